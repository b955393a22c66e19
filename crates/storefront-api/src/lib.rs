pub mod auth;
pub mod cart;
mod convert;
pub mod error;
pub mod extract;
pub mod identity;
pub mod middleware;
pub mod orders;
pub mod products;
pub mod resources;
pub mod routes;
pub mod state;
pub mod stores;

pub use routes::router;
pub use state::{AppState, AppStateInner, AuthSettings};

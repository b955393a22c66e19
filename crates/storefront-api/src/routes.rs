use axum::{
    Router, middleware,
    routing::{delete, get, patch, post},
};

use crate::middleware::require_auth;
use crate::resources::{self, Billboards, Categories, Resource};
use crate::state::AppState;
use crate::{auth, cart, orders, products, stores};

/// The full admin API.
///
/// Store and catalogue routes resolve the caller inside the handler so that
/// reads stay public; everything tied to a shopper account sits behind
/// [`require_auth`].
pub fn router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/health", get(health))
        .route("/api/auth/register", post(auth::register))
        .route("/api/auth/login", post(auth::login))
        .route("/api/stores", post(stores::create_store).get(stores::list_stores))
        .route(
            "/api/stores/{store_id}",
            get(stores::get_store)
                .patch(stores::update_store)
                .delete(stores::delete_store),
        )
        .merge(resource_routes::<Billboards>())
        .merge(resource_routes::<Categories>())
        .route("/api/products", get(products::list_products).post(products::create_product))
        .route("/api/products/category/{category}", get(products::list_by_category))
        .route(
            "/api/products/{id}",
            get(products::get_product)
                .patch(products::update_product)
                .delete(products::delete_product),
        );

    let protected_routes = Router::new()
        .route("/api/auth/me", get(auth::me))
        .route("/api/cart", get(cart::get_cart))
        .route("/api/cart/items", post(cart::add_item))
        .route("/api/cart/items/{product_id}", delete(cart::remove_item))
        .route("/api/cart/items/{product_id}/increase", post(cart::increase_item))
        .route("/api/cart/items/{product_id}/decrease", post(cart::decrease_item))
        .route("/api/orders", post(orders::place_order).get(orders::list_orders))
        .route("/api/orders/mine", get(orders::my_orders))
        .route("/api/orders/{id}/mark-delivered", patch(orders::mark_delivered))
        .route("/api/notifications", get(orders::list_notifications))
        .route("/api/notifications/read", post(orders::mark_notifications_read))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(state)
}

/// Collection and member routes for one store-scoped resource.
fn resource_routes<R: Resource>() -> Router<AppState> {
    let collection = format!("/api/stores/{{store_id}}/{}", R::descriptor().path);
    let member = format!("{}/{{id}}", collection);

    Router::new()
        .route(&collection, get(resources::list::<R>).post(resources::create::<R>))
        .route(
            &member,
            get(resources::get_one::<R>)
                .patch(resources::update::<R>)
                .delete(resources::delete::<R>),
        )
}

async fn health() -> &'static str {
    "ok"
}

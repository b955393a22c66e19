use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use crate::error::ApiError;
use crate::state::AppState;

/// Resolve the caller and reject anonymous requests. The resolved
/// [`Identity`](crate::identity::Identity) is stored in the request extensions.
pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let identity = state
        .identity
        .resolve(req.headers())
        .ok_or(ApiError::Unauthenticated)?;

    req.extensions_mut().insert(identity);
    Ok(next.run(req).await)
}

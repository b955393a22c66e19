//! The caller's shopping cart. Every route sits behind `require_auth`; the
//! cart owner is always the token subject.

use axum::{
    Extension, Json,
    body::Bytes,
    extract::{Path, State},
};
use uuid::Uuid;

use storefront_types::api::AddCartItemRequest;
use storefront_types::models::Cart;

use crate::convert;
use crate::error::ApiError;
use crate::extract::json_body;
use crate::identity::Identity;
use crate::state::{AppState, run_db};

/// GET /api/cart
pub async fn get_cart(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
) -> Result<Json<Cart>, ApiError> {
    let uid = identity.user_id.to_string();
    let rows = run_db(&state, "get cart", move |db| db.get_cart(&uid)).await?;
    Ok(Json(convert::cart(rows)?))
}

/// POST /api/cart/items: add one unit of a product.
pub async fn add_item(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    body: Bytes,
) -> Result<Json<Cart>, ApiError> {
    let req: AddCartItemRequest = json_body(&body)?;
    let uid = identity.user_id.to_string();
    let pid = req.product_id.to_string();

    let rows = run_db(&state, "add cart item", move |db| {
        if !db.add_cart_item(&uid, &pid)? {
            return Ok(None);
        }
        db.get_cart(&uid).map(Some)
    })
    .await?
    .ok_or_else(|| ApiError::NotFound("Product not found".to_string()))?;

    Ok(Json(convert::cart(rows)?))
}

/// POST /api/cart/items/{product_id}/increase
pub async fn increase_item(
    state: State<AppState>,
    identity: Extension<Identity>,
    Path(product_id): Path<Uuid>,
) -> Result<Json<Cart>, ApiError> {
    adjust(state, identity, product_id, 1).await
}

/// POST /api/cart/items/{product_id}/decrease: a line reaching zero is removed.
pub async fn decrease_item(
    state: State<AppState>,
    identity: Extension<Identity>,
    Path(product_id): Path<Uuid>,
) -> Result<Json<Cart>, ApiError> {
    adjust(state, identity, product_id, -1).await
}

async fn adjust(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    product_id: Uuid,
    delta: i64,
) -> Result<Json<Cart>, ApiError> {
    let uid = identity.user_id.to_string();
    let pid = product_id.to_string();

    let rows = run_db(&state, "adjust cart item", move |db| {
        if db.adjust_cart_item(&uid, &pid, delta)? == 0 {
            return Ok(None);
        }
        db.get_cart(&uid).map(Some)
    })
    .await?
    .ok_or_else(|| ApiError::NotFound("Product is not in the cart".to_string()))?;

    Ok(Json(convert::cart(rows)?))
}

/// DELETE /api/cart/items/{product_id}
pub async fn remove_item(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(product_id): Path<Uuid>,
) -> Result<Json<Cart>, ApiError> {
    let uid = identity.user_id.to_string();
    let pid = product_id.to_string();

    let rows = run_db(&state, "remove cart item", move |db| {
        db.remove_cart_item(&uid, &pid)?;
        db.get_cart(&uid)
    })
    .await?;

    Ok(Json(convert::cart(rows)?))
}

use axum::{
    Extension, Json,
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use tracing::info;
use uuid::Uuid;

use storefront_db::models::{DeliveryOutcome, ShippingAddress};
use storefront_types::api::{CountResponse, PlaceOrderRequest};
use storefront_types::models::{Notification, Order};

use crate::auth::require_admin;
use crate::convert;
use crate::error::ApiError;
use crate::extract::json_body;
use crate::identity::Identity;
use crate::state::{AppState, run_db};

// -- Orders --

/// POST /api/orders: check out the caller's cart.
pub async fn place_order(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    body: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    let req: PlaceOrderRequest = json_body(&body)?;
    let county = required(req.county, "county", "County")?;
    let constituency = required(req.constituency, "constituency", "Constituency")?;
    let local_area = required(req.local_area, "localArea", "Local area")?;

    let order_id = Uuid::new_v4().to_string();
    let uid = identity.user_id.to_string();
    let row = run_db(&state, "place order", move |db| {
        let address = ShippingAddress {
            county: &county,
            constituency: &constituency,
            local_area: &local_area,
        };
        db.place_order(&order_id, &uid, &address)
    })
    .await?
    .ok_or_else(|| ApiError::bad_request("Cart is empty"))?;

    info!("Order {} placed by {}: {} items, total {}", row.id, identity.user_id, row.item_count, row.total);
    Ok((StatusCode::CREATED, Json(convert::order(row, true))))
}

/// GET /api/orders: admin only; every order with its owner.
pub async fn list_orders(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
) -> Result<Json<Vec<Order>>, ApiError> {
    require_admin(&state, &identity).await?;
    all_orders(&state).await.map(Json)
}

/// GET /api/orders/mine
pub async fn my_orders(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
) -> Result<Json<Vec<Order>>, ApiError> {
    let uid = identity.user_id.to_string();
    let rows = run_db(&state, "list own orders", move |db| db.list_orders_for_user(&uid)).await?;
    Ok(Json(rows.into_iter().map(|row| convert::order(row, false)).collect()))
}

/// PATCH /api/orders/{id}/mark-delivered: admin only; responds with every order.
pub async fn mark_delivered(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(order_id): Path<String>,
) -> Result<Json<Vec<Order>>, ApiError> {
    require_admin(&state, &identity).await?;

    let oid = order_id.clone();
    let outcome = run_db(&state, "mark order delivered", move |db| db.mark_order_delivered(&oid)).await?;
    match outcome {
        DeliveryOutcome::Delivered => info!("Order {} delivered", order_id),
        DeliveryOutcome::NotFound => return Err(ApiError::NotFound("Order not found".to_string())),
        DeliveryOutcome::AlreadyDelivered => {
            return Err(ApiError::Conflict("Order is already delivered".to_string()));
        }
    }

    all_orders(&state).await.map(Json)
}

async fn all_orders(state: &AppState) -> Result<Vec<Order>, ApiError> {
    let rows = run_db(state, "list orders", |db| db.list_orders()).await?;
    Ok(rows.into_iter().map(|row| convert::order(row, true)).collect())
}

fn required(value: Option<String>, field: &'static str, label: &str) -> Result<String, ApiError> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ApiError::missing_field(field, label))
}

// -- Notifications --

/// GET /api/notifications: newest first.
pub async fn list_notifications(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
) -> Result<Json<Vec<Notification>>, ApiError> {
    let uid = identity.user_id.to_string();
    let rows = run_db(&state, "list notifications", move |db| db.list_notifications(&uid)).await?;
    Ok(Json(rows.into_iter().map(convert::notification).collect()))
}

/// POST /api/notifications/read
pub async fn mark_notifications_read(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
) -> Result<Json<CountResponse>, ApiError> {
    let uid = identity.user_id.to_string();
    let count = run_db(&state, "mark notifications read", move |db| db.mark_notifications_read(&uid)).await?;
    Ok(Json(CountResponse { count }))
}

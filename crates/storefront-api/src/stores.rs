use axum::{
    Json,
    body::Bytes,
    extract::{Path, State},
};
use tracing::info;
use uuid::Uuid;

use storefront_types::api::{CountResponse, StoreRequest};
use storefront_types::models::Store;

use crate::convert;
use crate::error::ApiError;
use crate::extract::{Caller, json_body};
use crate::resources::ensure_store_owner;
use crate::state::{AppState, run_db};

/// POST /api/stores
pub async fn create_store(
    State(state): State<AppState>,
    caller: Caller,
    body: Bytes,
) -> Result<Json<Store>, ApiError> {
    let identity = caller.require()?;
    let name = store_name(&body)?;

    let id = Uuid::new_v4().to_string();
    let owner = identity.user_id.to_string();
    let row = run_db(&state, "create store", move |db| db.create_store(&id, &name, &owner)).await?;

    info!("Store {} created by {}", row.id, identity.user_id);
    Ok(Json(convert::store(row)))
}

/// GET /api/stores: the caller's own stores, oldest first.
pub async fn list_stores(
    State(state): State<AppState>,
    caller: Caller,
) -> Result<Json<Vec<Store>>, ApiError> {
    let identity = caller.require()?;
    let owner = identity.user_id.to_string();
    let rows = run_db(&state, "list stores", move |db| db.list_stores_by_owner(&owner)).await?;
    Ok(Json(rows.into_iter().map(convert::store).collect()))
}

/// GET /api/stores/{store_id}: public; `null` for an unknown store.
pub async fn get_store(
    State(state): State<AppState>,
    Path(store_id): Path<String>,
) -> Result<Json<Option<Store>>, ApiError> {
    let row = run_db(&state, "get store", move |db| db.get_store(&store_id)).await?;
    Ok(Json(row.map(convert::store)))
}

/// PATCH /api/stores/{store_id}: rename.
pub async fn update_store(
    State(state): State<AppState>,
    Path(store_id): Path<String>,
    caller: Caller,
    body: Bytes,
) -> Result<Json<Store>, ApiError> {
    let identity = caller.require()?;
    let name = store_name(&body)?;
    ensure_store_owner(&state, &store_id, &identity).await?;

    let owner = identity.user_id.to_string();
    let row = run_db(&state, "update store", move |db| db.rename_store(&store_id, &owner, &name))
        .await?
        // Deleted between the ownership check and the update.
        .ok_or_else(|| ApiError::NotFound("Store not found".to_string()))?;

    info!("Store {} renamed by {}", row.id, identity.user_id);
    Ok(Json(convert::store(row)))
}

/// DELETE /api/stores/{store_id}: removes the store with its billboards and
/// categories.
pub async fn delete_store(
    State(state): State<AppState>,
    Path(store_id): Path<String>,
    caller: Caller,
) -> Result<Json<CountResponse>, ApiError> {
    let identity = caller.require()?;
    ensure_store_owner(&state, &store_id, &identity).await?;

    let owner = identity.user_id.to_string();
    let sid = store_id.clone();
    let count = run_db(&state, "delete store", move |db| db.delete_store(&sid, &owner)).await?;

    info!("Store {} deleted by {}", store_id, identity.user_id);
    Ok(Json(CountResponse { count }))
}

fn store_name(body: &Bytes) -> Result<String, ApiError> {
    let req: StoreRequest = json_body(body)?;
    req.name
        .as_deref()
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .ok_or_else(|| ApiError::missing_field("name", "Name"))
}

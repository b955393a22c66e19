//! Store-scoped resource handlers.
//!
//! One set of handlers serves every resource nested under a store. Each
//! mutation runs the same short-circuiting sequence: resolve the caller,
//! validate the body, confirm the caller owns the store in the path, then
//! perform a single persistence call.

use axum::{
    Json,
    body::Bytes,
    extract::{Path, State},
};
use serde_json::{Map, Value};
use tracing::info;
use uuid::Uuid;

use storefront_db::models::Outcome;
use storefront_types::api::CountResponse;
use storefront_types::models::ResourceRecord;
use storefront_types::resources::{BILLBOARDS, CATEGORIES, ResourceDescriptor};

use crate::convert;
use crate::error::ApiError;
use crate::extract::{Caller, json_body};
use crate::identity::Identity;
use crate::state::{AppState, run_db};

/// Binds a handler instantiation to a resource descriptor.
pub trait Resource: Send + Sync + 'static {
    fn descriptor() -> &'static ResourceDescriptor;
}

pub struct Billboards;

impl Resource for Billboards {
    fn descriptor() -> &'static ResourceDescriptor {
        &BILLBOARDS
    }
}

pub struct Categories;

impl Resource for Categories {
    fn descriptor() -> &'static ResourceDescriptor {
        &CATEGORIES
    }
}

/// GET /api/stores/{store_id}/{resource}: public.
pub async fn list<R: Resource>(
    State(state): State<AppState>,
    Path(store_id): Path<String>,
) -> Result<Json<Vec<ResourceRecord>>, ApiError> {
    let desc = R::descriptor();
    let rows = run_db(&state, "list resources", move |db| db.list_resources(desc, &store_id)).await?;
    Ok(Json(rows.into_iter().map(|row| convert::resource(desc, row)).collect()))
}

/// GET /api/stores/{store_id}/{resource}/{id}: public. `null` when the
/// record does not exist in this store.
pub async fn get_one<R: Resource>(
    State(state): State<AppState>,
    Path((store_id, id)): Path<(String, String)>,
) -> Result<Json<Option<ResourceRecord>>, ApiError> {
    let desc = R::descriptor();
    let row = run_db(&state, "get resource", move |db| db.get_resource(desc, &store_id, &id)).await?;
    Ok(Json(row.map(|row| convert::resource(desc, row))))
}

/// POST /api/stores/{store_id}/{resource}
pub async fn create<R: Resource>(
    State(state): State<AppState>,
    Path(store_id): Path<String>,
    caller: Caller,
    body: Bytes,
) -> Result<Json<ResourceRecord>, ApiError> {
    let desc = R::descriptor();
    let identity = caller.require()?;
    let values = required_values(desc, &body)?;
    ensure_store_owner(&state, &store_id, &identity).await?;

    let id = Uuid::new_v4().to_string();
    let sid = store_id.clone();
    let outcome = run_db(&state, "create resource", move |db| {
        db.insert_resource(desc, &id, &sid, &values)
    })
    .await?;

    match outcome {
        Outcome::Done(row) => {
            info!("{} {} created in store {} by {}", desc.display, row.id, store_id, identity.user_id);
            Ok(Json(convert::resource(desc, row)))
        }
        other => Err(refused(desc, other)),
    }
}

/// PATCH /api/stores/{store_id}/{resource}/{id}
///
/// Overwrites the required fields. Responds with the number of records
/// changed; a record that is not in this store is a 404.
pub async fn update<R: Resource>(
    State(state): State<AppState>,
    Path((store_id, id)): Path<(String, String)>,
    caller: Caller,
    body: Bytes,
) -> Result<Json<CountResponse>, ApiError> {
    let desc = R::descriptor();
    let identity = caller.require()?;
    let values = required_values(desc, &body)?;
    ensure_store_owner(&state, &store_id, &identity).await?;

    let sid = store_id.clone();
    let rid = id.clone();
    let outcome = run_db(&state, "update resource", move |db| {
        db.update_resource(desc, &sid, &rid, &values)
    })
    .await?;

    match outcome {
        Outcome::Done(0) => Err(ApiError::NotFound(format!("{} not found", desc.display))),
        Outcome::Done(count) => {
            info!("{} {} updated in store {} by {}", desc.display, id, store_id, identity.user_id);
            Ok(Json(CountResponse { count }))
        }
        other => Err(refused(desc, other)),
    }
}

/// DELETE /api/stores/{store_id}/{resource}/{id}
///
/// Idempotent: deleting a record that is already gone reports `count: 0`.
pub async fn delete<R: Resource>(
    State(state): State<AppState>,
    Path((store_id, id)): Path<(String, String)>,
    caller: Caller,
) -> Result<Json<CountResponse>, ApiError> {
    let desc = R::descriptor();
    let identity = caller.require()?;
    ensure_store_owner(&state, &store_id, &identity).await?;

    let sid = store_id.clone();
    let rid = id.clone();
    let outcome = run_db(&state, "delete resource", move |db| {
        db.delete_resource(desc, &sid, &rid)
    })
    .await?;

    match outcome {
        Outcome::Done(count) => {
            if count > 0 {
                info!("{} {} deleted from store {} by {}", desc.display, id, store_id, identity.user_id);
            }
            Ok(Json(CountResponse { count }))
        }
        other => Err(refused(desc, other)),
    }
}

/// 403 unless the caller owns the store. A store that does not exist is
/// indistinguishable from one owned by somebody else.
pub(crate) async fn ensure_store_owner(
    state: &AppState,
    store_id: &str,
    identity: &Identity,
) -> Result<(), ApiError> {
    let sid = store_id.to_string();
    let uid = identity.user_id.to_string();
    let store = run_db(state, "check store owner", move |db| db.find_owned_store(&sid, &uid)).await?;
    if store.is_none() {
        return Err(ApiError::Forbidden("You do not own this store".to_string()));
    }
    Ok(())
}

/// The descriptor's required fields, trimmed, in descriptor order. The first
/// missing, empty or non-string field fails the request.
fn required_values(desc: &ResourceDescriptor, body: &Bytes) -> Result<Vec<String>, ApiError> {
    let body: Map<String, Value> = json_body(body)?;
    desc.fields
        .iter()
        .map(|field| match body.get(field.key).and_then(Value::as_str).map(str::trim) {
            Some(value) if !value.is_empty() => Ok(value.to_string()),
            _ => Err(ApiError::missing_field(field.key, field.label)),
        })
        .collect()
}

fn refused<T>(desc: &ResourceDescriptor, outcome: Outcome<T>) -> ApiError {
    match outcome {
        Outcome::MissingReference(key) => {
            let label = desc.field(key).map_or(key, |f| f.label);
            ApiError::invalid_field(key, format!("{} does not belong to this store", label))
        }
        Outcome::InUse(dependents) => ApiError::Conflict(format!(
            "Make sure you removed all {} using this {} first",
            dependents,
            desc.display.to_lowercase()
        )),
        Outcome::Done(_) => ApiError::Internal(anyhow::anyhow!("{}: unexpected outcome", desc.name)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_missing_field_wins() {
        let body = Bytes::from_static(br#"{"imageUrl": ""}"#);
        let err = required_values(&BILLBOARDS, &body).unwrap_err();
        assert!(matches!(err, ApiError::Validation { field: Some("label"), .. }));

        let body = Bytes::from_static(br#"{"label": "Sale", "imageUrl": "   "}"#);
        let err = required_values(&BILLBOARDS, &body).unwrap_err();
        assert!(matches!(err, ApiError::Validation { field: Some("imageUrl"), .. }));
    }

    #[test]
    fn values_follow_descriptor_order() {
        let body = Bytes::from_static(br#"{"imageUrl": "https://x/y.png", "label": " Sale ", "extra": 1}"#);
        let values = required_values(&BILLBOARDS, &body).unwrap();
        assert_eq!(values, vec!["Sale", "https://x/y.png"]);
    }

    #[test]
    fn non_string_field_counts_as_missing() {
        let body = Bytes::from_static(br#"{"name": 42, "billboardId": "b1"}"#);
        let err = required_values(&CATEGORIES, &body).unwrap_err();
        assert_eq!(err.to_string(), "Category name is required");
    }

    #[test]
    fn refusals_map_to_client_errors() {
        let err = refused::<usize>(&CATEGORIES, Outcome::MissingReference("billboardId"));
        assert_eq!(err.to_string(), "Billboard id does not belong to this store");

        let err = refused::<usize>(&BILLBOARDS, Outcome::InUse("categories"));
        assert!(matches!(err, ApiError::Conflict(_)));
        assert!(err.to_string().contains("categories using this billboard"));
    }
}

use axum::{
    Json,
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use rust_decimal::Decimal;
use tracing::info;
use uuid::Uuid;

use storefront_db::models::NewProduct;
use storefront_types::api::{ProductDetail, ProductRequest};
use storefront_types::models::Product;

use crate::auth::require_admin;
use crate::convert;
use crate::error::ApiError;
use crate::extract::{Caller, json_body};
use crate::state::{AppState, run_db};

const SIMILAR_LIMIT: u32 = 5;

/// Upper bound on a unit price.
const MAX_PRICE: i64 = 1_000_000_000;

/// Category name that matches every product.
const ALL_CATEGORIES: &str = "all";

/// A fully validated product body.
struct ValidProduct {
    name: String,
    description: String,
    price: Decimal,
    category: String,
    pictures: Vec<String>,
}

impl ValidProduct {
    fn parse(body: &Bytes) -> Result<Self, ApiError> {
        let req: ProductRequest = json_body(body)?;

        let name = required_text(req.name, "name", "Name")?;
        let description = required_text(req.description, "description", "Description")?;
        let price = req.price.ok_or_else(|| ApiError::missing_field("price", "Price"))?;
        if price.is_sign_negative() {
            return Err(ApiError::invalid_field("price", "Price must not be negative"));
        }
        if price > Decimal::from(MAX_PRICE) {
            return Err(ApiError::invalid_field(
                "price",
                format!("Price must not exceed {}", MAX_PRICE),
            ));
        }
        let category = required_text(req.category, "category", "Category")?;
        let pictures: Vec<String> = req
            .images
            .unwrap_or_default()
            .into_iter()
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty())
            .collect();
        if pictures.is_empty() {
            return Err(ApiError::missing_field("images", "At least one image"));
        }

        Ok(Self {
            name,
            description,
            price,
            category,
            pictures,
        })
    }

    fn as_new(&self) -> NewProduct<'_> {
        NewProduct {
            name: &self.name,
            description: &self.description,
            price: self.price,
            category: &self.category,
            pictures: &self.pictures,
        }
    }
}

fn required_text(value: Option<String>, field: &'static str, label: &str) -> Result<String, ApiError> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ApiError::missing_field(field, label))
}

/// GET /api/products: newest first.
pub async fn list_products(State(state): State<AppState>) -> Result<Json<Vec<Product>>, ApiError> {
    let rows = run_db(&state, "list products", |db| db.list_products()).await?;
    Ok(Json(convert::products(rows)))
}

/// GET /api/products/{id}: the product plus a few others from its category.
pub async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ProductDetail>, ApiError> {
    let detail = run_db(&state, "get product", move |db| {
        let Some(product) = db.get_product(&id)? else {
            return Ok(None);
        };
        let similar = db.similar_products(&product.category, &product.id, SIMILAR_LIMIT)?;
        Ok(Some((product, similar)))
    })
    .await?
    .ok_or_else(|| ApiError::NotFound("Product not found".to_string()))?;

    let (product, similar) = detail;
    Ok(Json(ProductDetail {
        product: convert::product(product),
        similar: convert::products(similar),
    }))
}

/// GET /api/products/category/{category}: `all` lists everything.
pub async fn list_by_category(
    State(state): State<AppState>,
    Path(category): Path<String>,
) -> Result<Json<Vec<Product>>, ApiError> {
    let rows = run_db(&state, "list products by category", move |db| {
        if category == ALL_CATEGORIES {
            db.list_products()
        } else {
            db.list_products_by_category(&category)
        }
    })
    .await?;
    Ok(Json(convert::products(rows)))
}

/// POST /api/products: admin only; responds with the whole catalogue.
pub async fn create_product(
    State(state): State<AppState>,
    caller: Caller,
    body: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    let identity = caller.require()?;
    let product = ValidProduct::parse(&body)?;
    require_admin(&state, &identity).await?;

    let id = Uuid::new_v4().to_string();
    let rows = run_db(&state, "create product", move |db| {
        db.insert_product(&id, &product.as_new())?;
        db.list_products()
    })
    .await?;

    info!("Product created by {}", identity.user_id);
    Ok((StatusCode::CREATED, Json(convert::products(rows))))
}

/// PATCH /api/products/{id}: admin only; responds with the whole catalogue.
pub async fn update_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
    caller: Caller,
    body: Bytes,
) -> Result<Json<Vec<Product>>, ApiError> {
    let identity = caller.require()?;
    let product = ValidProduct::parse(&body)?;
    require_admin(&state, &identity).await?;

    let pid = id.clone();
    let rows = run_db(&state, "update product", move |db| {
        if db.update_product(&pid, &product.as_new())? == 0 {
            return Ok(None);
        }
        db.list_products().map(Some)
    })
    .await?
    .ok_or_else(|| ApiError::NotFound("Product not found".to_string()))?;

    info!("Product {} updated by {}", id, identity.user_id);
    Ok(Json(convert::products(rows)))
}

/// DELETE /api/products/{id}: admin only; idempotent.
pub async fn delete_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
    caller: Caller,
) -> Result<Json<Vec<Product>>, ApiError> {
    let identity = caller.require()?;
    require_admin(&state, &identity).await?;

    let pid = id.clone();
    let rows = run_db(&state, "delete product", move |db| {
        db.delete_product(&pid)?;
        db.list_products()
    })
    .await?;

    info!("Product {} deleted by {}", id, identity.user_id);
    Ok(Json(convert::products(rows)))
}

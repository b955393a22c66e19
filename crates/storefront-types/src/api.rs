use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::Product;

// -- JWT Claims --

/// Claims carried by the bearer tokens issued at login/registration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub email: String,
    pub exp: usize,
}

// -- Auth --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegisterRequest {
    pub email: String,
    pub name: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterResponse {
    pub user_id: Uuid,
    pub token: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub user_id: Uuid,
    pub name: String,
    pub is_admin: bool,
    pub token: String,
}

// -- Stores --

/// Body of store create/rename. `name` stays optional so a missing name is
/// reported as a field error rather than a deserialization failure.
#[derive(Debug, Default, Deserialize)]
pub struct StoreRequest {
    #[serde(default)]
    pub name: Option<String>,
}

// -- Mutation results --

/// Number of records touched by a bulk-style update or delete.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountResponse {
    pub count: usize,
}

// -- Products --

#[derive(Debug, Default, Deserialize)]
pub struct ProductRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub price: Option<Decimal>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub images: Option<Vec<String>>,
}

#[derive(Debug, Serialize)]
pub struct ProductDetail {
    pub product: Product,
    pub similar: Vec<Product>,
}

// -- Cart --

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddCartItemRequest {
    pub product_id: Uuid,
}

// -- Orders --

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceOrderRequest {
    #[serde(default)]
    pub county: Option<String>,
    #[serde(default)]
    pub constituency: Option<String>,
    #[serde(default)]
    pub local_area: Option<String>,
}

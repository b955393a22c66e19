//! Database row types. These map directly to SQLite rows and stay distinct
//! from the storefront-types API models to keep the DB layer independent.

use rust_decimal::Decimal;

pub struct UserRow {
    pub id: String,
    pub email: String,
    pub name: String,
    pub password: String,
    pub is_admin: bool,
    pub created_at: String,
}

pub struct StoreRow {
    pub id: String,
    pub name: String,
    pub owner_user_id: String,
    pub created_at: String,
    pub updated_at: String,
}

/// A row of any descriptor-driven resource table. `values` are aligned with
/// the descriptor's `fields`.
pub struct ResourceRow {
    pub id: String,
    pub store_id: String,
    pub values: Vec<String>,
    pub created_at: String,
    pub updated_at: String,
}

pub struct ProductRow {
    pub id: String,
    pub name: String,
    pub description: String,
    pub price: Decimal,
    pub category: String,
    pub pictures: Vec<String>,
    pub created_at: String,
}

/// Column values for a product insert or overwrite.
pub struct NewProduct<'a> {
    pub name: &'a str,
    pub description: &'a str,
    pub price: Decimal,
    pub category: &'a str,
    pub pictures: &'a [String],
}

pub struct CartItemRow {
    pub product_id: String,
    pub quantity: u32,
    pub price: Decimal,
}

pub struct OrderItemRow {
    pub product_id: String,
    pub quantity: u32,
    pub unit_price: Decimal,
}

pub struct OrderRow {
    pub id: String,
    pub owner_user_id: String,
    pub owner_email: String,
    pub owner_name: String,
    pub county: String,
    pub constituency: String,
    pub local_area: String,
    pub status: String,
    pub item_count: u32,
    pub total: Decimal,
    pub created_at: String,
    pub items: Vec<OrderItemRow>,
}

/// Delivery address captured when an order is placed.
pub struct ShippingAddress<'a> {
    pub county: &'a str,
    pub constituency: &'a str,
    pub local_area: &'a str,
}

pub struct NotificationRow {
    pub id: String,
    pub user_id: String,
    pub message: String,
    pub status: String,
    pub created_at: String,
}

/// Result of a write that can be refused for referential reasons.
#[derive(Debug, PartialEq)]
pub enum Outcome<T> {
    Done(T),
    /// The field with this key names no record in the same store.
    MissingReference(&'static str),
    /// Records in the named collection still point at the target.
    InUse(&'static str),
}

#[derive(Debug, PartialEq, Eq)]
pub enum DeliveryOutcome {
    Delivered,
    NotFound,
    AlreadyDelivered,
}

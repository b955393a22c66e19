//! Row -> wire model conversions.
//!
//! Rows hold ids and timestamps as text. A corrupt value is logged and
//! replaced by a default instead of failing the whole response.

use chrono::{DateTime, Utc};
use tracing::warn;
use uuid::Uuid;

use storefront_db::models::{
    CartItemRow, NotificationRow, OrderRow, ProductRow, ResourceRow, StoreRow, UserRow,
};
use storefront_types::models::{
    Cart, CartLine, Notification, Order, OrderLine, OrderOwner, OrderStatus, Product,
    ResourceRecord, Store, UserProfile, checked_totals,
};
use storefront_types::resources::ResourceDescriptor;

use crate::error::ApiError;

pub(crate) fn uuid(value: &str, what: &str) -> Uuid {
    value.parse().unwrap_or_else(|e| {
        warn!("Corrupt {} '{}': {}", what, value, e);
        Uuid::default()
    })
}

pub(crate) fn timestamp(value: &str, what: &str) -> DateTime<Utc> {
    value
        .parse::<DateTime<Utc>>()
        .or_else(|_| {
            // SQLite's datetime('now') default is "YYYY-MM-DD HH:MM:SS" without timezone.
            chrono::NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S").map(|ndt| ndt.and_utc())
        })
        .unwrap_or_else(|e| {
            warn!("Corrupt {} '{}': {}", what, value, e);
            DateTime::default()
        })
}

pub(crate) fn store(row: StoreRow) -> Store {
    Store {
        id: uuid(&row.id, "store id"),
        name: row.name,
        owner_user_id: uuid(&row.owner_user_id, "store owner"),
        created_at: timestamp(&row.created_at, "store created_at"),
        updated_at: timestamp(&row.updated_at, "store updated_at"),
    }
}

pub(crate) fn resource(desc: &ResourceDescriptor, row: ResourceRow) -> ResourceRecord {
    let fields = desc
        .fields
        .iter()
        .map(|f| f.key.to_string())
        .zip(row.values)
        .collect();
    ResourceRecord {
        id: uuid(&row.id, desc.name),
        store_id: uuid(&row.store_id, "store id"),
        fields,
        created_at: timestamp(&row.created_at, "created_at"),
        updated_at: timestamp(&row.updated_at, "updated_at"),
    }
}

pub(crate) fn product(row: ProductRow) -> Product {
    Product {
        id: uuid(&row.id, "product id"),
        name: row.name,
        description: row.description,
        price: row.price,
        category: row.category,
        pictures: row.pictures,
        created_at: timestamp(&row.created_at, "product created_at"),
    }
}

pub(crate) fn products(rows: Vec<ProductRow>) -> Vec<Product> {
    rows.into_iter().map(product).collect()
}

/// Totals that do not fit a `Decimal` fail the request.
pub(crate) fn cart(rows: Vec<CartItemRow>) -> Result<Cart, ApiError> {
    let (count, total) = checked_totals(rows.iter().map(|r| (r.quantity, r.price)))
        .ok_or_else(|| ApiError::Internal(anyhow::anyhow!("cart total overflowed")))?;
    Ok(Cart {
        items: rows
            .into_iter()
            .map(|r| CartLine {
                product_id: uuid(&r.product_id, "cart product id"),
                quantity: r.quantity,
            })
            .collect(),
        count,
        total,
    })
}

pub(crate) fn order(row: OrderRow, with_owner: bool) -> Order {
    let status = OrderStatus::parse(&row.status).unwrap_or_else(|| {
        warn!("Corrupt status '{}' on order '{}'", row.status, row.id);
        OrderStatus::Processing
    });
    Order {
        id: uuid(&row.id, "order id"),
        owner_user_id: uuid(&row.owner_user_id, "order owner"),
        owner: with_owner.then(|| OrderOwner {
            email: row.owner_email,
            name: row.owner_name,
        }),
        products: row
            .items
            .into_iter()
            .map(|i| OrderLine {
                product_id: uuid(&i.product_id, "order product id"),
                quantity: i.quantity,
                unit_price: i.unit_price,
            })
            .collect(),
        count: row.item_count,
        total: row.total,
        county: row.county,
        constituency: row.constituency,
        local_area: row.local_area,
        status,
        created_at: timestamp(&row.created_at, "order created_at"),
    }
}

pub(crate) fn notification(row: NotificationRow) -> Notification {
    Notification {
        id: uuid(&row.id, "notification id"),
        message: row.message,
        status: row.status,
        created_at: timestamp(&row.created_at, "notification created_at"),
    }
}

pub(crate) fn profile(row: UserRow) -> UserProfile {
    UserProfile {
        id: uuid(&row.id, "user id"),
        email: row.email,
        name: row.name,
        is_admin: row.is_admin,
        created_at: timestamp(&row.created_at, "user created_at"),
    }
}

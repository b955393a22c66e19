use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Store {
    pub id: Uuid,
    pub name: String,
    pub owner_user_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A record of a store-scoped resource (billboard, category, ...).
///
/// The resource-specific columns are carried in `fields`, keyed by their JSON
/// names, and flattened into the object on the wire:
/// `{"id", "storeId", "label", "imageUrl", "createdAt", "updatedAt"}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceRecord {
    pub id: Uuid,
    pub store_id: Uuid,
    #[serde(flatten)]
    pub fields: BTreeMap<String, String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub price: Decimal,
    pub category: String,
    pub pictures: Vec<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Processing,
    Delivered,
}

impl OrderStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Processing => "processing",
            Self::Delivered => "delivered",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "processing" => Some(Self::Processing),
            "delivered" => Some(Self::Delivered),
            _ => None,
        }
    }

    /// Orders only ever move forward: processing -> delivered.
    pub fn can_transition_to(self, next: Self) -> bool {
        matches!((self, next), (Self::Processing, Self::Delivered))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLine {
    pub product_id: Uuid,
    pub quantity: u32,
    pub unit_price: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderOwner {
    pub email: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: Uuid,
    pub owner_user_id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner: Option<OrderOwner>,
    pub products: Vec<OrderLine>,
    pub count: u32,
    pub total: Decimal,
    pub county: String,
    pub constituency: String,
    pub local_area: String,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    pub product_id: Uuid,
    pub quantity: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cart {
    pub items: Vec<CartLine>,
    pub count: u32,
    pub total: Decimal,
}

/// Item count and price total of `(quantity, unit price)` lines. `None` if
/// either overflows.
pub fn checked_totals<I>(lines: I) -> Option<(u32, Decimal)>
where
    I: IntoIterator<Item = (u32, Decimal)>,
{
    lines
        .into_iter()
        .try_fold((0u32, Decimal::ZERO), |(count, total), (quantity, price)| {
            let line = price.checked_mul(Decimal::from(quantity))?;
            Some((count.checked_add(quantity)?, total.checked_add(line)?))
        })
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: Uuid,
    pub message: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

/// The public side of a user account. Never carries the password hash.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resource_record_flattens_fields() {
        let mut fields = BTreeMap::new();
        fields.insert("label".to_string(), "Summer Sale".to_string());
        fields.insert("imageUrl".to_string(), "https://x/y.png".to_string());

        let record = ResourceRecord {
            id: Uuid::new_v4(),
            store_id: Uuid::new_v4(),
            fields,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["label"], "Summer Sale");
        assert_eq!(json["imageUrl"], "https://x/y.png");
        assert_eq!(json["storeId"], record.store_id.to_string());
        assert!(json.get("fields").is_none());
    }

    #[test]
    fn totals_sum_lines() {
        let lines = [(2, Decimal::new(1999, 2)), (1, Decimal::new(5, 0))];
        assert_eq!(checked_totals(lines), Some((3, Decimal::new(4498, 2))));
        assert_eq!(checked_totals([]), Some((0, Decimal::ZERO)));
    }

    #[test]
    fn totals_overflow_is_reported() {
        assert_eq!(checked_totals([(2, Decimal::MAX)]), None);
        assert_eq!(checked_totals([(1, Decimal::MAX), (1, Decimal::MAX)]), None);
        assert_eq!(checked_totals([(u32::MAX, Decimal::ONE), (1, Decimal::ONE)]), None);
    }

    #[test]
    fn order_status_is_one_way() {
        assert!(OrderStatus::Processing.can_transition_to(OrderStatus::Delivered));
        assert!(!OrderStatus::Delivered.can_transition_to(OrderStatus::Processing));
        assert!(!OrderStatus::Delivered.can_transition_to(OrderStatus::Delivered));
        assert_eq!(OrderStatus::parse("delivered"), Some(OrderStatus::Delivered));
        assert_eq!(OrderStatus::parse("shipped"), None);
    }
}

use std::collections::HashMap;

use anyhow::{Result, anyhow};
use rusqlite::{Connection, Row};
use storefront_types::models::{OrderStatus, checked_totals};

use super::cart::query_cart;
use super::notifications::insert_notification;
use super::users::admin_ids;
use super::{OptionalExt, count_column, decimal_column, placeholders};
use crate::models::{DeliveryOutcome, OrderItemRow, OrderRow, ShippingAddress};
use crate::{Database, now};

const ORDER_SELECT: &str = "SELECT o.id, o.owner_user_id, u.email, u.name, o.county, o.constituency,
            o.local_area, o.status, o.item_count, o.total, o.created_at
     FROM orders o
     JOIN users u ON u.id = o.owner_user_id";

impl Database {
    /// Turns the user's cart into a new order.
    ///
    /// Snapshotting the cart, clearing it and notifying every admin happen in
    /// one transaction: either all of it is recorded or none of it. Returns
    /// `None` when the cart is empty.
    pub fn place_order(
        &self,
        order_id: &str,
        user_id: &str,
        address: &ShippingAddress<'_>,
    ) -> Result<Option<OrderRow>> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            let lines = query_cart(&tx, user_id)?;
            if lines.is_empty() {
                return Ok(None);
            }

            let (item_count, total) = checked_totals(lines.iter().map(|l| (l.quantity, l.price)))
                .ok_or_else(|| anyhow!("order total overflowed for user {}", user_id))?;
            let created_at = now();

            tx.execute(
                "INSERT INTO orders (id, owner_user_id, county, constituency, local_area, status, item_count, total, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                rusqlite::params![
                    order_id,
                    user_id,
                    address.county,
                    address.constituency,
                    address.local_area,
                    OrderStatus::Processing.as_str(),
                    item_count,
                    total.to_string(),
                    created_at,
                ],
            )?;

            for line in &lines {
                tx.execute(
                    "INSERT INTO order_items (order_id, product_id, quantity, unit_price) VALUES (?1, ?2, ?3, ?4)",
                    rusqlite::params![order_id, line.product_id, line.quantity, line.price.to_string()],
                )?;
            }

            tx.execute("DELETE FROM cart_items WHERE user_id = ?1", [user_id])?;

            let (email, name): (String, String) = tx.query_row(
                "SELECT email, name FROM users WHERE id = ?1",
                [user_id],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )?;
            let message = format!("New order from {}", name);
            for admin_id in admin_ids(&tx)? {
                insert_notification(&tx, &uuid::Uuid::new_v4().to_string(), &admin_id, &message)?;
            }

            tx.commit()?;

            Ok(Some(OrderRow {
                id: order_id.to_string(),
                owner_user_id: user_id.to_string(),
                owner_email: email,
                owner_name: name,
                county: address.county.to_string(),
                constituency: address.constituency.to_string(),
                local_area: address.local_area.to_string(),
                status: OrderStatus::Processing.as_str().to_string(),
                item_count,
                total,
                created_at,
                items: lines
                    .into_iter()
                    .map(|l| OrderItemRow {
                        product_id: l.product_id,
                        quantity: l.quantity,
                        unit_price: l.price,
                    })
                    .collect(),
            }))
        })
    }

    /// Every order, newest first, with owner details and line items.
    pub fn list_orders(&self) -> Result<Vec<OrderRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "{} ORDER BY o.created_at DESC, o.rowid DESC",
                ORDER_SELECT
            ))?;
            let orders = stmt
                .query_map([], map_order)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            attach_items(conn, orders)
        })
    }

    pub fn list_orders_for_user(&self, user_id: &str) -> Result<Vec<OrderRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "{} WHERE o.owner_user_id = ?1 ORDER BY o.created_at DESC, o.rowid DESC",
                ORDER_SELECT
            ))?;
            let orders = stmt
                .query_map([user_id], map_order)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            attach_items(conn, orders)
        })
    }

    /// Moves a processing order to delivered and notifies its owner, in one
    /// transaction.
    pub fn mark_order_delivered(&self, order_id: &str) -> Result<DeliveryOutcome> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            let current: Option<(String, String)> = tx
                .query_row(
                    "SELECT status, owner_user_id FROM orders WHERE id = ?1",
                    [order_id],
                    |row| Ok((row.get(0)?, row.get(1)?)),
                )
                .optional()?;
            let Some((status, owner_id)) = current else {
                return Ok(DeliveryOutcome::NotFound);
            };

            let status = OrderStatus::parse(&status)
                .ok_or_else(|| anyhow::anyhow!("Corrupt status '{}' on order {}", status, order_id))?;
            if !status.can_transition_to(OrderStatus::Delivered) {
                return Ok(DeliveryOutcome::AlreadyDelivered);
            }

            tx.execute(
                "UPDATE orders SET status = ?1 WHERE id = ?2",
                [OrderStatus::Delivered.as_str(), order_id],
            )?;
            let message = format!("Order {} shipped with success", order_id);
            insert_notification(&tx, &uuid::Uuid::new_v4().to_string(), &owner_id, &message)?;

            tx.commit()?;
            Ok(DeliveryOutcome::Delivered)
        })
    }
}

fn map_order(row: &Row<'_>) -> rusqlite::Result<OrderRow> {
    Ok(OrderRow {
        id: row.get(0)?,
        owner_user_id: row.get(1)?,
        owner_email: row.get(2)?,
        owner_name: row.get(3)?,
        county: row.get(4)?,
        constituency: row.get(5)?,
        local_area: row.get(6)?,
        status: row.get(7)?,
        item_count: count_column(row, 8)?,
        total: decimal_column(row, 9)?,
        created_at: row.get(10)?,
        items: Vec::new(),
    })
}

/// Batch-fetch line items for a set of orders.
fn attach_items(conn: &Connection, mut orders: Vec<OrderRow>) -> Result<Vec<OrderRow>> {
    if orders.is_empty() {
        return Ok(orders);
    }

    let sql = format!(
        "SELECT order_id, product_id, quantity, unit_price FROM order_items
         WHERE order_id IN ({}) ORDER BY rowid",
        placeholders(1, orders.len()).join(", ")
    );
    let mut stmt = conn.prepare(&sql)?;
    let ids = orders.iter().map(|o| o.id.as_str());

    let mut by_order: HashMap<String, Vec<OrderItemRow>> = HashMap::new();
    let rows = stmt.query_map(rusqlite::params_from_iter(ids), |row| {
        Ok((
            row.get::<_, String>(0)?,
            OrderItemRow {
                product_id: row.get(1)?,
                quantity: count_column(row, 2)?,
                unit_price: decimal_column(row, 3)?,
            },
        ))
    })?;
    for row in rows {
        let (order_id, item) = row?;
        by_order.entry(order_id).or_default().push(item);
    }

    for order in &mut orders {
        order.items = by_order.remove(&order.id).unwrap_or_default();
    }
    Ok(orders)
}

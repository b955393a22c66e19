use anyhow::Result;
use rusqlite::Connection;

use super::{count_column, decimal_column};
use crate::Database;
use crate::models::CartItemRow;

impl Database {
    /// The user's cart lines joined with current product prices.
    pub fn get_cart(&self, user_id: &str) -> Result<Vec<CartItemRow>> {
        self.with_conn(|conn| query_cart(conn, user_id))
    }

    /// Adds one unit of the product. Returns false if the product does not exist.
    pub fn add_cart_item(&self, user_id: &str, product_id: &str) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            let exists: bool = tx.query_row(
                "SELECT EXISTS(SELECT 1 FROM products WHERE id = ?1)",
                [product_id],
                |row| row.get(0),
            )?;
            if !exists {
                return Ok(false);
            }
            tx.execute(
                "INSERT INTO cart_items (user_id, product_id, quantity) VALUES (?1, ?2, 1)
                 ON CONFLICT (user_id, product_id) DO UPDATE SET quantity = quantity + 1",
                [user_id, product_id],
            )?;
            tx.commit()?;
            Ok(true)
        })
    }

    /// Changes the quantity of an existing line by `delta`, dropping the line
    /// when it reaches zero. Returns the number of lines touched.
    pub fn adjust_cart_item(&self, user_id: &str, product_id: &str, delta: i64) -> Result<usize> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            let changed = tx.execute(
                "UPDATE cart_items SET quantity = quantity + ?1 WHERE user_id = ?2 AND product_id = ?3",
                rusqlite::params![delta, user_id, product_id],
            )?;
            tx.execute(
                "DELETE FROM cart_items WHERE user_id = ?1 AND product_id = ?2 AND quantity <= 0",
                [user_id, product_id],
            )?;
            tx.commit()?;
            Ok(changed)
        })
    }

    pub fn remove_cart_item(&self, user_id: &str, product_id: &str) -> Result<usize> {
        self.with_conn(|conn| {
            Ok(conn.execute(
                "DELETE FROM cart_items WHERE user_id = ?1 AND product_id = ?2",
                [user_id, product_id],
            )?)
        })
    }
}

pub(super) fn query_cart(conn: &Connection, user_id: &str) -> Result<Vec<CartItemRow>> {
    let mut stmt = conn.prepare(
        "SELECT c.product_id, c.quantity, p.price
         FROM cart_items c
         JOIN products p ON p.id = c.product_id
         WHERE c.user_id = ?1
         ORDER BY c.rowid",
    )?;
    let rows = stmt
        .query_map([user_id], |row| {
            Ok(CartItemRow {
                product_id: row.get(0)?,
                quantity: count_column(row, 1)?,
                price: decimal_column(row, 2)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

use anyhow::Result;
use rusqlite::Row;
use rusqlite::types::Type;

use super::{OptionalExt, decimal_column};
use crate::models::{NewProduct, ProductRow};
use crate::{Database, now};

const PRODUCT_COLUMNS: &str = "id, name, description, price, category, pictures, created_at";

impl Database {
    pub fn insert_product(&self, id: &str, product: &NewProduct<'_>) -> Result<()> {
        let pictures = serde_json::to_string(product.pictures)?;
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO products (id, name, description, price, category, pictures, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                rusqlite::params![
                    id,
                    product.name,
                    product.description,
                    product.price.to_string(),
                    product.category,
                    pictures,
                    now(),
                ],
            )?;
            Ok(())
        })
    }

    /// Every product, newest first.
    pub fn list_products(&self) -> Result<Vec<ProductRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {} FROM products ORDER BY created_at DESC, rowid DESC",
                PRODUCT_COLUMNS
            ))?;
            let rows = stmt
                .query_map([], map_product)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Products of one category, newest first.
    pub fn list_products_by_category(&self, category: &str) -> Result<Vec<ProductRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {} FROM products WHERE category = ?1 ORDER BY created_at DESC, rowid DESC",
                PRODUCT_COLUMNS
            ))?;
            let rows = stmt
                .query_map([category], map_product)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn get_product(&self, id: &str) -> Result<Option<ProductRow>> {
        self.with_conn(|conn| {
            conn.query_row(
                &format!("SELECT {} FROM products WHERE id = ?1", PRODUCT_COLUMNS),
                [id],
                map_product,
            )
            .optional()
        })
    }

    /// Up to `limit` other products sharing `category`, newest first.
    pub fn similar_products(&self, category: &str, exclude_id: &str, limit: u32) -> Result<Vec<ProductRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {} FROM products WHERE category = ?1 AND id != ?2
                 ORDER BY created_at DESC, rowid DESC LIMIT ?3",
                PRODUCT_COLUMNS
            ))?;
            let rows = stmt
                .query_map(rusqlite::params![category, exclude_id, limit], map_product)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn update_product(&self, id: &str, product: &NewProduct<'_>) -> Result<usize> {
        let pictures = serde_json::to_string(product.pictures)?;
        self.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE products SET name = ?1, description = ?2, price = ?3, category = ?4, pictures = ?5
                 WHERE id = ?6",
                rusqlite::params![
                    product.name,
                    product.description,
                    product.price.to_string(),
                    product.category,
                    pictures,
                    id,
                ],
            )?;
            Ok(changed)
        })
    }

    pub fn delete_product(&self, id: &str) -> Result<usize> {
        self.with_conn(|conn| Ok(conn.execute("DELETE FROM products WHERE id = ?1", [id])?))
    }
}

fn map_product(row: &Row<'_>) -> rusqlite::Result<ProductRow> {
    let pictures: String = row.get(5)?;
    let pictures: Vec<String> = serde_json::from_str(&pictures)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(5, Type::Text, Box::new(e)))?;
    Ok(ProductRow {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        price: decimal_column(row, 3)?,
        category: row.get(4)?,
        pictures,
        created_at: row.get(6)?,
    })
}

use anyhow::Result;
use rusqlite::{Connection, Row};

use super::OptionalExt;
use crate::models::StoreRow;
use crate::{Database, now};

const STORE_COLUMNS: &str = "id, name, owner_user_id, created_at, updated_at";

impl Database {
    pub fn create_store(&self, id: &str, name: &str, owner_user_id: &str) -> Result<StoreRow> {
        self.with_conn(|conn| {
            let ts = now();
            conn.execute(
                "INSERT INTO stores (id, name, owner_user_id, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?4)",
                (id, name, owner_user_id, &ts),
            )?;
            Ok(StoreRow {
                id: id.to_string(),
                name: name.to_string(),
                owner_user_id: owner_user_id.to_string(),
                created_at: ts.clone(),
                updated_at: ts,
            })
        })
    }

    pub fn get_store(&self, id: &str) -> Result<Option<StoreRow>> {
        self.with_conn(|conn| {
            conn.query_row(
                &format!("SELECT {} FROM stores WHERE id = ?1", STORE_COLUMNS),
                [id],
                map_store,
            )
            .optional()
        })
    }

    /// The ownership check: the store with this id, if `owner_user_id` owns it.
    pub fn find_owned_store(&self, id: &str, owner_user_id: &str) -> Result<Option<StoreRow>> {
        self.with_conn(|conn| query_owned_store(conn, id, owner_user_id))
    }

    pub fn list_stores_by_owner(&self, owner_user_id: &str) -> Result<Vec<StoreRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {} FROM stores WHERE owner_user_id = ?1 ORDER BY created_at ASC, rowid ASC",
                STORE_COLUMNS
            ))?;
            let rows = stmt
                .query_map([owner_user_id], map_store)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Renames the store if `owner_user_id` owns it; returns the updated row.
    pub fn rename_store(
        &self,
        id: &str,
        owner_user_id: &str,
        name: &str,
    ) -> Result<Option<StoreRow>> {
        self.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE stores SET name = ?1, updated_at = ?2 WHERE id = ?3 AND owner_user_id = ?4",
                (name, now(), id, owner_user_id),
            )?;
            if changed == 0 {
                return Ok(None);
            }
            query_owned_store(conn, id, owner_user_id)
        })
    }

    /// Deletes the store and, through the foreign keys, its billboards and
    /// categories in one statement.
    pub fn delete_store(&self, id: &str, owner_user_id: &str) -> Result<usize> {
        self.with_conn(|conn| {
            let deleted = conn.execute(
                "DELETE FROM stores WHERE id = ?1 AND owner_user_id = ?2",
                (id, owner_user_id),
            )?;
            Ok(deleted)
        })
    }
}

fn query_owned_store(conn: &Connection, id: &str, owner_user_id: &str) -> Result<Option<StoreRow>> {
    conn.query_row(
        &format!(
            "SELECT {} FROM stores WHERE id = ?1 AND owner_user_id = ?2",
            STORE_COLUMNS
        ),
        [id, owner_user_id],
        map_store,
    )
    .optional()
}

fn map_store(row: &Row<'_>) -> rusqlite::Result<StoreRow> {
    Ok(StoreRow {
        id: row.get(0)?,
        name: row.get(1)?,
        owner_user_id: row.get(2)?,
        created_at: row.get(3)?,
        updated_at: row.get(4)?,
    })
}

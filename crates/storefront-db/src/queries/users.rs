use anyhow::Result;
use rusqlite::Connection;

use super::OptionalExt;
use crate::models::UserRow;
use crate::{Database, now};

impl Database {
    /// Returns `None` when the email is already registered.
    pub fn create_user(
        &self,
        id: &str,
        email: &str,
        name: &str,
        password_hash: &str,
        is_admin: bool,
    ) -> Result<Option<UserRow>> {
        self.with_conn(|conn| {
            let created_at = now();
            let inserted = conn.execute(
                "INSERT INTO users (id, email, name, password, is_admin, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                rusqlite::params![id, email, name, password_hash, is_admin, created_at],
            );
            match inserted {
                Ok(_) => {}
                Err(rusqlite::Error::SqliteFailure(e, _))
                    if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE =>
                {
                    return Ok(None);
                }
                Err(e) => return Err(e.into()),
            }
            Ok(Some(UserRow {
                id: id.to_string(),
                email: email.to_string(),
                name: name.to_string(),
                password: password_hash.to_string(),
                is_admin,
                created_at,
            }))
        })
    }

    /// Email lookups are case-insensitive.
    pub fn get_user_by_email(&self, email: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "email", email))
    }

    pub fn get_user_by_id(&self, id: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "id", id))
    }
}

fn query_user(conn: &Connection, column: &str, value: &str) -> Result<Option<UserRow>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT id, email, name, password, is_admin, created_at FROM users WHERE {} = ?1",
        column
    ))?;

    let row = stmt
        .query_row([value], |row| {
            Ok(UserRow {
                id: row.get(0)?,
                email: row.get(1)?,
                name: row.get(2)?,
                password: row.get(3)?,
                is_admin: row.get(4)?,
                created_at: row.get(5)?,
            })
        })
        .optional()?;

    Ok(row)
}

/// Ids of every admin account, for fan-out notifications.
pub(super) fn admin_ids(conn: &Connection) -> Result<Vec<String>> {
    let mut stmt = conn.prepare("SELECT id FROM users WHERE is_admin = 1")?;
    let ids = stmt
        .query_map([], |row| row.get(0))?
        .collect::<std::result::Result<Vec<String>, _>>()?;
    Ok(ids)
}

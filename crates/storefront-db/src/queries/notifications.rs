use anyhow::Result;
use rusqlite::Connection;

use crate::models::NotificationRow;
use crate::{Database, now};

impl Database {
    /// The user's notifications, newest first.
    pub fn list_notifications(&self, user_id: &str) -> Result<Vec<NotificationRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, user_id, message, status, created_at FROM notifications
                 WHERE user_id = ?1 ORDER BY created_at DESC, rowid DESC",
            )?;
            let rows = stmt
                .query_map([user_id], |row| {
                    Ok(NotificationRow {
                        id: row.get(0)?,
                        user_id: row.get(1)?,
                        message: row.get(2)?,
                        status: row.get(3)?,
                        created_at: row.get(4)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Marks every unread notification of the user as read.
    pub fn mark_notifications_read(&self, user_id: &str) -> Result<usize> {
        self.with_conn(|conn| {
            Ok(conn.execute(
                "UPDATE notifications SET status = 'read' WHERE user_id = ?1 AND status = 'unread'",
                [user_id],
            )?)
        })
    }
}

pub(super) fn insert_notification(conn: &Connection, id: &str, user_id: &str, message: &str) -> Result<()> {
    conn.execute(
        "INSERT INTO notifications (id, user_id, message, status, created_at) VALUES (?1, ?2, ?3, 'unread', ?4)",
        (id, user_id, message, now()),
    )?;
    Ok(())
}

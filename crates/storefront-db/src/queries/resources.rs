//! Generic queries over the descriptor-driven, store-scoped resource tables.
//!
//! Every statement filters by `store_id` as well as `id`, so a record can
//! only be read or mutated through the store it belongs to.

use anyhow::{Result, anyhow};
use rusqlite::{Connection, Row, params_from_iter};
use storefront_types::resources::ResourceDescriptor;

use super::{OptionalExt, placeholders};
use crate::models::{Outcome, ResourceRow};
use crate::{Database, now};

impl Database {
    /// Inserts a record. `values` must be aligned with `desc.fields`.
    pub fn insert_resource(
        &self,
        desc: &'static ResourceDescriptor,
        id: &str,
        store_id: &str,
        values: &[String],
    ) -> Result<Outcome<ResourceRow>> {
        check_arity(desc, values)?;
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            if let Some(key) = missing_reference(&tx, desc, store_id, values)? {
                return Ok(Outcome::MissingReference(key));
            }

            let ts = now();
            let columns: Vec<&str> = desc.columns().collect();
            let sql = format!(
                "INSERT INTO {} (id, store_id, created_at, updated_at, {}) VALUES (?1, ?2, ?3, ?3, {})",
                desc.table,
                columns.join(", "),
                placeholders(4, values.len()).join(", ")
            );
            let params = [id, store_id, ts.as_str()]
                .into_iter()
                .chain(values.iter().map(String::as_str));
            tx.execute(&sql, params_from_iter(params))?;
            tx.commit()?;

            Ok(Outcome::Done(ResourceRow {
                id: id.to_string(),
                store_id: store_id.to_string(),
                values: values.to_vec(),
                created_at: ts.clone(),
                updated_at: ts,
            }))
        })
    }

    /// All records of one store, newest first.
    pub fn list_resources(
        &self,
        desc: &'static ResourceDescriptor,
        store_id: &str,
    ) -> Result<Vec<ResourceRow>> {
        self.with_conn(|conn| {
            let sql = format!(
                "{} WHERE store_id = ?1 ORDER BY created_at DESC, rowid DESC",
                select_sql(desc)
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map([store_id], |row| map_resource(desc, row))?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn get_resource(
        &self,
        desc: &'static ResourceDescriptor,
        store_id: &str,
        id: &str,
    ) -> Result<Option<ResourceRow>> {
        self.with_conn(|conn| {
            let sql = format!("{} WHERE id = ?1 AND store_id = ?2", select_sql(desc));
            conn.query_row(&sql, [id, store_id], |row| map_resource(desc, row))
                .optional()
        })
    }

    /// Overwrites every field of the record. Returns the number of rows
    /// changed, which is zero when the record is not in this store.
    pub fn update_resource(
        &self,
        desc: &'static ResourceDescriptor,
        store_id: &str,
        id: &str,
        values: &[String],
    ) -> Result<Outcome<usize>> {
        check_arity(desc, values)?;
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            if let Some(key) = missing_reference(&tx, desc, store_id, values)? {
                return Ok(Outcome::MissingReference(key));
            }

            let assignments: Vec<String> = desc
                .columns()
                .zip(placeholders(4, values.len()))
                .map(|(column, p)| format!("{} = {}", column, p))
                .collect();
            let sql = format!(
                "UPDATE {} SET updated_at = ?3, {} WHERE id = ?1 AND store_id = ?2",
                desc.table,
                assignments.join(", ")
            );
            let ts = now();
            let params = [id, store_id, ts.as_str()]
                .into_iter()
                .chain(values.iter().map(String::as_str));
            let changed = tx.execute(&sql, params_from_iter(params))?;
            tx.commit()?;

            Ok(Outcome::Done(changed))
        })
    }

    /// Deletes the record unless dependents still point at it. Deleting a
    /// record that is not in this store (or no longer exists) is a no-op that
    /// reports zero rows.
    pub fn delete_resource(
        &self,
        desc: &'static ResourceDescriptor,
        store_id: &str,
        id: &str,
    ) -> Result<Outcome<usize>> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            if !exists_in_store(&tx, desc, store_id, id)? {
                return Ok(Outcome::Done(0));
            }

            for dependent in desc.dependents {
                let in_use: bool = tx.query_row(
                    &format!(
                        "SELECT EXISTS(SELECT 1 FROM {} WHERE {} = ?1)",
                        dependent.table, dependent.column
                    ),
                    [id],
                    |row| row.get(0),
                )?;
                if in_use {
                    return Ok(Outcome::InUse(dependent.display));
                }
            }

            let deleted = tx.execute(
                &format!("DELETE FROM {} WHERE id = ?1 AND store_id = ?2", desc.table),
                [id, store_id],
            )?;
            tx.commit()?;

            Ok(Outcome::Done(deleted))
        })
    }
}

fn check_arity(desc: &ResourceDescriptor, values: &[String]) -> Result<()> {
    if values.len() != desc.fields.len() {
        return Err(anyhow!(
            "{} expects {} values, got {}",
            desc.name,
            desc.fields.len(),
            values.len()
        ));
    }
    Ok(())
}

fn select_sql(desc: &ResourceDescriptor) -> String {
    let columns: Vec<&str> = desc.columns().collect();
    format!(
        "SELECT id, store_id, created_at, updated_at, {} FROM {}",
        columns.join(", "),
        desc.table
    )
}

fn map_resource(desc: &ResourceDescriptor, row: &Row<'_>) -> rusqlite::Result<ResourceRow> {
    let values = (0..desc.fields.len())
        .map(|i| row.get(4 + i))
        .collect::<rusqlite::Result<Vec<String>>>()?;
    Ok(ResourceRow {
        id: row.get(0)?,
        store_id: row.get(1)?,
        created_at: row.get(2)?,
        updated_at: row.get(3)?,
        values,
    })
}

fn exists_in_store(
    conn: &Connection,
    desc: &ResourceDescriptor,
    store_id: &str,
    id: &str,
) -> Result<bool> {
    let exists = conn.query_row(
        &format!(
            "SELECT EXISTS(SELECT 1 FROM {} WHERE id = ?1 AND store_id = ?2)",
            desc.table
        ),
        [id, store_id],
        |row| row.get(0),
    )?;
    Ok(exists)
}

/// The key of the first reference field whose value names no record of the
/// target resource in the same store.
fn missing_reference(
    conn: &Connection,
    desc: &'static ResourceDescriptor,
    store_id: &str,
    values: &[String],
) -> Result<Option<&'static str>> {
    for reference in desc.references {
        let value = desc
            .fields
            .iter()
            .position(|f| f.key == reference.key)
            .and_then(|idx| values.get(idx))
            .ok_or_else(|| anyhow!("{} has no field {}", desc.name, reference.key))?;
        if !exists_in_store(conn, reference.target, store_id, value)? {
            return Ok(Some(reference.key));
        }
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use storefront_types::resources::{BILLBOARDS, CATEGORIES};

    use crate::Database;
    use crate::models::Outcome;

    fn seeded() -> Database {
        let db = Database::open_in_memory().unwrap();
        db.create_store("s1", "Shoes", "alice").unwrap();
        db.create_store("s2", "Hats", "bob").unwrap();
        db
    }

    fn billboard(db: &Database, store: &str, id: &str) {
        let values = vec!["Summer Sale".to_string(), "https://x/y.png".to_string()];
        let outcome = db.insert_resource(&BILLBOARDS, id, store, &values).unwrap();
        assert!(matches!(outcome, Outcome::Done(_)));
    }

    #[test]
    fn list_and_get_stay_inside_the_store() {
        let db = seeded();
        billboard(&db, "s1", "b1");
        billboard(&db, "s2", "b2");

        let listed = db.list_resources(&BILLBOARDS, "s1").unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, "b1");
        assert_eq!(listed[0].values[0], "Summer Sale");

        assert!(db.get_resource(&BILLBOARDS, "s1", "b2").unwrap().is_none());
        assert!(db.get_resource(&BILLBOARDS, "s2", "b2").unwrap().is_some());
    }

    #[test]
    fn update_ignores_records_of_other_stores() {
        let db = seeded();
        billboard(&db, "s2", "b2");

        let values = vec!["Hijacked".to_string(), "https://evil/x.png".to_string()];
        let outcome = db.update_resource(&BILLBOARDS, "s1", "b2", &values).unwrap();
        assert_eq!(outcome, Outcome::Done(0));

        let untouched = db.get_resource(&BILLBOARDS, "s2", "b2").unwrap().unwrap();
        assert_eq!(untouched.values[0], "Summer Sale");
    }

    #[test]
    fn delete_is_idempotent() {
        let db = seeded();
        billboard(&db, "s1", "b1");

        assert_eq!(db.delete_resource(&BILLBOARDS, "s1", "b1").unwrap(), Outcome::Done(1));
        assert_eq!(db.delete_resource(&BILLBOARDS, "s1", "b1").unwrap(), Outcome::Done(0));
    }

    #[test]
    fn category_must_reference_billboard_of_same_store() {
        let db = seeded();
        billboard(&db, "s2", "b2");

        let values = vec!["Sneakers".to_string(), "b2".to_string()];
        let outcome = db.insert_resource(&CATEGORIES, "c1", "s1", &values).unwrap();
        assert!(matches!(outcome, Outcome::MissingReference("billboardId")));
        assert!(db.list_resources(&CATEGORIES, "s1").unwrap().is_empty());
    }

    #[test]
    fn billboard_in_use_cannot_be_deleted() {
        let db = seeded();
        billboard(&db, "s1", "b1");
        let values = vec!["Sneakers".to_string(), "b1".to_string()];
        db.insert_resource(&CATEGORIES, "c1", "s1", &values).unwrap();

        let outcome = db.delete_resource(&BILLBOARDS, "s1", "b1").unwrap();
        assert_eq!(outcome, Outcome::InUse("categories"));
        assert!(db.get_resource(&BILLBOARDS, "s1", "b1").unwrap().is_some());

        assert_eq!(db.delete_resource(&CATEGORIES, "s1", "c1").unwrap(), Outcome::Done(1));
        assert_eq!(db.delete_resource(&BILLBOARDS, "s1", "b1").unwrap(), Outcome::Done(1));
    }

    #[test]
    fn deleting_a_store_cascades() {
        let db = seeded();
        billboard(&db, "s1", "b1");
        let values = vec!["Sneakers".to_string(), "b1".to_string()];
        db.insert_resource(&CATEGORIES, "c1", "s1", &values).unwrap();

        assert_eq!(db.delete_store("s1", "alice").unwrap(), 1);
        assert!(db.list_resources(&BILLBOARDS, "s1").unwrap().is_empty());
        assert!(db.list_resources(&CATEGORIES, "s1").unwrap().is_empty());
    }

    #[test]
    fn wrong_value_count_is_an_error() {
        let db = seeded();
        let values = vec!["only one".to_string()];
        assert!(db.insert_resource(&BILLBOARDS, "b1", "s1", &values).is_err());
    }
}

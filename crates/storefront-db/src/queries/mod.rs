mod cart;
mod notifications;
mod orders;
mod products;
mod resources;
mod stores;
mod users;

use anyhow::Result;
use rust_decimal::Decimal;
use rusqlite::types::Type;

/// Extension trait for optional query results
trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>>;
}

impl<T> OptionalExt<T> for std::result::Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

/// Read a decimal stored as TEXT.
fn decimal_column(row: &rusqlite::Row<'_>, idx: usize) -> rusqlite::Result<Decimal> {
    let raw: String = row.get(idx)?;
    raw.parse::<Decimal>()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

/// Read a non-negative count stored as INTEGER.
fn count_column(row: &rusqlite::Row<'_>, idx: usize) -> rusqlite::Result<u32> {
    let raw: i64 = row.get(idx)?;
    u32::try_from(raw)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Integer, Box::new(e)))
}

/// `?start, ?start+1, ...` for `count` positional parameters.
fn placeholders(start: usize, count: usize) -> Vec<String> {
    (start..start + count).map(|i| format!("?{}", i)).collect()
}

//! Repository layer: entity-scoped database operations.

mod medication;
mod patient;
mod vital_sign;

use chrono::NaiveDateTime;
use uuid::Uuid;

pub use medication::*;
pub use patient::*;
pub use vital_sign::*;

/// Timestamps are stored as fixed-width text so lexical order matches time order.
pub(crate) const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";
const TIMESTAMP_PARSE_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

pub(crate) fn format_timestamp(ts: &NaiveDateTime) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

pub(crate) fn parse_timestamp(idx: usize, raw: &str) -> Result<NaiveDateTime, rusqlite::Error> {
    NaiveDateTime::parse_from_str(raw, TIMESTAMP_PARSE_FORMAT).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}

pub(crate) fn parse_uuid(idx: usize, raw: &str) -> Result<Uuid, rusqlite::Error> {
    Uuid::parse_str(raw).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}

/// Read a non-negative integer column. Negative or oversized values read as 0.
pub(crate) fn read_count(row: &rusqlite::Row, idx: usize) -> Result<u32, rusqlite::Error> {
    let raw: i64 = row.get(idx)?;
    Ok(u32::try_from(raw).unwrap_or(0))
}

/// Start of the current UTC day, used for "today" dashboard queries.
pub fn start_of_today() -> NaiveDateTime {
    chrono::Utc::now()
        .date_naive()
        .and_hms_opt(0, 0, 0)
        .unwrap_or_default()
}

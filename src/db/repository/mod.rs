//! Repository layer: entity-scoped database operations.
//!
//! Free functions over a borrowed `Connection`; callers own transactions.

mod admin;
mod appointment;
mod doctor;
mod patient;
mod prescription;

use chrono::{NaiveDateTime, NaiveTime};
use rusqlite::types::Type;
use rusqlite::Row;

pub use admin::*;
pub use appointment::*;
pub use doctor::*;
pub use patient::*;
pub use prescription::*;

/// Stored datetime layout. Lexicographic order matches chronological order.
pub(crate) const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
pub(crate) const TIME_FORMAT: &str = "%H:%M:%S";

pub(crate) fn format_datetime(value: NaiveDateTime) -> String {
    value.format(DATETIME_FORMAT).to_string()
}

pub(crate) fn format_time(value: NaiveTime) -> String {
    value.format(TIME_FORMAT).to_string()
}

pub(crate) fn datetime_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<NaiveDateTime> {
    let raw: String = row.get(idx)?;
    NaiveDateTime::parse_from_str(&raw, DATETIME_FORMAT)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

pub(crate) fn time_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<NaiveTime> {
    let raw: String = row.get(idx)?;
    NaiveTime::parse_from_str(&raw, TIME_FORMAT)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

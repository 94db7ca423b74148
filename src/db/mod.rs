pub mod sqlite;

pub use sqlite::*;

use chrono::{NaiveDate, NaiveDateTime};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Entity not found: {entity_type} with id {id}")]
    NotFound { entity_type: String, id: String },

    #[error("Invalid enum value for {field}: {value}")]
    InvalidEnum { field: String, value: String },

    #[error("Migration failed at version {version}: {reason}")]
    MigrationFailed { version: i64, reason: String },

    #[error("Constraint violated: {0}")]
    ConstraintViolation(String),
}

// ---------------------------------------------------------------------------
// Storage formats
// ---------------------------------------------------------------------------
// Dates and timestamps are stored as TEXT in these formats so that
// lexicographic comparison matches chronological order and range filters
// can compare strings directly (same convention as SQLite's datetime('now')).

pub const DATE_FMT: &str = "%Y-%m-%d";
pub const DATETIME_FMT: &str = "%Y-%m-%d %H:%M:%S";

pub fn fmt_date(date: NaiveDate) -> String {
    date.format(DATE_FMT).to_string()
}

pub fn fmt_datetime(dt: NaiveDateTime) -> String {
    dt.format(DATETIME_FMT).to_string()
}

pub fn parse_date(s: &str) -> Result<NaiveDate, DatabaseError> {
    NaiveDate::parse_from_str(s, DATE_FMT)
        .map_err(|_| DatabaseError::ConstraintViolation(format!("invalid date: {s}")))
}

pub fn parse_datetime(s: &str) -> Result<NaiveDateTime, DatabaseError> {
    NaiveDateTime::parse_from_str(s, DATETIME_FMT)
        .map_err(|_| DatabaseError::ConstraintViolation(format!("invalid timestamp: {s}")))
}

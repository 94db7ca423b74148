//! Manual notifications — operator-authored ad hoc notices.
//!
//! Created from a small form (title, message, display date + time, optional
//! phone) and listed by the notification center once due. Unlike reminders
//! they are not tied to a patient row; the optional phone is an opaque
//! string used only for the outbound message link.

use std::sync::OnceLock;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use regex::Regex;
use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::db::{self, DatabaseError};

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

pub const MIN_TITLE_CHARS: usize = 3;
pub const MIN_MESSAGE_CHARS: usize = 5;

/// 24-hour `HH:MM`, leading zero optional on the hour.
const TIME_PATTERN: &str = r"^([0-1]?[0-9]|2[0-3]):[0-5][0-9]$";

/// A persisted manual notification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManualNotification {
    pub id: String,
    pub title: String,
    pub message: String,
    /// Timestamp at which the notification becomes visible.
    pub notify_at: String,
    pub phone: Option<String>,
    pub sent: bool,
    pub created_at: String,
}

/// Form input for creating a manual notification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewManualNotification {
    pub title: String,
    pub message: String,
    /// Calendar date the notification should appear on.
    pub display_date: NaiveDate,
    /// `HH:MM`, 24-hour.
    pub display_time: String,
    pub phone: Option<String>,
}

/// Form-boundary validation failures. No row is created when any of these
/// fire.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("title must have at least {MIN_TITLE_CHARS} characters")]
    TitleTooShort,
    #[error("message must have at least {MIN_MESSAGE_CHARS} characters")]
    MessageTooShort,
    #[error("invalid display time: {0}")]
    InvalidTime(String),
    #[error("notification time must be in the future")]
    NotInFuture,
}

#[derive(Debug, Error)]
pub enum ManualError {
    #[error(transparent)]
    Invalid(#[from] ValidationError),
    #[error(transparent)]
    Database(#[from] DatabaseError),
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn time_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(TIME_PATTERN).expect("valid time pattern"))
}

/// Validates the form and resolves the combined `notify_at` instant.
pub fn validate(
    new: &NewManualNotification,
    now: NaiveDateTime,
) -> Result<NaiveDateTime, ValidationError> {
    if new.title.trim().chars().count() < MIN_TITLE_CHARS {
        return Err(ValidationError::TitleTooShort);
    }
    if new.message.trim().chars().count() < MIN_MESSAGE_CHARS {
        return Err(ValidationError::MessageTooShort);
    }
    if !time_regex().is_match(&new.display_time) {
        return Err(ValidationError::InvalidTime(new.display_time.clone()));
    }

    let time = NaiveTime::parse_from_str(&new.display_time, "%H:%M")
        .map_err(|_| ValidationError::InvalidTime(new.display_time.clone()))?;
    let notify_at = new.display_date.and_time(time);
    if notify_at <= now {
        return Err(ValidationError::NotInFuture);
    }
    Ok(notify_at)
}

// ---------------------------------------------------------------------------
// Repository functions
// ---------------------------------------------------------------------------

fn map_manual(row: &rusqlite::Row<'_>) -> rusqlite::Result<ManualNotification> {
    Ok(ManualNotification {
        id: row.get(0)?,
        title: row.get(1)?,
        message: row.get(2)?,
        notify_at: row.get(3)?,
        phone: row.get(4)?,
        sent: row.get(5)?,
        created_at: row.get(6)?,
    })
}

const MANUAL_COLUMNS: &str = "id, title, message, notify_at, phone, sent, created_at";

/// Validates and inserts a manual notification.
pub fn create_manual_notification(
    conn: &Connection,
    new: &NewManualNotification,
    now: NaiveDateTime,
) -> Result<ManualNotification, ManualError> {
    let notify_at = validate(new, now)?;

    let id = Uuid::new_v4().to_string();
    conn.execute(
        "INSERT INTO manual_notifications (id, title, message, notify_at, phone)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            id,
            new.title.trim(),
            new.message.trim(),
            db::fmt_datetime(notify_at),
            new.phone,
        ],
    )
    .map_err(DatabaseError::from)?;

    let stored = conn
        .query_row(
            &format!("SELECT {MANUAL_COLUMNS} FROM manual_notifications WHERE id = ?1"),
            params![id],
            map_manual,
        )
        .map_err(DatabaseError::from)?;
    Ok(stored)
}

/// Unsent manual notifications whose `notify_at` has passed, soonest first.
/// This is the notification center's manual source.
pub fn due_manual_notifications(
    conn: &Connection,
    now: NaiveDateTime,
) -> Result<Vec<ManualNotification>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {MANUAL_COLUMNS} FROM manual_notifications
         WHERE sent = 0 AND notify_at <= ?1
         ORDER BY notify_at ASC",
    ))?;
    let rows = stmt.query_map(params![db::fmt_datetime(now)], map_manual)?;
    rows.collect::<Result<Vec<_>, _>>().map_err(DatabaseError::from)
}

/// All manual notifications, newest first — the management listing.
pub fn list_manual_notifications(
    conn: &Connection,
) -> Result<Vec<ManualNotification>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {MANUAL_COLUMNS} FROM manual_notifications ORDER BY notify_at DESC",
    ))?;
    let rows = stmt.query_map([], map_manual)?;
    rows.collect::<Result<Vec<_>, _>>().map_err(DatabaseError::from)
}

/// Marks a manual notification as sent (dismissal).
pub fn mark_manual_sent(conn: &Connection, id: &str) -> Result<(), DatabaseError> {
    let changed = conn.execute(
        "UPDATE manual_notifications SET sent = 1 WHERE id = ?1",
        params![id],
    )?;
    if changed == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "ManualNotification".into(),
            id: id.into(),
        });
    }
    Ok(())
}

/// Hard-deletes a manual notification.
pub fn delete_manual_notification(conn: &Connection, id: &str) -> Result<(), DatabaseError> {
    let changed = conn.execute(
        "DELETE FROM manual_notifications WHERE id = ?1",
        params![id],
    )?;
    if changed == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "ManualNotification".into(),
            id: id.into(),
        });
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

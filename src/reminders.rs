//! Return-visit reminders — types and lifecycle operations.
//!
//! A reminder is a scheduled follow-up contact for one patient: a target
//! calendar date for the return visit plus a `notify_at` timestamp at which
//! it becomes actionable in the notification center. Reminders are only
//! ever mutated through the `sent` flag (set on dismissal) or deleted.

use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::db::{self, DatabaseError};

// ─── Types ────────────────────────────────────────────────────────────────────

/// Reminder kind. Only `return` reminders are ever created; the `birthday`
/// kind exists in the schema for completeness but birthday notifications
/// are computed, never persisted (see `birthdays`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReminderKind {
    Return,
    Birthday,
}

impl ReminderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Return => "return",
            Self::Birthday => "birthday",
        }
    }

    pub fn parse(value: &str) -> Result<Self, DatabaseError> {
        match value {
            "return" => Ok(Self::Return),
            "birthday" => Ok(Self::Birthday),
            other => Err(DatabaseError::InvalidEnum {
                field: "reminders.kind".into(),
                value: other.into(),
            }),
        }
    }
}

/// A persisted reminder row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reminder {
    pub id: String,
    pub patient_id: String,
    // `kind` is the notification center's discriminator tag; this field
    // keeps its own name on the wire.
    #[serde(rename = "reminder_kind")]
    pub kind: ReminderKind,
    /// Calendar date of the return visit, `YYYY-MM-DD`.
    pub target_date: String,
    /// Timestamp at which the reminder becomes actionable.
    pub notify_at: String,
    /// Optional message template with `{{nome}}`/`{{data}}` placeholders.
    pub message_template: Option<String>,
    pub sent: bool,
    pub created_at: String,
    pub updated_at: Option<String>,
}

/// Errors from reminder lifecycle operations.
#[derive(Debug, Error)]
pub enum ReminderError {
    #[error("notify_at must be in the future")]
    NotifyAtNotInFuture,
    #[error(transparent)]
    Database(#[from] DatabaseError),
}

// ─── Repository functions ─────────────────────────────────────────────────────

fn map_reminder(row: &rusqlite::Row<'_>) -> rusqlite::Result<Reminder> {
    let kind_raw: String = row.get(2)?;
    let kind = ReminderKind::parse(&kind_raw).map_err(|_| {
        rusqlite::Error::FromSqlConversionFailure(
            2,
            rusqlite::types::Type::Text,
            format!("unknown reminder kind: {kind_raw}").into(),
        )
    })?;
    Ok(Reminder {
        id: row.get(0)?,
        patient_id: row.get(1)?,
        kind,
        target_date: row.get(3)?,
        notify_at: row.get(4)?,
        message_template: row.get(5)?,
        sent: row.get(6)?,
        created_at: row.get(7)?,
        updated_at: row.get(8)?,
    })
}

const REMINDER_COLUMNS: &str = "id, patient_id, kind, target_date, notify_at, \
     message_template, sent, created_at, updated_at";

/// Creates a return-visit reminder for a patient.
///
/// `target` is truncated to calendar-date granularity; `notify_at` keeps
/// full timestamp precision. A `notify_at` that is not strictly after `now`
/// is rejected before anything touches the database.
pub fn create_return_reminder(
    conn: &Connection,
    patient_id: &str,
    target: NaiveDateTime,
    notify_at: NaiveDateTime,
    message_template: Option<&str>,
    now: NaiveDateTime,
) -> Result<Reminder, ReminderError> {
    if notify_at <= now {
        return Err(ReminderError::NotifyAtNotInFuture);
    }

    let id = Uuid::new_v4().to_string();
    conn.execute(
        "INSERT INTO reminders (id, patient_id, kind, target_date, notify_at, message_template)
         VALUES (?1, ?2, 'return', ?3, ?4, ?5)",
        params![
            id,
            patient_id,
            db::fmt_date(target.date()),
            db::fmt_datetime(notify_at),
            message_template,
        ],
    )
    .map_err(DatabaseError::from)?;

    get_reminder(conn, &id).map_err(ReminderError::from)
}

/// Fetches one reminder by id.
pub fn get_reminder(conn: &Connection, id: &str) -> Result<Reminder, DatabaseError> {
    conn.query_row(
        &format!("SELECT {REMINDER_COLUMNS} FROM reminders WHERE id = ?1"),
        params![id],
        map_reminder,
    )
    .map_err(|e| match e {
        rusqlite::Error::QueryReturnedNoRows => DatabaseError::NotFound {
            entity_type: "Reminder".into(),
            id: id.into(),
        },
        other => DatabaseError::from(other),
    })
}

/// All reminders for a patient, most recent target date first.
pub fn get_patient_reminders(
    conn: &Connection,
    patient_id: &str,
) -> Result<Vec<Reminder>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {REMINDER_COLUMNS} FROM reminders
         WHERE patient_id = ?1
         ORDER BY target_date DESC",
    ))?;
    let rows = stmt.query_map(params![patient_id], map_reminder)?;
    rows.collect::<Result<Vec<_>, _>>().map_err(DatabaseError::from)
}

/// Unsent reminders whose `notify_at` has passed, soonest first.
/// This is the notification center's reminder source.
pub fn due_reminders(
    conn: &Connection,
    now: NaiveDateTime,
) -> Result<Vec<Reminder>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {REMINDER_COLUMNS} FROM reminders
         WHERE sent = 0 AND notify_at <= ?1
         ORDER BY notify_at ASC",
    ))?;
    let rows = stmt.query_map(params![db::fmt_datetime(now)], map_reminder)?;
    rows.collect::<Result<Vec<_>, _>>().map_err(DatabaseError::from)
}

/// Splits a patient's reminders into upcoming and past.
///
/// Upcoming: target date today or later and not yet sent. Everything else
/// (past target date, or already dismissed) is history.
pub fn partition_reminders(
    reminders: Vec<Reminder>,
    today: NaiveDate,
) -> (Vec<Reminder>, Vec<Reminder>) {
    let today = db::fmt_date(today);
    reminders
        .into_iter()
        .partition(|r| r.target_date >= today && !r.sent)
}

/// Marks a reminder as sent (dismissal).
pub fn mark_reminder_sent(conn: &Connection, id: &str) -> Result<(), DatabaseError> {
    let changed = conn.execute(
        "UPDATE reminders SET sent = 1, updated_at = datetime('now') WHERE id = ?1",
        params![id],
    )?;
    if changed == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "Reminder".into(),
            id: id.into(),
        });
    }
    Ok(())
}

/// Hard-deletes a reminder.
pub fn delete_reminder(conn: &Connection, id: &str) -> Result<(), DatabaseError> {
    let changed = conn.execute("DELETE FROM reminders WHERE id = ?1", params![id])?;
    if changed == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "Reminder".into(),
            id: id.into(),
        });
    }
    Ok(())
}

// ─── Tests ────────────────────────────────────────────────────────────────────

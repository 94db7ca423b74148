//! Appointment scheduling for the practice agenda.
//!
//! Appointments are plain rows tied to a patient; the status lifecycle is
//! `scheduled → completed` or `scheduled → cancelled`, with no way back.

use chrono::NaiveDateTime;
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::db::{self, DatabaseError};

pub const DEFAULT_DURATION_MINUTES: i64 = 30;

// ─── Types ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AppointmentStatus {
    Scheduled,
    Completed,
    Cancelled,
}

impl AppointmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Scheduled => "scheduled",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }

    pub fn parse(value: &str) -> Result<Self, DatabaseError> {
        match value {
            "scheduled" => Ok(Self::Scheduled),
            "completed" => Ok(Self::Completed),
            "cancelled" => Ok(Self::Cancelled),
            other => Err(DatabaseError::InvalidEnum {
                field: "status".into(),
                value: other.into(),
            }),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Appointment {
    pub id: String,
    pub patient_id: String,
    /// Timestamp of the visit, `YYYY-MM-DD HH:MM:SS`.
    pub scheduled_at: String,
    pub duration_minutes: i64,
    pub status: AppointmentStatus,
    pub notes: Option<String>,
    pub created_at: String,
}

// ─── Repository functions ─────────────────────────────────────────────────────

fn map_appointment(row: &rusqlite::Row<'_>) -> rusqlite::Result<Appointment> {
    let status: String = row.get(4)?;
    let status = AppointmentStatus::parse(&status).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(4, rusqlite::types::Type::Text, Box::new(e))
    })?;
    Ok(Appointment {
        id: row.get(0)?,
        patient_id: row.get(1)?,
        scheduled_at: row.get(2)?,
        duration_minutes: row.get(3)?,
        status,
        notes: row.get(5)?,
        created_at: row.get(6)?,
    })
}

const APPOINTMENT_COLUMNS: &str =
    "id, patient_id, scheduled_at, duration_minutes, status, notes, created_at";

/// Books a visit for a patient. The slot must be in the future relative to
/// `now`; a past slot is rejected before anything is written.
pub fn schedule_appointment(
    conn: &Connection,
    patient_id: &str,
    at: NaiveDateTime,
    duration_minutes: Option<i64>,
    notes: Option<&str>,
    now: NaiveDateTime,
) -> Result<Appointment, DatabaseError> {
    if at <= now {
        return Err(DatabaseError::ConstraintViolation(
            "Appointment time must be in the future".into(),
        ));
    }

    let id = Uuid::new_v4().to_string();
    conn.execute(
        "INSERT INTO appointments (id, patient_id, scheduled_at, duration_minutes, notes)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            id,
            patient_id,
            db::fmt_datetime(at),
            duration_minutes.unwrap_or(DEFAULT_DURATION_MINUTES),
            notes
        ],
    )?;
    get_appointment(conn, &id)
}

pub fn get_appointment(conn: &Connection, id: &str) -> Result<Appointment, DatabaseError> {
    conn.query_row(
        &format!("SELECT {APPOINTMENT_COLUMNS} FROM appointments WHERE id = ?1"),
        params![id],
        map_appointment,
    )
    .optional()?
    .ok_or_else(|| DatabaseError::NotFound {
        entity_type: "Appointment".into(),
        id: id.into(),
    })
}

/// Future scheduled visits across all patients, soonest first.
pub fn list_upcoming(
    conn: &Connection,
    now: NaiveDateTime,
) -> Result<Vec<Appointment>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {APPOINTMENT_COLUMNS} FROM appointments
         WHERE status = 'scheduled' AND scheduled_at >= ?1
         ORDER BY scheduled_at ASC",
    ))?;
    let rows = stmt.query_map(params![db::fmt_datetime(now)], map_appointment)?;
    rows.collect::<Result<Vec<_>, _>>().map_err(DatabaseError::from)
}

/// Full appointment history for one patient, newest first.
pub fn list_for_patient(
    conn: &Connection,
    patient_id: &str,
) -> Result<Vec<Appointment>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {APPOINTMENT_COLUMNS} FROM appointments
         WHERE patient_id = ?1
         ORDER BY scheduled_at DESC",
    ))?;
    let rows = stmt.query_map(params![patient_id], map_appointment)?;
    rows.collect::<Result<Vec<_>, _>>().map_err(DatabaseError::from)
}

pub fn cancel_appointment(conn: &Connection, id: &str) -> Result<Appointment, DatabaseError> {
    transition(conn, id, AppointmentStatus::Cancelled)
}

pub fn complete_appointment(conn: &Connection, id: &str) -> Result<Appointment, DatabaseError> {
    transition(conn, id, AppointmentStatus::Completed)
}

/// Moves a `scheduled` appointment to a terminal status. A terminal row
/// stays as it is; re-transitioning it is a constraint violation, not a
/// silent overwrite.
fn transition(
    conn: &Connection,
    id: &str,
    to: AppointmentStatus,
) -> Result<Appointment, DatabaseError> {
    let current = get_appointment(conn, id)?;
    if current.status != AppointmentStatus::Scheduled {
        return Err(DatabaseError::ConstraintViolation(format!(
            "Cannot move appointment from '{}' to '{}'",
            current.status.as_str(),
            to.as_str()
        )));
    }
    conn.execute(
        "UPDATE appointments SET status = ?1 WHERE id = ?2",
        params![to.as_str(), id],
    )?;
    get_appointment(conn, id)
}

// ─── Tests ────────────────────────────────────────────────────────────────────

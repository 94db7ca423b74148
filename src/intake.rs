//! New-patient intake forms submitted from the public site.
//!
//! A submission stores the raw JSON payload verbatim plus a few
//! denormalized headline fields the admin list can show without parsing.
//! Lifecycle: `pending → reviewed` and `pending|reviewed → converted`;
//! conversion creates a real patient record from the form fields.

use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::db::DatabaseError;
use crate::patients::{self, NewPatient, Patient};

// ─── Types ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IntakeStatus {
    Pending,
    Reviewed,
    Converted,
}

impl IntakeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Reviewed => "reviewed",
            Self::Converted => "converted",
        }
    }

    pub fn parse(value: &str) -> Result<Self, DatabaseError> {
        match value {
            "pending" => Ok(Self::Pending),
            "reviewed" => Ok(Self::Reviewed),
            "converted" => Ok(Self::Converted),
            other => Err(DatabaseError::InvalidEnum {
                field: "status".into(),
                value: other.into(),
            }),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntakeForm {
    pub id: String,
    pub patient_name: String,
    pub guardian_name: Option<String>,
    pub birth_date: Option<String>,
    pub phone: Option<String>,
    /// The submission as received, untouched.
    pub payload: serde_json::Value,
    pub status: IntakeStatus,
    pub created_at: String,
    pub reviewed_at: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewIntakeForm {
    pub patient_name: String,
    pub guardian_name: Option<String>,
    pub birth_date: Option<String>,
    pub phone: Option<String>,
    pub payload: serde_json::Value,
}

// ─── Repository functions ─────────────────────────────────────────────────────

fn map_intake(row: &rusqlite::Row<'_>) -> rusqlite::Result<IntakeForm> {
    let status: String = row.get(6)?;
    let status = IntakeStatus::parse(&status).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(6, rusqlite::types::Type::Text, Box::new(e))
    })?;
    let payload: String = row.get(5)?;
    let payload = serde_json::from_str(&payload).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(5, rusqlite::types::Type::Text, Box::new(e))
    })?;
    Ok(IntakeForm {
        id: row.get(0)?,
        patient_name: row.get(1)?,
        guardian_name: row.get(2)?,
        birth_date: row.get(3)?,
        phone: row.get(4)?,
        payload,
        status,
        created_at: row.get(7)?,
        reviewed_at: row.get(8)?,
    })
}

const INTAKE_COLUMNS: &str = "id, patient_name, guardian_name, birth_date, phone, payload, \
                              status, created_at, reviewed_at";

/// Stores a submitted form with status `pending`.
pub fn submit_intake(conn: &Connection, new: &NewIntakeForm) -> Result<IntakeForm, DatabaseError> {
    let id = Uuid::new_v4().to_string();
    let payload = serde_json::to_string(&new.payload)
        .map_err(|e| DatabaseError::ConstraintViolation(format!("Invalid payload: {e}")))?;
    conn.execute(
        "INSERT INTO intake_forms (id, patient_name, guardian_name, birth_date, phone, payload)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            id,
            new.patient_name,
            new.guardian_name,
            new.birth_date,
            new.phone,
            payload
        ],
    )?;
    get_intake_form(conn, &id)
}

pub fn get_intake_form(conn: &Connection, id: &str) -> Result<IntakeForm, DatabaseError> {
    conn.query_row(
        &format!("SELECT {INTAKE_COLUMNS} FROM intake_forms WHERE id = ?1"),
        params![id],
        map_intake,
    )
    .optional()?
    .ok_or_else(|| DatabaseError::NotFound {
        entity_type: "IntakeForm".into(),
        id: id.into(),
    })
}

/// Lists forms newest first, optionally filtered by status.
pub fn list_intake_forms(
    conn: &Connection,
    status: Option<IntakeStatus>,
) -> Result<Vec<IntakeForm>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {INTAKE_COLUMNS} FROM intake_forms
         WHERE (?1 IS NULL OR status = ?1)
         ORDER BY created_at DESC, id DESC",
    ))?;
    let rows = stmt.query_map(params![status.map(|s| s.as_str())], map_intake)?;
    rows.collect::<Result<Vec<_>, _>>().map_err(DatabaseError::from)
}

/// Marks a pending form as seen by staff.
pub fn review_intake(conn: &Connection, id: &str) -> Result<IntakeForm, DatabaseError> {
    let form = get_intake_form(conn, id)?;
    if form.status != IntakeStatus::Pending {
        return Err(DatabaseError::ConstraintViolation(format!(
            "Only pending forms can be reviewed, form is '{}'",
            form.status.as_str()
        )));
    }
    conn.execute(
        "UPDATE intake_forms
         SET status = 'reviewed', reviewed_at = datetime('now')
         WHERE id = ?1",
        params![id],
    )?;
    get_intake_form(conn, id)
}

/// Creates a patient from the form's fields and marks the form converted.
///
/// Requires a birth date, since patient records do; a form without one must
/// be completed over the phone before conversion. Converting twice would
/// duplicate the patient, so a converted form is rejected.
pub fn convert_intake(conn: &Connection, id: &str) -> Result<Patient, DatabaseError> {
    let form = get_intake_form(conn, id)?;
    if form.status == IntakeStatus::Converted {
        return Err(DatabaseError::ConstraintViolation(
            "Form has already been converted".into(),
        ));
    }
    let Some(birth_date) = form.birth_date else {
        return Err(DatabaseError::ConstraintViolation(
            "Cannot convert a form without a birth date".into(),
        ));
    };

    let patient = patients::create_patient(
        conn,
        &NewPatient {
            name: form.patient_name,
            guardian_name: form.guardian_name,
            birth_date,
            phone: form.phone,
            email: None,
            notes: None,
        },
    )?;

    conn.execute(
        "UPDATE intake_forms
         SET status = 'converted', reviewed_at = COALESCE(reviewed_at, datetime('now'))
         WHERE id = ?1",
        params![id],
    )?;
    Ok(patient)
}

// ─── Tests ────────────────────────────────────────────────────────────────────

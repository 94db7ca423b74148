//! Patient records — types and repository functions.
//!
//! The patient roster drives everything else: reminders and appointments
//! reference it by id, and birthday notifications are derived from the
//! stored birth dates. All functions operate on the practice's SQLite
//! database via rusqlite.

use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::db::{self, DatabaseError};

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// A stored patient.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Patient {
    pub id: String,
    pub name: String,
    pub guardian_name: Option<String>,
    /// Calendar date, `YYYY-MM-DD`.
    pub birth_date: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub notes: Option<String>,
    pub created_at: String,
    pub updated_at: Option<String>,
}

/// Fields for creating or replacing a patient.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewPatient {
    pub name: String,
    pub guardian_name: Option<String>,
    pub birth_date: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub notes: Option<String>,
}

// ---------------------------------------------------------------------------
// Repository functions
// ---------------------------------------------------------------------------

fn map_patient(row: &rusqlite::Row<'_>) -> rusqlite::Result<Patient> {
    Ok(Patient {
        id: row.get(0)?,
        name: row.get(1)?,
        guardian_name: row.get(2)?,
        birth_date: row.get(3)?,
        phone: row.get(4)?,
        email: row.get(5)?,
        notes: row.get(6)?,
        created_at: row.get(7)?,
        updated_at: row.get(8)?,
    })
}

const PATIENT_COLUMNS: &str =
    "id, name, guardian_name, birth_date, phone, email, notes, created_at, updated_at";

/// Creates a patient and returns the stored row.
pub fn create_patient(conn: &Connection, new: &NewPatient) -> Result<Patient, DatabaseError> {
    // Birth date must be a real calendar date; birthday notifications
    // depend on it being parseable.
    db::parse_date(&new.birth_date)?;

    let id = Uuid::new_v4().to_string();
    conn.execute(
        "INSERT INTO patients (id, name, guardian_name, birth_date, phone, email, notes)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            id,
            new.name,
            new.guardian_name,
            new.birth_date,
            new.phone,
            new.email,
            new.notes
        ],
    )?;
    get_patient(conn, &id)
}

/// Fetches one patient by id.
pub fn get_patient(conn: &Connection, id: &str) -> Result<Patient, DatabaseError> {
    conn.query_row(
        &format!("SELECT {PATIENT_COLUMNS} FROM patients WHERE id = ?1"),
        params![id],
        map_patient,
    )
    .optional()?
    .ok_or_else(|| DatabaseError::NotFound {
        entity_type: "Patient".into(),
        id: id.into(),
    })
}

/// Lists patients ordered by name, optionally filtered by a name substring.
pub fn list_patients(
    conn: &Connection,
    search: Option<&str>,
) -> Result<Vec<Patient>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {PATIENT_COLUMNS} FROM patients
         WHERE (?1 IS NULL OR name LIKE '%' || ?1 || '%')
         ORDER BY name ASC",
    ))?;

    let rows = stmt.query_map(params![search], map_patient)?;
    rows.collect::<Result<Vec<_>, _>>().map_err(DatabaseError::from)
}

/// Replaces a patient's editable fields and stamps `updated_at`.
pub fn update_patient(
    conn: &Connection,
    id: &str,
    new: &NewPatient,
) -> Result<Patient, DatabaseError> {
    db::parse_date(&new.birth_date)?;

    let changed = conn.execute(
        "UPDATE patients
         SET name = ?1, guardian_name = ?2, birth_date = ?3, phone = ?4,
             email = ?5, notes = ?6, updated_at = datetime('now')
         WHERE id = ?7",
        params![
            new.name,
            new.guardian_name,
            new.birth_date,
            new.phone,
            new.email,
            new.notes,
            id
        ],
    )?;
    if changed == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "Patient".into(),
            id: id.into(),
        });
    }
    get_patient(conn, id)
}

/// Hard-deletes a patient. Reminders and appointments cascade.
pub fn delete_patient(conn: &Connection, id: &str) -> Result<(), DatabaseError> {
    let changed = conn.execute("DELETE FROM patients WHERE id = ?1", params![id])?;
    if changed == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "Patient".into(),
            id: id.into(),
        });
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

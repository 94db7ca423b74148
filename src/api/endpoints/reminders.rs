//! Return-reminder endpoints, including the rendered WhatsApp message.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Local;
use serde::{Deserialize, Serialize};

use crate::api::error::ApiError;
use crate::db;
use crate::messages;
use crate::patients;
use crate::reminders::{self, Reminder};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct NewReminderRequest {
    /// Return-visit date, `YYYY-MM-DD`.
    pub target_date: String,
    /// When the reminder should surface, `YYYY-MM-DD HH:MM:SS`.
    pub notify_at: String,
    pub message_template: Option<String>,
}

#[derive(Serialize)]
pub struct RemindersResponse {
    pub upcoming: Vec<Reminder>,
    pub past: Vec<Reminder>,
}

/// `GET /api/patients/:id/reminders` — the patient's reminders split into
/// upcoming and past relative to today.
pub async fn list_for_patient(
    State(state): State<Arc<AppState>>,
    Path(patient_id): Path<String>,
) -> Result<Json<RemindersResponse>, ApiError> {
    let conn = state.open_db()?;
    // Listing for an unknown patient is a 404, not an empty list.
    patients::get_patient(&conn, &patient_id)?;
    let all = reminders::get_patient_reminders(&conn, &patient_id)?;
    let (upcoming, past) = reminders::partition_reminders(all, Local::now().date_naive());
    Ok(Json(RemindersResponse { upcoming, past }))
}

/// `POST /api/patients/:id/reminders` — schedule a return reminder.
pub async fn create(
    State(state): State<Arc<AppState>>,
    Path(patient_id): Path<String>,
    Json(req): Json<NewReminderRequest>,
) -> Result<(StatusCode, Json<Reminder>), ApiError> {
    let conn = state.open_db()?;
    patients::get_patient(&conn, &patient_id)?;

    let target = db::parse_date(&req.target_date)
        .map_err(|e| ApiError::BadRequest(e.to_string()))?
        .and_hms_opt(0, 0, 0)
        .ok_or_else(|| ApiError::BadRequest("Invalid target date".into()))?;
    let notify_at = db::parse_datetime(&req.notify_at)
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let reminder = reminders::create_return_reminder(
        &conn,
        &patient_id,
        target,
        notify_at,
        req.message_template.as_deref(),
        Local::now().naive_local(),
    )?;
    Ok((StatusCode::CREATED, Json(reminder)))
}

/// `DELETE /api/reminders/:id`.
pub async fn remove(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let conn = state.open_db()?;
    reminders::delete_reminder(&conn, &id)?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Serialize)]
pub struct MessageResponse {
    pub text: String,
    /// `None` when the patient has no phone on file.
    pub whatsapp_link: Option<String>,
}

/// `GET /api/reminders/:id/message` — the rendered reminder text plus a
/// ready-to-open WhatsApp link.
pub async fn message(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    let conn = state.open_db()?;
    let reminder = reminders::get_reminder(&conn, &id)?;
    let patient = patients::get_patient(&conn, &reminder.patient_id)?;

    let target = db::parse_date(&reminder.target_date)?;
    let text = messages::return_message(reminder.message_template.as_deref(), &patient.name, target);
    let whatsapp_link = patient
        .phone
        .as_deref()
        .map(|phone| messages::whatsapp_link(phone, &text));
    Ok(Json(MessageResponse {
        text,
        whatsapp_link,
    }))
}

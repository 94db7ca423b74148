//! Appointment endpoints.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Local;
use serde::{Deserialize, Serialize};

use crate::api::error::ApiError;
use crate::appointments::{self, Appointment};
use crate::db;
use crate::patients;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct NewAppointmentRequest {
    pub patient_id: String,
    /// `YYYY-MM-DD HH:MM:SS`.
    pub scheduled_at: String,
    pub duration_minutes: Option<i64>,
    pub notes: Option<String>,
}

#[derive(Serialize)]
pub struct AppointmentsResponse {
    pub appointments: Vec<Appointment>,
}

/// `GET /api/appointments` — upcoming agenda, soonest first.
pub async fn list(
    State(state): State<Arc<AppState>>,
) -> Result<Json<AppointmentsResponse>, ApiError> {
    let conn = state.open_db()?;
    let appointments = appointments::list_upcoming(&conn, Local::now().naive_local())?;
    Ok(Json(AppointmentsResponse { appointments }))
}

/// `POST /api/appointments` — book a visit.
pub async fn create(
    State(state): State<Arc<AppState>>,
    Json(req): Json<NewAppointmentRequest>,
) -> Result<(StatusCode, Json<Appointment>), ApiError> {
    let conn = state.open_db()?;
    patients::get_patient(&conn, &req.patient_id)?;

    let at = db::parse_datetime(&req.scheduled_at)
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;
    let appointment = appointments::schedule_appointment(
        &conn,
        &req.patient_id,
        at,
        req.duration_minutes,
        req.notes.as_deref(),
        Local::now().naive_local(),
    )?;
    Ok((StatusCode::CREATED, Json(appointment)))
}

/// `POST /api/appointments/:id/cancel`.
pub async fn cancel(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Appointment>, ApiError> {
    let conn = state.open_db()?;
    Ok(Json(appointments::cancel_appointment(&conn, &id)?))
}

/// `POST /api/appointments/:id/complete`.
pub async fn complete(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Appointment>, ApiError> {
    let conn = state.open_db()?;
    Ok(Json(appointments::complete_appointment(&conn, &id)?))
}

/// `GET /api/patients/:id/appointments` — one patient's history.
pub async fn list_for_patient(
    State(state): State<Arc<AppState>>,
    Path(patient_id): Path<String>,
) -> Result<Json<AppointmentsResponse>, ApiError> {
    let conn = state.open_db()?;
    patients::get_patient(&conn, &patient_id)?;
    let appointments = appointments::list_for_patient(&conn, &patient_id)?;
    Ok(Json(AppointmentsResponse { appointments }))
}

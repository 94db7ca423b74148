//! Intake form endpoints.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::api::error::ApiError;
use crate::intake::{self, IntakeForm, IntakeStatus, NewIntakeForm};
use crate::patients::Patient;
use crate::state::AppState;

/// `POST /api/intake` — public-site submission.
pub async fn submit(
    State(state): State<Arc<AppState>>,
    Json(new): Json<NewIntakeForm>,
) -> Result<(StatusCode, Json<IntakeForm>), ApiError> {
    if new.patient_name.trim().is_empty() {
        return Err(ApiError::BadRequest("patient_name is required".into()));
    }
    let conn = state.open_db()?;
    let form = intake::submit_intake(&conn, &new)?;
    Ok((StatusCode::CREATED, Json(form)))
}

#[derive(Deserialize)]
pub struct ListQuery {
    pub status: Option<IntakeStatus>,
}

#[derive(Serialize)]
pub struct IntakeListResponse {
    pub forms: Vec<IntakeForm>,
}

/// `GET /api/intake?status=` — admin list, newest first.
pub async fn list(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListQuery>,
) -> Result<Json<IntakeListResponse>, ApiError> {
    let conn = state.open_db()?;
    let forms = intake::list_intake_forms(&conn, query.status)?;
    Ok(Json(IntakeListResponse { forms }))
}

/// `POST /api/intake/:id/review`.
pub async fn review(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<IntakeForm>, ApiError> {
    let conn = state.open_db()?;
    Ok(Json(intake::review_intake(&conn, &id)?))
}

/// `POST /api/intake/:id/convert` — create the patient record.
pub async fn convert(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<(StatusCode, Json<Patient>), ApiError> {
    let conn = state.open_db()?;
    let patient = intake::convert_intake(&conn, &id)?;
    Ok((StatusCode::CREATED, Json(patient)))
}

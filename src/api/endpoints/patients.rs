//! Patient CRUD endpoints.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::api::error::ApiError;
use crate::patients::{self, NewPatient, Patient};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct ListQuery {
    pub search: Option<String>,
}

#[derive(Serialize)]
pub struct PatientsResponse {
    pub patients: Vec<Patient>,
}

/// `GET /api/patients?search=` — roster, name-ordered.
pub async fn list(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListQuery>,
) -> Result<Json<PatientsResponse>, ApiError> {
    let conn = state.open_db()?;
    let patients = patients::list_patients(&conn, query.search.as_deref())?;
    Ok(Json(PatientsResponse { patients }))
}

/// `POST /api/patients` — create.
pub async fn create(
    State(state): State<Arc<AppState>>,
    Json(new): Json<NewPatient>,
) -> Result<(StatusCode, Json<Patient>), ApiError> {
    let conn = state.open_db()?;
    let patient = patients::create_patient(&conn, &new)?;
    Ok((StatusCode::CREATED, Json(patient)))
}

/// `GET /api/patients/:id`.
pub async fn detail(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Patient>, ApiError> {
    let conn = state.open_db()?;
    Ok(Json(patients::get_patient(&conn, &id)?))
}

/// `PUT /api/patients/:id` — full replace of editable fields.
pub async fn update(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(new): Json<NewPatient>,
) -> Result<Json<Patient>, ApiError> {
    let conn = state.open_db()?;
    Ok(Json(patients::update_patient(&conn, &id, &new)?))
}

/// `DELETE /api/patients/:id`.
pub async fn remove(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let conn = state.open_db()?;
    patients::delete_patient(&conn, &id)?;
    Ok(StatusCode::NO_CONTENT)
}

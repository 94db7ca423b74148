//! Health check endpoint.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::api::error::ApiError;
use crate::config;
use crate::state::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub unread_notifications: usize,
}

/// `GET /api/health` — liveness plus the notification badge count, so the
/// admin shell can poll one endpoint.
pub async fn check(State(state): State<Arc<AppState>>) -> Result<Json<HealthResponse>, ApiError> {
    // Opening a connection verifies the database is reachable and migrated.
    state.open_db()?;
    Ok(Json(HealthResponse {
        status: "ok",
        version: config::APP_VERSION,
        unread_notifications: state.notifications.unread_count(),
    }))
}

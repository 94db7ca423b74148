//! Site settings endpoints.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::api::error::ApiError;
use crate::settings::{self, SeoConfig, Setting};
use crate::state::AppState;

#[derive(Serialize)]
pub struct SettingsResponse {
    pub settings: Vec<Setting>,
}

/// `GET /api/settings` — all keys, sorted.
pub async fn list(State(state): State<Arc<AppState>>) -> Result<Json<SettingsResponse>, ApiError> {
    let conn = state.open_db()?;
    let settings = settings::list_settings(&conn)?;
    Ok(Json(SettingsResponse { settings }))
}

#[derive(Serialize)]
pub struct SettingValue {
    pub key: String,
    pub value: String,
}

/// `GET /api/settings/:key`.
pub async fn get(
    State(state): State<Arc<AppState>>,
    Path(key): Path<String>,
) -> Result<Json<SettingValue>, ApiError> {
    let conn = state.open_db()?;
    let value = settings::get_setting(&conn, &key)?
        .ok_or_else(|| ApiError::NotFound(format!("Setting '{key}' not found")))?;
    Ok(Json(SettingValue { key, value }))
}

#[derive(Deserialize)]
pub struct PutSetting {
    pub value: String,
}

/// `PUT /api/settings/:key` — upsert.
pub async fn put(
    State(state): State<Arc<AppState>>,
    Path(key): Path<String>,
    Json(body): Json<PutSetting>,
) -> Result<Json<SettingValue>, ApiError> {
    let conn = state.open_db()?;
    settings::set_setting(&conn, &key, &body.value)?;
    Ok(Json(SettingValue {
        key,
        value: body.value,
    }))
}

/// `DELETE /api/settings/:key`.
pub async fn remove(
    State(state): State<Arc<AppState>>,
    Path(key): Path<String>,
) -> Result<StatusCode, ApiError> {
    let conn = state.open_db()?;
    settings::delete_setting(&conn, &key)?;
    Ok(StatusCode::NO_CONTENT)
}

/// `GET /api/settings-seo` — the typed SEO block.
pub async fn get_seo(State(state): State<Arc<AppState>>) -> Result<Json<SeoConfig>, ApiError> {
    let conn = state.open_db()?;
    Ok(Json(SeoConfig::load(&conn)?))
}

/// `PUT /api/settings-seo`.
pub async fn put_seo(
    State(state): State<Arc<AppState>>,
    Json(seo): Json<SeoConfig>,
) -> Result<Json<SeoConfig>, ApiError> {
    let conn = state.open_db()?;
    seo.save(&conn)?;
    Ok(Json(seo))
}

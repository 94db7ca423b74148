//! Notification center endpoints.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Local;
use serde::{Deserialize, Serialize};

use crate::api::error::ApiError;
use crate::birthdays::{self, BirthdayNotification, DASHBOARD_LOOKAHEAD_DAYS};
use crate::manual::{self, ManualNotification, NewManualNotification};
use crate::messages;
use crate::notifications::Notification;
use crate::state::AppState;

#[derive(Serialize)]
pub struct NotificationsResponse {
    pub notifications: Vec<Notification>,
    pub unread: usize,
}

/// `GET /api/notifications` — the current in-memory snapshot. Does not
/// trigger a fetch; the poller and explicit refresh do that.
pub async fn list(State(state): State<Arc<AppState>>) -> Json<NotificationsResponse> {
    Json(NotificationsResponse {
        notifications: state.notifications.snapshot(),
        unread: state.notifications.unread_count(),
    })
}

/// `POST /api/notifications/refresh` — reload all sources now.
pub async fn refresh(State(state): State<Arc<AppState>>) -> Json<NotificationsResponse> {
    state.notifications.refresh().await;
    Json(NotificationsResponse {
        notifications: state.notifications.snapshot(),
        unread: state.notifications.unread_count(),
    })
}

#[derive(Serialize)]
pub struct DismissResponse {
    pub dismissed: bool,
    pub unread: usize,
}

/// `POST /api/notifications/:id/dismiss`.
pub async fn dismiss(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<DismissResponse>, ApiError> {
    let dismissed = state.notifications.dismiss(&id).await?;
    Ok(Json(DismissResponse {
        dismissed,
        unread: state.notifications.unread_count(),
    }))
}

#[derive(Deserialize)]
pub struct BirthdaysQuery {
    pub days: Option<i64>,
}

#[derive(Serialize)]
pub struct BirthdayEntry {
    #[serde(flatten)]
    pub notification: BirthdayNotification,
    pub message: String,
    pub whatsapp_link: Option<String>,
}

#[derive(Serialize)]
pub struct BirthdaysResponse {
    pub birthdays: Vec<BirthdayEntry>,
}

/// `GET /api/notifications/birthdays?days=N` — the dashboard card: every
/// birthday within the window, with ready-to-send messages.
pub async fn birthdays(
    State(state): State<Arc<AppState>>,
    Query(query): Query<BirthdaysQuery>,
) -> Result<Json<BirthdaysResponse>, ApiError> {
    let days = query.days.unwrap_or(DASHBOARD_LOOKAHEAD_DAYS);
    if !(0..=366).contains(&days) {
        return Err(ApiError::BadRequest("days must be between 0 and 366".into()));
    }

    let conn = state.open_db()?;
    let today = Local::now().date_naive();
    let upcoming = birthdays::upcoming_birthdays(&conn, today, days)?;

    let birthdays = upcoming
        .into_iter()
        .map(|n| {
            let message = messages::birthday_message(&n.name, n.days_until);
            let whatsapp_link = n
                .phone
                .as_deref()
                .map(|phone| messages::whatsapp_link(phone, &message));
            BirthdayEntry {
                notification: n,
                message,
                whatsapp_link,
            }
        })
        .collect();
    Ok(Json(BirthdaysResponse { birthdays }))
}

/// `POST /api/notifications/manual` — staff-authored notification.
pub async fn create_manual(
    State(state): State<Arc<AppState>>,
    Json(new): Json<NewManualNotification>,
) -> Result<(StatusCode, Json<ManualNotification>), ApiError> {
    let conn = state.open_db()?;
    let created = manual::create_manual_notification(&conn, &new, Local::now().naive_local())?;
    Ok((StatusCode::CREATED, Json(created)))
}

#[derive(Serialize)]
pub struct ManualListResponse {
    pub notifications: Vec<ManualNotification>,
}

/// `GET /api/notifications/manual` — all manual notifications, newest first.
pub async fn list_manual(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ManualListResponse>, ApiError> {
    let conn = state.open_db()?;
    let notifications = manual::list_manual_notifications(&conn)?;
    Ok(Json(ManualListResponse { notifications }))
}

/// `DELETE /api/notifications/manual/:id`.
pub async fn remove_manual(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let conn = state.open_db()?;
    manual::delete_manual_notification(&conn, &id)?;
    Ok(StatusCode::NO_CONTENT)
}

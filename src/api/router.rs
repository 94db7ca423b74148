//! Admin API router.
//!
//! Returns a composable `Router` that can be mounted on any axum server.
//! Routes are nested under `/api/`, JSON in and out, with permissive CORS
//! for the local admin frontend and request tracing.

use std::sync::Arc;

use axum::routing::{delete, get, post, put};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::api::endpoints;
use crate::state::AppState;

/// Build the admin API router.
///
/// NOTE: Path params use `:param` syntax (matchit 0.7 / axum 0.7).
pub fn admin_router(state: Arc<AppState>) -> Router {
    let api = Router::new()
        .route("/health", get(endpoints::health::check))
        // Patients
        .route(
            "/patients",
            get(endpoints::patients::list).post(endpoints::patients::create),
        )
        .route(
            "/patients/:id",
            get(endpoints::patients::detail)
                .put(endpoints::patients::update)
                .delete(endpoints::patients::remove),
        )
        // Return reminders
        .route(
            "/patients/:id/reminders",
            get(endpoints::reminders::list_for_patient).post(endpoints::reminders::create),
        )
        .route("/reminders/:id", delete(endpoints::reminders::remove))
        .route("/reminders/:id/message", get(endpoints::reminders::message))
        // Notification center
        .route("/notifications", get(endpoints::notifications::list))
        .route(
            "/notifications/refresh",
            post(endpoints::notifications::refresh),
        )
        .route(
            "/notifications/:id/dismiss",
            post(endpoints::notifications::dismiss),
        )
        .route(
            "/notifications/birthdays",
            get(endpoints::notifications::birthdays),
        )
        .route(
            "/notifications/manual",
            get(endpoints::notifications::list_manual).post(endpoints::notifications::create_manual),
        )
        .route(
            "/notifications/manual/:id",
            delete(endpoints::notifications::remove_manual),
        )
        // Appointments
        .route(
            "/appointments",
            get(endpoints::appointments::list).post(endpoints::appointments::create),
        )
        .route(
            "/appointments/:id/cancel",
            post(endpoints::appointments::cancel),
        )
        .route(
            "/appointments/:id/complete",
            post(endpoints::appointments::complete),
        )
        .route(
            "/patients/:id/appointments",
            get(endpoints::appointments::list_for_patient),
        )
        // Intake forms
        .route(
            "/intake",
            get(endpoints::intake::list).post(endpoints::intake::submit),
        )
        .route("/intake/:id/review", post(endpoints::intake::review))
        .route("/intake/:id/convert", post(endpoints::intake::convert))
        // Site settings
        .route("/settings", get(endpoints::settings::list))
        .route(
            "/settings/:key",
            get(endpoints::settings::get)
                .put(endpoints::settings::put)
                .delete(endpoints::settings::remove),
        )
        .route(
            "/settings-seo",
            get(endpoints::settings::get_seo).put(endpoints::settings::put_seo),
        )
        .with_state(state);

    Router::new()
        .nest("/api", api)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

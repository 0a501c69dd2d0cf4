use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};

use crate::features::sessions::handlers::{self, SessionState};
use crate::features::sessions::services::{CleanupService, SessionService};

/// Create routes for the sessions feature
///
/// All routes are public except the cleanup trigger, which expects the
/// shared bearer token.
pub fn routes(
    sessions: Arc<SessionService>,
    cleanup: Arc<CleanupService>,
    cookie_secure: bool,
    cleanup_bearer_token: String,
) -> Router {
    let state = SessionState {
        sessions,
        cleanup,
        cookie_secure,
        cleanup_bearer_token,
    };

    Router::new()
        .route(
            "/api/consent",
            post(handlers::save_consent).get(handlers::consent_status),
        )
        .route("/api/data-export", get(handlers::export_data))
        .route(
            "/api/delete",
            post(handlers::delete_session_data).get(handlers::deletion_status),
        )
        .route("/api/internal/cleanup", post(handlers::trigger_cleanup))
        .with_state(state)
}

use std::sync::Arc;

use axum::{extract::DefaultBodyLimit, routing::post, Router};

use crate::features::sessions::services::SessionService;
use crate::features::uploads::dtos::MAX_FILE_SIZE;
use crate::features::uploads::handlers::{self, UploadState};
use crate::features::uploads::services::UploadService;

/// Create routes for the uploads feature
pub fn routes(
    sessions: Arc<SessionService>,
    uploads: Arc<UploadService>,
    cookie_secure: bool,
) -> Router {
    let state = UploadState {
        sessions,
        uploads,
        cookie_secure,
    };

    Router::new()
        .route("/api/upload", post(handlers::upload_selfie))
        // Body limit slightly above the file cap to leave room for the
        // multipart envelope and consent fields
        .layer(DefaultBodyLimit::max(MAX_FILE_SIZE + 1024 * 1024))
        .with_state(state)
}

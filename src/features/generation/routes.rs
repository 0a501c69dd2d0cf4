use std::sync::Arc;

use axum::{routing::get, Router};

use crate::features::generation::handlers::{self, GenerationState};
use crate::features::generation::services::GenerationService;

/// Create routes for the generation feature
pub fn routes(generation: Arc<GenerationService>) -> Router {
    let state = GenerationState { generation };

    Router::new()
        .route("/api/generation-status", get(handlers::generation_status))
        .with_state(state)
}

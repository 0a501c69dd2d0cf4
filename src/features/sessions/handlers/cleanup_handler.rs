use axum::{
    extract::State,
    http::{header, HeaderMap},
    Json,
};
use subtle::ConstantTimeEq;

use crate::core::error::{AppError, Result};
use crate::features::sessions::dtos::CleanupStatsDto;
use crate::features::sessions::handlers::SessionState;
use crate::shared::types::ApiResponse;

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
}

/// Trigger a retention sweep
///
/// Guarded by a shared bearer token; meant for schedulers and operators,
/// not end users. The same sweep also runs on a fixed interval in the
/// background.
#[utoipa::path(
    post,
    path = "/api/internal/cleanup",
    responses(
        (status = 200, description = "Sweep executed", body = ApiResponse<CleanupStatsDto>),
        (status = 401, description = "Missing or wrong bearer token")
    ),
    security(("bearer_auth" = [])),
    tag = "internal"
)]
pub async fn trigger_cleanup(
    State(state): State<SessionState>,
    headers: HeaderMap,
) -> Result<Json<ApiResponse<CleanupStatsDto>>> {
    let token =
        bearer_token(&headers).ok_or_else(|| AppError::Unauthorized("Unauthorized".to_string()))?;

    // Constant-time comparison so the token cannot be probed byte by byte
    let authorized: bool = state
        .cleanup_bearer_token
        .as_bytes()
        .ct_eq(token.as_bytes())
        .into();
    if !authorized {
        return Err(AppError::Unauthorized("Unauthorized".to_string()));
    }

    let stats = state.cleanup.sweep().await?;

    Ok(Json(ApiResponse::success(
        Some(stats),
        Some("GDPR cleanup completed successfully".to_string()),
    )))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum_test::TestServer;

    use crate::features::sessions::routes::routes;
    use crate::features::sessions::services::{CleanupService, SessionService};
    use crate::modules::storage::MinIOClient;
    use crate::shared::test_helpers::{lazy_test_pool, test_minio_config};

    // The token check precedes the sweep, so rejected requests never
    // touch the lazy pool.
    fn test_server() -> TestServer {
        let storage = Arc::new(MinIOClient::new(test_minio_config()).unwrap());
        let sessions = Arc::new(SessionService::new(lazy_test_pool(), storage.clone()));
        let cleanup = Arc::new(CleanupService::new(sessions.clone(), storage));
        TestServer::new(routes(sessions, cleanup, false, "sweep-token".to_string())).unwrap()
    }

    #[tokio::test]
    async fn test_cleanup_requires_bearer_token() {
        let server = test_server();

        let response = server.post("/api/internal/cleanup").await;

        assert_eq!(response.status_code(), 401);
    }

    #[tokio::test]
    async fn test_cleanup_rejects_wrong_token() {
        let server = test_server();

        let response = server
            .post("/api/internal/cleanup")
            .add_header("authorization", "Bearer wrong-token")
            .await;

        assert_eq!(response.status_code(), 401);
    }
}

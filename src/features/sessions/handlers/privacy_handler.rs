use axum::{
    extract::{Query, State},
    http::{header, HeaderName},
    Json,
};
use serde::Deserialize;
use utoipa::IntoParams;
use uuid::Uuid;
use validator::Validate;

use crate::core::error::{AppError, Result};
use crate::core::extractor::{AppJson, SessionCookie};
use crate::features::sessions::dtos::{
    DataExportDto, DeleteRequestDto, DeleteResponseDto, DeletionStatusDto,
};
use crate::features::sessions::handlers::{clear_session_cookie, SessionState};
use crate::shared::types::ApiResponse;

/// Download everything held for the caller's session
///
/// Served as a standalone JSON attachment rather than the API envelope,
/// so the file is usable on its own.
#[utoipa::path(
    get,
    path = "/api/data-export",
    responses(
        (status = 200, description = "Data export attachment", body = DataExportDto),
        (status = 401, description = "No active session"),
        (status = 404, description = "Session expired or invalid")
    ),
    tag = "privacy"
)]
pub async fn export_data(
    State(state): State<SessionState>,
    cookie: SessionCookie,
) -> Result<([(HeaderName, String); 1], Json<DataExportDto>)> {
    let session_id = cookie
        .0
        .ok_or_else(|| AppError::Unauthorized("No active session found".to_string()))?;

    let session = state
        .sessions
        .get_active_session(session_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Session expired or invalid".to_string()))?;

    // Logged after the activity list is read so the export does not
    // contain its own audit entry.
    let logs = state.sessions.list_activity(session.id).await?;
    state
        .sessions
        .record_processing(
            session.id,
            "data_exported",
            "gdpr_compliance",
            "legal_obligation",
            &["all_session_data"],
        )
        .await?;

    let export = DataExportDto::from_session(&session, logs);

    let disposition = format!(
        "attachment; filename=\"gdpr-data-export-{}.json\"",
        session.id
    );

    Ok(([(header::CONTENT_DISPOSITION, disposition)], Json(export)))
}

/// Erase the caller's session on request
///
/// The target session must match the caller's cookie; erasure is
/// executed immediately and the cookie is cleared.
#[utoipa::path(
    post,
    path = "/api/delete",
    request_body = DeleteRequestDto,
    responses(
        (status = 200, description = "Data deleted", body = ApiResponse<DeleteResponseDto>),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Cookie does not match the target session"),
        (status = 404, description = "Session not found or already expired")
    ),
    tag = "privacy"
)]
pub async fn delete_session_data(
    State(state): State<SessionState>,
    cookie: SessionCookie,
    AppJson(dto): AppJson<DeleteRequestDto>,
) -> Result<([(HeaderName, String); 1], Json<ApiResponse<DeleteResponseDto>>)> {
    dto.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    if cookie.0 != Some(dto.session_id) {
        return Err(AppError::Unauthorized(
            "Unauthorized deletion request".to_string(),
        ));
    }

    let session = state
        .sessions
        .get_active_session(dto.session_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Session not found or already expired".to_string()))?;

    let request = state.sessions.request_deletion(session.id).await?;
    state.sessions.execute_deletion(session.id).await?;

    Ok((
        [(header::SET_COOKIE, clear_session_cookie())],
        Json(ApiResponse::success(
            Some(DeleteResponseDto::new(request.id)),
            Some("Your data has been deleted as requested".to_string()),
        )),
    ))
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct DeletionStatusQuery {
    /// Deletion request id returned by the delete endpoint
    pub id: Option<Uuid>,
}

/// Look up the status of an erasure request
///
/// Works after the session itself is gone; the audit row survives.
#[utoipa::path(
    get,
    path = "/api/delete",
    params(DeletionStatusQuery),
    responses(
        (status = 200, description = "Deletion request status", body = ApiResponse<DeletionStatusDto>),
        (status = 400, description = "Deletion ID missing"),
        (status = 404, description = "Deletion request not found")
    ),
    tag = "privacy"
)]
pub async fn deletion_status(
    State(state): State<SessionState>,
    Query(query): Query<DeletionStatusQuery>,
) -> Result<Json<ApiResponse<DeletionStatusDto>>> {
    let id = query
        .id
        .ok_or_else(|| AppError::BadRequest("Deletion ID required".to_string()))?;

    let request = state
        .sessions
        .get_deletion_request(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Deletion request not found".to_string()))?;

    Ok(Json(ApiResponse::success(
        Some(DeletionStatusDto::from(request)),
        None,
    )))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum_test::TestServer;
    use uuid::Uuid;

    use crate::features::sessions::routes::routes;
    use crate::features::sessions::services::{CleanupService, SessionService};
    use crate::modules::storage::MinIOClient;
    use crate::shared::test_helpers::{lazy_test_pool, test_minio_config};

    // Guards under test all reject before the first query, so the lazy
    // pool never actually connects.
    fn test_server() -> TestServer {
        let storage = Arc::new(MinIOClient::new(test_minio_config()).unwrap());
        let sessions = Arc::new(SessionService::new(lazy_test_pool(), storage.clone()));
        let cleanup = Arc::new(CleanupService::new(sessions.clone(), storage));
        TestServer::new(routes(sessions, cleanup, false, "sweep-token".to_string())).unwrap()
    }

    #[tokio::test]
    async fn test_export_requires_session_cookie() {
        let server = test_server();

        let response = server.get("/api/data-export").await;

        assert_eq!(response.status_code(), 401);
    }

    #[tokio::test]
    async fn test_delete_rejects_cookie_body_mismatch() {
        let server = test_server();

        let response = server
            .post("/api/delete")
            .add_header("cookie", format!("gdpr-session={}", Uuid::new_v4()))
            .json(&serde_json::json!({ "sessionId": Uuid::new_v4() }))
            .await;

        assert_eq!(response.status_code(), 401);
    }

    #[tokio::test]
    async fn test_delete_rejects_unknown_reason() {
        let server = test_server();
        let id = Uuid::new_v4();

        let response = server
            .post("/api/delete")
            .add_header("cookie", format!("gdpr-session={}", id))
            .json(&serde_json::json!({ "sessionId": id, "reason": "because" }))
            .await;

        assert_eq!(response.status_code(), 400);
    }

    #[tokio::test]
    async fn test_deletion_status_requires_id() {
        let server = test_server();

        let response = server.get("/api/delete").await;

        assert_eq!(response.status_code(), 400);
        assert!(response.text().contains("Deletion ID required"));
    }
}

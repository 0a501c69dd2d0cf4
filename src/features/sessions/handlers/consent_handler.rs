use axum::{
    extract::State,
    http::{header, HeaderMap, HeaderName},
    Json,
};

use crate::core::error::Result;
use crate::core::extractor::{client_ip, user_agent, AppJson, SessionCookie};
use crate::features::sessions::dtos::{
    ConsentRequestDto, ConsentResponseDto, ConsentSnapshotDto, ConsentStatusDto,
    ProcessingActivityDto,
};
use crate::features::sessions::handlers::{session_cookie, SessionState};
use crate::features::sessions::models::ConsentFlags;
use crate::shared::types::ApiResponse;

/// Save consent preferences and start a session
///
/// Creates the session the rest of the flow hangs off and sets the
/// session cookie. Requires data and cookie consent.
#[utoipa::path(
    post,
    path = "/api/consent",
    request_body = ConsentRequestDto,
    responses(
        (status = 200, description = "Consent preferences saved", body = ApiResponse<ConsentResponseDto>),
        (status = 400, description = "Required consent missing")
    ),
    tag = "consent"
)]
pub async fn save_consent(
    State(state): State<SessionState>,
    headers: HeaderMap,
    AppJson(dto): AppJson<ConsentRequestDto>,
) -> Result<([(HeaderName, String); 1], Json<ApiResponse<ConsentResponseDto>>)> {
    let consents = ConsentFlags {
        data_consent: dto.data_consent,
        cookie_consent: dto.cookie_consent,
        marketing_consent: dto.marketing_consent,
    };

    let session = state
        .sessions
        .create_session(consents, client_ip(&headers), user_agent(&headers))
        .await?;

    let cookie = session_cookie(session.id, state.cookie_secure);
    let body = ConsentResponseDto::new(session.id, session.expires_at);

    Ok((
        [(header::SET_COOKIE, cookie)],
        Json(ApiResponse::success(
            Some(body),
            Some("Consent preferences saved".to_string()),
        )),
    ))
}

/// Current consent status for the caller's session
#[utoipa::path(
    get,
    path = "/api/consent",
    responses(
        (status = 200, description = "Consent status", body = ApiResponse<ConsentStatusDto>)
    ),
    tag = "consent"
)]
pub async fn consent_status(
    State(state): State<SessionState>,
    cookie: SessionCookie,
) -> Result<Json<ApiResponse<ConsentStatusDto>>> {
    let Some(session_id) = cookie.0 else {
        return Ok(Json(ApiResponse::success(
            Some(ConsentStatusDto::absent()),
            Some("No consent session found".to_string()),
        )));
    };

    let Some(session) = state.sessions.get_active_session(session_id).await? else {
        return Ok(Json(ApiResponse::success(
            Some(ConsentStatusDto::absent()),
            Some("Session expired or invalid".to_string()),
        )));
    };

    let activities = state
        .sessions
        .recent_activity(session.id)
        .await?
        .into_iter()
        .map(ProcessingActivityDto::from)
        .collect();

    let status = ConsentStatusDto {
        has_consent: true,
        session_id: Some(session.id),
        consent: Some(ConsentSnapshotDto {
            data: session.data_consent,
            cookies: session.cookie_consent,
        }),
        expires_at: Some(session.expires_at),
        data_processing_activities: Some(activities),
    };

    Ok(Json(ApiResponse::success(Some(status), None)))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum_test::TestServer;

    use crate::features::sessions::routes::routes;
    use crate::features::sessions::services::{CleanupService, SessionService};
    use crate::modules::storage::MinIOClient;
    use crate::shared::test_helpers::{lazy_test_pool, test_minio_config};

    // Consent validation happens before the insert, so these paths never
    // reach the lazy pool.
    fn test_server() -> TestServer {
        let storage = Arc::new(MinIOClient::new(test_minio_config()).unwrap());
        let sessions = Arc::new(SessionService::new(lazy_test_pool(), storage.clone()));
        let cleanup = Arc::new(CleanupService::new(sessions.clone(), storage));
        TestServer::new(routes(sessions, cleanup, false, "sweep-token".to_string())).unwrap()
    }

    #[tokio::test]
    async fn test_consent_requires_both_flags() {
        let server = test_server();

        let response = server
            .post("/api/consent")
            .json(&serde_json::json!({ "dataConsent": true, "cookieConsent": false }))
            .await;

        assert_eq!(response.status_code(), 400);
        assert!(response
            .text()
            .contains("Data and cookie consent are required"));
    }

    #[tokio::test]
    async fn test_consent_status_without_cookie_reports_absent() {
        let server = test_server();

        let response = server.get("/api/consent").await;

        assert_eq!(response.status_code(), 200);
        assert!(response.text().contains("\"hasConsent\":false"));
    }
}

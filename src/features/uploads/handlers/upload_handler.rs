use axum::{
    extract::{multipart::Field, Multipart, State},
    http::{header, HeaderMap, HeaderName},
    Json,
};
use tracing::debug;

use crate::core::error::{AppError, Result};
use crate::core::extractor::{client_ip, user_agent, SessionCookie};
use crate::features::sessions::handlers::session_cookie;
use crate::features::sessions::models::ConsentFlags;
use crate::features::uploads::dtos::{
    is_mime_type_allowed, UploadRequestDto, UploadResponseDto, MAX_FILE_SIZE,
};
use crate::features::uploads::handlers::UploadState;
use crate::shared::types::ApiResponse;

async fn consent_flag(field: Field<'_>) -> Result<bool> {
    let text = field
        .text()
        .await
        .map_err(|e| AppError::BadRequest(format!("Failed to read consent field: {}", e)))?;
    Ok(text.trim().eq_ignore_ascii_case("true"))
}

/// Upload a selfie
///
/// Accepts multipart/form-data with:
/// - `file`: The selfie to upload (required, JPG/PNG/GIF/WebP, max 10MB)
/// - `dataConsent` / `cookieConsent` / `marketingConsent`: "true"/"false",
///   used to open a session when the request carries no valid session cookie
///
/// An existing session cookie wins over the form flags; re-uploading
/// replaces the previous selfie for that session.
#[utoipa::path(
    post,
    path = "/api/upload",
    tag = "uploads",
    request_body(
        content = UploadRequestDto,
        content_type = "multipart/form-data",
        description = "Selfie upload form with optional consent fields for first contact",
    ),
    responses(
        (status = 200, description = "File uploaded successfully", body = ApiResponse<UploadResponseDto>),
        (status = 400, description = "Missing file, invalid type, oversized, or consent missing"),
        (status = 413, description = "Request body too large")
    )
)]
pub async fn upload_selfie(
    State(state): State<UploadState>,
    cookie: SessionCookie,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Result<([(HeaderName, String); 1], Json<ApiResponse<UploadResponseDto>>)> {
    let mut file_data: Option<Vec<u8>> = None;
    let mut file_name: Option<String> = None;
    let mut content_type: Option<String> = None;
    let mut data_consent = false;
    let mut cookie_consent = false;
    let mut marketing_consent = false;

    // Process multipart fields
    while let Some(field) = multipart.next_field().await.map_err(|e| {
        debug!("Failed to read multipart field: {}", e);
        AppError::BadRequest(format!("Failed to read multipart data: {}", e))
    })? {
        let field_name = field.name().unwrap_or("").to_string();

        match field_name.as_str() {
            "file" => {
                let ct = field
                    .content_type()
                    .map(|s| s.to_string())
                    .unwrap_or_else(|| "application/octet-stream".to_string());

                let fname = field
                    .file_name()
                    .map(|s| s.to_string())
                    .unwrap_or_else(|| "selfie".to_string());

                let data = field.bytes().await.map_err(|e| {
                    debug!("Failed to read file bytes: {}", e);
                    AppError::BadRequest(format!("Failed to read file data: {}", e))
                })?;

                file_data = Some(data.to_vec());
                file_name = Some(fname);
                content_type = Some(ct);
            }
            "dataConsent" => {
                data_consent = consent_flag(field).await?;
            }
            "cookieConsent" => {
                cookie_consent = consent_flag(field).await?;
            }
            "marketingConsent" => {
                marketing_consent = consent_flag(field).await?;
            }
            _ => {
                debug!("Ignoring unknown field: {}", field_name);
            }
        }
    }

    let file_data =
        file_data.ok_or_else(|| AppError::BadRequest("No file uploaded".to_string()))?;
    let file_name =
        file_name.ok_or_else(|| AppError::BadRequest("No file uploaded".to_string()))?;
    let content_type =
        content_type.ok_or_else(|| AppError::BadRequest("No file uploaded".to_string()))?;

    if !is_mime_type_allowed(&content_type) {
        return Err(AppError::BadRequest(
            "Invalid file type. Please upload JPG, PNG, GIF, or WebP images only.".to_string(),
        ));
    }

    if file_data.len() > MAX_FILE_SIZE {
        return Err(AppError::BadRequest(
            "File too large. Maximum size is 10MB.".to_string(),
        ));
    }

    let size_bytes = file_data.len() as i64;

    // A live session cookie wins; otherwise the form flags must carry the
    // required consent themselves and a fresh session is opened here.
    let existing = match cookie.0 {
        Some(session_id) => state.sessions.get_active_session(session_id).await?,
        None => None,
    };

    let session = match existing {
        Some(session) => session,
        None => {
            let consents = ConsentFlags {
                data_consent,
                cookie_consent,
                marketing_consent,
            };
            state
                .sessions
                .create_session(consents, client_ip(&headers), user_agent(&headers))
                .await?
        }
    };

    let session = state
        .uploads
        .store_selfie(session.id, file_data, &file_name, &content_type)
        .await?;

    let response = UploadResponseDto {
        session_id: session.id,
        filename: file_name,
        content_type,
        size_bytes,
    };

    Ok((
        [(
            header::SET_COOKIE,
            session_cookie(session.id, state.cookie_secure),
        )],
        Json(ApiResponse::success(
            Some(response),
            Some("File uploaded successfully and ready for processing".to_string()),
        )),
    ))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum_test::multipart::{MultipartForm, Part};
    use axum_test::TestServer;

    use crate::features::sessions::services::SessionService;
    use crate::features::uploads::dtos::MAX_FILE_SIZE;
    use crate::features::uploads::routes::routes;
    use crate::features::uploads::services::UploadService;
    use crate::modules::storage::MinIOClient;
    use crate::shared::test_helpers::{lazy_test_pool, test_minio_config};

    // Guards under test all reject before the first query, so the lazy
    // pool never actually connects.
    fn test_server() -> TestServer {
        let storage = Arc::new(MinIOClient::new(test_minio_config()).unwrap());
        let sessions = Arc::new(SessionService::new(lazy_test_pool(), storage.clone()));
        let uploads = Arc::new(UploadService::new(sessions.clone(), storage));
        TestServer::new(routes(sessions, uploads, false)).unwrap()
    }

    #[tokio::test]
    async fn test_upload_without_file_is_rejected() {
        let server = test_server();

        let form = MultipartForm::new()
            .add_text("dataConsent", "true")
            .add_text("cookieConsent", "true");
        let response = server.post("/api/upload").multipart(form).await;

        assert_eq!(response.status_code(), 400);
        assert!(response.text().contains("No file uploaded"));
    }

    #[tokio::test]
    async fn test_upload_rejects_unsupported_file_type() {
        let server = test_server();

        let part = Part::bytes(b"%PDF-1.4".to_vec())
            .file_name("document.pdf")
            .mime_type("application/pdf");
        let form = MultipartForm::new().add_part("file", part);
        let response = server.post("/api/upload").multipart(form).await;

        assert_eq!(response.status_code(), 400);
        assert!(response.text().contains("Invalid file type"));
    }

    #[tokio::test]
    async fn test_upload_rejects_oversized_file() {
        let server = test_server();

        let part = Part::bytes(vec![0u8; MAX_FILE_SIZE + 1])
            .file_name("huge.jpg")
            .mime_type("image/jpeg");
        let form = MultipartForm::new().add_part("file", part);
        let response = server.post("/api/upload").multipart(form).await;

        assert_eq!(response.status_code(), 400);
        assert!(response.text().contains("File too large"));
    }

    #[tokio::test]
    async fn test_upload_without_consent_or_session_is_rejected() {
        let server = test_server();

        let part = Part::bytes(vec![0u8; 32])
            .file_name("selfie.jpg")
            .mime_type("image/jpeg");
        let form = MultipartForm::new().add_part("file", part);
        let response = server.post("/api/upload").multipart(form).await;

        assert_eq!(response.status_code(), 400);
        assert!(response
            .text()
            .contains("Data and cookie consent are required"));
    }
}

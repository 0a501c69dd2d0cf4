use axum::{extract::State, Json};

use crate::core::error::{AppError, Result};
use crate::core::extractor::SessionCookie;
use crate::features::generation::dtos::GenerationStatusDto;
use crate::features::generation::handlers::GenerationState;
use crate::shared::types::ApiResponse;

/// Generation progress for the caller's session
///
/// Polled by the result page after payment. Once the job completes the
/// response carries a presigned download URL for the enhanced image.
#[utoipa::path(
    get,
    path = "/api/generation-status",
    responses(
        (status = 200, description = "Generation state", body = ApiResponse<GenerationStatusDto>),
        (status = 401, description = "No active session"),
        (status = 404, description = "Session expired or invalid")
    ),
    tag = "generation"
)]
pub async fn generation_status(
    State(state): State<GenerationState>,
    cookie: SessionCookie,
) -> Result<Json<ApiResponse<GenerationStatusDto>>> {
    let session_id = cookie
        .0
        .ok_or_else(|| AppError::Unauthorized("No active session found".to_string()))?;

    let status = state.generation.poll_for_session(session_id).await?;

    Ok(Json(ApiResponse::success(Some(status), None)))
}

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::features::sessions::models::GenerationStatus;

/// Generation progress for the caller's session
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GenerationStatusDto {
    pub status: GenerationStatus,
    /// Presigned URL for the enhanced image, present once completed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub download_url: Option<String>,
    /// Provider-reported failure reason, present when failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl GenerationStatusDto {
    pub fn not_started() -> Self {
        Self {
            status: GenerationStatus::NotStarted,
            download_url: None,
            error: None,
        }
    }

    pub fn in_progress() -> Self {
        Self {
            status: GenerationStatus::InProgress,
            download_url: None,
            error: None,
        }
    }

    pub fn completed(download_url: String) -> Self {
        Self {
            status: GenerationStatus::Completed,
            download_url: Some(download_url),
            error: None,
        }
    }

    pub fn failed(error: Option<String>) -> Self {
        Self {
            status: GenerationStatus::Failed,
            download_url: None,
            error,
        }
    }
}

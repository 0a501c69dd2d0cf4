use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::features::sessions::models::ProcessingLog;
use crate::shared::constants::{DATA_RETENTION_STATEMENT, GDPR_RIGHTS};

/// Request DTO for saving consent preferences
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ConsentRequestDto {
    /// Consent to processing of uploaded images
    pub data_consent: bool,

    /// Consent to the session cookie
    pub cookie_consent: bool,

    /// Optional marketing consent, defaults to false
    #[serde(default)]
    pub marketing_consent: bool,
}

/// Response DTO for a freshly created consent session
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ConsentResponseDto {
    pub session_id: Uuid,
    pub expires_at: DateTime<Utc>,
    pub data_retention: String,
    pub rights: Vec<String>,
}

impl ConsentResponseDto {
    pub fn new(session_id: Uuid, expires_at: DateTime<Utc>) -> Self {
        Self {
            session_id,
            expires_at,
            data_retention: DATA_RETENTION_STATEMENT.to_string(),
            rights: GDPR_RIGHTS.iter().map(|r| r.to_string()).collect(),
        }
    }
}

/// Consent flags as stored on the session
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ConsentSnapshotDto {
    pub data: bool,
    pub cookies: bool,
}

/// One processing activity entry shown to the data subject
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProcessingActivityDto {
    pub action: String,
    pub purpose: String,
    pub legal_basis: String,
    pub timestamp: DateTime<Utc>,
}

impl From<ProcessingLog> for ProcessingActivityDto {
    fn from(log: ProcessingLog) -> Self {
        Self {
            action: log.action,
            purpose: log.purpose,
            legal_basis: log.legal_basis,
            timestamp: log.logged_at,
        }
    }
}

/// Response DTO for the current consent status
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ConsentStatusDto {
    pub has_consent: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub consent: Option<ConsentSnapshotDto>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_processing_activities: Option<Vec<ProcessingActivityDto>>,
}

impl ConsentStatusDto {
    /// Status for a caller without an active session
    pub fn absent() -> Self {
        Self {
            has_consent: false,
            session_id: None,
            consent: None,
            expires_at: None,
            data_processing_activities: None,
        }
    }
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use utoipa::ToSchema;
use uuid::Uuid;

/// Deletion request status enum matching database enum
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type, ToSchema)]
#[sqlx(type_name = "deletion_request_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum DeletionRequestStatus {
    Pending,
    Completed,
}

impl std::fmt::Display for DeletionRequestStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DeletionRequestStatus::Pending => write!(f, "pending"),
            DeletionRequestStatus::Completed => write!(f, "completed"),
        }
    }
}

/// Database model for an erasure request
///
/// Kept without a foreign key so the audit trail outlives the session
/// row it refers to.
#[derive(Debug, Clone, FromRow)]
pub struct DeletionRequest {
    pub id: Uuid,
    pub session_id: Uuid,
    pub status: DeletionRequestStatus,
    pub requested_at: DateTime<Utc>,
    pub processed_at: Option<DateTime<Utc>>,
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use utoipa::ToSchema;
use uuid::Uuid;

/// Payment status enum matching database enum
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type, ToSchema)]
#[sqlx(type_name = "payment_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    Paid,
    Failed,
}

impl PaymentStatus {
    /// Terminal statuses are never overwritten once reached
    pub fn is_terminal(&self) -> bool {
        matches!(self, PaymentStatus::Paid | PaymentStatus::Failed)
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaymentStatus::Pending => write!(f, "pending"),
            PaymentStatus::Paid => write!(f, "paid"),
            PaymentStatus::Failed => write!(f, "failed"),
        }
    }
}

/// Generation status enum matching database enum
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type, ToSchema)]
#[sqlx(type_name = "generation_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum GenerationStatus {
    NotStarted,
    InProgress,
    Completed,
    Failed,
}

impl std::fmt::Display for GenerationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GenerationStatus::NotStarted => write!(f, "not_started"),
            GenerationStatus::InProgress => write!(f, "in_progress"),
            GenerationStatus::Completed => write!(f, "completed"),
            GenerationStatus::Failed => write!(f, "failed"),
        }
    }
}

/// Database model for a visitor session
///
/// A session is the unit of data retention: consents, the uploaded selfie,
/// payment state and generation state all hang off it, and the whole row
/// is removed at `expires_at`.
#[derive(Debug, Clone, FromRow)]
pub struct Session {
    pub id: Uuid,
    pub data_consent: bool,
    pub cookie_consent: bool,
    pub marketing_consent: bool,
    pub upload_key: Option<String>,
    pub upload_filename: Option<String>,
    pub upload_content_type: Option<String>,
    pub upload_size_bytes: Option<i64>,
    pub payment_status: PaymentStatus,
    pub checkout_ref: Option<String>,
    pub generation_status: GenerationStatus,
    pub generation_job_id: Option<String>,
    pub generated_key: Option<String>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    pub fn is_expired(&self) -> bool {
        self.expires_at <= Utc::now()
    }
}

/// Consent flags captured when a session is created
#[derive(Debug, Clone, Copy)]
pub struct ConsentFlags {
    pub data_consent: bool,
    pub cookie_consent: bool,
    pub marketing_consent: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payment_status_terminality() {
        assert!(!PaymentStatus::Pending.is_terminal());
        assert!(PaymentStatus::Paid.is_terminal());
        assert!(PaymentStatus::Failed.is_terminal());
    }

    #[test]
    fn test_status_display_matches_database_enum() {
        assert_eq!(PaymentStatus::Pending.to_string(), "pending");
        assert_eq!(GenerationStatus::NotStarted.to_string(), "not_started");
        assert_eq!(GenerationStatus::InProgress.to_string(), "in_progress");
    }
}

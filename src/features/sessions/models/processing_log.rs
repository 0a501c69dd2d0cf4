use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

/// Database model for a processing activity record
///
/// Every handling of personal data gets one row stating what was done,
/// for which purpose and under which legal basis.
#[derive(Debug, Clone, FromRow)]
pub struct ProcessingLog {
    pub id: Uuid,
    pub session_id: Uuid,
    pub action: String,
    pub purpose: String,
    pub legal_basis: String,
    /// Comma-joined list of data categories touched by the action
    pub data_types: String,
    pub logged_at: DateTime<Utc>,
}

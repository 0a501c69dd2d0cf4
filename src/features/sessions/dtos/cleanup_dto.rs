use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Statistics from one retention sweep
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CleanupStatsDto {
    pub expired_sessions_deleted: u64,
    pub orphaned_files_deleted: u64,
    pub executed_at: DateTime<Utc>,
}

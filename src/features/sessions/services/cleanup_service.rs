use std::sync::Arc;

use chrono::Utc;

use crate::core::error::Result;
use crate::features::sessions::dtos::CleanupStatsDto;
use crate::features::sessions::services::SessionService;
use crate::modules::storage::MinIOClient;
use crate::shared::constants::{GENERATED_PREFIX, UPLOADS_PREFIX};
use crate::shared::validation::session_id_from_key;

/// Service for the retention sweep
///
/// Removes expired sessions and any stored blobs whose session row is
/// gone. Invoked by the background sweeper and the internal trigger
/// endpoint.
pub struct CleanupService {
    sessions: Arc<SessionService>,
    storage: Arc<MinIOClient>,
}

impl CleanupService {
    pub fn new(sessions: Arc<SessionService>, storage: Arc<MinIOClient>) -> Self {
        Self { sessions, storage }
    }

    /// Run one full sweep: expired sessions first, then orphaned blobs
    pub async fn sweep(&self) -> Result<CleanupStatsDto> {
        let expired_sessions_deleted = self.sessions.cleanup_expired().await?;
        let orphaned_files_deleted = self.sweep_orphaned_blobs().await?;

        let stats = CleanupStatsDto {
            expired_sessions_deleted,
            orphaned_files_deleted,
            executed_at: Utc::now(),
        };

        tracing::info!(
            expired_sessions = stats.expired_sessions_deleted,
            orphaned_files = stats.orphaned_files_deleted,
            "Retention sweep completed"
        );

        Ok(stats)
    }

    /// Delete blobs whose owning session no longer exists.
    ///
    /// Keys that do not follow the session-key layout are skipped; they
    /// were not written by this application.
    async fn sweep_orphaned_blobs(&self) -> Result<u64> {
        let mut deleted = 0u64;

        for prefix in [UPLOADS_PREFIX, GENERATED_PREFIX] {
            let keys = match self.storage.list_prefix(&format!("{}/", prefix)).await {
                Ok(keys) => keys,
                Err(e) => {
                    tracing::warn!("Could not list '{}' blobs for orphan sweep: {}", prefix, e);
                    continue;
                }
            };

            for key in keys {
                let Some(session_id) = session_id_from_key(&key) else {
                    continue;
                };

                if self.sessions.get_active_session(session_id).await?.is_some() {
                    continue;
                }

                match self.storage.delete(&key).await {
                    Ok(()) => {
                        tracing::info!("Deleted orphaned blob '{}'", key);
                        deleted += 1;
                    }
                    Err(e) => {
                        tracing::warn!("Could not delete orphaned blob '{}': {}", key, e);
                    }
                }
            }
        }

        Ok(deleted)
    }
}

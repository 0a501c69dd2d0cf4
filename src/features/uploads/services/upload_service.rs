use std::sync::Arc;

use tracing::info;
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::sessions::models::Session;
use crate::features::sessions::services::SessionService;
use crate::features::uploads::dtos::extension_for_content_type;
use crate::modules::storage::MinIOClient;
use crate::shared::constants::UPLOADS_PREFIX;

/// Service for selfie uploads
pub struct UploadService {
    sessions: Arc<SessionService>,
    storage: Arc<MinIOClient>,
}

impl UploadService {
    pub fn new(sessions: Arc<SessionService>, storage: Arc<MinIOClient>) -> Self {
        Self { sessions, storage }
    }

    /// Store the selfie under the session's upload key and attach it
    ///
    /// One upload per session: a second upload overwrites the first,
    /// both in storage (same key) and on the session row.
    pub async fn store_selfie(
        &self,
        session_id: Uuid,
        data: Vec<u8>,
        filename: &str,
        content_type: &str,
    ) -> Result<Session> {
        let extension = extension_for_content_type(content_type).ok_or_else(|| {
            AppError::Validation(format!("Unsupported content type '{}'", content_type))
        })?;

        let size_bytes = data.len() as i64;
        let key = format!("{}/{}.{}", UPLOADS_PREFIX, session_id, extension);

        self.storage.upload(&key, data, content_type).await?;

        let session = self
            .sessions
            .attach_upload(session_id, &key, filename, content_type, size_bytes)
            .await?;

        info!(
            "Stored selfie for session {}: {} ({} bytes)",
            session_id, key, size_bytes
        );

        Ok(session)
    }
}

use std::sync::Arc;

use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::core::retry::RetryPolicy;
use crate::features::generation::clients::{GenerationProvider, JobState};
use crate::features::generation::dtos::GenerationStatusDto;
use crate::features::sessions::models::{GenerationStatus, PaymentStatus, Session};
use crate::features::sessions::services::SessionService;
use crate::modules::storage::MinIOClient;
use crate::shared::constants::GENERATED_PREFIX;

/// Service bridging paid sessions to the image generation provider
pub struct GenerationService {
    sessions: Arc<SessionService>,
    storage: Arc<MinIOClient>,
    provider: Arc<dyn GenerationProvider>,
    retry: RetryPolicy,
}

impl GenerationService {
    pub fn new(
        sessions: Arc<SessionService>,
        storage: Arc<MinIOClient>,
        provider: Arc<dyn GenerationProvider>,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            sessions,
            storage,
            provider,
            retry,
        }
    }

    /// Ship the session's selfie to the provider and start a job
    ///
    /// Invoked asynchronously on the pending-to-paid transition. Sessions
    /// that already carry a job are left alone, so duplicate payment
    /// notifications cannot start a second job.
    pub async fn start_for_session(&self, session_id: Uuid) -> Result<()> {
        let session = self
            .sessions
            .get_active_session(session_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Session not found or expired".to_string()))?;

        if session.payment_status != PaymentStatus::Paid {
            return Err(AppError::BadRequest(
                "Payment required before generation".to_string(),
            ));
        }
        let upload_key = session.upload_key.clone().ok_or_else(|| {
            AppError::BadRequest("No selfie uploaded for this session".to_string())
        })?;
        if session.generation_job_id.is_some() {
            tracing::debug!("Generation already started for session {}", session_id);
            return Ok(());
        }

        let content_type = session
            .upload_content_type
            .clone()
            .unwrap_or_else(|| "image/jpeg".to_string());

        self.sessions
            .record_processing(
                session_id,
                "generation_started",
                "image_generation",
                "contract",
                &["image_data"],
            )
            .await?;

        match self.submit(&upload_key, &content_type).await {
            Ok(job_id) => {
                self.sessions
                    .set_generation_started(session_id, &job_id)
                    .await?;
                tracing::info!(
                    "Generation job {} started for session {}",
                    job_id,
                    session_id
                );
                Ok(())
            }
            Err(e) => {
                self.record_failure(session_id).await?;
                Err(e)
            }
        }
    }

    async fn submit(&self, upload_key: &str, content_type: &str) -> Result<String> {
        let data = self.storage.download(upload_key).await?;

        let source_url = self
            .retry
            .run("fal_upload_source", || {
                self.provider.upload_source(data.clone(), content_type)
            })
            .await?;

        self.retry
            .run("fal_start_job", || self.provider.start_job(&source_url))
            .await
    }

    /// Current generation state for the session
    ///
    /// Terminal states answer from the row; only in-progress sessions hit
    /// the provider. Completion downloads and stores the result before
    /// answering, so the presigned URL always points at our own bucket.
    pub async fn poll_for_session(&self, session_id: Uuid) -> Result<GenerationStatusDto> {
        let session = self
            .sessions
            .get_active_session(session_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Session not found or expired".to_string()))?;

        match session.generation_status {
            GenerationStatus::NotStarted => Ok(GenerationStatusDto::not_started()),
            GenerationStatus::Failed => Ok(GenerationStatusDto::failed(None)),
            GenerationStatus::Completed => self.completed_view(&session).await,
            GenerationStatus::InProgress => self.poll_provider(&session).await,
        }
    }

    async fn completed_view(&self, session: &Session) -> Result<GenerationStatusDto> {
        let generated_key = session.generated_key.as_deref().ok_or_else(|| {
            AppError::Internal("Completed session has no generated image".to_string())
        })?;

        let url = self.storage.get_presigned_url(generated_key).await?;
        Ok(GenerationStatusDto::completed(url))
    }

    async fn poll_provider(&self, session: &Session) -> Result<GenerationStatusDto> {
        let job_id = session.generation_job_id.clone().ok_or_else(|| {
            AppError::Internal("In-progress session has no generation job".to_string())
        })?;

        let status = self
            .retry
            .run("fal_poll_job", || self.provider.poll_job(&job_id))
            .await?;

        match status.state {
            JobState::Queued | JobState::InProgress => Ok(GenerationStatusDto::in_progress()),
            JobState::Completed => {
                let result_url = status.result_url.ok_or_else(|| {
                    AppError::ExternalServiceError(
                        "Completed job carried no result URL".to_string(),
                    )
                })?;

                let key = self.store_result(session.id, &result_url).await?;
                let url = self.storage.get_presigned_url(&key).await?;
                Ok(GenerationStatusDto::completed(url))
            }
            JobState::Failed => {
                tracing::warn!(
                    "Generation job {} failed for session {}: {:?}",
                    job_id,
                    session.id,
                    status.error
                );
                self.record_failure(session.id).await?;
                Ok(GenerationStatusDto::failed(status.error))
            }
        }
    }

    async fn store_result(&self, session_id: Uuid, result_url: &str) -> Result<String> {
        let bytes = self
            .retry
            .run("fal_fetch_result", || self.provider.fetch_result(result_url))
            .await?;

        let key = format!("{}/{}.jpg", GENERATED_PREFIX, session_id);
        self.storage.upload(&key, bytes, "image/jpeg").await?;

        self.sessions
            .set_generation_completed(session_id, &key)
            .await?;
        self.sessions
            .record_processing(
                session_id,
                "generation_completed",
                "image_generation",
                "contract",
                &["generated_image_data"],
            )
            .await?;
        self.sessions
            .record_processing(
                session_id,
                "generated_image_stored",
                "image_delivery",
                "contract",
                &["generated_image_file"],
            )
            .await?;

        tracing::info!(
            "Generated image stored for session {} at {}",
            session_id,
            key
        );

        Ok(key)
    }

    async fn record_failure(&self, session_id: Uuid) -> Result<()> {
        self.sessions.set_generation_failed(session_id).await?;
        self.sessions
            .record_processing(
                session_id,
                "generation_failed",
                "error_tracking",
                "legitimate_interest",
                &["error_data"],
            )
            .await
    }
}

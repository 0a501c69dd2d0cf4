use std::sync::Arc;

use chrono::{Duration, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::sessions::models::{
    ConsentFlags, DeletionRequest, GenerationStatus, PaymentStatus, ProcessingLog, Session,
};
use crate::modules::storage::MinIOClient;
use crate::shared::constants::RETENTION_HOURS;

/// Outcome of comparing a stored payment status against an incoming one
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PaymentTransition {
    /// The update may be written
    Apply,
    /// Same terminal status delivered again; acknowledge without writing
    Duplicate,
    /// A different terminal status is already recorded; keep it
    Conflict,
}

fn classify_payment_transition(current: PaymentStatus, incoming: PaymentStatus) -> PaymentTransition {
    if current.is_terminal() {
        if current == incoming {
            PaymentTransition::Duplicate
        } else {
            PaymentTransition::Conflict
        }
    } else {
        PaymentTransition::Apply
    }
}

/// Service for session lifecycle operations
///
/// Owns the sessions, processing_logs and deletion_requests tables.
/// Other services mutate session state only through this service.
pub struct SessionService {
    pool: PgPool,
    storage: Arc<MinIOClient>,
}

impl SessionService {
    pub fn new(pool: PgPool, storage: Arc<MinIOClient>) -> Self {
        Self { pool, storage }
    }

    /// Create a session with automatic expiry
    ///
    /// Refuses to create a session without data and cookie consent; there
    /// is nothing lawful to store for such a visitor.
    pub async fn create_session(
        &self,
        consents: ConsentFlags,
        ip_address: Option<String>,
        user_agent: Option<String>,
    ) -> Result<Session> {
        if !consents.data_consent || !consents.cookie_consent {
            return Err(AppError::Validation(
                "Data and cookie consent are required".to_string(),
            ));
        }

        let expires_at = Utc::now() + Duration::hours(RETENTION_HOURS);

        let session = sqlx::query_as::<_, Session>(
            r#"
            INSERT INTO sessions (data_consent, cookie_consent, marketing_consent, ip_address, user_agent, expires_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(consents.data_consent)
        .bind(consents.cookie_consent)
        .bind(consents.marketing_consent)
        .bind(&ip_address)
        .bind(&user_agent)
        .bind(expires_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to create session: {:?}", e);
            AppError::Database(e)
        })?;

        self.record_processing(
            session.id,
            "session_created",
            "user_session_management",
            "consent",
            &["session_data", "consent_preferences", "image_data"],
        )
        .await?;

        tracing::info!("Session created: {} (expires {})", session.id, session.expires_at);
        Ok(session)
    }

    /// Get a session only if it has not expired yet
    ///
    /// Expired-but-unswept rows are reported as absent.
    pub async fn get_active_session(&self, session_id: Uuid) -> Result<Option<Session>> {
        sqlx::query_as::<_, Session>(
            "SELECT * FROM sessions WHERE id = $1 AND expires_at > NOW()",
        )
        .bind(session_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to get session {}: {:?}", session_id, e);
            AppError::Database(e)
        })
    }

    /// Attach an uploaded selfie to an active session
    pub async fn attach_upload(
        &self,
        session_id: Uuid,
        key: &str,
        filename: &str,
        content_type: &str,
        size_bytes: i64,
    ) -> Result<Session> {
        let session = sqlx::query_as::<_, Session>(
            r#"
            UPDATE sessions
            SET upload_key = $2, upload_filename = $3, upload_content_type = $4, upload_size_bytes = $5
            WHERE id = $1 AND expires_at > NOW()
            RETURNING *
            "#,
        )
        .bind(session_id)
        .bind(key)
        .bind(filename)
        .bind(content_type)
        .bind(size_bytes)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to attach upload to session {}: {:?}", session_id, e);
            AppError::Database(e)
        })?
        .ok_or_else(|| AppError::NotFound("Session not found or expired".to_string()))?;

        self.record_processing(
            session_id,
            "file_uploaded",
            "ai_generation_service",
            "consent",
            &["image_data"],
        )
        .await?;

        Ok(session)
    }

    /// Update payment state from checkout creation, verification or webhook
    ///
    /// Terminal statuses are immutable: a repeated delivery of the same
    /// terminal status is acknowledged without a write, and a conflicting
    /// terminal status is logged and ignored. A transition to paid extends
    /// the session's retention window.
    pub async fn update_payment_status(
        &self,
        session_id: Uuid,
        checkout_ref: &str,
        status: PaymentStatus,
    ) -> Result<Session> {
        // Deliberately no expiry filter: a checkout can settle after the
        // session window lapsed and the terminal status must still land.
        let current = sqlx::query_as::<_, Session>("SELECT * FROM sessions WHERE id = $1")
            .bind(session_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to load session {}: {:?}", session_id, e);
                AppError::Database(e)
            })?
            .ok_or_else(|| AppError::NotFound("Session not found".to_string()))?;

        match classify_payment_transition(current.payment_status, status) {
            PaymentTransition::Duplicate => {
                tracing::debug!(
                    "Duplicate payment status {} for session {}, ignoring",
                    status,
                    session_id
                );
                return Ok(current);
            }
            PaymentTransition::Conflict => {
                tracing::warn!(
                    "Conflicting payment status {} for session {} (already {}), keeping recorded status",
                    status,
                    session_id,
                    current.payment_status
                );
                return Ok(current);
            }
            PaymentTransition::Apply => {}
        }

        // Guard on the pending status so racing updates cannot overwrite a
        // terminal state that landed in between.
        let updated = if status == PaymentStatus::Paid {
            let extended = Utc::now() + Duration::hours(RETENTION_HOURS);
            sqlx::query_as::<_, Session>(
                r#"
                UPDATE sessions
                SET payment_status = $2, checkout_ref = $3, expires_at = $4
                WHERE id = $1 AND payment_status = 'pending'
                RETURNING *
                "#,
            )
            .bind(session_id)
            .bind(status)
            .bind(checkout_ref)
            .bind(extended)
            .fetch_optional(&self.pool)
            .await
        } else {
            sqlx::query_as::<_, Session>(
                r#"
                UPDATE sessions
                SET payment_status = $2, checkout_ref = $3
                WHERE id = $1 AND payment_status = 'pending'
                RETURNING *
                "#,
            )
            .bind(session_id)
            .bind(status)
            .bind(checkout_ref)
            .fetch_optional(&self.pool)
            .await
        }
        .map_err(|e| {
            tracing::error!(
                "Failed to update payment status for session {}: {:?}",
                session_id,
                e
            );
            AppError::Database(e)
        })?;

        let session = match updated {
            Some(session) => session,
            None => {
                // Lost a race against another delivery; return what won.
                tracing::warn!(
                    "Payment status update for session {} raced a concurrent write",
                    session_id
                );
                return sqlx::query_as::<_, Session>("SELECT * FROM sessions WHERE id = $1")
                    .bind(session_id)
                    .fetch_one(&self.pool)
                    .await
                    .map_err(|e| {
                        tracing::error!("Failed to reload session {}: {:?}", session_id, e);
                        AppError::Database(e)
                    });
            }
        };

        // Pending applies (storing the checkout reference) are not payment
        // events; only the settled payment is audited.
        if status == PaymentStatus::Paid {
            self.record_processing(
                session_id,
                "payment_processed",
                "payment_processing",
                "contract",
                &["payment_info", "session_data"],
            )
            .await?;
        }

        tracing::info!(
            "Payment status for session {} set to {} (ref {})",
            session_id,
            status,
            checkout_ref
        );
        Ok(session)
    }

    /// Record that generation was submitted to the provider
    pub async fn set_generation_started(&self, session_id: Uuid, job_id: &str) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE sessions
            SET generation_status = $2, generation_job_id = $3
            WHERE id = $1
            "#,
        )
        .bind(session_id)
        .bind(GenerationStatus::InProgress)
        .bind(job_id)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!(
                "Failed to mark generation started for session {}: {:?}",
                session_id,
                e
            );
            AppError::Database(e)
        })?;

        Ok(())
    }

    /// Record the stored result of a completed generation
    pub async fn set_generation_completed(&self, session_id: Uuid, generated_key: &str) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE sessions
            SET generation_status = $2, generated_key = $3
            WHERE id = $1
            "#,
        )
        .bind(session_id)
        .bind(GenerationStatus::Completed)
        .bind(generated_key)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!(
                "Failed to mark generation completed for session {}: {:?}",
                session_id,
                e
            );
            AppError::Database(e)
        })?;

        Ok(())
    }

    /// Record a failed generation attempt
    pub async fn set_generation_failed(&self, session_id: Uuid) -> Result<()> {
        sqlx::query("UPDATE sessions SET generation_status = $2 WHERE id = $1")
            .bind(session_id)
            .bind(GenerationStatus::Failed)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!(
                    "Failed to mark generation failed for session {}: {:?}",
                    session_id,
                    e
                );
                AppError::Database(e)
            })?;

        Ok(())
    }

    /// Append a processing activity record (transparency ledger)
    pub async fn record_processing(
        &self,
        session_id: Uuid,
        action: &str,
        purpose: &str,
        legal_basis: &str,
        data_types: &[&str],
    ) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO processing_logs (session_id, action, purpose, legal_basis, data_types)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(session_id)
        .bind(action)
        .bind(purpose)
        .bind(legal_basis)
        .bind(data_types.join(","))
        .execute(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!(
                "Failed to record processing log for session {}: {:?}",
                session_id,
                e
            );
            AppError::Database(e)
        })?;

        Ok(())
    }

    /// Latest processing activities, newest first, capped at ten
    pub async fn recent_activity(&self, session_id: Uuid) -> Result<Vec<ProcessingLog>> {
        sqlx::query_as::<_, ProcessingLog>(
            r#"
            SELECT * FROM processing_logs
            WHERE session_id = $1
            ORDER BY logged_at DESC
            LIMIT 10
            "#,
        )
        .bind(session_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!(
                "Failed to list recent activity for session {}: {:?}",
                session_id,
                e
            );
            AppError::Database(e)
        })
    }

    /// Every processing activity for the session, newest first
    ///
    /// The data export must be complete, so unlike `recent_activity`
    /// this is not capped.
    pub async fn list_activity(&self, session_id: Uuid) -> Result<Vec<ProcessingLog>> {
        sqlx::query_as::<_, ProcessingLog>(
            r#"
            SELECT * FROM processing_logs
            WHERE session_id = $1
            ORDER BY logged_at DESC
            "#,
        )
        .bind(session_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!(
                "Failed to list activity for session {}: {:?}",
                session_id,
                e
            );
            AppError::Database(e)
        })
    }

    /// Record an erasure request before executing it
    pub async fn request_deletion(&self, session_id: Uuid) -> Result<DeletionRequest> {
        let request = sqlx::query_as::<_, DeletionRequest>(
            r#"
            INSERT INTO deletion_requests (session_id)
            VALUES ($1)
            RETURNING *
            "#,
        )
        .bind(session_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!(
                "Failed to create deletion request for session {}: {:?}",
                session_id,
                e
            );
            AppError::Database(e)
        })?;

        self.record_processing(
            session_id,
            "deletion_requested",
            "gdpr_compliance",
            "legal_obligation",
            &["all_session_data"],
        )
        .await?;

        Ok(request)
    }

    /// Look up a deletion request by id
    pub async fn get_deletion_request(&self, id: Uuid) -> Result<Option<DeletionRequest>> {
        sqlx::query_as::<_, DeletionRequest>("SELECT * FROM deletion_requests WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to get deletion request {}: {:?}", id, e);
                AppError::Database(e)
            })
    }

    /// Erase a session: row, log entries (cascade) and stored blobs.
    ///
    /// The row delete claims the session, so two concurrent calls cannot
    /// both proceed; the loser sees nothing to delete and returns false.
    /// Blob deletion is best-effort: failures are logged and the orphan
    /// sweep picks the blobs up later.
    pub async fn execute_deletion(&self, session_id: Uuid) -> Result<bool> {
        let claimed = sqlx::query_as::<_, Session>(
            "DELETE FROM sessions WHERE id = $1 RETURNING *",
        )
        .bind(session_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to delete session {}: {:?}", session_id, e);
            AppError::Database(e)
        })?;

        let session = match claimed {
            Some(session) => session,
            None => {
                tracing::debug!("Session {} already gone, nothing to delete", session_id);
                return Ok(false);
            }
        };

        for key in [&session.upload_key, &session.generated_key]
            .into_iter()
            .flatten()
        {
            if let Err(e) = self.storage.delete(key).await {
                tracing::warn!(
                    "Could not delete blob '{}' for session {}: {}",
                    key,
                    session_id,
                    e
                );
            }
        }

        sqlx::query(
            r#"
            UPDATE deletion_requests
            SET status = 'completed', processed_at = NOW()
            WHERE session_id = $1 AND status = 'pending'
            "#,
        )
        .bind(session_id)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!(
                "Failed to complete deletion requests for session {}: {:?}",
                session_id,
                e
            );
            AppError::Database(e)
        })?;

        tracing::info!("Session {} erased", session_id);
        Ok(true)
    }

    /// Delete every expired session, returning how many were removed
    pub async fn cleanup_expired(&self) -> Result<u64> {
        let expired: Vec<Uuid> =
            sqlx::query_scalar("SELECT id FROM sessions WHERE expires_at < NOW()")
                .fetch_all(&self.pool)
                .await
                .map_err(|e| {
                    tracing::error!("Failed to list expired sessions: {:?}", e);
                    AppError::Database(e)
                })?;

        if !expired.is_empty() {
            tracing::info!("Retention sweep found {} expired sessions", expired.len());
        }

        let mut deleted = 0u64;
        for session_id in expired {
            if self.execute_deletion(session_id).await? {
                deleted += 1;
            }
        }

        Ok(deleted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pending_transitions_apply() {
        assert_eq!(
            classify_payment_transition(PaymentStatus::Pending, PaymentStatus::Paid),
            PaymentTransition::Apply
        );
        assert_eq!(
            classify_payment_transition(PaymentStatus::Pending, PaymentStatus::Failed),
            PaymentTransition::Apply
        );
        assert_eq!(
            classify_payment_transition(PaymentStatus::Pending, PaymentStatus::Pending),
            PaymentTransition::Apply
        );
    }

    #[test]
    fn test_repeated_terminal_status_is_duplicate() {
        assert_eq!(
            classify_payment_transition(PaymentStatus::Paid, PaymentStatus::Paid),
            PaymentTransition::Duplicate
        );
        assert_eq!(
            classify_payment_transition(PaymentStatus::Failed, PaymentStatus::Failed),
            PaymentTransition::Duplicate
        );
    }

    #[test]
    fn test_terminal_status_never_changes() {
        assert_eq!(
            classify_payment_transition(PaymentStatus::Paid, PaymentStatus::Failed),
            PaymentTransition::Conflict
        );
        assert_eq!(
            classify_payment_transition(PaymentStatus::Failed, PaymentStatus::Paid),
            PaymentTransition::Conflict
        );
        assert_eq!(
            classify_payment_transition(PaymentStatus::Paid, PaymentStatus::Pending),
            PaymentTransition::Conflict
        );
    }
}

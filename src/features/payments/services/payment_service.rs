use std::sync::Arc;

use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::core::retry::RetryPolicy;
use crate::features::generation::GenerationService;
use crate::features::payments::clients::{verify_webhook_signature, Checkout, CheckoutProvider};
use crate::features::payments::dtos::{PaymentVerificationDto, WebhookAckDto};
use crate::features::sessions::models::PaymentStatus;
use crate::features::sessions::services::SessionService;

/// Webhook event payload, parsed only after signature verification
#[derive(Debug, Deserialize)]
struct WebhookEvent {
    #[serde(rename = "type")]
    event_type: String,
    data: WebhookEventData,
}

#[derive(Debug, Deserialize)]
struct WebhookEventData {
    object: WebhookObject,
}

#[derive(Debug, Deserialize)]
struct WebhookObject {
    id: String,
    #[serde(default)]
    metadata: Option<WebhookMetadata>,
}

#[derive(Debug, Deserialize)]
struct WebhookMetadata {
    #[serde(default)]
    session_id: Option<String>,
}

/// Service bridging sessions to the hosted checkout provider
pub struct PaymentService {
    sessions: Arc<SessionService>,
    generation: Arc<GenerationService>,
    provider: Arc<dyn CheckoutProvider>,
    retry: RetryPolicy,
    webhook_secret: String,
}

impl PaymentService {
    pub fn new(
        sessions: Arc<SessionService>,
        generation: Arc<GenerationService>,
        provider: Arc<dyn CheckoutProvider>,
        retry: RetryPolicy,
        webhook_secret: String,
    ) -> Self {
        Self {
            sessions,
            generation,
            provider,
            retry,
            webhook_secret,
        }
    }

    /// Open a hosted checkout for an active, consenting session
    ///
    /// Paid and failed are terminal: neither accepts a new checkout, so a
    /// settled session can never be charged twice.
    pub async fn create_checkout(&self, session_id: Uuid) -> Result<Checkout> {
        let session = self
            .sessions
            .get_active_session(session_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Session not found or expired".to_string()))?;

        if !session.data_consent {
            return Err(AppError::BadRequest(
                "Data consent required for payment processing".to_string(),
            ));
        }
        if session.payment_status == PaymentStatus::Paid {
            return Err(AppError::BadRequest("Session already paid".to_string()));
        }
        if session.payment_status == PaymentStatus::Failed {
            return Err(AppError::BadRequest(
                "Payment already failed for this session".to_string(),
            ));
        }

        let checkout = self
            .retry
            .run("stripe_create_checkout", || {
                self.provider.create_checkout(session_id)
            })
            .await?;

        self.sessions
            .update_payment_status(session_id, &checkout.id, PaymentStatus::Pending)
            .await?;

        Ok(checkout)
    }

    /// Confirm a checkout after the client returns from the provider
    ///
    /// Answers from the local row when already settled; otherwise asks the
    /// provider and promotes to paid when it reports settlement. When the
    /// provider is unreachable the local status is the answer.
    pub async fn verify_payment(
        &self,
        session_id: Uuid,
        checkout_ref: &str,
    ) -> Result<(PaymentVerificationDto, &'static str)> {
        let session = self
            .sessions
            .get_active_session(session_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Session not found or expired".to_string()))?;

        if session.checkout_ref.as_deref() != Some(checkout_ref) {
            return Err(AppError::Unauthorized("Session mismatch".to_string()));
        }

        if session.payment_status == PaymentStatus::Paid {
            return Ok((
                PaymentVerificationDto {
                    confirmed: true,
                    payment_status: PaymentStatus::Paid,
                },
                "Payment confirmed",
            ));
        }

        let provider_status = self
            .retry
            .run("stripe_retrieve_checkout", || {
                self.provider.retrieve_checkout(checkout_ref)
            })
            .await;

        match provider_status {
            Ok(status) if status.paid => {
                let updated = self
                    .sessions
                    .update_payment_status(session_id, checkout_ref, PaymentStatus::Paid)
                    .await?;
                if updated.payment_status == PaymentStatus::Paid {
                    self.spawn_generation(updated.id);
                }

                Ok((
                    PaymentVerificationDto {
                        confirmed: true,
                        payment_status: PaymentStatus::Paid,
                    },
                    "Payment confirmed",
                ))
            }
            Ok(status) => {
                tracing::debug!(
                    "Checkout {} not settled yet (provider reports {})",
                    checkout_ref,
                    status.payment_status
                );
                Ok((
                    PaymentVerificationDto {
                        confirmed: false,
                        payment_status: session.payment_status,
                    },
                    "Payment not completed",
                ))
            }
            Err(e) => {
                tracing::warn!(
                    "Checkout verification unavailable for {}: {:?}",
                    checkout_ref,
                    e
                );
                Ok((
                    PaymentVerificationDto {
                        confirmed: false,
                        payment_status: session.payment_status,
                    },
                    "Payment verification pending",
                ))
            }
        }
    }

    /// Apply a provider webhook event
    ///
    /// The raw body is verified before anything is parsed. Events without a
    /// usable session id are acknowledged with a warning so provider
    /// retries stop; database failures propagate so at-least-once delivery
    /// retries them.
    pub async fn handle_webhook(
        &self,
        signature: Option<&str>,
        payload: &[u8],
    ) -> Result<WebhookAckDto> {
        let signature = signature.ok_or(AppError::InvalidSignature)?;
        verify_webhook_signature(
            &self.webhook_secret,
            signature,
            payload,
            Utc::now().timestamp(),
        )?;

        let event: WebhookEvent = serde_json::from_slice(payload).map_err(|e| {
            tracing::warn!("Webhook payload did not parse: {}", e);
            AppError::BadRequest("Invalid webhook payload".to_string())
        })?;

        let status = match event.event_type.as_str() {
            "checkout.session.completed" => Some(PaymentStatus::Paid),
            "checkout.session.expired" => Some(PaymentStatus::Failed),
            "payment_intent.payment_failed" => Some(PaymentStatus::Failed),
            other => {
                tracing::debug!("Ignoring webhook event type {}", other);
                None
            }
        };

        if let Some(status) = status {
            let object = event.data.object;
            let session_id = object
                .metadata
                .as_ref()
                .and_then(|m| m.session_id.as_deref())
                .and_then(|raw| Uuid::parse_str(raw).ok());

            match session_id {
                Some(session_id) => {
                    self.apply_webhook_status(session_id, &object.id, status)
                        .await?;
                }
                None => {
                    tracing::warn!(
                        "Webhook event {} carried no usable session id, acknowledging",
                        event.event_type
                    );
                }
            }
        }

        Ok(WebhookAckDto { received: true })
    }

    async fn apply_webhook_status(
        &self,
        session_id: Uuid,
        checkout_ref: &str,
        status: PaymentStatus,
    ) -> Result<()> {
        match self
            .sessions
            .update_payment_status(session_id, checkout_ref, status)
            .await
        {
            Ok(updated) => {
                if status == PaymentStatus::Paid
                    && updated.payment_status == PaymentStatus::Paid
                {
                    self.spawn_generation(updated.id);
                }
                Ok(())
            }
            Err(AppError::NotFound(_)) => {
                // The session may be swept already; retries will not help.
                tracing::warn!(
                    "Webhook for unknown session {}, acknowledging",
                    session_id
                );
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    /// Kick off generation without holding up the caller
    ///
    /// Duplicate kicks are harmless: the generation service refuses
    /// sessions that already carry a job.
    fn spawn_generation(&self, session_id: Uuid) {
        let generation = self.generation.clone();
        tokio::spawn(async move {
            if let Err(e) = generation.start_for_session(session_id).await {
                tracing::error!(
                    "Generation kick-off failed for session {}: {:?}",
                    session_id,
                    e
                );
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use async_trait::async_trait;

    use crate::core::error::Result;
    use crate::features::generation::clients::{GenerationProvider, JobStatus};
    use crate::features::payments::clients::CheckoutStatus;
    use crate::modules::storage::MinIOClient;
    use crate::shared::test_helpers::{lazy_test_pool, test_minio_config, test_retry_config};

    struct UnreachableCheckout;

    #[async_trait]
    impl CheckoutProvider for UnreachableCheckout {
        async fn create_checkout(&self, _session_id: Uuid) -> Result<Checkout> {
            panic!("provider must not be called");
        }

        async fn retrieve_checkout(&self, _checkout_ref: &str) -> Result<CheckoutStatus> {
            panic!("provider must not be called");
        }
    }

    struct UnreachableGeneration;

    #[async_trait]
    impl GenerationProvider for UnreachableGeneration {
        async fn upload_source(&self, _data: Vec<u8>, _content_type: &str) -> Result<String> {
            panic!("provider must not be called");
        }

        async fn start_job(&self, _source_url: &str) -> Result<String> {
            panic!("provider must not be called");
        }

        async fn poll_job(&self, _job_id: &str) -> Result<JobStatus> {
            panic!("provider must not be called");
        }

        async fn fetch_result(&self, _result_url: &str) -> Result<Vec<u8>> {
            panic!("provider must not be called");
        }
    }

    fn test_service() -> PaymentService {
        let storage = Arc::new(MinIOClient::new(test_minio_config()).unwrap());
        let sessions = Arc::new(SessionService::new(lazy_test_pool(), storage.clone()));
        let generation = Arc::new(GenerationService::new(
            sessions.clone(),
            storage,
            Arc::new(UnreachableGeneration),
            RetryPolicy::new(test_retry_config()),
        ));
        PaymentService::new(
            sessions,
            generation,
            Arc::new(UnreachableCheckout),
            RetryPolicy::new(test_retry_config()),
            "whsec_test_secret".to_string(),
        )
    }

    #[tokio::test]
    async fn test_webhook_without_signature_is_rejected() {
        let service = test_service();

        let result = service.handle_webhook(None, b"{}").await;
        assert!(matches!(result, Err(AppError::InvalidSignature)));
    }

    #[tokio::test]
    async fn test_webhook_with_bad_signature_is_rejected_before_parsing() {
        let service = test_service();

        // Junk payload: it must never be parsed when the signature fails.
        let result = service
            .handle_webhook(Some("t=1,v1=deadbeef"), b"not even json")
            .await;
        assert!(matches!(result, Err(AppError::InvalidSignature)));
    }
}

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;
use subtle::ConstantTimeEq;
use uuid::Uuid;

use crate::core::config::StripeConfig;
use crate::core::error::{AppError, Result};

type HmacSha256 = Hmac<Sha256>;

/// Product shown on the hosted checkout page
const PRODUCT_NAME: &str = "AI Selfie Enhancement";
const PRODUCT_DESCRIPTION: &str = "Professional AI selfie enhancement with GDPR compliance";

/// Hosted checkout expires if unpaid after 30 minutes
const CHECKOUT_EXPIRY_SECS: i64 = 30 * 60;

/// Maximum accepted age of a webhook signature timestamp
const SIGNATURE_TOLERANCE_SECS: i64 = 5 * 60;

/// Hosted checkout created at the provider
#[derive(Debug, Clone)]
pub struct Checkout {
    pub id: String,
    pub url: String,
}

/// Payment state the provider reports for a checkout
#[derive(Debug, Clone)]
pub struct CheckoutStatus {
    pub paid: bool,
    pub payment_status: String,
}

/// Hosted checkout provider contract
#[async_trait]
pub trait CheckoutProvider: Send + Sync {
    /// Create a hosted checkout for the given app session
    async fn create_checkout(&self, session_id: Uuid) -> Result<Checkout>;

    /// Fetch the current payment state of a checkout
    async fn retrieve_checkout(&self, checkout_ref: &str) -> Result<CheckoutStatus>;
}

/// Checkout session payload returned by the Stripe API
#[derive(Debug, Deserialize)]
struct CheckoutSessionResponse {
    id: String,
    url: Option<String>,
    payment_status: Option<String>,
}

/// Stripe Checkout over the plain REST API
///
/// Requests are form-encoded with the bracketed key syntax the API
/// expects; no SDK involved.
pub struct StripeClient {
    client: reqwest::Client,
    config: StripeConfig,
    frontend_url: String,
}

impl StripeClient {
    pub fn new(config: StripeConfig, frontend_url: String) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(Duration::from_secs(config.request_timeout_secs))
                .build()
                .expect("Failed to build HTTP client"),
            config,
            frontend_url,
        }
    }

    async fn read_checkout_response(
        &self,
        response: reqwest::Response,
        operation: &str,
    ) -> Result<CheckoutSessionResponse> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!("Stripe {} returned {}: {}", operation, status, body);
            if status.is_client_error() {
                // 4xx means our request or credentials are wrong; retrying
                // would send the same rejected request again.
                return Err(AppError::Internal(format!(
                    "Payment provider rejected the {} request",
                    operation
                )));
            }
            return Err(AppError::ExternalServiceError(format!(
                "Stripe {} returned {}",
                operation, status
            )));
        }

        response.json().await.map_err(|e| {
            tracing::error!("Failed to parse Stripe {} response: {:?}", operation, e);
            AppError::ExternalServiceError(format!("Failed to parse {} response: {}", operation, e))
        })
    }
}

#[async_trait]
impl CheckoutProvider for StripeClient {
    async fn create_checkout(&self, session_id: Uuid) -> Result<Checkout> {
        let success_url = format!(
            "{}/payment/success?session_id={{CHECKOUT_SESSION_ID}}&app_session={}",
            self.frontend_url, session_id
        );
        let cancel_url = format!(
            "{}/payment/cancel?app_session={}",
            self.frontend_url, session_id
        );
        let expires_at = Utc::now().timestamp() + CHECKOUT_EXPIRY_SECS;

        let params: Vec<(&str, String)> = vec![
            ("mode", "payment".to_string()),
            ("payment_method_types[0]", "card".to_string()),
            (
                "line_items[0][price_data][currency]",
                self.config.currency.clone(),
            ),
            (
                "line_items[0][price_data][product_data][name]",
                PRODUCT_NAME.to_string(),
            ),
            (
                "line_items[0][price_data][product_data][description]",
                PRODUCT_DESCRIPTION.to_string(),
            ),
            (
                "line_items[0][price_data][unit_amount]",
                self.config.price_cents.to_string(),
            ),
            ("line_items[0][quantity]", "1".to_string()),
            ("success_url", success_url),
            ("cancel_url", cancel_url),
            ("metadata[session_id]", session_id.to_string()),
            ("metadata[service]", "selfie_generation".to_string()),
            ("metadata[gdpr_consent]", "true".to_string()),
            ("expires_at", expires_at.to_string()),
        ];

        let response = self
            .client
            .post(format!("{}/v1/checkout/sessions", self.config.api_base_url))
            .bearer_auth(&self.config.secret_key)
            .form(&params)
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Stripe checkout creation request failed: {:?}", e);
                AppError::ExternalServiceError(format!("Checkout creation failed: {}", e))
            })?;

        let checkout = self
            .read_checkout_response(response, "checkout creation")
            .await?;

        let url = checkout.url.ok_or_else(|| {
            tracing::error!("Stripe checkout {} carried no URL", checkout.id);
            AppError::ExternalServiceError("Checkout response carried no URL".to_string())
        })?;

        tracing::info!(
            "Created checkout {} for session {}",
            checkout.id,
            session_id
        );

        Ok(Checkout {
            id: checkout.id,
            url,
        })
    }

    async fn retrieve_checkout(&self, checkout_ref: &str) -> Result<CheckoutStatus> {
        let response = self
            .client
            .get(format!(
                "{}/v1/checkout/sessions/{}",
                self.config.api_base_url, checkout_ref
            ))
            .bearer_auth(&self.config.secret_key)
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Stripe checkout retrieval request failed: {:?}", e);
                AppError::ExternalServiceError(format!("Checkout retrieval failed: {}", e))
            })?;

        let checkout = self
            .read_checkout_response(response, "checkout retrieval")
            .await?;

        let payment_status = checkout
            .payment_status
            .unwrap_or_else(|| "unknown".to_string());

        Ok(CheckoutStatus {
            paid: payment_status == "paid",
            payment_status,
        })
    }
}

/// Verify a `Stripe-Signature` header against the raw request body
///
/// Scheme: `t=<unix>,v1=<hex>`, signed payload `"{t}.{body}"` under
/// HMAC-SHA256 with the webhook secret. Every rejection returns the same
/// error so the check cannot be probed for which step failed.
pub fn verify_webhook_signature(
    secret: &str,
    header: &str,
    payload: &[u8],
    now: i64,
) -> Result<()> {
    let mut timestamp: Option<&str> = None;
    let mut signature: Option<&str> = None;

    for part in header.split(',') {
        match part.trim().split_once('=') {
            Some(("t", value)) => timestamp = Some(value),
            Some(("v1", value)) => signature = Some(value),
            _ => {}
        }
    }

    let timestamp = timestamp.ok_or(AppError::InvalidSignature)?;
    let signature = signature.ok_or(AppError::InvalidSignature)?;

    let ts: i64 = timestamp.parse().map_err(|_| AppError::InvalidSignature)?;
    if (now - ts).abs() > SIGNATURE_TOLERANCE_SECS {
        return Err(AppError::InvalidSignature);
    }

    let provided = hex::decode(signature).map_err(|_| AppError::InvalidSignature)?;

    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).map_err(|_| AppError::InvalidSignature)?;
    mac.update(timestamp.as_bytes());
    mac.update(b".");
    mac.update(payload);
    let expected = mac.finalize().into_bytes();

    if bool::from(expected.as_slice().ct_eq(provided.as_slice())) {
        Ok(())
    } else {
        Err(AppError::InvalidSignature)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "whsec_test_secret";

    fn sign(secret: &str, timestamp: i64, payload: &[u8]) -> String {
        let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).unwrap();
        mac.update(timestamp.to_string().as_bytes());
        mac.update(b".");
        mac.update(payload);
        hex::encode(mac.finalize().into_bytes())
    }

    #[test]
    fn test_valid_signature_is_accepted() {
        let payload = br#"{"type":"checkout.session.completed"}"#;
        let now = 1_700_000_000;
        let header = format!("t={},v1={}", now, sign(SECRET, now, payload));

        assert!(verify_webhook_signature(SECRET, &header, payload, now).is_ok());
    }

    #[test]
    fn test_tampered_payload_is_rejected() {
        let now = 1_700_000_000;
        let header = format!("t={},v1={}", now, sign(SECRET, now, b"original"));

        let result = verify_webhook_signature(SECRET, &header, b"tampered", now);
        assert!(matches!(result, Err(AppError::InvalidSignature)));
    }

    #[test]
    fn test_wrong_secret_is_rejected() {
        let payload = b"payload";
        let now = 1_700_000_000;
        let header = format!("t={},v1={}", now, sign("whsec_other", now, payload));

        let result = verify_webhook_signature(SECRET, &header, payload, now);
        assert!(matches!(result, Err(AppError::InvalidSignature)));
    }

    #[test]
    fn test_stale_timestamp_is_rejected() {
        let payload = b"payload";
        let signed_at = 1_700_000_000;
        let header = format!("t={},v1={}", signed_at, sign(SECRET, signed_at, payload));

        // Six minutes later the signature itself still matches but the
        // timestamp falls outside the tolerance window.
        let result =
            verify_webhook_signature(SECRET, &header, payload, signed_at + 6 * 60);
        assert!(matches!(result, Err(AppError::InvalidSignature)));
    }

    #[test]
    fn test_malformed_headers_are_rejected() {
        let payload = b"payload";
        let now = 1_700_000_000;

        for header in [
            "",
            "t=123",
            "v1=abcdef",
            "t=notanumber,v1=abcdef",
            "t=123,v1=not-hex!",
            "signature-without-structure",
        ] {
            let result = verify_webhook_signature(SECRET, header, payload, now);
            assert!(
                matches!(result, Err(AppError::InvalidSignature)),
                "header {:?} should be rejected",
                header
            );
        }
    }
}

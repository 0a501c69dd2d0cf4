use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::features::sessions::models::PaymentStatus;

/// Request to open a hosted checkout for a session
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreatePaymentRequestDto {
    pub session_id: Uuid,
}

/// Hosted checkout handed back to the client
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutResponseDto {
    /// URL the client is redirected to for payment
    pub payment_url: String,
    /// Provider-side checkout reference, echoed back on verification
    pub checkout_ref: String,
}

/// Request to confirm a checkout after the client returns
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VerifyPaymentRequestDto {
    pub session_id: Uuid,
    #[validate(length(min = 1, message = "Checkout reference is required"))]
    pub checkout_ref: String,
}

/// Verification result for a checkout
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PaymentVerificationDto {
    /// Whether the payment is confirmed settled
    pub confirmed: bool,
    /// Payment status recorded on the session after verification
    pub payment_status: PaymentStatus,
}

/// Webhook acknowledgment, returned flat so provider retries stop
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct WebhookAckDto {
    pub received: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verify_request_requires_checkout_ref() {
        let dto = VerifyPaymentRequestDto {
            session_id: Uuid::new_v4(),
            checkout_ref: "cs_test_123".to_string(),
        };
        assert!(dto.validate().is_ok());

        let empty = VerifyPaymentRequestDto {
            session_id: Uuid::new_v4(),
            checkout_ref: String::new(),
        };
        assert!(empty.validate().is_err());
    }
}

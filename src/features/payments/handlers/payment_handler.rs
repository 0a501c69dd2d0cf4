use axum::{extract::State, Json};
use validator::Validate;

use crate::core::error::{AppError, Result};
use crate::core::extractor::AppJson;
use crate::features::payments::dtos::{
    CheckoutResponseDto, CreatePaymentRequestDto, PaymentVerificationDto, VerifyPaymentRequestDto,
};
use crate::features::payments::handlers::PaymentState;
use crate::shared::types::ApiResponse;

/// Create a hosted checkout for a session
///
/// The session must be active, carry data consent, and not be settled.
#[utoipa::path(
    post,
    path = "/api/payment-session",
    request_body = CreatePaymentRequestDto,
    responses(
        (status = 200, description = "Checkout created", body = ApiResponse<CheckoutResponseDto>),
        (status = 400, description = "Consent missing or session already settled"),
        (status = 404, description = "Session not found or expired"),
        (status = 502, description = "Payment provider unavailable")
    ),
    tag = "payments"
)]
pub async fn create_payment_session(
    State(state): State<PaymentState>,
    AppJson(dto): AppJson<CreatePaymentRequestDto>,
) -> Result<Json<ApiResponse<CheckoutResponseDto>>> {
    let checkout = state.payments.create_checkout(dto.session_id).await?;

    Ok(Json(ApiResponse::success(
        Some(CheckoutResponseDto {
            payment_url: checkout.url,
            checkout_ref: checkout.id,
        }),
        Some("Payment session created".to_string()),
    )))
}

/// Confirm payment status for a session
///
/// Used by the success page when the client returns from checkout before
/// the webhook lands.
#[utoipa::path(
    post,
    path = "/api/verify-payment",
    request_body = VerifyPaymentRequestDto,
    responses(
        (status = 200, description = "Verification result", body = ApiResponse<PaymentVerificationDto>),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Checkout reference does not belong to the session"),
        (status = 404, description = "Session not found or expired")
    ),
    tag = "payments"
)]
pub async fn verify_payment(
    State(state): State<PaymentState>,
    AppJson(dto): AppJson<VerifyPaymentRequestDto>,
) -> Result<Json<ApiResponse<PaymentVerificationDto>>> {
    dto.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let (verification, message) = state
        .payments
        .verify_payment(dto.session_id, &dto.checkout_ref)
        .await?;

    Ok(Json(ApiResponse::success(
        Some(verification),
        Some(message.to_string()),
    )))
}

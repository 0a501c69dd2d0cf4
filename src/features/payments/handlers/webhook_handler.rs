use axum::{body::Bytes, extract::State, http::HeaderMap, Json};

use crate::core::error::Result;
use crate::features::payments::dtos::WebhookAckDto;
use crate::features::payments::handlers::PaymentState;

/// Receive payment status callbacks from the provider
///
/// The body stays raw: the signature covers the exact bytes on the wire,
/// so any parsing happens after verification inside the service.
#[utoipa::path(
    post,
    path = "/api/webhooks/payment",
    request_body(content = String, content_type = "application/json"),
    responses(
        (status = 200, description = "Event acknowledged", body = WebhookAckDto),
        (status = 400, description = "Signature verification failed")
    ),
    tag = "payments"
)]
pub async fn payment_webhook(
    State(state): State<PaymentState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<WebhookAckDto>> {
    let signature = headers.get("stripe-signature").and_then(|v| v.to_str().ok());

    let ack = state.payments.handle_webhook(signature, &body).await?;

    Ok(Json(ack))
}

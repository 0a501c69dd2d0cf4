use std::sync::Arc;

use axum::{routing::post, Router};

use crate::features::payments::handlers::{self, PaymentState};
use crate::features::payments::services::PaymentService;

/// Create routes for the payments feature
pub fn routes(payments: Arc<PaymentService>) -> Router {
    let state = PaymentState { payments };

    Router::new()
        .route(
            "/api/payment-session",
            post(handlers::create_payment_session),
        )
        .route("/api/verify-payment", post(handlers::verify_payment))
        .route("/api/webhooks/payment", post(handlers::payment_webhook))
        .with_state(state)
}

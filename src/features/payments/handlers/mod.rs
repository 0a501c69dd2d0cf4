use std::sync::Arc;

use crate::features::payments::services::PaymentService;

pub mod payment_handler;
pub mod webhook_handler;

pub use payment_handler::{
    __path_create_payment_session, __path_verify_payment, create_payment_session, verify_payment,
};
pub use webhook_handler::{__path_payment_webhook, payment_webhook};

/// State for payment handlers
#[derive(Clone)]
pub struct PaymentState {
    pub payments: Arc<PaymentService>,
}

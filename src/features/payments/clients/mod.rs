mod stripe_client;

pub use stripe_client::{
    verify_webhook_signature, Checkout, CheckoutProvider, CheckoutStatus, StripeClient,
};

//! Payments feature module
//!
//! Bridges sessions to the hosted checkout provider (Stripe): opens
//! checkouts, confirms settlement, and applies signed webhook callbacks.
//! A settled payment kicks off image generation asynchronously.
//!
//! ## Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | POST | `/api/payment-session` | Create a hosted checkout |
//! | POST | `/api/verify-payment` | Confirm payment after checkout |
//! | POST | `/api/webhooks/payment` | Signed provider callbacks |

pub mod clients;
pub mod dtos;
pub mod handlers;
pub mod routes;
pub mod services;

pub use services::PaymentService;

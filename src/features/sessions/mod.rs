//! Session lifecycle, consent and privacy rights.
//!
//! A session is created when the visitor saves consent preferences and
//! is the anchor for everything else: the uploaded selfie, the payment
//! state and the generation state. Sessions expire 24 hours after
//! creation and are erased by the retention sweeper, or immediately on
//! user request.
//!
//! ## Endpoints
//!
//! | Method | Endpoint | Auth | Description |
//! |--------|----------|------|-------------|
//! | POST | `/api/consent` | No | Save consent preferences, start a session |
//! | GET | `/api/consent` | Cookie | Current consent status and activity |
//! | GET | `/api/data-export` | Cookie | Download all held data as JSON |
//! | POST | `/api/delete` | Cookie | Erase the session immediately |
//! | GET | `/api/delete` | No | Status of an erasure request |
//! | POST | `/api/internal/cleanup` | Bearer | Trigger a retention sweep |

pub mod dtos;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod services;
pub mod workers;

pub use services::{CleanupService, SessionService};

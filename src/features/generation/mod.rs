//! Generation feature module
//!
//! Bridges paid sessions to the external image generation API (fal.ai):
//! ships the stored selfie to the provider, tracks the job, and stores
//! the enhanced result under the `generated/` prefix for presigned
//! delivery. Jobs start asynchronously when a payment settles.
//!
//! ## Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | GET | `/api/generation-status` | Generation progress / result URL |

pub mod clients;
pub mod dtos;
pub mod handlers;
pub mod routes;
pub mod services;

pub use services::GenerationService;

//! Uploads feature module
//!
//! Receives selfie uploads, validates type and size, and stores the image
//! in MinIO under the owning session's key. Uploading without a session
//! cookie opens a session from the consent fields on the form.
//!
//! ## Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | POST | `/api/upload` | Upload a selfie for AI generation |

pub mod dtos;
pub mod handlers;
pub mod routes;
pub mod services;

pub use services::UploadService;

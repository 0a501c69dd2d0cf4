use std::sync::Arc;

use crate::features::sessions::services::SessionService;
use crate::features::uploads::services::UploadService;

pub mod upload_handler;

pub use upload_handler::{__path_upload_selfie, upload_selfie};

/// State for upload handlers
#[derive(Clone)]
pub struct UploadState {
    pub sessions: Arc<SessionService>,
    pub uploads: Arc<UploadService>,
    /// Whether issued cookies carry the Secure attribute
    pub cookie_secure: bool,
}

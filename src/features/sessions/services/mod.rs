mod cleanup_service;
mod session_service;

pub use cleanup_service::CleanupService;
pub use session_service::SessionService;

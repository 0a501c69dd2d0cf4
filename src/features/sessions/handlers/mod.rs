use std::sync::Arc;

use crate::features::sessions::services::{CleanupService, SessionService};
use crate::shared::constants::{SESSION_COOKIE_MAX_AGE_SECS, SESSION_COOKIE_NAME};

pub mod cleanup_handler;
pub mod consent_handler;
pub mod privacy_handler;

pub use cleanup_handler::{__path_trigger_cleanup, trigger_cleanup};
pub use consent_handler::{
    __path_consent_status, __path_save_consent, consent_status, save_consent,
};
pub use privacy_handler::{
    __path_delete_session_data, __path_deletion_status, __path_export_data, delete_session_data,
    deletion_status, export_data,
};

/// State for session handlers
#[derive(Clone)]
pub struct SessionState {
    pub sessions: Arc<SessionService>,
    pub cleanup: Arc<CleanupService>,
    /// Whether issued cookies carry the Secure attribute
    pub cookie_secure: bool,
    /// Token expected by the internal cleanup trigger
    pub cleanup_bearer_token: String,
}

/// Build the session cookie header value
pub(crate) fn session_cookie(session_id: uuid::Uuid, secure: bool) -> String {
    let mut cookie = format!(
        "{}={}; Max-Age={}; Path=/; HttpOnly; SameSite=Strict",
        SESSION_COOKIE_NAME, session_id, SESSION_COOKIE_MAX_AGE_SECS
    );
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}

/// Cookie header value that removes the session cookie
pub(crate) fn clear_session_cookie() -> String {
    format!(
        "{}=; Max-Age=0; Path=/; HttpOnly; SameSite=Strict",
        SESSION_COOKIE_NAME
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_cookie_attributes() {
        let id = uuid::Uuid::new_v4();

        let insecure = session_cookie(id, false);
        assert!(insecure.starts_with(&format!("gdpr-session={}", id)));
        assert!(insecure.contains("HttpOnly"));
        assert!(insecure.contains("SameSite=Strict"));
        assert!(insecure.contains("Max-Age=86400"));
        assert!(!insecure.contains("Secure"));

        let secure = session_cookie(id, true);
        assert!(secure.ends_with("; Secure"));
    }

    #[test]
    fn test_clear_cookie_expires_immediately() {
        let cleared = clear_session_cookie();
        assert!(cleared.starts_with("gdpr-session=;"));
        assert!(cleared.contains("Max-Age=0"));
    }
}

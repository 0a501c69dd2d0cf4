use lazy_static::lazy_static;
use regex::Regex;
use uuid::Uuid;

lazy_static! {
    /// Regex for session-scoped storage keys
    /// Matches `uploads/{uuid}.{ext}` and `generated/{uuid}.{ext}`
    /// - Valid: "uploads/0192b1c0-6f4e-7a31-bd1e-6a3f2a9c1d55.jpg"
    /// - Invalid: "uploads/not-a-uuid.jpg", "temp/abc.jpg", "uploads/x/y.jpg"
    pub static ref STORAGE_KEY_REGEX: Regex = Regex::new(
        r"^(?:uploads|generated)/([0-9a-f]{8}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{12})\.[a-z0-9]+$"
    ).unwrap();

    /// Regex for the optional erasure-request reason
    /// Accepts only the reasons the consent UI offers
    pub static ref DELETION_REASON_REGEX: Regex =
        Regex::new(r"^(no_longer_needed|withdraw_consent|unlawful_processing|other)$").unwrap();
}

/// Extract the owning session id from a storage key.
///
/// Used by the orphan sweep to map blobs back to session rows.
/// Keys that do not follow the session-key layout yield `None` and are
/// left untouched by the sweep.
pub fn session_id_from_key(key: &str) -> Option<Uuid> {
    STORAGE_KEY_REGEX
        .captures(key)
        .and_then(|caps| caps.get(1))
        .and_then(|m| Uuid::parse_str(m.as_str()).ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_key_regex_valid() {
        assert!(STORAGE_KEY_REGEX.is_match("uploads/0192b1c0-6f4e-7a31-bd1e-6a3f2a9c1d55.jpg"));
        assert!(STORAGE_KEY_REGEX.is_match("generated/0192b1c0-6f4e-7a31-bd1e-6a3f2a9c1d55.png"));
        assert!(STORAGE_KEY_REGEX.is_match("uploads/a3bb189e-8bf9-3888-9912-ace4e6543002.webp"));
    }

    #[test]
    fn test_storage_key_regex_invalid() {
        assert!(!STORAGE_KEY_REGEX.is_match("uploads/not-a-uuid.jpg")); // malformed uuid
        assert!(!STORAGE_KEY_REGEX.is_match("temp/a3bb189e-8bf9-3888-9912-ace4e6543002.jpg")); // unknown prefix
        assert!(!STORAGE_KEY_REGEX.is_match("uploads/a3bb189e-8bf9-3888-9912-ace4e6543002")); // no extension
        assert!(!STORAGE_KEY_REGEX.is_match("uploads/x/a3bb189e-8bf9-3888-9912-ace4e6543002.jpg")); // nested path
        assert!(!STORAGE_KEY_REGEX.is_match("")); // empty
    }

    #[test]
    fn test_session_id_from_key() {
        let id = session_id_from_key("uploads/a3bb189e-8bf9-3888-9912-ace4e6543002.jpg");
        assert_eq!(
            id,
            Some(Uuid::parse_str("a3bb189e-8bf9-3888-9912-ace4e6543002").unwrap())
        );

        assert_eq!(session_id_from_key("uploads/readme.txt"), None);
        assert_eq!(session_id_from_key("generated/.jpg"), None);
    }
}

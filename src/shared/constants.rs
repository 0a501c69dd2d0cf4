/// Data retention window for every session (GDPR storage limitation)
pub const RETENTION_HOURS: i64 = 24;

/// Name of the session cookie issued on consent
pub const SESSION_COOKIE_NAME: &str = "gdpr-session";

/// Session cookie lifetime, matches the retention window
pub const SESSION_COOKIE_MAX_AGE_SECS: i64 = 24 * 60 * 60;

// =============================================================================
// STORAGE KEY PREFIXES
// =============================================================================

/// Object-storage prefix for user-uploaded selfies
pub const UPLOADS_PREFIX: &str = "uploads";

/// Object-storage prefix for AI-generated results
pub const GENERATED_PREFIX: &str = "generated";

// =============================================================================
// GDPR COPY
// =============================================================================

/// Retention statement echoed in consent and export responses
pub const DATA_RETENTION_STATEMENT: &str = "24 hours";

/// Rights listed in the consent response (GDPR Art. 13 transparency)
pub const GDPR_RIGHTS: &[&str] = &[
    "Right to access your data",
    "Right to rectification",
    "Right to erasure (deletion)",
    "Right to data portability",
    "Right to object to processing",
];

/// Data categories listed in the deletion confirmation
pub const DELETED_DATA_CATEGORIES: &[&str] = &[
    "Session information",
    "Uploaded images",
    "Generated images",
    "Payment session data",
    "Processing logs",
];

/// Data controller contact block for the data export
pub const DATA_CONTROLLER_NAME: &str = "AI Selfie Generator";
pub const DATA_CONTROLLER_EMAIL: &str = "privacy@aiselfiegenerator.com";
pub const DATA_CONTROLLER_DPO_EMAIL: &str = "dpo@aiselfiegenerator.com";

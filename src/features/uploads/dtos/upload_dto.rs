use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Upload request DTO for OpenAPI documentation
/// Note: This struct is for Swagger UI documentation only.
/// The actual handler uses axum's Multipart extractor directly.
#[derive(Debug, ToSchema)]
#[allow(dead_code)]
pub struct UploadRequestDto {
    /// The selfie to upload
    #[schema(format = Binary, content_media_type = "application/octet-stream")]
    pub file: String,
    /// "true" to grant data consent when no session exists yet
    #[schema(example = "true")]
    pub data_consent: Option<String>,
    /// "true" to grant cookie consent when no session exists yet
    #[schema(example = "true")]
    pub cookie_consent: Option<String>,
    /// "true" to grant marketing consent
    #[schema(example = "false")]
    pub marketing_consent: Option<String>,
}

/// Response DTO for a stored upload
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponseDto {
    pub session_id: Uuid,
    pub filename: String,
    pub content_type: String,
    pub size_bytes: i64,
}

/// Allowed MIME types for selfie uploads
pub const ALLOWED_MIME_TYPES: &[&str] = &[
    "image/jpeg",
    "image/jpg",
    "image/png",
    "image/gif",
    "image/webp",
];

/// Maximum file size in bytes (10MB)
pub const MAX_FILE_SIZE: usize = 10 * 1024 * 1024;

/// Check if a MIME type is allowed
pub fn is_mime_type_allowed(content_type: &str) -> bool {
    ALLOWED_MIME_TYPES.contains(&content_type)
}

/// Get file extension from content type
pub fn extension_for_content_type(content_type: &str) -> Option<&'static str> {
    match content_type {
        "image/jpeg" | "image/jpg" => Some("jpg"),
        "image/png" => Some("png"),
        "image/gif" => Some("gif"),
        "image/webp" => Some("webp"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mime_type_allowlist() {
        assert!(is_mime_type_allowed("image/jpeg"));
        assert!(is_mime_type_allowed("image/webp"));
        assert!(!is_mime_type_allowed("application/pdf"));
        assert!(!is_mime_type_allowed("image/svg+xml"));
        assert!(!is_mime_type_allowed(""));
    }

    #[test]
    fn test_extension_mapping() {
        assert_eq!(extension_for_content_type("image/jpeg"), Some("jpg"));
        assert_eq!(extension_for_content_type("image/jpg"), Some("jpg"));
        assert_eq!(extension_for_content_type("image/png"), Some("png"));
        assert_eq!(extension_for_content_type("text/plain"), None);
    }
}

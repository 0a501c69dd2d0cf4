use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Envelope for every JSON endpoint except the data export and webhook ack.
///
/// Absent fields are omitted from the wire format rather than sent as
/// null, so clients can key on field presence.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<String>>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: Option<T>, message: Option<String>) -> Self {
        Self {
            success: true,
            data,
            message,
            errors: None,
        }
    }

    pub fn error(message: Option<String>, errors: Option<Vec<String>>) -> ApiResponse<()> {
        ApiResponse {
            success: false,
            data: None,
            message,
            errors,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_envelope_omits_absent_fields() {
        let response = ApiResponse::success(Some(7), None);
        let json = serde_json::to_value(&response).unwrap();

        assert_eq!(json, serde_json::json!({"success": true, "data": 7}));
    }

    #[test]
    fn test_error_envelope_carries_message_and_errors() {
        let response =
            ApiResponse::<()>::error(Some("bad".to_string()), Some(vec!["bad".to_string()]));
        let json = serde_json::to_value(&response).unwrap();

        assert_eq!(
            json,
            serde_json::json!({"success": false, "message": "bad", "errors": ["bad"]})
        );
    }
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::features::sessions::dtos::ProcessingActivityDto;
use crate::features::sessions::models::{
    DeletionRequest, DeletionRequestStatus, GenerationStatus, PaymentStatus, ProcessingLog,
    Session,
};
use crate::shared::constants::{
    DATA_CONTROLLER_DPO_EMAIL, DATA_CONTROLLER_EMAIL, DATA_CONTROLLER_NAME,
    DELETED_DATA_CATEGORIES,
};
use crate::shared::validation::DELETION_REASON_REGEX;

/// Request DTO for an erasure request
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DeleteRequestDto {
    /// Session to erase; must match the caller's session cookie
    pub session_id: Uuid,

    /// Optional reason for the request
    #[validate(regex(
        path = *DELETION_REASON_REGEX,
        message = "reason must be one of: no_longer_needed, withdraw_consent, unlawful_processing, other"
    ))]
    pub reason: Option<String>,
}

/// Response DTO confirming an executed erasure
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DeleteResponseDto {
    pub deleted_data: Vec<String>,
    pub deletion_id: Uuid,
    pub deleted_at: DateTime<Utc>,
}

impl DeleteResponseDto {
    pub fn new(deletion_id: Uuid) -> Self {
        Self {
            deleted_data: DELETED_DATA_CATEGORIES
                .iter()
                .map(|c| c.to_string())
                .collect(),
            deletion_id,
            deleted_at: Utc::now(),
        }
    }
}

/// Response DTO for deletion request lookup
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DeletionStatusDto {
    pub id: Uuid,
    pub session_id: Uuid,
    pub status: DeletionRequestStatus,
    pub requested_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub processed_at: Option<DateTime<Utc>>,
}

impl From<DeletionRequest> for DeletionStatusDto {
    fn from(req: DeletionRequest) -> Self {
        Self {
            id: req.id,
            session_id: req.session_id,
            status: req.status,
            requested_at: req.requested_at,
            processed_at: req.processed_at,
        }
    }
}

/// Machine-readable export of everything held for one session.
///
/// Served as a JSON attachment; intentionally not wrapped in the API
/// envelope so the downloaded file stands on its own.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DataExportDto {
    pub data_export: DataExportBodyDto,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DataExportBodyDto {
    pub export_date: DateTime<Utc>,
    pub session_id: Uuid,
    pub data_retention: String,
    pub session_data: ExportSessionDataDto,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_data: Option<ExportPaymentDataDto>,
    pub generation_data: ExportGenerationDataDto,
    pub processing_activities: Vec<ExportProcessingActivityDto>,
    pub your_rights: ExportRightsDto,
    pub data_controller: DataControllerDto,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ExportSessionDataDto {
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub data_consent: bool,
    pub cookie_consent: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ExportPaymentDataDto {
    pub payment_status: PaymentStatus,
    pub checkout_ref: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ExportGenerationDataDto {
    pub status: GenerationStatus,
}

/// Processing activity entry in the export, including touched data types
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ExportProcessingActivityDto {
    pub action: String,
    pub purpose: String,
    pub legal_basis: String,
    pub data_types: String,
    pub timestamp: DateTime<Utc>,
}

impl From<ProcessingLog> for ExportProcessingActivityDto {
    fn from(log: ProcessingLog) -> Self {
        Self {
            action: log.action,
            purpose: log.purpose,
            legal_basis: log.legal_basis,
            data_types: log.data_types,
            timestamp: log.logged_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ExportRightsDto {
    pub right_to_access: String,
    pub right_to_rectification: String,
    pub right_to_erasure: String,
    pub right_to_portability: String,
    pub right_to_object: String,
    pub right_to_withdraw_consent: String,
}

impl ExportRightsDto {
    pub fn standard() -> Self {
        Self {
            right_to_access: "You can access your personal data".to_string(),
            right_to_rectification: "You can correct inaccurate personal data".to_string(),
            right_to_erasure: "You can request deletion of your data".to_string(),
            right_to_portability: "You can export your data (this export)".to_string(),
            right_to_object: "You can object to processing".to_string(),
            right_to_withdraw_consent: "You can withdraw consent at any time".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DataControllerDto {
    pub name: String,
    pub email: String,
    pub data_protection_officer: String,
}

impl DataControllerDto {
    pub fn standard() -> Self {
        Self {
            name: DATA_CONTROLLER_NAME.to_string(),
            email: DATA_CONTROLLER_EMAIL.to_string(),
            data_protection_officer: DATA_CONTROLLER_DPO_EMAIL.to_string(),
        }
    }
}

impl DataExportDto {
    /// Assemble the export from a session row and its processing logs
    pub fn from_session(session: &Session, logs: Vec<ProcessingLog>) -> Self {
        let payment_data = session.checkout_ref.as_ref().map(|r| ExportPaymentDataDto {
            payment_status: session.payment_status,
            checkout_ref: r.clone(),
        });

        Self {
            data_export: DataExportBodyDto {
                export_date: Utc::now(),
                session_id: session.id,
                data_retention: "24 hours from creation".to_string(),
                session_data: ExportSessionDataDto {
                    created_at: session.created_at,
                    expires_at: session.expires_at,
                    data_consent: session.data_consent,
                    cookie_consent: session.cookie_consent,
                },
                payment_data,
                generation_data: ExportGenerationDataDto {
                    status: session.generation_status,
                },
                processing_activities: logs
                    .into_iter()
                    .map(ExportProcessingActivityDto::from)
                    .collect(),
                your_rights: ExportRightsDto::standard(),
                data_controller: DataControllerDto::standard(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delete_reason_validation() {
        let valid = DeleteRequestDto {
            session_id: Uuid::new_v4(),
            reason: Some("withdraw_consent".to_string()),
        };
        assert!(valid.validate().is_ok());

        let absent = DeleteRequestDto {
            session_id: Uuid::new_v4(),
            reason: None,
        };
        assert!(absent.validate().is_ok());

        let invalid = DeleteRequestDto {
            session_id: Uuid::new_v4(),
            reason: Some("because".to_string()),
        };
        assert!(invalid.validate().is_err());
    }
}

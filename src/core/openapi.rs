use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::features::generation::{dtos as generation_dtos, handlers as generation_handlers};
use crate::features::payments::{dtos as payments_dtos, handlers as payments_handlers};
use crate::features::sessions::{
    dtos as sessions_dtos, handlers as sessions_handlers, models as sessions_models,
};
use crate::features::uploads::{dtos as uploads_dtos, handlers as uploads_handlers};
use crate::shared::types::ApiResponse;

#[derive(OpenApi)]
#[openapi(
    paths(
        // Consent
        sessions_handlers::save_consent,
        sessions_handlers::consent_status,
        // Uploads
        uploads_handlers::upload_selfie,
        // Payments
        payments_handlers::create_payment_session,
        payments_handlers::verify_payment,
        payments_handlers::payment_webhook,
        // Generation
        generation_handlers::generation_status,
        // Privacy (GDPR)
        sessions_handlers::export_data,
        sessions_handlers::delete_session_data,
        sessions_handlers::deletion_status,
        // Internal
        sessions_handlers::trigger_cleanup,
    ),
    components(
        schemas(
            // Session models
            sessions_models::PaymentStatus,
            sessions_models::GenerationStatus,
            sessions_models::DeletionRequestStatus,
            // Consent
            sessions_dtos::ConsentRequestDto,
            sessions_dtos::ConsentResponseDto,
            sessions_dtos::ConsentSnapshotDto,
            sessions_dtos::ProcessingActivityDto,
            sessions_dtos::ConsentStatusDto,
            ApiResponse<sessions_dtos::ConsentResponseDto>,
            ApiResponse<sessions_dtos::ConsentStatusDto>,
            // Privacy
            sessions_dtos::DeleteRequestDto,
            sessions_dtos::DeleteResponseDto,
            sessions_dtos::DeletionStatusDto,
            sessions_dtos::DataExportDto,
            sessions_dtos::DataExportBodyDto,
            sessions_dtos::ExportSessionDataDto,
            sessions_dtos::ExportPaymentDataDto,
            sessions_dtos::ExportGenerationDataDto,
            sessions_dtos::ExportProcessingActivityDto,
            sessions_dtos::ExportRightsDto,
            sessions_dtos::DataControllerDto,
            ApiResponse<sessions_dtos::DeleteResponseDto>,
            ApiResponse<sessions_dtos::DeletionStatusDto>,
            // Cleanup
            sessions_dtos::CleanupStatsDto,
            ApiResponse<sessions_dtos::CleanupStatsDto>,
            // Uploads
            uploads_dtos::UploadRequestDto,
            uploads_dtos::UploadResponseDto,
            ApiResponse<uploads_dtos::UploadResponseDto>,
            // Payments
            payments_dtos::CreatePaymentRequestDto,
            payments_dtos::CheckoutResponseDto,
            payments_dtos::VerifyPaymentRequestDto,
            payments_dtos::PaymentVerificationDto,
            payments_dtos::WebhookAckDto,
            ApiResponse<payments_dtos::CheckoutResponseDto>,
            ApiResponse<payments_dtos::PaymentVerificationDto>,
            // Generation
            generation_dtos::GenerationStatusDto,
            ApiResponse<generation_dtos::GenerationStatusDto>,
        )
    ),
    tags(
        (name = "consent", description = "Consent capture and status"),
        (name = "uploads", description = "Selfie upload and session bootstrap"),
        (name = "payments", description = "Hosted checkout and payment webhooks"),
        (name = "generation", description = "AI generation status and result delivery"),
        (name = "privacy", description = "GDPR data export and erasure"),
        (name = "internal", description = "Operational endpoints (bearer token)"),
    ),
    modifiers(&SecurityAddon),
    info(
        title = "Lumishot API",
        version = "0.1.0",
        description = "API documentation for Lumishot",
    )
)]
pub struct ApiDoc;

/// Adds the bearer security scheme used by internal endpoints
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new().scheme(HttpAuthScheme::Bearer).build(),
                ),
            );
        }
    }
}

/// Modifier to override OpenAPI info from config
pub struct SwaggerInfoModifier {
    pub title: String,
    pub version: String,
    pub description: String,
}

impl Modify for SwaggerInfoModifier {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        openapi.info.title = self.title.clone();
        openapi.info.version = self.version.clone();
        openapi.info.description = Some(self.description.clone());
    }
}

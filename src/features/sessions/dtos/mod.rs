mod cleanup_dto;
mod consent_dto;
mod privacy_dto;

pub use cleanup_dto::CleanupStatsDto;
pub use consent_dto::{
    ConsentRequestDto, ConsentResponseDto, ConsentSnapshotDto, ConsentStatusDto,
    ProcessingActivityDto,
};
pub use privacy_dto::{
    DataControllerDto, DataExportBodyDto, DataExportDto, DeleteRequestDto, DeleteResponseDto,
    DeletionStatusDto, ExportGenerationDataDto, ExportPaymentDataDto, ExportProcessingActivityDto,
    ExportRightsDto, ExportSessionDataDto,
};

mod upload_dto;

pub use upload_dto::{
    extension_for_content_type, is_mime_type_allowed, UploadRequestDto, UploadResponseDto,
    ALLOWED_MIME_TYPES, MAX_FILE_SIZE,
};

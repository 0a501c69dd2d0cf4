mod deletion_request;
mod processing_log;
mod session;

pub use deletion_request::{DeletionRequest, DeletionRequestStatus};
pub use processing_log::ProcessingLog;
pub use session::{ConsentFlags, GenerationStatus, PaymentStatus, Session};

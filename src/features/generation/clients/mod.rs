mod fal_client;

pub use fal_client::{FalClient, GenerationProvider, JobState, JobStatus};

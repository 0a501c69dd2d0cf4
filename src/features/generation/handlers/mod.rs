use std::sync::Arc;

use crate::features::generation::services::GenerationService;

pub mod generation_handler;

pub use generation_handler::{__path_generation_status, generation_status};

/// State for generation handlers
#[derive(Clone)]
pub struct GenerationState {
    pub generation: Arc<GenerationService>,
}

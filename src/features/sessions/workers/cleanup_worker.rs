use std::sync::Arc;
use std::time::Duration;
use tokio::time::interval;

use crate::features::sessions::services::CleanupService;

/// Background sweeper enforcing the retention window
///
/// Runs the same sweep as the internal trigger endpoint on a fixed
/// interval. Failures are logged and the loop keeps going; a missed
/// sweep is caught by the next one.
pub struct CleanupWorker {
    cleanup_service: Arc<CleanupService>,
    sweep_interval: Duration,
}

impl CleanupWorker {
    pub fn new(cleanup_service: Arc<CleanupService>, sweep_interval: Duration) -> Self {
        Self {
            cleanup_service,
            sweep_interval,
        }
    }

    /// Run the sweeper in a background loop
    pub async fn run(&self) {
        tracing::info!(
            "Starting retention sweeper (interval {}s)",
            self.sweep_interval.as_secs()
        );

        let mut ticker = interval(self.sweep_interval);

        loop {
            ticker.tick().await;

            if let Err(e) = self.cleanup_service.sweep().await {
                tracing::error!("Retention sweep failed: {:?}", e);
            }
        }
    }
}

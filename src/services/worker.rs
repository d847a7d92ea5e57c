use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::sleep;

use crate::services::storage::StorageService;

/// Timer-driven reaper for stale staged and converted files.
///
/// Runs independently of request handling; there is no lock against
/// in-flight conversions. Correctness relies on the retention window being
/// much larger than any request lives.
pub struct RetentionSweeper {
    storage: Arc<StorageService>,
    max_age: Duration,
    interval: Duration,
    shutdown: watch::Receiver<bool>,
}

impl RetentionSweeper {
    pub fn new(
        storage: Arc<StorageService>,
        max_age: Duration,
        interval: Duration,
        shutdown: watch::Receiver<bool>,
    ) -> Self {
        Self {
            storage,
            max_age,
            interval,
            shutdown,
        }
    }

    pub async fn run(mut self) {
        tracing::info!(
            "🧹 Retention sweeper started (max age {:?}, every {:?})",
            self.max_age,
            self.interval
        );

        loop {
            tokio::select! {
                _ = self.shutdown.changed() => {
                    tracing::info!("🛑 Retention sweeper shutting down");
                    break;
                }
                _ = sleep(self.interval) => {
                    let stats = self.storage.sweep_all(self.max_age).await;
                    if stats.deleted > 0 {
                        tracing::info!(
                            "🧹 Reaped {} of {} files past retention",
                            stats.deleted,
                            stats.scanned
                        );
                    }
                }
            }
        }
    }
}

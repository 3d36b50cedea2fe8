use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::db::RecommendationStore;

/// Handle for stopping the expired-recommendation sweeper
pub struct SweeperHandle {
    shutdown_tx: mpsc::Sender<()>,
    task: JoinHandle<()>,
}

impl SweeperHandle {
    /// Signals the sweeper and waits for it to exit
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(()).await;
        if let Err(e) = self.task.await {
            tracing::error!(error = %e, "Sweeper task ended abnormally");
        }
    }
}

/// Spawns a task deleting expired recommendations every `interval`.
///
/// The first sweep runs immediately. Failures are logged and the next tick
/// tries again.
pub fn spawn_sweeper(store: Arc<dyn RecommendationStore>, interval: Duration) -> SweeperHandle {
    let (shutdown_tx, shutdown_rx) = mpsc::channel(1);
    let task = tokio::spawn(sweeper_task(store, interval, shutdown_rx));
    SweeperHandle { shutdown_tx, task }
}

async fn sweeper_task(
    store: Arc<dyn RecommendationStore>,
    interval: Duration,
    mut shutdown_rx: mpsc::Receiver<()>,
) {
    tracing::info!(interval_secs = interval.as_secs(), "Recommendation sweeper started");

    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                match store.delete_expired().await {
                    Ok(0) => tracing::debug!("No expired recommendations to sweep"),
                    Ok(removed) => tracing::info!(removed, "Swept expired recommendations"),
                    Err(e) => tracing::error!(error = %e, "Failed to sweep expired recommendations"),
                }
            }
            _ = shutdown_rx.recv() => {
                tracing::info!("Recommendation sweeper stopped");
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MockRecommendationStore;
    use crate::error::AppError;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn test_sweeps_immediately_and_stops_on_shutdown() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();

        let mut store = MockRecommendationStore::new();
        store.expect_delete_expired().returning(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(2)
        });

        let handle = spawn_sweeper(Arc::new(store), Duration::from_secs(3600));
        tokio::time::sleep(Duration::from_millis(50)).await;
        handle.shutdown().await;

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failed_sweep_keeps_running() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();

        let mut store = MockRecommendationStore::new();
        store.expect_delete_expired().returning(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Err(AppError::StorageUnavailable(sqlx::Error::PoolTimedOut))
        });

        let handle = spawn_sweeper(Arc::new(store), Duration::from_millis(10));
        tokio::time::sleep(Duration::from_millis(100)).await;
        handle.shutdown().await;

        assert!(calls.load(Ordering::SeqCst) >= 2);
    }
}

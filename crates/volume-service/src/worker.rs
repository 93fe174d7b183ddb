//! Background refresh of the volume snapshot.

use config::RefreshConfig;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::service::VolumeService;

/// Calls [`VolumeService::refresh`] on a fixed interval until cancelled
pub struct RefreshWorker {
    service: Arc<VolumeService>,
    interval: Duration,
    run_on_startup: bool,
}

impl RefreshWorker {
    pub fn new(service: Arc<VolumeService>, config: &RefreshConfig) -> Self {
        Self {
            service,
            interval: Duration::from_secs(config.interval_seconds),
            run_on_startup: config.run_on_startup,
        }
    }

    /// Runs until `shutdown` is cancelled. Refresh failures are logged and
    /// retried on the next tick.
    pub async fn run(self, shutdown: CancellationToken) {
        info!(
            interval_secs = self.interval.as_secs(),
            run_on_startup = self.run_on_startup,
            "Starting refresh worker"
        );

        if self.run_on_startup {
            info!("Running initial refresh...");
            tokio::select! {
                result = self.service.refresh() => {
                    if let Err(e) = result {
                        error!("Initial refresh failed: {}", e);
                    }
                }
                _ = shutdown.cancelled() => {
                    info!("Refresh worker shutting down.");
                    return;
                }
            }
        }

        let mut timer = tokio::time::interval(self.interval);
        timer.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        timer.tick().await; // first tick completes immediately

        loop {
            tokio::select! {
                _ = timer.tick() => {
                    if let Err(e) = self.service.refresh().await {
                        error!("Refresh failed: {}", e);
                    }
                }
                _ = shutdown.cancelled() => {
                    info!("Refresh worker shutting down.");
                    return;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{fixture, service_with};

    fn worker(run_on_startup: bool) -> (RefreshWorker, Arc<sources::StaticSources>, Arc<VolumeService>) {
        let (service, sources) = service_with(fixture());
        let service = Arc::new(service);
        let config = RefreshConfig {
            interval_seconds: 60,
            run_on_startup,
        };
        (RefreshWorker::new(service.clone(), &config), sources, service)
    }

    #[tokio::test(start_paused = true)]
    async fn test_refreshes_on_startup_and_each_interval() {
        let (worker, sources, service) = worker(true);
        let shutdown = CancellationToken::new();
        let handle = tokio::spawn(worker.run(shutdown.clone()));

        tokio::time::sleep(Duration::from_secs(125)).await;
        shutdown.cancel();
        handle.await.unwrap();

        assert_eq!(sources.exchange_fetches(), 3);
        assert!(service.snapshot().is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_waits_for_first_tick_without_startup_run() {
        let (worker, sources, service) = worker(false);
        let shutdown = CancellationToken::new();
        let handle = tokio::spawn(worker.run(shutdown.clone()));

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(sources.exchange_fetches(), 0);
        assert!(service.snapshot().is_none());

        shutdown.cancel();
        handle.await.unwrap();
    }
}

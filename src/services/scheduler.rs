//! Background tasks: periodic ingestion and expired-entry purge.

use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval};
use tracing::{error, info};

use crate::services::ingestion::Ingestor;
use crate::store::TrackerStore;

/// Configuration for the background tasks.
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Builds fetched per ingestion batch
    pub ingest_limit: usize,
    /// How often to ingest (in seconds); 0 disables scheduled ingestion
    pub ingest_interval_secs: u64,
    /// How often to purge expired store entries (in seconds); 0 disables purging
    pub purge_interval_secs: u64,
}

/// Handles of the spawned tasks.
#[derive(Debug, Default)]
pub struct SchedulerHandles {
    pub ingestion: Option<JoinHandle<()>>,
    pub purge: Option<JoinHandle<()>>,
}

impl SchedulerHandles {
    /// Abort every running task.
    pub fn abort(&self) {
        for handle in [&self.ingestion, &self.purge].into_iter().flatten() {
            handle.abort();
        }
    }
}

/// Start the background tasks.
///
/// The first ingestion batch runs immediately. Batch failures are logged and
/// retried on the next tick.
pub fn start_scheduler(
    ingestor: Ingestor,
    store: TrackerStore,
    config: SchedulerConfig,
) -> SchedulerHandles {
    let mut handles = SchedulerHandles::default();

    if config.ingest_interval_secs > 0 {
        let limit = config.ingest_limit;
        let period = Duration::from_secs(config.ingest_interval_secs);
        handles.ingestion = Some(tokio::spawn(async move {
            info!(
                "Starting ingestion scheduler (limit: {} builds, interval: {} seconds)",
                limit,
                period.as_secs()
            );

            let mut ticker = interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;

                if let Err(e) = ingestor.ingest(limit).await {
                    error!("Ingestion batch failed: {}", e);
                }
            }
        }));
    } else {
        info!("Scheduled ingestion disabled (TRACKER_INGEST_INTERVAL_SECS=0)");
    }

    if config.purge_interval_secs > 0 {
        let period = Duration::from_secs(config.purge_interval_secs);
        handles.purge = Some(tokio::spawn(async move {
            let mut ticker = interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;
                run_purge(&store).await;
            }
        }));
    }

    handles
}

/// Run a single purge cycle.
async fn run_purge(store: &TrackerStore) {
    match store.backend().purge_expired().await {
        Ok(0) => {}
        Ok(removed) => info!(
            "Purged {} expired entries from {} store",
            removed,
            store.backend().backend_name()
        ),
        Err(e) => error!("Purge task error: {}", e),
    }
}

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval};
use tracing::{error, info};

use crate::{CalendarError, CalendarSyncService};

/// Totals of one refresh pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshSummary {
    /// Feeds processed
    pub feeds: usize,
    /// Reservation blocks written
    pub blocks: usize,
}

impl RefreshSummary {
    /// Summarizes the per-feed output of [`CalendarSyncService::refresh`]
    pub fn from_results<T>(results: &[Vec<T>]) -> Self {
        Self {
            feeds: results.len(),
            blocks: results.iter().map(Vec::len).sum(),
        }
    }
}

/// Runs a full calendar refresh on a fixed interval in the background
pub struct CalendarRefresher {
    service: Arc<CalendarSyncService>,
    handle: Option<JoinHandle<()>>,
}

impl CalendarRefresher {
    /// Creates a stopped refresher
    pub fn new(service: Arc<CalendarSyncService>) -> Self {
        Self {
            service,
            handle: None,
        }
    }

    /// Refreshes every feed once
    pub async fn run_once(service: &CalendarSyncService) -> Result<RefreshSummary, CalendarError> {
        let results = service.refresh(None).await?;
        Ok(RefreshSummary::from_results(&results))
    }

    /// Whether the background loop is running
    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|handle| !handle.is_finished())
    }

    /// Starts the background loop; the first pass runs immediately
    pub fn start(&mut self) {
        if self.is_running() {
            return;
        }

        let service = self.service.clone();
        let period = service
            .config()
            .refresh_interval
            .max(Duration::from_secs(1));
        info!("Starting calendar refresher (every {:?})", period);

        self.handle = Some(tokio::spawn(async move {
            let mut ticker = interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;

                match Self::run_once(&service).await {
                    Ok(summary) => info!(
                        "Scheduled calendar refresh done: {} feeds, {} blocks",
                        summary.feeds, summary.blocks
                    ),
                    Err(e) => error!("Scheduled calendar refresh failed: {}", e),
                }
            }
        }));
    }

    /// Stops the background loop
    pub async fn stop(&mut self) {
        if let Some(handle) = self.handle.take() {
            info!("Stopping calendar refresher");
            handle.abort();
            let _ = handle.await;
        }
    }
}

impl Drop for CalendarRefresher {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

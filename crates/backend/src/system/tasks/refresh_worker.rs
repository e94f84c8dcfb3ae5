use std::sync::Arc;
use tokio::time::{self, MissedTickBehavior};
use tracing::{error, info, warn};

use crate::dashboards::d402_inventory_overview::service::{
    InventoryOverviewService, RefreshOutcome,
};

/// Фоновый воркер периодического обновления дашборда.
pub struct RefreshWorker {
    service: Arc<InventoryOverviewService>,
    interval_seconds: u64,
}

impl RefreshWorker {
    pub fn new(service: Arc<InventoryOverviewService>, interval_seconds: u64) -> Self {
        Self {
            service,
            interval_seconds,
        }
    }

    /// Запускает цикл обновления; первый тик срабатывает сразу.
    pub async fn run_loop(&self) {
        info!(
            "Inventory refresh worker started with interval {} seconds",
            self.interval_seconds
        );
        let mut interval = time::interval(time::Duration::from_secs(self.interval_seconds));
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            interval.tick().await;

            // A slow fetch must not delay the next tick; overlapping cycles
            // are turned away by the service's single-flight guard.
            let service = Arc::clone(&self.service);
            tokio::spawn(async move {
                match service.refresh().await {
                    RefreshOutcome::Completed { generated_at } => {
                        info!("Dashboard snapshot updated at {}", generated_at);
                    }
                    RefreshOutcome::Skipped => {
                        warn!("Previous refresh still in flight, tick skipped");
                    }
                    RefreshOutcome::Failed { message } => {
                        error!("Refresh cycle aborted, keeping last snapshot: {}", message);
                    }
                }
            });
        }
    }
}

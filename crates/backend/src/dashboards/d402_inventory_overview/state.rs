use contracts::dashboards::d402_inventory_overview::{InventoryOverviewResponse, RejectedRowDto};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{RwLock, RwLockReadGuard};

/// Last published snapshot plus the single-flight flag of the refresh cycle.
///
/// The snapshot is only replaced by a completed cycle, so a failed fetch
/// leaves the previous one in place. Its rejected rows share the same lock,
/// readers never see one cycle's snapshot with another cycle's rejections.
#[derive(Default)]
pub struct DashboardState {
    published: RwLock<Published>,
    in_flight: AtomicBool,
}

#[derive(Default)]
struct Published {
    snapshot: Option<InventoryOverviewResponse>,
    rejected: Vec<RejectedRowDto>,
}

/// Clears the in-flight flag when the cycle ends, however it ends.
pub struct RefreshGuard<'a> {
    flag: &'a AtomicBool,
}

impl Drop for RefreshGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

impl DashboardState {
    pub fn new() -> Self {
        Self::default()
    }

    /// `None` while another cycle holds the flag
    pub fn try_begin_refresh(&self) -> Option<RefreshGuard<'_>> {
        self.in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| RefreshGuard {
                flag: &self.in_flight,
            })
    }

    pub fn is_refreshing(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    pub fn publish(&self, snapshot: InventoryOverviewResponse, rejected: Vec<RejectedRowDto>) {
        *self.published.write().unwrap_or_else(|e| e.into_inner()) = Published {
            snapshot: Some(snapshot),
            rejected,
        };
    }

    pub fn snapshot(&self) -> Option<InventoryOverviewResponse> {
        self.read().snapshot.clone()
    }

    pub fn rejected_rows(&self) -> Vec<RejectedRowDto> {
        self.read().rejected.clone()
    }

    fn read(&self) -> RwLockReadGuard<'_, Published> {
        self.published.read().unwrap_or_else(|e| e.into_inner())
    }
}

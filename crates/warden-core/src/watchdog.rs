//! Watchdog heartbeat loop
//!
//! The companion controller runs its own host watchdog; if the
//! heartbeat stops, it assumes the host is dead and may cut power.
//! The loop therefore treats any refresh failure as fatal and reports
//! it to the caller instead of retrying: a stalled heartbeat is
//! indistinguishable from a dead supervisor, and the operator or the
//! controller will power-cycle.

use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};
use warden_link::{ControllerLink, RegisterBus};
use warden_util::WardenError;

/// Interval between watchdog refreshes
pub const WATCHDOG_INTERVAL: Duration = Duration::from_secs(60);

/// Send heartbeats forever. Only returns on failure, handing the
/// fatal error to the caller; the top level maps it to process exit.
pub async fn run_watchdog<B: RegisterBus>(link: Arc<ControllerLink<B>>) -> WardenError {
    info!("sending watchdog timer updates");

    loop {
        if let Err(e) = link.ping_watchdog() {
            error!(error = %e, "watchdog refresh failed");
            return WardenError::fatal_link(format!("watchdog refresh failed: {e}"));
        }

        tokio::time::sleep(WATCHDOG_INTERVAL).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use warden_link::registers::REG_WATCHDOG;
    use warden_link::MockBus;

    #[tokio::test(start_paused = true)]
    async fn pings_once_per_interval() {
        let bus = MockBus::present();
        let link = Arc::new(ControllerLink::connect(bus.clone()).await.unwrap());

        let handle = tokio::spawn(run_watchdog(link));

        // First ping is immediate, then one per interval
        tokio::time::sleep(WATCHDOG_INTERVAL * 5 + Duration::from_secs(1)).await;
        let pings = bus
            .writes()
            .iter()
            .filter(|(reg, _)| *reg == REG_WATCHDOG)
            .count();
        assert_eq!(pings, 6);

        handle.abort();
    }

    #[tokio::test(start_paused = true)]
    async fn reports_failure_instead_of_swallowing_it() {
        let bus = MockBus::present();
        let link = Arc::new(ControllerLink::connect(bus.clone()).await.unwrap());

        let handle = tokio::spawn(run_watchdog(link));

        tokio::time::sleep(Duration::from_secs(30)).await;
        bus.set_fail_writes(true);
        tokio::time::sleep(WATCHDOG_INTERVAL).await;

        let err = handle.await.unwrap();
        assert!(err.is_fatal());
    }
}

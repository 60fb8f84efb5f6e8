//! The stay-on override store
//!
//! A single timestamp shared between the scheduling loop (reader) and
//! the IPC control endpoint (writer). Both sides go through the same
//! mutex; the lock is only held for the comparison or assignment,
//! never across I/O.

use chrono::{DateTime, Local};
use std::sync::Mutex;
use tracing::info;
use warden_util::{Result, WardenError};

/// Maximum distance into the future a stay-on deadline may be set
pub const MAX_STAY_ON_HOURS: i64 = 12;

/// Shutdown is only considered when the window opens more than this
/// many minutes away, so the whole sequence (sync, arm, OS shutdown)
/// completes before the window actually opens.
pub const SHUTDOWN_LEAD_MINUTES: i64 = 15;

/// Mutation-guarded "do not evaluate shutdown before this instant"
pub struct OverrideStore {
    stay_on_until: Mutex<DateTime<Local>>,
}

impl OverrideStore {
    /// A fresh store has no standing override: the deadline starts at
    /// `now`.
    pub fn new(now: DateTime<Local>) -> Self {
        Self {
            stay_on_until: Mutex::new(now),
        }
    }

    /// Decide whether the host should initiate shutdown. False while
    /// an override deadline is in the future; otherwise true iff the
    /// window opens more than `SHUTDOWN_LEAD_MINUTES` away.
    pub fn should_turn_off(&self, now: DateTime<Local>, minutes_until_active: i64) -> bool {
        let stay_on_until = self.stay_on_until.lock().unwrap();
        if now < *stay_on_until {
            return false;
        }
        minutes_until_active > SHUTDOWN_LEAD_MINUTES
    }

    /// Replace the override deadline. Rejects deadlines more than
    /// `MAX_STAY_ON_HOURS` in the future, leaving the stored value
    /// unchanged.
    pub fn stay_on_until(&self, now: DateTime<Local>, deadline: DateTime<Local>) -> Result<()> {
        if deadline - now > chrono::Duration::hours(MAX_STAY_ON_HOURS) {
            return Err(WardenError::InvalidDelay {
                requested: deadline,
                max_hours: MAX_STAY_ON_HOURS,
            });
        }

        *self.stay_on_until.lock().unwrap() = deadline;
        info!(until = %deadline.format("%Y-%m-%d %H:%M:%S"), "staying on");
        Ok(())
    }

    /// Current deadline, for state snapshots.
    pub fn deadline(&self) -> DateTime<Local> {
        *self.stay_on_until.lock().unwrap()
    }
}

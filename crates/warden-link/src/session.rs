//! The companion-controller session
//!
//! A `ControllerLink` is the single live handle to the controller for
//! the process lifetime. The watchdog loop and the scheduling loop
//! share it; since the transport is not assumed safe for concurrent
//! use, every register access serializes through the internal mutex.
//! The lock is only ever held for the duration of one bus transfer.

use std::sync::Mutex;
use std::time::Duration;
use tracing::debug;

use crate::registers::{
    ID_MAGIC, POWER_SOURCE_EXTERNAL, REG_BATTERY_HI, REG_BATTERY_LO, REG_ID, REG_POWER_SOURCE,
    REG_SLEEP, REG_WATCHDOG, WATCHDOG_KICK,
};
use crate::{LinkResult, RegisterBus};

/// How many times to poll the identity register before deciding the
/// controller is not fitted
pub const HANDSHAKE_ATTEMPTS: u32 = 20;

/// Delay between handshake attempts
pub const HANDSHAKE_RETRY_DELAY: Duration = Duration::from_secs(3);

/// Session with the companion controller
pub struct ControllerLink<B: RegisterBus> {
    bus: Mutex<B>,
}

impl<B: RegisterBus> ControllerLink<B> {
    /// Poll the identity register until the controller answers the
    /// handshake. Returns `None` when it never does: an absent
    /// controller is a recognized operating mode, not an error, so the
    /// supervisor can still run on hardware without one. Read errors
    /// count as failed attempts.
    pub async fn connect(bus: B) -> Option<Self> {
        let link = Self {
            bus: Mutex::new(bus),
        };

        for attempt in 1..=HANDSHAKE_ATTEMPTS {
            match link.read(REG_ID) {
                Ok(ID_MAGIC) => {
                    debug!(attempt, "controller answered handshake");
                    return Some(link);
                }
                Ok(value) => {
                    debug!(attempt, value, "unexpected handshake byte");
                }
                Err(e) => {
                    debug!(attempt, error = %e, "handshake read failed");
                }
            }

            if attempt < HANDSHAKE_ATTEMPTS {
                tokio::time::sleep(HANDSHAKE_RETRY_DELAY).await;
            }
        }

        None
    }

    fn read(&self, register: u8) -> LinkResult<u8> {
        self.bus.lock().unwrap().read_register(register)
    }

    /// Whether the host is currently running from battery. Failures
    /// are non-fatal; callers log and treat the state as unknown.
    pub fn check_is_on_battery(&self) -> LinkResult<bool> {
        let value = self.read(REG_POWER_SOURCE)?;
        Ok(value != POWER_SOURCE_EXTERNAL)
    }

    /// Raw battery sense reading. Non-fatal on failure.
    pub fn read_battery_value(&self) -> LinkResult<u16> {
        // Hold the lock across both halves so the pair is consistent
        let mut bus = self.bus.lock().unwrap();
        let hi = bus.read_register(REG_BATTERY_HI)?;
        let lo = bus.read_register(REG_BATTERY_LO)?;
        Ok(u16::from_be_bytes([hi, lo]))
    }

    /// Refresh the controller's host watchdog. A failure here means
    /// the controller may soon assume the host is dead and cut power;
    /// callers treat it as fatal.
    pub fn ping_watchdog(&self) -> LinkResult<()> {
        self.bus
            .lock()
            .unwrap()
            .write_register(REG_WATCHDOG, &[WATCHDOG_KICK])
    }

    /// Arm a power-off `minutes` minutes from now. The countdown must
    /// be positive; the controller does not validate it.
    pub fn power_off(&self, minutes: u16) -> LinkResult<()> {
        debug_assert!(minutes > 0, "power-off countdown must be positive");

        let [hi, lo] = minutes.to_be_bytes();
        self.bus.lock().unwrap().write_register(REG_SLEEP, &[hi, lo])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MockBus;

    #[tokio::test(start_paused = true)]
    async fn handshake_succeeds_on_first_attempt() {
        let bus = MockBus::present();
        let link = ControllerLink::connect(bus.clone()).await;

        assert!(link.is_some());
        assert_eq!(bus.read_count(REG_ID), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn handshake_stops_at_first_answer() {
        let bus = MockBus::present_after(5);
        let started = tokio::time::Instant::now();

        let link = ControllerLink::connect(bus.clone()).await;

        assert!(link.is_some());
        // Four failed attempts, each followed by the retry delay
        assert_eq!(bus.read_count(REG_ID), 5);
        assert_eq!(started.elapsed(), Duration::from_secs(12));
    }

    #[tokio::test(start_paused = true)]
    async fn handshake_exhaustion_means_absent() {
        let bus = MockBus::absent();
        let link = ControllerLink::connect(bus.clone()).await;

        assert!(link.is_none());
        assert_eq!(bus.read_count(REG_ID), HANDSHAKE_ATTEMPTS);
    }

    #[tokio::test(start_paused = true)]
    async fn handshake_survives_read_errors() {
        let bus = MockBus::present();
        bus.set_fail_reads(true);

        // Flip to healthy after the clock has advanced past two attempts
        let toggler = bus.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(4)).await;
            toggler.set_fail_reads(false);
        });

        let link = ControllerLink::connect(bus.clone()).await;
        assert!(link.is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn power_source_decoding() {
        let bus = MockBus::present();
        bus.set_register(REG_POWER_SOURCE, POWER_SOURCE_EXTERNAL);
        let link = ControllerLink::connect(bus.clone()).await.unwrap();

        assert!(!link.check_is_on_battery().unwrap());

        bus.set_register(REG_POWER_SOURCE, 0x00);
        assert!(link.check_is_on_battery().unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn battery_value_combines_bytes() {
        let bus = MockBus::present();
        bus.set_register(REG_BATTERY_HI, 0x02);
        bus.set_register(REG_BATTERY_LO, 0xe6);
        let link = ControllerLink::connect(bus.clone()).await.unwrap();

        assert_eq!(link.read_battery_value().unwrap(), 0x02e6);
    }

    #[tokio::test(start_paused = true)]
    async fn watchdog_ping_writes_marker() {
        let bus = MockBus::present();
        let link = ControllerLink::connect(bus.clone()).await.unwrap();

        link.ping_watchdog().unwrap();
        assert_eq!(bus.writes(), vec![(REG_WATCHDOG, vec![WATCHDOG_KICK])]);
    }

    #[tokio::test(start_paused = true)]
    async fn power_off_splits_minutes() {
        let bus = MockBus::present();
        let link = ControllerLink::connect(bus.clone()).await.unwrap();

        link.power_off(18).unwrap();
        link.power_off(300).unwrap();

        assert_eq!(
            bus.writes(),
            vec![
                (REG_SLEEP, vec![0x00, 18]),
                (REG_SLEEP, vec![0x01, 0x2c]),
            ]
        );
    }
}

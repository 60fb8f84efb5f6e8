//! The main scheduling loop
//!
//! Repeatedly evaluates the power window and decides between three
//! steps: hold (inside the window), poll again later, or run the
//! shutdown sequence. The decision itself is pure; all I/O happens in
//! the run loop so the state machine can be tested directly.

use chrono::{DateTime, Local};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::info;
use warden_link::{ControllerLink, RegisterBus};
use warden_util::{format_duration, PowerWindow, Result, WardenError};

use crate::{CoreEvent, OverrideStore, SystemControl};

/// How long to wait after startup before the first evaluation. This
/// gives an operator time to do something with a freshly booted device
/// before it can power itself off.
pub const INITIAL_GRACE_PERIOD: Duration = Duration::from_secs(20 * 60);

/// Re-evaluation interval while outside the window with no shutdown due
pub const POLL_INTERVAL: Duration = Duration::from_secs(5 * 60);

/// Minutes subtracted from the countdown sent to the controller, so the
/// host's own shutdown completes before power is cut
pub const POWER_OFF_MARGIN_MINUTES: i64 = 2;

/// One scheduling decision
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// Inside the window; sleep until its sleep edge
    HoldUntilWindowEnd(Duration),

    /// Outside the window but no shutdown due; sleep a poll interval
    Poll { minutes_until_active: i64 },

    /// Run the shutdown sequence
    Shutdown { minutes_until_active: i64 },
}

/// The main scheduling loop
pub struct Scheduler<B: RegisterBus> {
    window: PowerWindow,
    overrides: Arc<OverrideStore>,
    link: Arc<ControllerLink<B>>,
    system: Arc<dyn SystemControl>,
    events: mpsc::UnboundedSender<CoreEvent>,
    skip_system_shutdown: bool,
}

impl<B: RegisterBus> Scheduler<B> {
    pub fn new(
        window: PowerWindow,
        overrides: Arc<OverrideStore>,
        link: Arc<ControllerLink<B>>,
        system: Arc<dyn SystemControl>,
        events: mpsc::UnboundedSender<CoreEvent>,
        skip_system_shutdown: bool,
    ) -> Self {
        Self {
            window,
            overrides,
            link,
            system,
            events,
            skip_system_shutdown,
        }
    }

    /// Decide what to do at `now`. Pure: no I/O, no side effects.
    pub fn next_step(&self, now: DateTime<Local>) -> Step {
        if self.window.is_active(&now) {
            return Step::HoldUntilWindowEnd(self.window.until_end(&now));
        }

        let minutes_until_active = (self.window.until_active(&now).as_secs() / 60) as i64;
        if self.overrides.should_turn_off(now, minutes_until_active) {
            Step::Shutdown {
                minutes_until_active,
            }
        } else {
            Step::Poll {
                minutes_until_active,
            }
        }
    }

    /// Run the loop until a shutdown sequence completes. Only returns
    /// early on a fatal error.
    pub async fn run(&self) -> Result<()> {
        loop {
            let now = warden_util::now();

            match self.next_step(now) {
                Step::HoldUntilWindowEnd(until_end) => {
                    info!(
                        until_end = %format_duration(until_end),
                        "inside power window, sleeping until it ends"
                    );
                    tokio::time::sleep(until_end).await;
                }

                Step::Poll {
                    minutes_until_active,
                } => {
                    info!(minutes_until_active, "not due to turn off yet");
                    tokio::time::sleep(POLL_INTERVAL).await;
                }

                Step::Shutdown {
                    minutes_until_active,
                } => {
                    self.shutdown_sequence(minutes_until_active).await?;
                    if !self.skip_system_shutdown {
                        // OS shutdown invoked; the process ends with it
                        return Ok(());
                    }
                    // Power-off armed but OS shutdown suppressed; keep
                    // polling until the controller cuts power
                    tokio::time::sleep(POLL_INTERVAL).await;
                }
            }
        }
    }

    /// The one-way shutdown sequence: flush filesystems, arm the
    /// controller's power-off countdown, then (unless suppressed)
    /// invoke the OS shutdown. An arming failure aborts before any OS
    /// shutdown is attempted: powering the host down while the
    /// controller was never told to wait would cut power mid-shutdown.
    pub async fn shutdown_sequence(&self, minutes_until_active: i64) -> Result<()> {
        info!(minutes_until_active, "preparing to power off");

        info!("syncing filesystems");
        self.system.sync_filesystems();

        let countdown = (minutes_until_active - POWER_OFF_MARGIN_MINUTES) as u16;
        info!(countdown, "requesting power off");
        self.link
            .power_off(countdown)
            .map_err(|e| WardenError::fatal_link(format!("power-off arming failed: {e}")))?;
        let _ = self.events.send(CoreEvent::PowerOffArmed { minutes: countdown });
        info!("power off requested");

        if self.skip_system_shutdown {
            info!("skipping system shutdown as configured");
            return Ok(());
        }

        let _ = self.events.send(CoreEvent::ShuttingDown);
        info!("shutting down system");
        self.system.power_down().await
    }
}

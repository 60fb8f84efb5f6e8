//! Time utilities for wardend
//!
//! Provides wall-clock time and the daily power window used to decide
//! when the host should stay awake.
//!
//! # Mock Time for Development
//!
//! In debug builds, the `WARDEN_MOCK_TIME` environment variable can be
//! set to override the system time for all window evaluation. This is
//! useful for exercising the scheduler without waiting for a real wake
//! or sleep edge.
//!
//! Format: `YYYY-MM-DD HH:MM:SS` (e.g., `2026-03-02 08:40:00`)

use chrono::{DateTime, Local, NaiveDateTime, NaiveTime, TimeZone, Timelike};
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;
use std::time::Duration;

/// Environment variable name for mock time (debug builds only)
pub const MOCK_TIME_ENV_VAR: &str = "WARDEN_MOCK_TIME";

const SECONDS_PER_DAY: u32 = 86_400;

/// Cached mock time offset from the real time when the process started.
/// This allows mock time to advance naturally.
static MOCK_TIME_OFFSET: OnceLock<Option<chrono::Duration>> = OnceLock::new();

#[allow(clippy::disallowed_methods)] // This is the internal implementation that wraps Local::now()
fn get_mock_time_offset() -> Option<chrono::Duration> {
    *MOCK_TIME_OFFSET.get_or_init(|| {
        #[cfg(debug_assertions)]
        {
            if let Ok(mock_time_str) = std::env::var(MOCK_TIME_ENV_VAR) {
                if let Ok(naive_dt) =
                    NaiveDateTime::parse_from_str(&mock_time_str, "%Y-%m-%d %H:%M:%S")
                {
                    if let Some(mock_dt) = Local.from_local_datetime(&naive_dt).single() {
                        let real_now = chrono::Local::now();
                        let offset = mock_dt.signed_duration_since(real_now);
                        tracing::info!(
                            mock_time = %mock_time_str,
                            offset_secs = offset.num_seconds(),
                            "Mock time enabled"
                        );
                        return Some(offset);
                    } else {
                        tracing::warn!(
                            mock_time = %mock_time_str,
                            "Failed to convert mock time to local timezone"
                        );
                    }
                } else {
                    tracing::warn!(
                        mock_time = %mock_time_str,
                        expected_format = "%Y-%m-%d %H:%M:%S",
                        "Invalid mock time format"
                    );
                }
            }
            None
        }
        #[cfg(not(debug_assertions))]
        {
            None
        }
    })
}

/// Get the current local time, respecting mock time settings in debug
/// builds. In release builds this is always the real system time.
#[allow(clippy::disallowed_methods)] // This is the wrapper that provides mock time support
pub fn now() -> DateTime<Local> {
    let real_now = chrono::Local::now();

    if let Some(offset) = get_mock_time_offset() {
        real_now + offset
    } else {
        real_now
    }
}

/// Wall-clock time of day (minute resolution)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WallClock {
    pub hour: u8,
    pub minute: u8,
}

impl WallClock {
    pub fn new(hour: u8, minute: u8) -> Option<Self> {
        if hour < 24 && minute < 60 {
            Some(Self { hour, minute })
        } else {
            None
        }
    }

    pub fn to_naive_time(self) -> NaiveTime {
        NaiveTime::from_hms_opt(self.hour as u32, self.minute as u32, 0).unwrap()
    }

    /// Returns seconds since midnight
    pub fn as_seconds_from_midnight(&self) -> u32 {
        (self.hour as u32) * 3600 + (self.minute as u32) * 60
    }
}

impl std::fmt::Display for WallClock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

impl PartialOrd for WallClock {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for WallClock {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.as_seconds_from_midnight()
            .cmp(&other.as_seconds_from_midnight())
    }
}

/// The recurring daily interval during which the host is expected to be
/// powered and running. The interval is [wake, sleep); a sleep time at
/// or before the wake time means the window spans midnight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PowerWindow {
    pub wake: WallClock,
    pub sleep: WallClock,
}

impl PowerWindow {
    pub fn new(wake: WallClock, sleep: WallClock) -> Self {
        Self { wake, sleep }
    }

    /// True iff `dt` falls within the window.
    pub fn is_active(&self, dt: &DateTime<Local>) -> bool {
        let now_secs = dt.time().num_seconds_from_midnight();
        let wake_secs = self.wake.as_seconds_from_midnight();
        let sleep_secs = self.sleep.as_seconds_from_midnight();

        if wake_secs < sleep_secs {
            now_secs >= wake_secs && now_secs < sleep_secs
        } else {
            // Window crosses midnight (e.g., 20:00 - 06:00)
            now_secs >= wake_secs || now_secs < sleep_secs
        }
    }

    /// Duration until the window next becomes active; zero while active.
    pub fn until_active(&self, dt: &DateTime<Local>) -> Duration {
        if self.is_active(dt) {
            return Duration::ZERO;
        }

        let now_secs = dt.time().num_seconds_from_midnight();
        let wake_secs = self.wake.as_seconds_from_midnight();

        let delta = if wake_secs > now_secs {
            wake_secs - now_secs
        } else {
            SECONDS_PER_DAY - now_secs + wake_secs
        };

        Duration::from_secs(delta as u64)
    }

    /// Duration until the current window's sleep edge. While inactive,
    /// this is the time until the *next* window ends.
    pub fn until_end(&self, dt: &DateTime<Local>) -> Duration {
        let now_secs = dt.time().num_seconds_from_midnight();
        let sleep_secs = self.sleep.as_seconds_from_midnight();

        let delta = if sleep_secs > now_secs {
            sleep_secs - now_secs
        } else {
            SECONDS_PER_DAY - now_secs + sleep_secs
        };

        Duration::from_secs(delta as u64)
    }
}

impl std::fmt::Display for PowerWindow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}", self.wake, self.sleep)
    }
}

/// Helper to format durations in human-readable form
pub fn format_duration(d: Duration) -> String {
    let total_secs = d.as_secs();
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let seconds = total_secs % 60;

    if hours > 0 {
        format!("{}h {}m {}s", hours, minutes, seconds)
    } else if minutes > 0 {
        format!("{}m {}s", minutes, seconds)
    } else {
        format!("{}s", seconds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(hour: u32, minute: u32) -> DateTime<Local> {
        Local.with_ymd_and_hms(2026, 3, 2, hour, minute, 0).unwrap()
    }

    fn window(wake: (u8, u8), sleep: (u8, u8)) -> PowerWindow {
        PowerWindow::new(
            WallClock::new(wake.0, wake.1).unwrap(),
            WallClock::new(sleep.0, sleep.1).unwrap(),
        )
    }

    #[test]
    fn wall_clock_ordering() {
        let morning = WallClock::new(8, 0).unwrap();
        let noon = WallClock::new(12, 0).unwrap();
        let evening = WallClock::new(18, 30).unwrap();

        assert!(morning < noon);
        assert!(noon < evening);
        assert!(WallClock::new(24, 0).is_none());
        assert!(WallClock::new(12, 60).is_none());
    }

    #[test]
    fn daytime_window_bounds() {
        let w = window((9, 0), (17, 0));

        assert!(!w.is_active(&at(8, 59)));
        assert!(w.is_active(&at(9, 0)));
        assert!(w.is_active(&at(12, 0)));
        assert!(w.is_active(&at(16, 59)));
        // Sleep edge is exclusive
        assert!(!w.is_active(&at(17, 0)));
    }

    #[test]
    fn midnight_crossing_window() {
        let w = window((20, 0), (6, 0));

        assert!(w.is_active(&at(23, 0)));
        assert!(w.is_active(&at(2, 0)));
        assert!(!w.is_active(&at(12, 0)));
        assert_eq!(w.until_active(&at(12, 0)), Duration::from_secs(8 * 3600));
    }

    #[test]
    fn active_and_until_active_are_complementary() {
        let w = window((9, 0), (17, 0));

        for hour in 0..24 {
            let dt = at(hour, 30);
            if w.is_active(&dt) {
                assert_eq!(w.until_active(&dt), Duration::ZERO);
            } else {
                assert!(w.until_active(&dt) > Duration::ZERO);
            }
        }
    }

    #[test]
    fn until_active_wraps_past_midnight() {
        let w = window((9, 0), (17, 0));

        // 20:00 -> 09:00 next day = 13 hours
        assert_eq!(
            w.until_active(&at(20, 0)),
            Duration::from_secs(13 * 3600)
        );
        // 08:40 -> 09:00 = 20 minutes
        assert_eq!(w.until_active(&at(8, 40)), Duration::from_secs(20 * 60));
    }

    #[test]
    fn until_end_within_window() {
        let w = window((9, 0), (17, 0));
        assert_eq!(w.until_end(&at(16, 50)), Duration::from_secs(10 * 60));

        let crossing = window((20, 0), (6, 0));
        // 23:00 -> 06:00 = 7 hours
        assert_eq!(
            crossing.until_end(&at(23, 0)),
            Duration::from_secs(7 * 3600)
        );
        // 02:00 -> 06:00 = 4 hours
        assert_eq!(
            crossing.until_end(&at(2, 0)),
            Duration::from_secs(4 * 3600)
        );
    }

    #[test]
    fn format_duration_variants() {
        assert_eq!(format_duration(Duration::from_secs(30)), "30s");
        assert_eq!(format_duration(Duration::from_secs(90)), "1m 30s");
        assert_eq!(format_duration(Duration::from_secs(3661)), "1h 1m 1s");
    }

    #[test]
    fn now_returns_advancing_time() {
        let t1 = now();
        let t2 = now();
        assert!(t2 >= t1);
    }

    #[test]
    fn mock_time_format_parses() {
        let result = NaiveDateTime::parse_from_str("2026-03-02 08:40:00", "%Y-%m-%d %H:%M:%S");
        assert!(result.is_ok());
        assert!(NaiveDateTime::parse_from_str("2026-03-02", "%Y-%m-%d %H:%M:%S").is_err());
    }
}

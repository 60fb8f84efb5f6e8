//! Validated settings ready for use by the supervisor

use crate::schema::RawConfig;
use crate::validation::parse_time;
use std::path::PathBuf;
use warden_util::{socket_path_without_env, PowerWindow, WallClock};

/// Default I2C character device for the controller bus
pub const DEFAULT_BUS_PATH: &str = "/dev/i2c-1";

/// Default 7-bit bus address of the companion controller
pub const DEFAULT_CONTROLLER_ADDRESS: u8 = 0x6d;

/// Validated configuration (after `validate_config`)
#[derive(Debug, Clone)]
pub struct Settings {
    pub daemon: DaemonSettings,

    /// None means no window is configured: the host never powers
    /// itself off and the supervisor only keeps the watchdog fed.
    pub window: Option<PowerWindow>,

    pub controller: ControllerSettings,

    pub battery: BatterySettings,
}

impl Settings {
    /// Convert from raw config (after validation)
    pub fn from_raw(raw: RawConfig) -> Self {
        let window = raw.window.map(|w| {
            // Validation already proved both times parse
            let (wake_h, wake_m) = parse_time(&w.wake).unwrap_or((0, 0));
            let (sleep_h, sleep_m) = parse_time(&w.sleep).unwrap_or((0, 0));
            PowerWindow::new(
                WallClock::new(wake_h, wake_m).unwrap(),
                WallClock::new(sleep_h, sleep_m).unwrap(),
            )
        });

        Self {
            daemon: DaemonSettings {
                socket_path: raw
                    .daemon
                    .socket_path
                    .unwrap_or_else(socket_path_without_env),
            },
            window,
            controller: ControllerSettings {
                bus_path: raw
                    .controller
                    .bus
                    .unwrap_or_else(|| PathBuf::from(DEFAULT_BUS_PATH)),
                address: raw
                    .controller
                    .address
                    .unwrap_or(DEFAULT_CONTROLLER_ADDRESS),
            },
            battery: BatterySettings {
                enable_readings: raw.battery.enable_readings.unwrap_or(true),
            },
        }
    }
}

/// Daemon configuration
#[derive(Debug, Clone)]
pub struct DaemonSettings {
    pub socket_path: PathBuf,
}

/// Companion-controller bus configuration
#[derive(Debug, Clone)]
pub struct ControllerSettings {
    pub bus_path: PathBuf,
    pub address: u8,
}

/// Battery sense configuration
#[derive(Debug, Clone)]
pub struct BatterySettings {
    pub enable_readings: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            daemon: DaemonSettings {
                socket_path: socket_path_without_env(),
            },
            window: None,
            controller: ControllerSettings {
                bus_path: PathBuf::from(DEFAULT_BUS_PATH),
                address: DEFAULT_CONTROLLER_ADDRESS,
            },
            battery: BatterySettings {
                enable_readings: true,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{RawControllerConfig, RawWindow};

    #[test]
    fn defaults_applied() {
        let raw = RawConfig {
            config_version: 1,
            daemon: Default::default(),
            window: None,
            controller: RawControllerConfig::default(),
            battery: Default::default(),
        };

        let settings = Settings::from_raw(raw);
        assert_eq!(settings.controller.address, DEFAULT_CONTROLLER_ADDRESS);
        assert!(settings.battery.enable_readings);
        assert!(settings.window.is_none());
    }

    #[test]
    fn window_converted() {
        let raw = RawConfig {
            config_version: 1,
            daemon: Default::default(),
            window: Some(RawWindow {
                wake: "20:00".into(),
                sleep: "06:00".into(),
            }),
            controller: RawControllerConfig::default(),
            battery: Default::default(),
        };

        let window = Settings::from_raw(raw).window.unwrap();
        assert_eq!(window.wake.hour, 20);
        assert_eq!(window.sleep.hour, 6);
    }
}

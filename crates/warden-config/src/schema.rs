//! Raw configuration schema (as parsed from TOML)

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Raw configuration as parsed from TOML
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawConfig {
    /// Config schema version
    pub config_version: u32,

    /// Global daemon settings
    #[serde(default)]
    pub daemon: RawDaemonConfig,

    /// Daily power window. Absent means the host never powers itself off.
    pub window: Option<RawWindow>,

    /// Companion-controller bus settings
    #[serde(default)]
    pub controller: RawControllerConfig,

    /// Battery sense settings
    #[serde(default)]
    pub battery: RawBatteryConfig,
}

/// Daemon-level settings
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawDaemonConfig {
    /// IPC socket path (default: /run/wardend/wardend.sock)
    pub socket_path: Option<PathBuf>,
}

/// Daily power window
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawWindow {
    /// Wake time (HH:MM format)
    pub wake: String,

    /// Sleep time (HH:MM format). A sleep time at or before the wake
    /// time spans midnight.
    pub sleep: String,
}

/// Companion-controller bus settings
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawControllerConfig {
    /// I2C character device (default: /dev/i2c-1)
    pub bus: Option<PathBuf>,

    /// 7-bit bus address of the controller (default: 0x6d)
    pub address: Option<u8>,
}

/// Battery sense settings
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawBatteryConfig {
    /// Read and log the raw battery sense value at startup
    pub enable_readings: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_window_table() {
        let toml_str = r#"
            config_version = 1

            [window]
            wake = "09:00"
            sleep = "17:00"
        "#;

        let config: RawConfig = toml::from_str(toml_str).unwrap();
        let window = config.window.unwrap();
        assert_eq!(window.wake, "09:00");
        assert_eq!(window.sleep, "17:00");
    }

    #[test]
    fn missing_tables_default() {
        let config: RawConfig = toml::from_str("config_version = 1\n").unwrap();
        assert!(config.window.is_none());
        assert!(config.controller.bus.is_none());
        assert!(config.battery.enable_readings.is_none());
    }
}

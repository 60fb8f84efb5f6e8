//! Configuration parsing and validation for wardend
//!
//! Supports TOML configuration with:
//! - Versioned schema
//! - The daily power window (wake/sleep times)
//! - Companion-controller bus settings
//! - Validation with clear error messages

mod schema;
mod settings;
mod validation;

pub use schema::*;
pub use settings::*;
pub use validation::*;

use std::path::Path;
use thiserror::Error;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Validation failed: {errors:?}")]
    ValidationFailed { errors: Vec<ValidationError> },

    #[error("Unsupported config version: {0}")]
    UnsupportedVersion(u32),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Current supported config version
pub const CURRENT_CONFIG_VERSION: u32 = 1;

/// Load and validate configuration from a TOML file
pub fn load_config(path: impl AsRef<Path>) -> ConfigResult<Settings> {
    let content = std::fs::read_to_string(path)?;
    parse_config(&content)
}

/// Parse and validate configuration from a TOML string
pub fn parse_config(content: &str) -> ConfigResult<Settings> {
    let raw: RawConfig = toml::from_str(content)?;

    if raw.config_version != CURRENT_CONFIG_VERSION {
        return Err(ConfigError::UnsupportedVersion(raw.config_version));
    }

    let errors = validate_config(&raw);
    if !errors.is_empty() {
        return Err(ConfigError::ValidationFailed { errors });
    }

    Ok(Settings::from_raw(raw))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_minimal_config() {
        let config = "config_version = 1\n";

        let settings = parse_config(config).unwrap();
        assert!(settings.window.is_none());
        assert_eq!(settings.controller.bus_path.to_str().unwrap(), "/dev/i2c-1");
    }

    #[test]
    fn parse_full_config() {
        let config = r#"
            config_version = 1

            [daemon]
            socket_path = "/tmp/wardend-test.sock"

            [window]
            wake = "09:00"
            sleep = "17:00"

            [controller]
            bus = "/dev/i2c-3"
            address = 0x6d

            [battery]
            enable_readings = false
        "#;

        let settings = parse_config(config).unwrap();
        let window = settings.window.unwrap();
        assert_eq!(window.wake.hour, 9);
        assert_eq!(window.sleep.hour, 17);
        assert_eq!(settings.controller.address, 0x6d);
        assert!(!settings.battery.enable_readings);
    }

    #[test]
    fn reject_wrong_version() {
        let config = "config_version = 99\n";

        let result = parse_config(config);
        assert!(matches!(result, Err(ConfigError::UnsupportedVersion(99))));
    }

    #[test]
    fn reject_malformed_window() {
        let config = r#"
            config_version = 1

            [window]
            wake = "25:00"
            sleep = "17:00"
        "#;

        assert!(matches!(
            parse_config(config),
            Err(ConfigError::ValidationFailed { .. })
        ));
    }

    #[test]
    fn load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("warden.toml");
        std::fs::write(
            &path,
            "config_version = 1\n\n[window]\nwake = \"20:00\"\nsleep = \"06:00\"\n",
        )
        .unwrap();

        let settings = load_config(&path).unwrap();
        assert!(settings.window.is_some());
    }
}

//! Configuration validation

use crate::schema::{RawConfig, RawWindow};
use thiserror::Error;

/// Lowest and highest valid 7-bit I2C addresses (0x00-0x07 and
/// 0x78-0x7f are reserved by the bus specification).
const I2C_ADDRESS_RANGE: std::ops::RangeInclusive<u8> = 0x08..=0x77;

/// Validation error
#[derive(Debug, Clone, Error)]
pub enum ValidationError {
    #[error("Invalid time format '{value}': {message}")]
    InvalidTimeFormat { value: String, message: String },

    #[error("Window error: {0}")]
    WindowError(String),

    #[error("Controller address {address:#04x} outside valid range 0x08-0x77")]
    InvalidAddress { address: u8 },
}

/// Validate a raw configuration
pub fn validate_config(config: &RawConfig) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if let Some(window) = &config.window {
        errors.extend(validate_window(window));
    }

    if let Some(address) = config.controller.address {
        if !I2C_ADDRESS_RANGE.contains(&address) {
            errors.push(ValidationError::InvalidAddress { address });
        }
    }

    errors
}

fn validate_window(window: &RawWindow) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    let wake = match parse_time(&window.wake) {
        Ok(t) => Some(t),
        Err(e) => {
            errors.push(ValidationError::InvalidTimeFormat {
                value: window.wake.clone(),
                message: e,
            });
            None
        }
    };

    let sleep = match parse_time(&window.sleep) {
        Ok(t) => Some(t),
        Err(e) => {
            errors.push(ValidationError::InvalidTimeFormat {
                value: window.sleep.clone(),
                message: e,
            });
            None
        }
    };

    if let (Some(wake), Some(sleep)) = (wake, sleep) {
        if wake == sleep {
            errors.push(ValidationError::WindowError(
                "wake and sleep times must differ".into(),
            ));
        }
    }

    errors
}

/// Parse HH:MM time format
pub fn parse_time(s: &str) -> Result<(u8, u8), String> {
    let parts: Vec<&str> = s.split(':').collect();
    if parts.len() != 2 {
        return Err("Expected HH:MM format".into());
    }

    let hour: u8 = parts[0].parse().map_err(|_| "Invalid hour".to_string())?;
    let minute: u8 = parts[1].parse().map_err(|_| "Invalid minute".to_string())?;

    if hour >= 24 {
        return Err("Hour must be 0-23".into());
    }
    if minute >= 60 {
        return Err("Minute must be 0-59".into());
    }

    Ok((hour, minute))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_time() {
        assert_eq!(parse_time("14:30").unwrap(), (14, 30));
        assert_eq!(parse_time("00:00").unwrap(), (0, 0));
        assert_eq!(parse_time("23:59").unwrap(), (23, 59));

        assert!(parse_time("24:00").is_err());
        assert!(parse_time("12:60").is_err());
        assert!(parse_time("invalid").is_err());
    }

    #[test]
    fn equal_wake_and_sleep_rejected() {
        let window = RawWindow {
            wake: "09:00".into(),
            sleep: "09:00".into(),
        };
        let errors = validate_window(&window);
        assert!(errors
            .iter()
            .any(|e| matches!(e, ValidationError::WindowError(_))));
    }

    #[test]
    fn reserved_address_rejected() {
        let config: RawConfig = toml::from_str(
            "config_version = 1\n\n[controller]\naddress = 0x03\n",
        )
        .unwrap();

        let errors = validate_config(&config);
        assert!(errors
            .iter()
            .any(|e| matches!(e, ValidationError::InvalidAddress { address: 0x03 })));
    }
}

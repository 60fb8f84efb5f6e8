//! Shared types for the wardend API

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

/// Status of the configured power window at a point in time
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WindowStatus {
    /// Wake and sleep times as "HH:MM"
    pub wake: String,
    pub sleep: String,
    /// Whether the window is currently active
    pub active: bool,
    /// Whole minutes until the window opens (zero while active)
    pub minutes_until_active: i64,
    /// Whole minutes until the window's sleep edge
    pub minutes_until_end: i64,
}

/// Full supervisor state snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateSnapshot {
    pub api_version: u32,
    /// Whether the companion controller answered the presence handshake
    pub controller_present: bool,
    /// Power source at snapshot time; None when the read failed or the
    /// controller is absent
    pub on_battery: Option<bool>,
    /// Raw battery sense value, same caveats as `on_battery`
    pub battery_raw: Option<u16>,
    /// None when no power window is configured (host never powers off)
    pub window: Option<WindowStatus>,
    /// Shutdown evaluation is suppressed before this instant
    pub stay_on_until: DateTime<Local>,
}

/// Role for authorization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClientRole {
    /// Local admin - may extend the stay-on override
    Admin,
    /// Read-only observer
    Observer,
}

impl ClientRole {
    pub fn can_stay_on(&self) -> bool {
        matches!(self, ClientRole::Admin)
    }
}

/// Client connection info (set by IPC layer)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientInfo {
    pub role: ClientRole,
    /// Unix UID if available
    pub uid: Option<u32>,
}

impl ClientInfo {
    pub fn new(role: ClientRole) -> Self {
        Self { role, uid: None }
    }

    pub fn with_uid(mut self, uid: u32) -> Self {
        self.uid = Some(uid);
        self
    }
}

/// Health status
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthStatus {
    pub live: bool,
    pub controller_present: bool,
    pub watchdog_running: bool,
    pub window_configured: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_serialization() {
        let snapshot = StateSnapshot {
            api_version: crate::API_VERSION,
            controller_present: true,
            on_battery: Some(false),
            battery_raw: Some(742),
            window: Some(WindowStatus {
                wake: "09:00".into(),
                sleep: "17:00".into(),
                active: false,
                minutes_until_active: 20,
                minutes_until_end: 500,
            }),
            stay_on_until: Local::now(),
        };

        let json = serde_json::to_string(&snapshot).unwrap();
        let parsed: StateSnapshot = serde_json::from_str(&json).unwrap();
        assert!(parsed.controller_present);
        assert_eq!(parsed.battery_raw, Some(742));
    }

    #[test]
    fn only_admin_extends_override() {
        assert!(ClientRole::Admin.can_stay_on());
        assert!(!ClientRole::Observer.can_stay_on());
    }
}

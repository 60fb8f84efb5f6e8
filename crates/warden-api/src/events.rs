//! Event types for wardend -> client streaming

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use crate::{StateSnapshot, API_VERSION};

/// Event envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub api_version: u32,
    pub timestamp: DateTime<Local>,
    pub payload: EventPayload,
}

impl Event {
    pub fn new(payload: EventPayload) -> Self {
        Self {
            api_version: API_VERSION,
            timestamp: warden_util::now(),
            payload,
        }
    }
}

/// All possible events from the service to clients
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventPayload {
    /// Full state snapshot (sent on subscribe and major changes)
    StateChanged(StateSnapshot),

    /// The stay-on override deadline was extended
    OverrideExtended { until: DateTime<Local> },

    /// The controller was told to cut power after `minutes` minutes
    PowerOffArmed { minutes: u16 },

    /// OS shutdown is about to be invoked
    ShuttingDown,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_serialization() {
        let event = Event::new(EventPayload::PowerOffArmed { minutes: 18 });

        let json = serde_json::to_string(&event).unwrap();
        let parsed: Event = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed.api_version, API_VERSION);
        assert!(matches!(
            parsed.payload,
            EventPayload::PowerOffArmed { minutes: 18 }
        ));
    }

    #[test]
    fn override_event_tag() {
        let event = Event::new(EventPayload::OverrideExtended {
            until: Local::now(),
        });
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("override_extended"));
    }
}

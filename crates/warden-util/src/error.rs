//! Error types for wardend

use chrono::{DateTime, Local};
use thiserror::Error;

/// Core error type for wardend operations
#[derive(Debug, Error)]
pub enum WardenError {
    #[error("Configuration error: {0}")]
    Config(String),

    /// A recoverable bus failure (battery or power-source queries).
    /// Callers log it and carry on with the value treated as unknown.
    #[error("Controller link error: {0}")]
    Link(String),

    /// A bus failure after which the controller's view of the host can
    /// no longer be trusted (watchdog refresh, power-off arming). The
    /// top level maps this to a logged error and process exit.
    #[error("Fatal controller link error: {0}")]
    FatalLink(String),

    #[error("can not delay power off over {max_hours} hours (requested until {requested})")]
    InvalidDelay {
        requested: DateTime<Local>,
        max_hours: i64,
    },

    #[error("System command failed: {0}")]
    System(String),

    #[error("IPC error: {0}")]
    Ipc(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl WardenError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn link(msg: impl Into<String>) -> Self {
        Self::Link(msg.into())
    }

    pub fn fatal_link(msg: impl Into<String>) -> Self {
        Self::FatalLink(msg.into())
    }

    pub fn system(msg: impl Into<String>) -> Self {
        Self::System(msg.into())
    }

    pub fn ipc(msg: impl Into<String>) -> Self {
        Self::Ipc(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Whether this error must terminate the process.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::FatalLink(_) | Self::System(_))
    }
}

pub type Result<T> = std::result::Result<T, WardenError>;

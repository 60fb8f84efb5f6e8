//! Register-bus transport trait

use thiserror::Error;

/// Errors from the register bus
#[derive(Debug, Error)]
pub enum LinkError {
    #[error("Failed to open bus device: {0}")]
    Open(String),

    #[error("Bus I/O error: {0}")]
    Io(String),
}

pub type LinkResult<T> = Result<T, LinkError>;

/// Raw byte transport to the companion controller, keyed by register
/// address. Implementations are not expected to be safe for concurrent
/// use; `ControllerLink` serializes all access.
pub trait RegisterBus: Send {
    /// Read one byte from a register.
    fn read_register(&mut self, register: u8) -> LinkResult<u8>;

    /// Write a payload to a register.
    fn write_register(&mut self, register: u8, payload: &[u8]) -> LinkResult<()>;
}

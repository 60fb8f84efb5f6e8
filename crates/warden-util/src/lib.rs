//! Shared utilities for wardend
//!
//! This crate provides:
//! - Error types
//! - Wall-clock time and the daily power window evaluator
//! - IPC client IDs
//! - Default paths for the socket and configuration file
//! - Rate limiting helpers

mod error;
mod ids;
mod paths;
mod rate_limit;
mod time;

pub use error::*;
pub use ids::*;
pub use paths::*;
pub use rate_limit::*;
pub use time::*;

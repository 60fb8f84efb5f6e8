//! Power-window scheduling and shutdown coordination for wardend
//!
//! This crate is the heart of wardend, containing:
//! - The stay-on override store and its locking discipline
//! - The shutdown decision and main scheduling loop
//! - The watchdog heartbeat loop
//! - The system-control seam (filesystem sync, OS power-off)

mod events;
mod scheduler;
mod stay_on;
mod system;
mod watchdog;

pub use events::*;
pub use scheduler::*;
pub use stay_on::*;
pub use system::*;
pub use watchdog::*;

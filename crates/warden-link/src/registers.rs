//! Companion-controller register map
//!
//! The controller exposes a fixed register file over the bus:
//! - Read 0x01: Identity handshake; a present controller answers 0x57
//! - Read 0x10: Query power source (0x01 = external power, 0x00 = battery)
//! - Write 0x12 0x01: Refresh the host watchdog
//! - Read 0x20: Raw battery sense value, high byte
//! - Read 0x21: Raw battery sense value, low byte
//! - Write 0x31 [HH LL]: Arm power-off after HHLL minutes
//!
//! The controller does not validate the power-off countdown; a zero or
//! nonsensical value is a bug on the host side.

/// Identity register answered during the presence handshake
pub const REG_ID: u8 = 0x01;

/// Value a present controller returns from `REG_ID`
pub const ID_MAGIC: u8 = 0x57;

/// Power source register
pub const REG_POWER_SOURCE: u8 = 0x10;

/// `REG_POWER_SOURCE` value when external power is present
pub const POWER_SOURCE_EXTERNAL: u8 = 0x01;

/// Watchdog refresh register
pub const REG_WATCHDOG: u8 = 0x12;

/// Marker byte written to `REG_WATCHDOG` as a heartbeat
pub const WATCHDOG_KICK: u8 = 0x01;

/// Battery sense value, high byte
pub const REG_BATTERY_HI: u8 = 0x20;

/// Battery sense value, low byte
pub const REG_BATTERY_LO: u8 = 0x21;

/// Power-off arming register; payload is the minute countdown as two
/// bytes, high then low
pub const REG_SLEEP: u8 = 0x31;

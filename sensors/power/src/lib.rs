//! Board power and on-chip analog telemetry for somstat-rs.
//!
//! Two hwmon devices feed this crate: the ina260 power sensor on the
//! module's supply rail (instantaneous power, current and voltage, smoothed
//! by moving averages over the sampling window) and the on-chip analog
//! monitor exposing die temperatures and internal voltage rails.

pub mod power;
pub mod sysmon;

pub use power::{BoardPowerMonitor, PowerSample, BOARD_POWER_DEVICE};
pub use sysmon::{SysmonReading, ANALOG_MONITOR_DEVICE};

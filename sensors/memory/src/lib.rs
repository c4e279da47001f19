//! Memory statistics for somstat-rs.
//!
//! Reads `/proc/meminfo` once per report and serves the RAM, swap and CMA
//! field groups in kilobytes.

pub mod memory;

pub use memory::{CmaReport, MeminfoTable, MemoryProbe, MemoryReport, RamReport, SwapReport};

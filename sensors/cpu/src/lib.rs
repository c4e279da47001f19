//! CPU statistics for somstat-rs.
//!
//! This crate samples the kernel's per-CPU accounting counters from
//! `/proc/stat`, derives instantaneous utilization from two time-separated
//! samples, and reads the current core frequency from cpufreq.
//!
//! # Examples
//!
//! ```no_run
//! use somstat_rs_core::Probe;
//! use somstat_rs_cpu::CpuLoadProbe;
//!
//! // Samples every CPU twice, one second apart.
//! let mut probe = CpuLoadProbe::new();
//! for load in probe.collect()? {
//!     println!("CPU{}: {:.2}%", load.cpu_id, load.utilization);
//! }
//! # Ok::<(), somstat_rs_core::ProbeError>(())
//! ```

pub mod cpu;

pub use cpu::{utilization, CpuFrequency, CpuFrequencyProbe, CpuLoad, CpuLoadProbe, CpuStat};

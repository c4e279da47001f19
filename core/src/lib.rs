//! # somstat-rs-core
//!
//! Shared plumbing for the somstat-rs platform-statistics suite: the error
//! taxonomy, scalar sysfs/procfs readers, hwmon device discovery, and the
//! moving-average buffer used to smooth power telemetry.
//!
//! The sensor crates (`somstat-rs-cpu`, `somstat-rs-memory`,
//! `somstat-rs-power`) build on these pieces and the report binary stitches
//! them into one console report.
//!
//! ## Quick Start
//!
//! ```rust
//! use somstat_rs_core::{Probe, ProbeError};
//!
//! struct UptimeProbe;
//!
//! impl Probe for UptimeProbe {
//!     type Report = f64;
//!
//!     fn name(&self) -> &str {
//!         "uptime"
//!     }
//!
//!     fn collect(&mut self) -> Result<f64, ProbeError> {
//!         let content = std::fs::read_to_string("/proc/uptime")?;
//!         let token = content
//!             .split_whitespace()
//!             .next()
//!             .ok_or_else(|| ProbeError::parse("/proc/uptime is empty"))?;
//!         token
//!             .parse()
//!             .map_err(|e| ProbeError::parse_with_source("bad uptime value", e))
//!     }
//! }
//! ```

pub mod avg;
pub mod error;
pub mod hwmon;
pub mod sysfs;

pub use avg::MovingAverage;
pub use error::ProbeError;
pub use hwmon::HwmonLocator;

/// Trait for all platform-statistics probes.
///
/// A probe owns whatever state it needs between samples and produces one
/// typed report per [`collect`](Probe::collect) call. Report sections are
/// independent: a probe failure is reported and skipped, it never aborts
/// the collection of the other sections.
pub trait Probe {
    /// The typed report this probe produces.
    type Report;

    /// Stable identifier used in log messages and section headings.
    fn name(&self) -> &str;

    /// Check if the probe can work on this system.
    ///
    /// Default implementation returns `Ok(())`. Probes with specific
    /// kernel-interface requirements should override this.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing pseudo-files are absent or
    /// unreadable.
    fn check_availability(&self) -> Result<(), ProbeError> {
        Ok(())
    }

    /// Read current values and produce a report.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing data cannot be read or parsed.
    fn collect(&mut self) -> Result<Self::Report, ProbeError>;
}

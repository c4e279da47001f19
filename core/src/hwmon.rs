//! Hardware-monitor device discovery under `/sys/class/hwmon`.
//!
//! The kernel numbers hwmon devices in registration order, so the id of a
//! given sensor varies between boots and kernel versions. Devices are
//! identified by reading each `hwmon<N>/name` file and comparing against the
//! driver name we are looking for.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::ProbeError;
use crate::sysfs;

/// Default hwmon class directory.
pub const HWMON_ROOT: &str = "/sys/class/hwmon";

/// Locates hwmon devices by driver name.
///
/// # Examples
///
/// ```no_run
/// use somstat_rs_core::HwmonLocator;
///
/// let locator = HwmonLocator::default();
/// if let Some(id) = locator.resolve_id("ina260_u14")? {
///     println!("board power sensor is hwmon{id}");
/// }
/// # Ok::<(), somstat_rs_core::ProbeError>(())
/// ```
#[derive(Debug, Clone)]
pub struct HwmonLocator {
    root: PathBuf,
}

impl Default for HwmonLocator {
    fn default() -> Self {
        Self::new(HWMON_ROOT)
    }
}

impl HwmonLocator {
    /// Create a locator over a specific hwmon class directory.
    ///
    /// Tests point this at a synthetic tree; production code uses
    /// [`HwmonLocator::default`].
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The class directory this locator scans.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path prefix for numbered device attributes, e.g.
    /// `/sys/class/hwmon/hwmon` for the default root.
    #[must_use]
    pub fn device_base(&self) -> String {
        format!("{}/hwmon", self.root.display())
    }

    /// Number of registered hwmon devices.
    ///
    /// Counts the immediate entries of the root whose name contains the
    /// substring `hwmon`.
    ///
    /// # Errors
    ///
    /// Returns [`ProbeError::Io`] if the root directory cannot be opened.
    pub fn count_devices(&self) -> Result<usize, ProbeError> {
        let mut count = 0;
        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            if entry.file_name().to_string_lossy().contains("hwmon") {
                count += 1;
            }
        }
        Ok(count)
    }

    /// Driver name of a device, read from its `name` file.
    pub fn device_name(&self, id: u32) -> Result<String, ProbeError> {
        sysfs::read_string(&self.device_base(), id, "/name")
    }

    /// Resolve the numeric id of the device whose `name` file matches
    /// `target` verbatim (case-sensitive, exact).
    ///
    /// Linear scan over `0..count_devices()`, first match wins; no caching,
    /// so the mapping is re-derived on every call. Returns `Ok(None)` when
    /// no device matches.
    pub fn resolve_id(&self, target: &str) -> Result<Option<u32>, ProbeError> {
        let devices = self.count_devices()?;
        for id in 0..devices as u32 {
            match self.device_name(id) {
                Ok(name) => {
                    tracing::debug!(id, %name, "probed hwmon device");
                    if name == target {
                        return Ok(Some(id));
                    }
                }
                // A gap in the numbering; keep scanning the rest.
                Err(e) => tracing::debug!(id, error = %e, "unreadable hwmon name"),
            }
        }
        Ok(None)
    }
}

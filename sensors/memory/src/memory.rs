//! `/proc/meminfo` reader.
//!
//! The file is line-oriented, `<Label>: <value> kB`. The whole file is
//! parsed once into a label-to-value table and the report fields are served
//! by name; selecting lines by offset would silently read wrong values on a
//! kernel that reorders or inserts fields.

use serde::Serialize;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

use somstat_rs_core::{Probe, ProbeError};

/// Path to the kernel's memory-info pseudo-file.
pub const PROC_MEMINFO_PATH: &str = "/proc/meminfo";

/// Label-keyed snapshot of `/proc/meminfo`, values in kilobytes.
#[derive(Debug, Clone)]
pub struct MeminfoTable {
    values: HashMap<String, u64>,
}

/// Physical RAM fields, in kilobytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RamReport {
    /// Total usable physical RAM
    pub total_kb: u64,
    /// RAM left unused by the system
    pub free_kb: u64,
    /// Estimate of RAM available for starting new applications without
    /// swapping
    pub available_kb: u64,
}

/// Swap fields, in kilobytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SwapReport {
    /// Total swap space
    pub total_kb: u64,
    /// Unused swap space
    pub free_kb: u64,
}

/// Contiguous-memory-allocator fields, in kilobytes.
///
/// Only present on kernels built with CMA; boards without it skip the
/// section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CmaReport {
    /// Total CMA region size
    pub total_kb: u64,
    /// Unallocated CMA pages
    pub free_kb: u64,
}

impl MeminfoTable {
    /// Snapshot the live `/proc/meminfo`.
    ///
    /// # Errors
    ///
    /// Returns [`ProbeError::Io`] if the file cannot be opened and
    /// [`ProbeError::Parse`] if a value token is not an unsigned integer.
    pub fn read() -> Result<Self, ProbeError> {
        Self::from_path(Path::new(PROC_MEMINFO_PATH))
    }

    /// Snapshot a specific file (useful for testing).
    pub fn from_path(path: &Path) -> Result<Self, ProbeError> {
        let content = fs::read_to_string(path)?;
        Self::parse_content(&content)
    }

    fn parse_content(content: &str) -> Result<Self, ProbeError> {
        let mut values = HashMap::new();
        for line in content.lines() {
            let mut parts = line.split_whitespace();
            let (Some(label), Some(token)) = (parts.next(), parts.next()) else {
                continue;
            };
            let label = label.trim_end_matches(':');
            let value = token.parse::<u64>().map_err(|e| {
                ProbeError::parse_with_source(format!("bad value {token:?} for {label}"), e)
            })?;
            values.insert(label.to_owned(), value);
        }
        Ok(Self { values })
    }

    /// Value of a single field in kilobytes.
    ///
    /// # Errors
    ///
    /// Returns [`ProbeError::Unavailable`] if the label is absent from
    /// this kernel's table.
    pub fn get(&self, label: &str) -> Result<u64, ProbeError> {
        self.values
            .get(label)
            .copied()
            .ok_or_else(|| ProbeError::unavailable(format!("{label} not present in meminfo")))
    }

    /// The physical RAM group.
    pub fn ram(&self) -> Result<RamReport, ProbeError> {
        Ok(RamReport {
            total_kb: self.get("MemTotal")?,
            free_kb: self.get("MemFree")?,
            available_kb: self.get("MemAvailable")?,
        })
    }

    /// The swap group.
    pub fn swap(&self) -> Result<SwapReport, ProbeError> {
        Ok(SwapReport {
            total_kb: self.get("SwapTotal")?,
            free_kb: self.get("SwapFree")?,
        })
    }

    /// The CMA group.
    pub fn cma(&self) -> Result<CmaReport, ProbeError> {
        Ok(CmaReport {
            total_kb: self.get("CmaTotal")?,
            free_kb: self.get("CmaFree")?,
        })
    }
}

/// All memory groups of one report.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct MemoryReport {
    /// Physical RAM fields
    pub ram: RamReport,
    /// Swap fields
    pub swap: SwapReport,
    /// CMA fields, absent on kernels without CMA
    pub cma: Option<CmaReport>,
}

/// Probe producing a [`MemoryReport`] from one meminfo snapshot.
#[derive(Debug)]
pub struct MemoryProbe {
    path: std::path::PathBuf,
}

impl MemoryProbe {
    /// Probe over the live `/proc/meminfo`.
    #[must_use]
    pub fn new() -> Self {
        Self {
            path: std::path::PathBuf::from(PROC_MEMINFO_PATH),
        }
    }
}

impl Default for MemoryProbe {
    fn default() -> Self {
        Self::new()
    }
}

impl Probe for MemoryProbe {
    type Report = MemoryReport;

    fn name(&self) -> &str {
        "memory"
    }

    fn check_availability(&self) -> Result<(), ProbeError> {
        MeminfoTable::from_path(&self.path).map(|_| ())
    }

    fn collect(&mut self) -> Result<Self::Report, ProbeError> {
        let table = MeminfoTable::from_path(&self.path)?;
        let cma = match table.cma() {
            Ok(cma) => Some(cma),
            Err(e) => {
                tracing::debug!(error = %e, "kernel has no CMA fields");
                None
            }
        };
        Ok(MemoryReport {
            ram: table.ram()?,
            swap: table.swap()?,
            cma,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Field layout of the target board's kernel: MemTotal on line 0,
    // MemFree on line 2, MemAvailable on line 4, SwapTotal on line 14,
    // SwapFree on line 16, CmaTotal on line 41, CmaFree on line 43.
    const MEMINFO_FIXTURE: &str = "\
MemTotal:        4045816 kB
Buffers:           21096 kB
MemFree:         3460244 kB
Cached:           292040 kB
MemAvailable:    3586484 kB
SwapCached:            0 kB
Active:           201124 kB
Inactive:         227636 kB
Active(anon):     117680 kB
Inactive(anon):    14652 kB
Active(file):      83444 kB
Inactive(file):   212984 kB
Unevictable:           0 kB
Mlocked:               0 kB
SwapTotal:        524284 kB
Dirty:                16 kB
SwapFree:         524280 kB
Writeback:             0 kB
AnonPages:        115652 kB
Mapped:            62832 kB
Shmem:             16712 kB
KReclaimable:      19852 kB
Slab:              57164 kB
SReclaimable:      19852 kB
SUnreclaim:        37312 kB
KernelStack:        2656 kB
PageTables:         1696 kB
NFS_Unstable:          0 kB
Bounce:                0 kB
WritebackTmp:          0 kB
CommitLimit:     2547192 kB
Committed_AS:     729876 kB
VmallocTotal:   135290159040 kB
VmallocUsed:       15820 kB
VmallocChunk:          0 kB
Percpu:             1408 kB
HardwareCorrupted:     0 kB
AnonHugePages:     43008 kB
ShmemHugePages:        0 kB
ShmemPmdMapped:        0 kB
FileHugePages:         0 kB
CmaTotal:         262144 kB
FilePmdMapped:         0 kB
CmaFree:          261140 kB
";

    #[test]
    fn fixture_keeps_the_documented_line_offsets() {
        let line = |n: usize| MEMINFO_FIXTURE.lines().nth(n).unwrap();
        assert!(line(0).starts_with("MemTotal:"));
        assert!(line(2).starts_with("MemFree:"));
        assert!(line(4).starts_with("MemAvailable:"));
        assert!(line(14).starts_with("SwapTotal:"));
        assert!(line(16).starts_with("SwapFree:"));
        assert!(line(41).starts_with("CmaTotal:"));
        assert!(line(43).starts_with("CmaFree:"));
    }

    #[test]
    fn extracts_every_report_field_exactly() {
        let table = MeminfoTable::parse_content(MEMINFO_FIXTURE).unwrap();

        let ram = table.ram().unwrap();
        assert_eq!(ram.total_kb, 4_045_816);
        assert_eq!(ram.free_kb, 3_460_244);
        assert_eq!(ram.available_kb, 3_586_484);

        let swap = table.swap().unwrap();
        assert_eq!(swap.total_kb, 524_284);
        assert_eq!(swap.free_kb, 524_280);

        let cma = table.cma().unwrap();
        assert_eq!(cma.total_kb, 262_144);
        assert_eq!(cma.free_kb, 261_140);
    }

    #[test]
    fn lookup_is_by_label_not_by_position() {
        // Same fields, shuffled the way a different kernel might emit them.
        let content = "\
CmaFree:          261140 kB
MemAvailable:    3586484 kB
SwapFree:         524280 kB
MemTotal:        4045816 kB
CmaTotal:         262144 kB
MemFree:         3460244 kB
SwapTotal:        524284 kB
";
        let table = MeminfoTable::parse_content(content).unwrap();
        assert_eq!(table.ram().unwrap().total_kb, 4_045_816);
        assert_eq!(table.cma().unwrap().free_kb, 261_140);
    }

    #[test]
    fn kernels_without_cma_lose_only_the_cma_group() {
        let content = "\
MemTotal:        4045816 kB
MemFree:         3460244 kB
MemAvailable:    3586484 kB
SwapTotal:        524284 kB
SwapFree:         524280 kB
";
        let table = MeminfoTable::parse_content(content).unwrap();
        assert!(table.ram().is_ok());
        assert!(table.swap().is_ok());
        assert!(matches!(
            table.cma().unwrap_err(),
            ProbeError::Unavailable { .. }
        ));
    }

    #[test]
    fn malformed_value_is_a_parse_error() {
        let err = MeminfoTable::parse_content("MemTotal: lots kB\n").unwrap_err();
        assert!(matches!(err, ProbeError::Parse { .. }));
    }

    #[test]
    fn probe_report_carries_all_groups() {
        let file = tempfile_with(MEMINFO_FIXTURE);
        let mut probe = MemoryProbe {
            path: file.path().to_path_buf(),
        };
        let report = somstat_rs_core::Probe::collect(&mut probe).unwrap();
        assert_eq!(report.ram.total_kb, 4_045_816);
        assert!(report.cma.is_some());
    }

    fn tempfile_with(content: &str) -> tempfile::NamedTempFile {
        let file = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(file.path(), content).unwrap();
        file
    }
}

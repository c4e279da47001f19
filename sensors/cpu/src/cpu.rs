//! CPU load and frequency probes backed by `/proc/stat` and cpufreq.
//!
//! `/proc/stat` exposes one aggregate `cpu` row followed by one `cpu<N>` row
//! per configured CPU. Each row carries jiffy counters for the time spent in
//! user, nice, system, idle, iowait, irq and softirq states. Utilization is
//! derived from the delta between two samples of the same row taken one
//! second apart.

use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use somstat_rs_core::{sysfs, Probe, ProbeError};

/// Path to the kernel's CPU accounting table.
pub const PROC_STAT_PATH: &str = "/proc/stat";

/// Path prefix of the per-CPU cpufreq directories.
const CPUFREQ_BASE: &str = "/sys/devices/system/cpu/cpu";

/// Attribute holding the current frequency in kHz.
const CPUFREQ_CUR_FREQ: &str = "/cpufreq/cpuinfo_cur_freq";

/// Per-CPU accounting counters from `/proc/stat`.
///
/// All values are jiffies, monotonically increasing and reset only on
/// reboot. A sample is consumed by [`utilization`] together with a later
/// sample of the same CPU and then discarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CpuStat {
    /// Time spent in user mode (normal priority)
    pub user: u64,
    /// Time spent in user mode with "niced" priority
    pub nice: u64,
    /// Time spent in kernel mode
    pub system: u64,
    /// Time spent idle with no outstanding disk I/O
    pub idle: u64,
    /// Time spent idle while disk I/O was outstanding
    pub iowait: u64,
    /// Time spent servicing hardware interrupts
    pub irq: u64,
    /// Time spent servicing soft interrupts
    pub softirq: u64,
}

impl CpuStat {
    /// Sample the counters of one CPU from `/proc/stat`.
    ///
    /// # Errors
    ///
    /// Returns [`ProbeError::Io`] if the table cannot be opened and
    /// [`ProbeError::Parse`] if the `cpu<id>` row is absent (id out of
    /// range) or malformed. Fields are never left partially filled.
    pub fn sample(cpu_id: u32) -> Result<Self, ProbeError> {
        Self::sample_from_path(Path::new(PROC_STAT_PATH), cpu_id)
    }

    /// Sample from a specific accounting table (useful for testing).
    pub fn sample_from_path(path: &Path, cpu_id: u32) -> Result<Self, ProbeError> {
        let content = fs::read_to_string(path)?;
        // Row 0 is the aggregate "cpu" row; cpu<N> sits at row N + 1.
        let row = content
            .lines()
            .nth(cpu_id as usize + 1)
            .ok_or_else(|| ProbeError::parse(format!("no row for cpu{cpu_id}")))?;
        Self::parse_row(row, cpu_id)
    }

    /// Parse one `cpu<id>` accounting row.
    ///
    /// The label is checked against the requested id so that an
    /// out-of-range id surfaces as a parse error instead of silently
    /// reading counters from an unrelated row.
    pub fn parse_row(row: &str, cpu_id: u32) -> Result<Self, ProbeError> {
        let mut fields = row.split_whitespace();

        let label = fields
            .next()
            .ok_or_else(|| ProbeError::parse("empty accounting row"))?;
        let expected = format!("cpu{cpu_id}");
        if label != expected {
            return Err(ProbeError::parse(format!(
                "expected row {expected}, found {label:?}"
            )));
        }

        let mut counters = [0u64; 7];
        for (i, slot) in counters.iter_mut().enumerate() {
            let token = fields.next().ok_or_else(|| {
                ProbeError::parse(format!("row {expected} has only {i} of 7 counters"))
            })?;
            *slot = token.parse().map_err(|e| {
                ProbeError::parse_with_source(format!("bad counter {token:?} in row {expected}"), e)
            })?;
        }

        let [user, nice, system, idle, iowait, irq, softirq] = counters;
        Ok(Self {
            user,
            nice,
            system,
            idle,
            iowait,
            irq,
            softirq,
        })
    }
}

/// Instantaneous utilization of one CPU between two samples.
///
/// `prev` and `curr` must belong to the same CPU, with `curr` taken
/// strictly later in wall-clock time; the sampler is responsible for the
/// ordering.
///
/// The expression reproduces the probe's established scaling, including
/// the `+1` bias and the `/10` step. It is not the textbook percentage
/// formula and changing it would alter every reported value.
///
/// # Errors
///
/// Returns [`ProbeError::InvalidState`] when no jiffies elapsed between
/// the samples (`total_delta == 0`); the result is never NaN or infinite.
pub fn utilization(prev: &CpuStat, curr: &CpuStat) -> Result<f64, ProbeError> {
    let idle_prev = prev.idle + prev.iowait;
    let idle_curr = curr.idle + curr.iowait;

    let nonidle_prev = prev.user + prev.nice + prev.system + prev.irq + prev.softirq;
    let nonidle_curr = curr.user + curr.nice + curr.system + curr.irq + curr.softirq;

    let total_prev = idle_prev + nonidle_prev;
    let total_curr = idle_curr + nonidle_curr;

    let total_delta = total_curr as f64 - total_prev as f64;
    let idle_delta = idle_curr as f64 - idle_prev as f64;

    if total_delta == 0.0 {
        return Err(ProbeError::invalid_state(
            "no jiffies elapsed between CPU samples",
        ));
    }

    Ok((1000.0 * (total_delta - idle_delta) / total_delta + 1.0) / 10.0)
}

/// Number of configured CPUs, counted from the `cpu<N>` rows of the
/// accounting table.
pub fn num_cpus() -> Result<usize, ProbeError> {
    num_cpus_from_path(Path::new(PROC_STAT_PATH))
}

/// Count CPUs in a specific accounting table (useful for testing).
pub fn num_cpus_from_path(path: &Path) -> Result<usize, ProbeError> {
    let content = fs::read_to_string(path)?;
    Ok(content
        .lines()
        .filter(|line| is_per_cpu_row(line))
        .count())
}

fn is_per_cpu_row(line: &str) -> bool {
    match line.strip_prefix("cpu") {
        Some(rest) => rest.chars().next().is_some_and(|c| c.is_ascii_digit()),
        None => false,
    }
}

/// Current frequency of one CPU in MHz.
///
/// cpufreq publishes kHz; the report shows MHz.
pub fn frequency_mhz(cpu_id: u32) -> Result<f64, ProbeError> {
    frequency_mhz_at(CPUFREQ_BASE, cpu_id)
}

/// Read the frequency from a specific cpufreq tree (useful for testing).
pub fn frequency_mhz_at(base: &str, cpu_id: u32) -> Result<f64, ProbeError> {
    let khz = sysfs::read_int(base, cpu_id, CPUFREQ_CUR_FREQ)?;
    Ok(khz as f64 / 1000.0)
}

/// Utilization of one CPU over the sampling interval.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct CpuLoad {
    /// CPU id the sample belongs to
    pub cpu_id: u32,
    /// Counters at the end of the interval
    pub stat: CpuStat,
    /// Derived utilization percentage
    pub utilization: f64,
}

/// Current frequency of one CPU.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct CpuFrequency {
    /// CPU id the reading belongs to
    pub cpu_id: u32,
    /// Current frequency in MHz
    pub mhz: f64,
}

/// Probe that samples every CPU twice, one second apart, and derives the
/// per-CPU utilization from the deltas.
#[derive(Debug)]
pub struct CpuLoadProbe {
    path: PathBuf,
    interval: Duration,
}

impl CpuLoadProbe {
    /// Interval separating the two samples of each CPU.
    const SAMPLE_INTERVAL: Duration = Duration::from_secs(1);

    /// Probe over the live `/proc/stat`.
    #[must_use]
    pub fn new() -> Self {
        Self {
            path: PathBuf::from(PROC_STAT_PATH),
            interval: Self::SAMPLE_INTERVAL,
        }
    }
}

impl Default for CpuLoadProbe {
    fn default() -> Self {
        Self::new()
    }
}

impl Probe for CpuLoadProbe {
    type Report = Vec<CpuLoad>;

    fn name(&self) -> &str {
        "cpu-load"
    }

    fn check_availability(&self) -> Result<(), ProbeError> {
        num_cpus_from_path(&self.path).map(|_| ())
    }

    fn collect(&mut self) -> Result<Self::Report, ProbeError> {
        let cpus = num_cpus_from_path(&self.path)?;

        let mut first = Vec::with_capacity(cpus);
        for cpu_id in 0..cpus as u32 {
            let stat = CpuStat::sample_from_path(&self.path, cpu_id)?;
            tracing::debug!(cpu_id, ?stat, "counters at t0");
            first.push(stat);
        }

        thread::sleep(self.interval);

        let mut loads = Vec::with_capacity(cpus);
        for (cpu_id, prev) in first.iter().enumerate() {
            let cpu_id = cpu_id as u32;
            let curr = CpuStat::sample_from_path(&self.path, cpu_id)?;
            tracing::debug!(cpu_id, stat = ?curr, "counters at t1");
            loads.push(CpuLoad {
                cpu_id,
                stat: curr,
                utilization: utilization(prev, &curr)?,
            });
        }

        Ok(loads)
    }
}

/// Probe that reads the current cpufreq frequency of every CPU.
///
/// CPUs whose cpufreq directory is absent (governor not loaded, core
/// offline) are skipped rather than failing the whole section.
#[derive(Debug)]
pub struct CpuFrequencyProbe {
    base: String,
    stat_path: PathBuf,
}

impl CpuFrequencyProbe {
    /// Probe over the live cpufreq tree.
    #[must_use]
    pub fn new() -> Self {
        Self {
            base: CPUFREQ_BASE.to_owned(),
            stat_path: PathBuf::from(PROC_STAT_PATH),
        }
    }
}

impl Default for CpuFrequencyProbe {
    fn default() -> Self {
        Self::new()
    }
}

impl Probe for CpuFrequencyProbe {
    type Report = Vec<CpuFrequency>;

    fn name(&self) -> &str {
        "cpu-frequency"
    }

    fn collect(&mut self) -> Result<Self::Report, ProbeError> {
        let cpus = num_cpus_from_path(&self.stat_path)?;
        let mut frequencies = Vec::with_capacity(cpus);
        for cpu_id in 0..cpus as u32 {
            match frequency_mhz_at(&self.base, cpu_id) {
                Ok(mhz) => frequencies.push(CpuFrequency { cpu_id, mhz }),
                Err(e) => tracing::debug!(cpu_id, error = %e, "cpufreq reading unavailable"),
            }
        }
        if frequencies.is_empty() && cpus > 0 {
            return Err(ProbeError::unavailable(
                "no CPU exposes cpufreq/cpuinfo_cur_freq",
            ));
        }
        Ok(frequencies)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const STAT_FIXTURE: &str = "\
cpu  1000 20 300 4000 50 6 7 0 0 0
cpu0 400 10 100 2000 30 2 3 0 0 0
cpu1 600 10 200 2000 20 4 4 0 0 0
intr 8356123 0 11 0 0 0 0 0 0 0
ctxt 12345678
btime 1700000000
";

    fn stat_file(content: &str) -> tempfile::NamedTempFile {
        let file = tempfile::NamedTempFile::new().unwrap();
        fs::write(file.path(), content).unwrap();
        file
    }

    #[test]
    fn parses_the_row_for_the_requested_cpu() {
        let file = stat_file(STAT_FIXTURE);
        let stat = CpuStat::sample_from_path(file.path(), 1).unwrap();
        assert_eq!(
            stat,
            CpuStat {
                user: 600,
                nice: 10,
                system: 200,
                idle: 2000,
                iowait: 20,
                irq: 4,
                softirq: 4,
            }
        );
    }

    #[test]
    fn extra_kernel_fields_after_softirq_are_ignored() {
        let stat = CpuStat::parse_row("cpu0 1 2 3 4 5 6 7 8 9 10", 0).unwrap();
        assert_eq!(stat.softirq, 7);
    }

    #[test]
    fn out_of_range_cpu_id_is_a_parse_error() {
        let file = stat_file(STAT_FIXTURE);
        // Row 3 exists ("intr ...") but is not a CPU row; row 9 does not.
        assert!(matches!(
            CpuStat::sample_from_path(file.path(), 2).unwrap_err(),
            ProbeError::Parse { .. }
        ));
        assert!(matches!(
            CpuStat::sample_from_path(file.path(), 8).unwrap_err(),
            ProbeError::Parse { .. }
        ));
    }

    #[test]
    fn short_row_is_a_parse_error() {
        assert!(matches!(
            CpuStat::parse_row("cpu0 1 2 3", 0).unwrap_err(),
            ProbeError::Parse { .. }
        ));
    }

    #[test]
    fn counts_per_cpu_rows_only() {
        let file = stat_file(STAT_FIXTURE);
        assert_eq!(num_cpus_from_path(file.path()).unwrap(), 2);
    }

    #[test]
    fn utilization_matches_the_closed_form() {
        let prev = CpuStat {
            user: 4000,
            nice: 20,
            system: 1000,
            idle: 30000,
            iowait: 500,
            irq: 10,
            softirq: 30,
        };
        let curr = CpuStat {
            user: 4060,
            nice: 20,
            system: 1015,
            idle: 30020,
            iowait: 505,
            irq: 10,
            softirq: 30,
        };

        let total_delta = (60 + 15 + 20 + 5) as f64;
        let idle_delta = (20 + 5) as f64;
        let expected = (1000.0 * (total_delta - idle_delta) / total_delta + 1.0) / 10.0;

        assert_eq!(utilization(&prev, &curr).unwrap(), expected);
    }

    #[test]
    fn busier_interval_reports_higher_utilization() {
        let prev = CpuStat {
            user: 100,
            nice: 0,
            system: 50,
            idle: 800,
            iowait: 50,
            irq: 0,
            softirq: 0,
        };
        let mut busy = prev;
        busy.user += 10;
        let mut mixed = prev;
        mixed.user += 10;
        mixed.idle += 10;

        let fully_busy = utilization(&prev, &busy).unwrap();
        let half_busy = utilization(&prev, &mixed).unwrap();
        assert!(fully_busy > half_busy);
        // All 10 elapsed jiffies were active: (1000 * 10/10 + 1) / 10.
        assert_eq!(fully_busy, 100.1);
        // 10 of 20 elapsed jiffies were active: (1000 * 10/20 + 1) / 10.
        assert_eq!(half_busy, 50.1);
    }

    #[test]
    fn zero_total_delta_is_invalid_state_never_nan() {
        let stat = CpuStat {
            user: 1,
            nice: 2,
            system: 3,
            idle: 4,
            iowait: 5,
            irq: 6,
            softirq: 7,
        };
        assert!(matches!(
            utilization(&stat, &stat).unwrap_err(),
            ProbeError::InvalidState { .. }
        ));
    }

    #[test]
    fn frequency_is_reported_in_mhz() {
        let tmp = tempfile::tempdir().unwrap();
        let cpufreq = tmp.path().join("cpu0/cpufreq");
        fs::create_dir_all(&cpufreq).unwrap();
        fs::write(cpufreq.join("cpuinfo_cur_freq"), "1333332\n").unwrap();

        let base = format!("{}/cpu", tmp.path().display());
        let mhz = frequency_mhz_at(&base, 0).unwrap();
        assert!((mhz - 1333.332).abs() < 1e-9);
    }

    #[test]
    fn missing_cpufreq_tree_is_an_io_error() {
        let tmp = tempfile::tempdir().unwrap();
        let base = format!("{}/cpu", tmp.path().display());
        assert!(matches!(
            frequency_mhz_at(&base, 0).unwrap_err(),
            ProbeError::Io(_)
        ));
    }
}

//! ina260 board-power telemetry.
//!
//! The sensor publishes `power1_input` in microwatts, `curr1_input` in
//! milliamps and `in1_input` in millivolts. Power is reported in milliwatts
//! to match the other two units. Each quantity runs through its own moving
//! average sized to the sampling window, so the smoothed values settle over
//! a full run.

use serde::Serialize;

use somstat_rs_core::{sysfs, HwmonLocator, MovingAverage, ProbeError};

/// hwmon driver name of the board power sensor.
pub const BOARD_POWER_DEVICE: &str = "ina260_u14";

/// One power sample together with the smoothed values after it was folded
/// into the averages.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct PowerSample {
    /// Instantaneous power draw in milliwatts
    pub power_mw: i64,
    /// Instantaneous current in milliamps
    pub current_ma: i64,
    /// Supply voltage in millivolts
    pub voltage_mv: i64,
    /// Moving-average power in milliwatts
    pub avg_power_mw: i64,
    /// Moving-average current in milliamps
    pub avg_current_ma: i64,
    /// Moving-average voltage in millivolts
    pub avg_voltage_mv: i64,
}

/// Samples the board power sensor and maintains the moving averages.
#[derive(Debug)]
pub struct BoardPowerMonitor {
    base: String,
    id: u32,
    power_avg: MovingAverage,
    current_avg: MovingAverage,
    voltage_avg: MovingAverage,
}

impl BoardPowerMonitor {
    /// Locate the sensor under `/sys/class/hwmon`.
    ///
    /// `window` is the number of samples the moving averages span,
    /// normally the iteration count of the sampling loop. Returns
    /// `Ok(None)` when the board has no ina260 device; the caller reports
    /// that and skips the section.
    pub fn discover(window: usize) -> Result<Option<Self>, ProbeError> {
        Self::discover_at(&HwmonLocator::default(), window)
    }

    /// Locate the sensor under a specific hwmon root (useful for testing).
    pub fn discover_at(locator: &HwmonLocator, window: usize) -> Result<Option<Self>, ProbeError> {
        let Some(id) = locator.resolve_id(BOARD_POWER_DEVICE)? else {
            return Ok(None);
        };
        tracing::debug!(id, "board power sensor is hwmon{id}");
        Ok(Some(Self {
            base: locator.device_base(),
            id,
            power_avg: MovingAverage::new(window)?,
            current_avg: MovingAverage::new(window)?,
            voltage_avg: MovingAverage::new(window)?,
        }))
    }

    /// hwmon id the sensor was resolved to.
    #[must_use]
    pub fn hwmon_id(&self) -> u32 {
        self.id
    }

    /// Read power, current and voltage once and fold them into the
    /// averages.
    ///
    /// # Errors
    ///
    /// Returns [`ProbeError::Io`] if an attribute vanished (device unbound
    /// mid-run) or [`ProbeError::Parse`] on a malformed attribute. The
    /// averages are only updated by complete samples.
    pub fn sample(&mut self) -> Result<PowerSample, ProbeError> {
        let power_mw = sysfs::read_int(&self.base, self.id, "/power1_input")? / 1000;
        let current_ma = sysfs::read_int(&self.base, self.id, "/curr1_input")?;
        let voltage_mv = sysfs::read_int(&self.base, self.id, "/in1_input")?;

        Ok(PowerSample {
            power_mw,
            current_ma,
            voltage_mv,
            avg_power_mw: self.power_avg.push(power_mw),
            avg_current_ma: self.current_avg.push(current_ma),
            avg_voltage_mv: self.voltage_avg.push(voltage_mv),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::Path;

    fn write_attrs(dir: &Path, attrs: &[(&str, &str)]) {
        for (name, content) in attrs {
            fs::write(dir.join(name), content).unwrap();
        }
    }

    fn board_with_ina260() -> (tempfile::TempDir, HwmonLocator) {
        let tmp = tempfile::tempdir().unwrap();
        let dev = tmp.path().join("hwmon0");
        fs::create_dir(&dev).unwrap();
        write_attrs(
            &dev,
            &[
                ("name", "ina260_u14\n"),
                ("power1_input", "5000000\n"),
                ("curr1_input", "1200\n"),
                ("in1_input", "12000\n"),
            ],
        );
        let locator = HwmonLocator::new(tmp.path());
        (tmp, locator)
    }

    #[test]
    fn discovers_the_sensor_and_converts_microwatts() {
        let (_tmp, locator) = board_with_ina260();
        let mut monitor = BoardPowerMonitor::discover_at(&locator, 4).unwrap().unwrap();
        assert_eq!(monitor.hwmon_id(), 0);

        let sample = monitor.sample().unwrap();
        assert_eq!(sample.power_mw, 5000);
        assert_eq!(sample.current_ma, 1200);
        assert_eq!(sample.voltage_mv, 12000);
        // First sample: average over one value.
        assert_eq!(sample.avg_power_mw, 5000);
    }

    #[test]
    fn averages_follow_changing_readings() {
        let (tmp, locator) = board_with_ina260();
        let mut monitor = BoardPowerMonitor::discover_at(&locator, 4).unwrap().unwrap();
        monitor.sample().unwrap();

        let dev = tmp.path().join("hwmon0");
        write_attrs(&dev, &[("power1_input", "7000000\n")]);
        let sample = monitor.sample().unwrap();
        assert_eq!(sample.power_mw, 7000);
        assert_eq!(sample.avg_power_mw, 6000);
        assert_eq!(sample.avg_current_ma, 1200);
    }

    #[test]
    fn missing_device_is_not_an_error() {
        let tmp = tempfile::tempdir().unwrap();
        let dev = tmp.path().join("hwmon0");
        fs::create_dir(&dev).unwrap();
        write_attrs(&dev, &[("name", "ams\n")]);

        let locator = HwmonLocator::new(tmp.path());
        assert!(BoardPowerMonitor::discover_at(&locator, 4)
            .unwrap()
            .is_none());
    }

    #[test]
    fn vanished_attribute_is_an_io_error() {
        let (tmp, locator) = board_with_ina260();
        let mut monitor = BoardPowerMonitor::discover_at(&locator, 4).unwrap().unwrap();
        fs::remove_file(tmp.path().join("hwmon0/power1_input")).unwrap();
        assert!(matches!(
            monitor.sample().unwrap_err(),
            ProbeError::Io(_)
        ));
    }
}

//! On-chip analog monitor (sysmon) telemetry.
//!
//! The `ams` hwmon device exposes the die temperature sensors of the
//! low-power and full-power domains and the programmable logic, plus a set
//! of internal supply rails. Temperatures are published in millidegrees
//! Celsius, voltages in millivolts. The rail-to-attribute mapping is fixed
//! by the driver.

use serde::Serialize;

use somstat_rs_core::{sysfs, HwmonLocator, ProbeError};

/// hwmon driver name of the on-chip analog monitor.
pub const ANALOG_MONITOR_DEVICE: &str = "ams";

/// One full reading of the analog monitor.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct SysmonReading {
    /// Low-power-domain die temperature in millidegrees Celsius
    pub lpd_temp_mc: i64,
    /// Full-power-domain die temperature in millidegrees Celsius
    pub fpd_temp_mc: i64,
    /// Programmable-logic die temperature in millidegrees Celsius
    pub pl_temp_mc: i64,
    /// System PLLs supply, VCC_PSPLL, in millivolts
    pub vcc_pspll_mv: i64,
    /// PL internal supply, VCC_PSBATT, in millivolts
    pub pl_vccint_mv: i64,
    /// DDR I/O PLL supply, VCC_PSDDR_PLL, in millivolts
    pub vcc_psddr_pll_mv: i64,
    /// VCC_PSINTFP_DDR supply in millivolts
    pub vcc_psintfp_mv: i64,
    /// VCC PS FPD supply in millivolts
    pub vcc_ps_fpd_mv: i64,
    /// PS IO bank 500 supply in millivolts
    pub ps_io_bank_500_mv: i64,
    /// VCC PS GTR supply in millivolts
    pub vcc_ps_gtr_mv: i64,
    /// VTT PS GTR supply in millivolts
    pub vtt_ps_gtr_mv: i64,
}

impl SysmonReading {
    /// Low-power-domain temperature in whole degrees Celsius.
    #[must_use]
    pub fn lpd_temp_c(&self) -> i64 {
        self.lpd_temp_mc / 1000
    }

    /// Full-power-domain temperature in whole degrees Celsius.
    #[must_use]
    pub fn fpd_temp_c(&self) -> i64 {
        self.fpd_temp_mc / 1000
    }

    /// Programmable-logic temperature in whole degrees Celsius.
    #[must_use]
    pub fn pl_temp_c(&self) -> i64 {
        self.pl_temp_mc / 1000
    }

    /// Read the analog monitor under `/sys/class/hwmon`.
    ///
    /// Returns `Ok(None)` when the chip exposes no `ams` device; the
    /// caller reports that and skips the section.
    pub fn read() -> Result<Option<Self>, ProbeError> {
        Self::read_at(&HwmonLocator::default())
    }

    /// Read the analog monitor under a specific hwmon root (useful for
    /// testing).
    pub fn read_at(locator: &HwmonLocator) -> Result<Option<Self>, ProbeError> {
        let Some(id) = locator.resolve_id(ANALOG_MONITOR_DEVICE)? else {
            return Ok(None);
        };
        tracing::debug!(id, "analog monitor is hwmon{id}");

        let base = locator.device_base();
        let attr = |suffix: &str| sysfs::read_int(&base, id, suffix);

        Ok(Some(Self {
            lpd_temp_mc: attr("/temp1_input")?,
            fpd_temp_mc: attr("/temp2_input")?,
            pl_temp_mc: attr("/temp3_input")?,
            vcc_pspll_mv: attr("/in1_input")?,
            pl_vccint_mv: attr("/in3_input")?,
            vcc_psddr_pll_mv: attr("/in6_input")?,
            vcc_psintfp_mv: attr("/in7_input")?,
            vcc_ps_fpd_mv: attr("/in9_input")?,
            ps_io_bank_500_mv: attr("/in13_input")?,
            vcc_ps_gtr_mv: attr("/in16_input")?,
            vtt_ps_gtr_mv: attr("/in17_input")?,
        }))
    }
}

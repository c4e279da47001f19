//! somstat-rs-report: the full platform-statistics report.
//!
//! Runs every probe in a fixed order: CPU utilization, RAM, swap, board
//! power, the on-chip analog monitor, CMA and CPU frequency. Sections are
//! independent; a board without some sensor (or a kernel without some
//! pseudo-file) loses only the affected section.

use anyhow::Result;
use clap::Parser;
use serde::Serialize;
use somstat_rs_core::{Probe, ProbeError};
use somstat_rs_cpu::{CpuFrequency, CpuFrequencyProbe, CpuLoad, CpuLoadProbe};
use somstat_rs_memory::{CmaReport, MeminfoTable, RamReport, SwapReport};
use somstat_rs_power::{
    BoardPowerMonitor, PowerSample, SysmonReading, ANALOG_MONITOR_DEVICE, BOARD_POWER_DEVICE,
};
use std::time::Duration;
use tokio::time;
use tracing_subscriber::EnvFilter;

/// Command-line arguments for the full report.
#[derive(Parser)]
#[command(name = "somstat-rs-report")]
#[command(about = "Platform statistics report: CPU, memory and power telemetry")]
#[command(version)]
#[command(author)]
struct Args {
    /// Seconds between power samples
    #[arg(short, long, default_value = "1", value_parser = validate_seconds)]
    rate: u64,

    /// Number of power samples to take
    #[arg(short, long, default_value = "10", value_parser = validate_count)]
    duration: usize,

    /// Emit the report as JSON instead of the console layout
    #[arg(long)]
    json: bool,

    /// Log per-sample diagnostics (raw CPU counters, hwmon discovery)
    #[arg(short, long)]
    verbose: bool,
}

/// Validate that a seconds value is at least 1.
fn validate_seconds(s: &str) -> Result<u64, String> {
    let seconds = s
        .parse::<u64>()
        .map_err(|_| "rate must be a positive integer".to_owned())?;
    if seconds == 0 {
        return Err("rate must be at least 1 second".to_owned());
    }
    Ok(seconds)
}

/// Validate that an iteration count is at least 1.
fn validate_count(s: &str) -> Result<usize, String> {
    let count = s
        .parse::<usize>()
        .map_err(|_| "duration must be a positive integer".to_owned())?;
    if count == 0 {
        return Err("duration must be at least 1 sample".to_owned());
    }
    Ok(count)
}

/// Everything the report gathered; `None` marks a skipped section.
#[derive(Default, Serialize)]
struct FullReport {
    cpu_load: Option<Vec<CpuLoad>>,
    ram: Option<RamReport>,
    swap: Option<SwapReport>,
    power: Option<Vec<PowerSample>>,
    sysmon: Option<SysmonReading>,
    cma: Option<CmaReport>,
    cpu_frequency: Option<Vec<CpuFrequency>>,
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn skip(section: &str, error: &ProbeError) {
    tracing::warn!(section, %error, "section skipped");
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    let mut report = FullReport::default();
    let human = !args.json;

    // CPU utilization
    match CpuLoadProbe::new().collect() {
        Ok(loads) => {
            if human {
                println!("CPU Utilization");
                for load in &loads {
                    println!("CPU{}\t:     {:.2}%", load.cpu_id, load.utilization);
                }
                println!();
            }
            report.cpu_load = Some(loads);
        }
        Err(e) => skip("cpu-load", &e),
    }

    // RAM
    match MeminfoTable::read().and_then(|t| t.ram()) {
        Ok(ram) => {
            if human {
                println!("RAM Utilization");
                println!("MemTotal      :     {} kB", ram.total_kb);
                println!("MemFree       :     {} kB", ram.free_kb);
                println!("MemAvailable  :     {} kB", ram.available_kb);
                println!();
            }
            report.ram = Some(ram);
        }
        Err(e) => skip("ram", &e),
    }

    // Swap
    match MeminfoTable::read().and_then(|t| t.swap()) {
        Ok(swap) => {
            if human {
                println!("Swap Mem Utilization");
                println!("SwapTotal     :     {} kB", swap.total_kb);
                println!("SwapFree      :     {} kB", swap.free_kb);
                println!();
            }
            report.swap = Some(swap);
        }
        Err(e) => skip("swap", &e),
    }

    // Board power, sampled over the requested window
    if human {
        println!("Power Utilization");
    }
    match BoardPowerMonitor::discover(args.duration) {
        Ok(Some(mut monitor)) => {
            let mut samples = Vec::with_capacity(args.duration);
            let mut interval = time::interval(Duration::from_secs(args.rate));
            for _ in 0..args.duration {
                interval.tick().await;
                match monitor.sample() {
                    Ok(sample) => {
                        if human {
                            println!(
                                "total power    :     {} mW\t avg power    :    {} mW",
                                sample.power_mw, sample.avg_power_mw
                            );
                            println!(
                                "total current  :     {} mA\t avg current  :    {} mA",
                                sample.current_ma, sample.avg_current_ma
                            );
                            println!(
                                "total voltage  :     {} mV\t avg voltage  :    {} mV",
                                sample.voltage_mv, sample.avg_voltage_mv
                            );
                            println!();
                        }
                        samples.push(sample);
                    }
                    Err(e) => {
                        skip("power", &e);
                        break;
                    }
                }
            }
            if !samples.is_empty() {
                report.power = Some(samples);
            }
        }
        Ok(None) => {
            if human {
                println!("no hwmon device found for {BOARD_POWER_DEVICE} under /sys/class/hwmon");
            } else {
                tracing::warn!("no hwmon device found for {BOARD_POWER_DEVICE}");
            }
        }
        Err(e) => skip("power", &e),
    }

    // On-chip analog monitor
    match SysmonReading::read() {
        Ok(Some(reading)) => {
            if human {
                print_sysmon(&reading);
            }
            report.sysmon = Some(reading);
        }
        Ok(None) => {
            if human {
                println!("no hwmon device found for {ANALOG_MONITOR_DEVICE} under /sys/class/hwmon");
            } else {
                tracing::warn!("no hwmon device found for {ANALOG_MONITOR_DEVICE}");
            }
        }
        Err(e) => skip("sysmon", &e),
    }

    // CMA
    match MeminfoTable::read().and_then(|t| t.cma()) {
        Ok(cma) => {
            if human {
                println!("CMA Mem Utilization");
                println!("CmaTotal      :     {} kB", cma.total_kb);
                println!("CmaFree       :     {} kB", cma.free_kb);
                println!();
            }
            report.cma = Some(cma);
        }
        Err(e) => skip("cma", &e),
    }

    // CPU frequency
    match CpuFrequencyProbe::new().collect() {
        Ok(frequencies) => {
            if human {
                println!("CPU Frequency");
                for freq in &frequencies {
                    println!("CPU{}\t:    {:.3} MHz", freq.cpu_id, freq.mhz);
                }
                println!();
            }
            report.cpu_frequency = Some(frequencies);
        }
        Err(e) => skip("cpu-frequency", &e),
    }

    if args.json {
        println!("{}", serde_json::to_string(&report)?);
    }

    Ok(())
}

fn print_sysmon(reading: &SysmonReading) {
    println!("AMS CTRL");
    println!(
        "System PLLs voltage measurement, VCC_PSLL        :     {} mV",
        reading.vcc_pspll_mv
    );
    println!(
        "PL internal voltage measurement, VCC_PSBATT      :     {} mV",
        reading.pl_vccint_mv
    );
    println!(
        "Voltage measurement for six DDR I/O PLLs         :     {} mV",
        reading.vcc_psddr_pll_mv
    );
    println!(
        "VCC_PSINTFP_DDR voltage measurement              :     {} mV",
        reading.vcc_psintfp_mv
    );
    println!();

    println!("PS Sysmon");
    println!(
        "LPD temperature measurement                      :     {} C",
        reading.lpd_temp_c()
    );
    println!(
        "FPD temperature measurement (REMOTE)             :     {} C",
        reading.fpd_temp_c()
    );
    println!(
        "VCC PS FPD voltage measurement (supply 2)        :     {} mV",
        reading.vcc_ps_fpd_mv
    );
    println!(
        "PS IO Bank 500 voltage measurement (supply 6)    :     {} mV",
        reading.ps_io_bank_500_mv
    );
    println!(
        "VCC PS GTR voltage                               :     {} mV",
        reading.vcc_ps_gtr_mv
    );
    println!(
        "VTT PS GTR voltage                               :     {} mV",
        reading.vtt_ps_gtr_mv
    );
    println!();

    println!("PL Sysmon");
    println!(
        "PL temperature                                   :     {} C",
        reading.pl_temp_c()
    );
    println!();
}

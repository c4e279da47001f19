//! somstat-rs-power: board power and on-chip analog telemetry report.
//!
//! Samples the ina260 power sensor `duration` times, `rate` seconds apart,
//! printing each sample next to its moving average, then reads the on-chip
//! analog monitor once.

use clap::Parser;
use serde::Serialize;
use somstat_rs_power::{BoardPowerMonitor, PowerSample, SysmonReading, BOARD_POWER_DEVICE};
use std::time::Duration;
use tokio::time;
use tracing_subscriber::EnvFilter;

/// Command-line arguments for the power report.
#[derive(Parser)]
#[command(name = "somstat-rs-power")]
#[command(about = "Board power and analog-monitor probe for somstat-rs")]
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

    /// Log hwmon discovery diagnostics
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

#[derive(Serialize)]
struct PowerReport {
    samples: Vec<PowerSample>,
    sysmon: Option<SysmonReading>,
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

fn print_sample(sample: &PowerSample) {
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

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    init_tracing(args.verbose);

    let mut samples = Vec::with_capacity(args.duration);

    if !args.json {
        println!("Power Utilization");
    }

    match BoardPowerMonitor::discover(args.duration)? {
        Some(mut monitor) => {
            let mut interval = time::interval(Duration::from_secs(args.rate));
            for _ in 0..args.duration {
                interval.tick().await;
                let sample = monitor.sample()?;
                if !args.json {
                    print_sample(&sample);
                }
                samples.push(sample);
            }
        }
        None => {
            if args.json {
                tracing::warn!("no hwmon device found for {BOARD_POWER_DEVICE}");
            } else {
                println!("no hwmon device found for {BOARD_POWER_DEVICE} under /sys/class/hwmon");
            }
        }
    }

    let sysmon = SysmonReading::read()?;
    match (&sysmon, args.json) {
        (Some(reading), false) => print_sysmon(reading),
        (None, true) => tracing::warn!(
            "no hwmon device found for {}",
            somstat_rs_power::ANALOG_MONITOR_DEVICE
        ),
        (None, false) => println!(
            "no hwmon device found for {} under /sys/class/hwmon",
            somstat_rs_power::ANALOG_MONITOR_DEVICE
        ),
        _ => {}
    }

    if args.json {
        let report = PowerReport { samples, sysmon };
        println!("{}", serde_json::to_string(&report)?);
    }

    Ok(())
}

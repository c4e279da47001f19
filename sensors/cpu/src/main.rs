//! somstat-rs-cpu: CPU utilization and frequency report.
//!
//! Samples every CPU twice, one second apart, prints the derived
//! utilization and the current cpufreq frequency per CPU.

use clap::Parser;
use serde::Serialize;
use somstat_rs_core::Probe;
use somstat_rs_cpu::{CpuFrequency, CpuFrequencyProbe, CpuLoad, CpuLoadProbe};
use std::process;
use tracing_subscriber::EnvFilter;

/// Command-line arguments for the CPU report.
#[derive(Parser)]
#[command(name = "somstat-rs-cpu")]
#[command(about = "CPU utilization and frequency probe for somstat-rs")]
#[command(version)]
#[command(author)]
struct Args {
    /// Emit the report as JSON instead of the console layout
    #[arg(long)]
    json: bool,

    /// Verify /proc/stat access and exit
    #[arg(long)]
    check: bool,

    /// Log per-sample diagnostics (raw counters at t0 and t1)
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Serialize)]
struct CpuReport {
    loads: Vec<CpuLoad>,
    frequencies: Vec<CpuFrequency>,
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

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    init_tracing(args.verbose);

    let mut load_probe = CpuLoadProbe::new();

    if args.check {
        match load_probe.check_availability() {
            Ok(()) => {
                println!("CPU probe is available");
                return Ok(());
            }
            Err(e) => {
                eprintln!("CPU probe is not available: {e}");
                process::exit(1);
            }
        }
    }

    let loads = load_probe.collect()?;

    // Frequency is best effort; boards without cpufreq still get the
    // utilization section.
    let frequencies = match CpuFrequencyProbe::new().collect() {
        Ok(frequencies) => frequencies,
        Err(e) => {
            tracing::warn!(error = %e, "CPU frequency section skipped");
            Vec::new()
        }
    };

    if args.json {
        let report = CpuReport { loads, frequencies };
        println!("{}", serde_json::to_string(&report)?);
        return Ok(());
    }

    println!("CPU Utilization");
    for load in &loads {
        println!("CPU{}\t:     {:.2}%", load.cpu_id, load.utilization);
    }
    println!();

    if !frequencies.is_empty() {
        println!("CPU Frequency");
        for freq in &frequencies {
            println!("CPU{}\t:    {:.3} MHz", freq.cpu_id, freq.mhz);
        }
        println!();
    }

    Ok(())
}

//! somstat-rs-memory: RAM, swap and CMA usage report.

use clap::Parser;
use somstat_rs_core::Probe;
use somstat_rs_memory::MemoryProbe;
use std::process;
use tracing_subscriber::EnvFilter;

/// Command-line arguments for the memory report.
#[derive(Parser)]
#[command(name = "somstat-rs-memory")]
#[command(about = "RAM, swap and CMA usage probe for somstat-rs")]
#[command(version)]
#[command(author)]
struct Args {
    /// Emit the report as JSON instead of the console layout
    #[arg(long)]
    json: bool,

    /// Verify /proc/meminfo access and exit
    #[arg(long)]
    check: bool,

    /// Log per-field diagnostics
    #[arg(short, long)]
    verbose: bool,
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

    let mut probe = MemoryProbe::new();

    if args.check {
        match probe.check_availability() {
            Ok(()) => {
                println!("memory probe is available");
                return Ok(());
            }
            Err(e) => {
                eprintln!("memory probe is not available: {e}");
                process::exit(1);
            }
        }
    }

    let report = probe.collect()?;

    if args.json {
        println!("{}", serde_json::to_string(&report)?);
        return Ok(());
    }

    println!("RAM Utilization");
    println!("MemTotal      :     {} kB", report.ram.total_kb);
    println!("MemFree       :     {} kB", report.ram.free_kb);
    println!("MemAvailable  :     {} kB", report.ram.available_kb);
    println!();

    println!("Swap Mem Utilization");
    println!("SwapTotal     :     {} kB", report.swap.total_kb);
    println!("SwapFree      :     {} kB", report.swap.free_kb);
    println!();

    match report.cma {
        Some(cma) => {
            println!("CMA Mem Utilization");
            println!("CmaTotal      :     {} kB", cma.total_kb);
            println!("CmaFree       :     {} kB", cma.free_kb);
            println!();
        }
        None => tracing::warn!("CMA section skipped: kernel exposes no CMA fields"),
    }

    Ok(())
}

//! memprobe-rs-memory: memory health check binary for monitoring schedulers.
//!
//! Runs one check of RAM and swap utilization against warning/critical
//! thresholds, prints a monitoring-plugin status line with performance data
//! on stdout, and exits with the matching plugin exit code (0/1/2/3).

use clap::Parser;
use memprobe_rs_core::{CheckOutput, GlobalConfig, Probe, Severity};
use memprobe_rs_memory::{probe::SERVICE, MemoryProbe, RawThresholds};
use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Command-line arguments for the memory probe.
#[derive(Parser)]
#[command(name = "memprobe-rs-memory")]
#[command(about = "Memory health probe for memprobe-rs")]
#[command(version)]
#[command(author)]
struct Args {
    /// Warning threshold percentage for used memory
    #[arg(short = 'w', long)]
    mem_warn: Option<String>,

    /// Critical threshold percentage for used memory
    #[arg(short = 'c', long)]
    mem_crit: Option<String>,

    /// Warning threshold percentage for used swap
    #[arg(long)]
    swap_warn: Option<String>,

    /// Critical threshold percentage for used swap
    #[arg(long)]
    swap_crit: Option<String>,

    /// Gather perfdata only; always report OK regardless of usage
    #[arg(long)]
    perfdata_only: bool,

    /// Log level filter (error, warn, info, debug, trace)
    #[arg(short = 'd', long, default_value = "error")]
    debug: String,

    /// Write log output to this file instead of stderr
    #[arg(short = 'l', long, value_name = "FILE")]
    logfile: Option<PathBuf>,

    /// Check probe availability and exit
    #[arg(long)]
    check: bool,
}

/// Install the tracing subscriber.
///
/// Logs go to stderr by default; stdout is reserved for the status line the
/// scheduler consumes. If the requested log file cannot be opened the probe
/// falls back to stderr rather than aborting the check.
fn init_logging(level: &str, logfile: Option<&Path>) {
    let filter = || EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("error"));

    if let Some(path) = logfile {
        match std::fs::File::create(path) {
            Ok(file) => {
                tracing_subscriber::fmt()
                    .with_env_filter(filter())
                    .with_writer(Arc::new(file))
                    .with_ansi(false)
                    .init();
                return;
            }
            Err(e) => {
                eprintln!("Unable to open log file '{}' for writing: {}", path.display(), e);
            }
        }
    }

    tracing_subscriber::fmt()
        .with_env_filter(filter())
        .with_writer(std::io::stderr)
        .init();
}

/// Main entry point for the memory probe.
fn main() {
    let args = Args::parse();
    init_logging(&args.debug, args.logfile.as_deref());

    let config = GlobalConfig::load().unwrap_or_else(|e| {
        tracing::warn!(%e, "failed to load config, using defaults");
        GlobalConfig::default()
    });

    let defaults = &config.thresholds;
    let thresholds = RawThresholds::new(
        args.mem_warn.unwrap_or_else(|| defaults.mem_warn.to_string()),
        args.mem_crit.unwrap_or_else(|| defaults.mem_crit.to_string()),
        args.swap_warn.unwrap_or_else(|| defaults.swap_warn.to_string()),
        args.swap_crit.unwrap_or_else(|| defaults.swap_crit.to_string()),
    );

    let mut probe = MemoryProbe::new(thresholds, args.perfdata_only || config.perfdata_only);

    if args.check {
        match probe.check_availability() {
            Ok(()) => {
                println!("Memory probe is available");
                return;
            }
            Err(e) => {
                eprintln!("Memory probe is not available: {}", e);
                process::exit(1);
            }
        }
    }

    // Collection and parse failures still emit a determinate status line:
    // the scheduler gets UNKNOWN with a reason, never silence or a crash.
    let output = match probe.check() {
        Ok(output) => output,
        Err(e) => {
            tracing::error!(%e, "memory check failed");
            CheckOutput::new(SERVICE, Severity::Unknown, format!("check failed: {e}"))
        }
    };

    println!("{}", output.render());
    process::exit(output.exit_code());
}

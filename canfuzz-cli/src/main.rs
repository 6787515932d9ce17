// canfuzz CLI - Labeled CAN bus dataset generator
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! # canfuzz
//!
//! Writes a labeled CAN dataset (`R` normal, `T` injected) to a CSV file.
//!
//! ## Usage
//!
//! ```bash
//! # Default run: Fuzzy_dataset.csv with 3,347,013 normal and 491,847 injected frames
//! canfuzz
//!
//! # Small reproducible dataset with a manifest
//! canfuzz -o small.csv --normal 1000 --injected 100 --seed 42 --manifest
//!
//! # Summarize an existing file
//! canfuzz --inspect small.csv
//! ```

mod progress;

use canfuzz::{
    generate_dataset, CanfuzzError, DatasetManifest, DatasetSummary, GenerationReport,
    GeneratorConfig, NoProgress, ProgressReporter, SignalTable, Timestamp, Timing, DEFAULT_OUTPUT,
};
use clap::Parser;
use progress::ProgressBar;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{debug, info, Level};
use tracing_subscriber::EnvFilter;

/// Labeled CAN bus dataset generator
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Output CSV file
    #[arg(short, long, default_value = DEFAULT_OUTPUT)]
    output: PathBuf,

    /// Number of normal frames
    #[arg(long, default_value_t = canfuzz::generator::DEFAULT_NORMAL_TARGET)]
    normal: u64,

    /// Number of injected frames
    #[arg(long, default_value_t = canfuzz::generator::DEFAULT_INJECTED_TARGET)]
    injected: u64,

    /// Lowest injected identifier (decimal or 0x-prefixed hex)
    #[arg(long, value_parser = parse_id, default_value = "0x206")]
    injected_min: u32,

    /// Highest injected identifier (decimal or 0x-prefixed hex)
    #[arg(long, value_parser = parse_id, default_value = "0x2FF")]
    injected_max: u32,

    /// Random seed (entropy when omitted)
    #[arg(short, long)]
    seed: Option<u64>,

    /// JSON signal table replacing the built-in vehicle table
    #[arg(long)]
    signals: Option<PathBuf>,

    /// First timestamp (<seconds>.<micros>); switches to simulated time
    #[arg(long)]
    start_time: Option<Timestamp>,

    /// Microseconds between frames in simulated time
    #[arg(long, default_value = "1000", requires = "start_time")]
    interval_micros: u64,

    /// Write <output>.manifest.json next to the dataset
    #[arg(short, long)]
    manifest: bool,

    /// Summarize an existing dataset instead of generating one
    #[arg(long, value_name = "FILE")]
    inspect: Option<PathBuf>,

    /// Print the --inspect summary as JSON
    #[arg(long, requires = "inspect")]
    json: bool,

    /// Disable the progress bar
    #[arg(short, long)]
    quiet: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "warn")]
    log_level: String,
}

fn main() -> ExitCode {
    let args = Args::parse();

    // Initialize tracing
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = match args.log_level.to_lowercase().as_str() {
            "trace" => Level::TRACE,
            "debug" => Level::DEBUG,
            "info" => Level::INFO,
            "warn" => Level::WARN,
            "error" => Level::ERROR,
            _ => Level::WARN,
        };
        EnvFilter::from_default_env().add_directive(level.into())
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    info!("canfuzz v{}", canfuzz::VERSION);

    if let Some(path) = &args.inspect {
        return match inspect(path, args.json) {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                eprintln!("Error inspecting dataset: {}", e);
                ExitCode::FAILURE
            }
        };
    }

    match generate(&args) {
        Ok(report) => {
            println!(
                "\nDataset generated successfully and saved to {}",
                report.path.display()
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error generating dataset: {}", e);
            ExitCode::FAILURE
        }
    }
}

/// Accept `0x1A0`, `0X1a0` or `416`.
fn parse_id(s: &str) -> Result<u32, String> {
    let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u32::from_str_radix(hex, 16),
        None => s.parse(),
    };
    parsed.map_err(|e| format!("invalid identifier {:?}: {}", s, e))
}

/// Build the generator configuration from command-line flags.
fn config_from_args(args: &Args) -> Result<GeneratorConfig, CanfuzzError> {
    let mut config = GeneratorConfig::new()
        .with_targets(args.normal, args.injected)
        .with_injected_ids(args.injected_min, args.injected_max);

    if let Some(seed) = args.seed {
        config = config.with_seed(seed);
    }

    if let Some(path) = &args.signals {
        let signals = SignalTable::from_json_file(path)?;
        info!("Loaded {} signals from {}", signals.len(), path.display());
        config = config.with_signals(signals);
    }

    if let Some(start) = args.start_time {
        config = config.with_timing(Timing::Fixed {
            start,
            interval_micros: args.interval_micros,
        });
    }

    config.validate()?;
    Ok(config)
}

fn generate(args: &Args) -> Result<GenerationReport, CanfuzzError> {
    let config = config_from_args(args)?;

    info!(
        "Generating {} frames ({} normal, {} injected) into {}",
        config.total_target(),
        config.normal_target,
        config.injected_target,
        args.output.display()
    );
    debug!("Configuration: {:?}", config);

    let mut progress: Box<dyn ProgressReporter> = if args.quiet {
        Box::new(NoProgress)
    } else {
        Box::new(ProgressBar::stderr("Generating CAN dataset"))
    };

    let report = generate_dataset(config.clone(), &args.output, progress.as_mut())?;

    info!(
        "Wrote {} normal and {} injected frames",
        report.counters.normal, report.counters.injected
    );

    if args.manifest {
        let manifest_path = DatasetManifest::path_for(&args.output);
        DatasetManifest::from_run(&config, &report).to_json_file(&manifest_path)?;
        info!("Manifest saved to {}", manifest_path.display());
    }

    Ok(report)
}

fn inspect(path: &Path, json: bool) -> Result<(), CanfuzzError> {
    let summary = DatasetSummary::from_path(path)?;

    if json {
        let text = serde_json::to_string_pretty(&summary).map_err(canfuzz::DatasetError::from)?;
        println!("{}", text);
        return Ok(());
    }

    println!("{}", path.display());
    println!("  frames:    {}", summary.len());
    println!("  normal:    {}", summary.counters.normal);
    println!("  injected:  {}", summary.counters.injected);
    if let (Some(first), Some(last)) = (summary.first_timestamp, summary.last_timestamp) {
        println!("  time span: {} .. {}", first, last);
    }
    println!("  monotonic: {}", summary.monotonic);
    println!("  identifiers:");
    for (id, count) in &summary.per_id {
        println!("    {:>4X}  {}", id, count);
    }

    Ok(())
}

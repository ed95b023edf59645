//! CLI driver: replay an ITCH 5.0 capture and emit hourly VWAP reports.
//!
//! # Usage
//!
//! ```bash
//! # Reports land in the current directory
//! cargo run --release --bin hourly_vwap -- 01302019.NASDAQ_ITCH50
//!
//! # Choose a report directory and export replay counters
//! cargo run --release --bin hourly_vwap -- \
//!     --output-dir reports/ \
//!     --stats replay_stats.json \
//!     01302019.NASDAQ_ITCH50
//! ```
//!
//! Diagnostics go to stderr through the logger (`RUST_LOG` controls
//! verbosity, default `info`); the session log (system events, report
//! emissions) goes to stdout.

use std::env;
use std::path::PathBuf;
use std::time::Instant;

use itch_vwap::{EngineConfig, MessageReader, VwapEngine};

/// Command-line arguments
struct Args {
    /// Path to the unzipped ITCH 5.0 capture
    capture: PathBuf,
    /// Directory the hourly CSV reports are written into
    output_dir: PathBuf,
    /// Optional path for a JSON dump of the replay counters
    stats: Option<PathBuf>,
}

fn parse_args() -> Result<Args, String> {
    let args: Vec<String> = env::args().collect();

    let mut capture: Option<PathBuf> = None;
    let mut output_dir = PathBuf::from(".");
    let mut stats: Option<PathBuf> = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--output-dir" | "-o" => {
                i += 1;
                if i >= args.len() {
                    return Err("--output-dir requires a path".to_string());
                }
                output_dir = PathBuf::from(&args[i]);
            }
            "--stats" => {
                i += 1;
                if i >= args.len() {
                    return Err("--stats requires a path".to_string());
                }
                stats = Some(PathBuf::from(&args[i]));
            }
            "--help" | "-h" => {
                print_usage();
                std::process::exit(0);
            }
            arg => {
                if capture.is_none() {
                    capture = Some(PathBuf::from(arg));
                } else {
                    return Err(format!("Unknown argument: {arg}"));
                }
            }
        }
        i += 1;
    }

    let capture = capture.ok_or("capture path is required")?;

    Ok(Args {
        capture,
        output_dir,
        stats,
    })
}

fn print_usage() {
    println!(
        r#"Usage:
    hourly_vwap [OPTIONS] <unzipped NASDAQ ITCH 5.0 file>
    Example: hourly_vwap 01302019.NASDAQ_ITCH50

OPTIONS:
    -o, --output-dir <DIR>    Directory for Stock_VWAP_HH.csv reports (default: .)
        --stats <FILE>        Write replay counters as JSON to FILE
    -h, --help                Print this help message"#
    );
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let args = match parse_args() {
        Ok(args) => args,
        Err(e) => {
            print_usage();
            eprintln!("\nError: {e}");
            std::process::exit(1);
        }
    };

    let start = Instant::now();

    let reader = match MessageReader::open(&args.capture) {
        Ok(reader) => reader,
        Err(e) => {
            eprintln!("An error occurred: {e}");
            std::process::exit(1);
        }
    };

    let config = EngineConfig::default().with_output_dir(&args.output_dir);
    let mut engine = VwapEngine::with_config(&reader, config);

    for msg in reader.messages() {
        engine.handle_message(&msg);
    }
    engine.finish();

    let elapsed = start.elapsed().as_secs_f64();
    let stats = engine.stats();
    let throughput = stats.messages_processed as f64 / elapsed.max(f64::MIN_POSITIVE);

    println!();
    println!("Replay complete:");
    println!("  Capture size:      {} bytes", reader.len());
    println!("  Messages:          {}", stats.messages_processed);
    println!("  Executions:        {}", stats.executions_applied);
    println!("  Dropped:           {}", stats.executions_dropped);
    println!("  Live orders:       {}", engine.order_count());
    println!("  Symbols:           {}", engine.symbols().len());
    println!("  Reports written:   {}", stats.reports_written);
    println!("  Time:              {elapsed:.2}s ({throughput:.0} msg/s)");

    if let Some(path) = &args.stats {
        if let Err(e) = stats.save_json(path) {
            eprintln!("Failed to write stats to {}: {e}", path.display());
        }
    }

    if stats.report_failures > 0 {
        std::process::exit(1);
    }
}

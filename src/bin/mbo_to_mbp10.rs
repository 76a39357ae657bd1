//! CLI tool converting an MBO CSV export into MBP-10 rows.
//!
//! # Usage
//!
//! ```bash
//! cargo run --release --bin mbo-to-mbp10 -- data/mbo.csv data/mbp.csv
//!
//! # Compressed input is read transparently
//! cargo run --release --bin mbo-to-mbp10 -- data/mbo.csv.zst data/mbp.csv
//! ```
//!
//! Diagnostics go to stderr through `env_logger` (`RUST_LOG=info` prints the
//! run summary). Exit code 1 on missing arguments or unopenable files.

use std::env;
use std::path::PathBuf;
use std::process;
use std::time::Instant;

use mbp10_reconstructor::replay::{replay_files, ReplayConfig};

/// Command-line arguments
struct Args {
    /// MBO CSV input
    input: PathBuf,
    /// MBP-10 CSV output (created or truncated)
    output: PathBuf,
}

fn parse_args() -> Option<Args> {
    let mut args = env::args_os().skip(1);
    let input = PathBuf::from(args.next()?);
    let output = PathBuf::from(args.next()?);
    Some(Args { input, output })
}

fn program_name() -> String {
    env::args().next().unwrap_or_else(|| "mbo-to-mbp10".to_string())
}

fn main() {
    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .format_timestamp_millis()
        .init();

    let args = match parse_args() {
        Some(args) => args,
        None => {
            eprintln!("Usage: {} <input_mbo.csv> <output_mbp.csv>", program_name());
            process::exit(1);
        }
    };

    let start = Instant::now();
    let summary = match replay_files(&args.input, &args.output, &ReplayConfig::default()) {
        Ok(summary) => summary,
        Err(e) => {
            eprintln!("Error: {e}");
            process::exit(1);
        }
    };

    log::info!(
        "{} -> {}: {} rows in {:.2}s",
        args.input.display(),
        args.output.display(),
        summary.rows_written,
        start.elapsed().as_secs_f64()
    );
}

//! End-to-end replay: MBO CSV in, MBP-10 CSV out.
//!
//! A single synchronous pass. Each line is parsed, folded into the book and,
//! if it produces a row, written before the next line is read.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::time::Instant;

use crate::error::{Mbp10Error, Result};
use crate::lob::{Mbp10Reconstructor, ReconstructorConfig, ReconstructorStats};
use crate::loader::{CsvLoader, LineEvent, LoaderStats, SkipReason, IO_BUFFER_SIZE};
use crate::types::{MBO_RTYPE, MBP10_RTYPE, MBP_DEPTH};
use crate::warnings::{WarningCategory, WarningSummary};
use crate::writer::Mbp10Writer;

/// Configuration for a replay run.
#[derive(Debug, Clone)]
pub struct ReplayConfig {
    /// Book behavior (depth, duplicate policy, checks)
    pub reconstructor: ReconstructorConfig,

    /// Input record type treated as MBO
    pub mbo_rtype: u16,

    /// Value written in the output `rtype` column
    pub output_rtype: u16,

    /// Value written in the output `depth` column
    pub depth_marker: usize,

    /// Whether the input starts with a header line
    pub skip_header: bool,
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self {
            reconstructor: ReconstructorConfig::default(),
            mbo_rtype: MBO_RTYPE,
            output_rtype: MBP10_RTYPE,
            depth_marker: MBP_DEPTH,
            skip_header: true,
        }
    }
}

impl ReplayConfig {
    /// Use a specific reconstructor configuration.
    pub fn with_reconstructor(mut self, config: ReconstructorConfig) -> Self {
        self.reconstructor = config;
        self
    }
}

/// Counters from a finished replay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplaySummary {
    pub loader: LoaderStats,
    pub reconstructor: ReconstructorStats,
    pub warnings: WarningSummary,
    /// Data rows written (header excluded)
    pub rows_written: u64,
}

/// Replay MBO records from `loader` into MBP-10 rows on `output`.
///
/// # Errors
/// I/O failures on either side, or a broken book invariant when invariant
/// checks are enabled. Bad records are skipped, never fatal.
pub fn replay<W: Write>(loader: CsvLoader, output: W, config: &ReplayConfig) -> Result<ReplaySummary> {
    let start = Instant::now();
    let depth = config.reconstructor.depth;

    let mut recon = Mbp10Reconstructor::with_config(config.reconstructor.clone());
    let mut writer =
        Mbp10Writer::with_layout(output, depth, config.output_rtype, config.depth_marker);
    writer.write_header()?;

    let mut events = loader
        .skip_header(config.skip_header)
        .mbo_rtype(config.mbo_rtype)
        .events();
    for event in events.by_ref() {
        match event? {
            LineEvent::Record { record, .. } => {
                if let Some(snapshot) = recon.process(&record)? {
                    writer.write_row(&record, &snapshot)?;
                }
            }
            LineEvent::Skipped { line, reason } => {
                let (category, message) = match reason {
                    SkipReason::Short(_) => {
                        (WarningCategory::ShortLine, format!("line {line} skipped: {reason}"))
                    }
                    SkipReason::OtherRecord(_) => {
                        (WarningCategory::NonMboRecord, format!("line {line} skipped: {reason}"))
                    }
                    SkipReason::Malformed(e) => (WarningCategory::MalformedField, e.to_string()),
                };
                recon.warnings_mut().record_line(category, line, message);
            }
        }
    }
    writer.flush()?;

    let summary = ReplaySummary {
        loader: events.stats().clone(),
        reconstructor: recon.stats().clone(),
        warnings: recon.warnings().summary(),
        rows_written: writer.rows_written(),
    };

    let elapsed = start.elapsed().as_secs_f64();
    log::info!(
        "Replayed {} lines into {} rows in {:.2}s ({} skipped, {} trades collapsed, {} warnings)",
        summary.loader.lines_read,
        summary.rows_written,
        elapsed,
        summary.loader.skipped(),
        summary.reconstructor.trades_collapsed,
        summary.warnings.total
    );

    Ok(summary)
}

/// Replay between two files.
///
/// The output file is created (or truncated) before any input is read.
pub fn replay_files(
    input: impl AsRef<Path>,
    output: impl AsRef<Path>,
    config: &ReplayConfig,
) -> Result<ReplaySummary> {
    let loader = CsvLoader::open(input)?;
    let output = output.as_ref();
    let file = File::create(output)
        .map_err(|e| Mbp10Error::Io(format!("failed to create {}: {e}", output.display())))?;
    replay(loader, BufWriter::with_capacity(IO_BUFFER_SIZE, file), config)
}

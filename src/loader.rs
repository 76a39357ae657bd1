//! MBO CSV file loader and streaming interface.
//!
//! This module provides efficient loading of MBO CSV exports and streaming of
//! parsed records. Features:
//! - Memory-efficient streaming (doesn't load entire file into RAM)
//! - Automatic zstd decompression for `.zst` paths (feature `zstd`)
//! - Header line discarded by default
//! - Short, foreign and malformed lines reported as skips, never as errors
//! - Large I/O buffer (1MB) for improved throughput
//!
//! # Example
//!
//! ```no_run
//! use mbp10_reconstructor::loader::{CsvLoader, LineEvent};
//!
//! let loader = CsvLoader::open("mbo.csv")?;
//! for event in loader.events() {
//!     match event? {
//!         LineEvent::Record { record, .. } => println!("order {}", record.order_id),
//!         LineEvent::Skipped { line, reason } => eprintln!("line {line}: {reason}"),
//!     }
//! }
//! # Ok::<(), mbp10_reconstructor::Mbp10Error>(())
//! ```

use std::fmt;
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::{Path, PathBuf};

use crate::error::{Mbp10Error, Result};
use crate::record::ParsedLine;
use crate::types::{MboRecord, MBO_RTYPE};

/// I/O buffer size for file reading.
///
/// Default `BufReader` uses 8KB; MBO exports run to gigabytes, so a larger
/// buffer cuts syscall count substantially.
pub const IO_BUFFER_SIZE: usize = 1024 * 1024; // 1 MB

/// Statistics for CSV loading.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoaderStats {
    /// Lines read, header included
    pub lines_read: u64,

    /// Bytes read (after decompression)
    pub bytes_read: u64,

    /// MBO records successfully parsed
    pub records_parsed: u64,

    /// Lines with fewer than 15 fields
    pub short_lines: u64,

    /// Lines whose record type is not MBO
    pub non_mbo_records: u64,

    /// MBO lines with unparseable numeric fields or invalid UTF-8
    pub malformed_records: u64,
}

impl LoaderStats {
    /// Lines skipped for any reason (header excluded).
    pub fn skipped(&self) -> u64 {
        self.short_lines + self.non_mbo_records + self.malformed_records
    }
}

/// Why a line was passed over.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// Fewer than 15 fields (field count)
    Short(usize),
    /// Record type other than MBO (raw rtype)
    OtherRecord(String),
    /// MBO line that failed to parse (`Mbp10Error::MalformedRecord`)
    Malformed(Mbp10Error),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::Short(n) => write!(f, "only {n} fields"),
            SkipReason::OtherRecord(rtype) => write!(f, "record type {rtype:?} is not MBO"),
            SkipReason::Malformed(e) => write!(f, "{e}"),
        }
    }
}

/// One input line after parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineEvent {
    /// A usable MBO record
    Record { line: u64, record: MboRecord },
    /// A line that produces no output
    Skipped { line: u64, reason: SkipReason },
}

/// MBO CSV loader.
///
/// Handles file I/O, decompression and line parsing. It does NOT touch the
/// book; feed its records to a [`Mbp10Reconstructor`](crate::Mbp10Reconstructor).
pub struct CsvLoader {
    reader: Box<dyn BufRead>,
    path: Option<PathBuf>,
    skip_header: bool,
    mbo_rtype: u16,
}

impl fmt::Debug for CsvLoader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CsvLoader")
            .field("path", &self.path)
            .field("skip_header", &self.skip_header)
            .field("mbo_rtype", &self.mbo_rtype)
            .finish_non_exhaustive()
    }
}

impl CsvLoader {
    /// Open an MBO CSV file, decompressing `.zst` files on the fly.
    ///
    /// # Errors
    /// The file cannot be opened, or it is zstd-compressed and the `zstd`
    /// feature is disabled.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)
            .map_err(|e| Mbp10Error::Io(format!("failed to open {}: {e}", path.display())))?;

        let compressed = path.extension().is_some_and(|ext| ext == "zst");
        let reader: Box<dyn BufRead> = if compressed {
            Self::zstd_reader(file)?
        } else {
            Box::new(BufReader::with_capacity(IO_BUFFER_SIZE, file))
        };

        log::debug!(
            "Opened MBO input {} (compressed: {compressed})",
            path.display()
        );

        Ok(Self {
            reader,
            path: Some(path.to_path_buf()),
            skip_header: true,
            mbo_rtype: MBO_RTYPE,
        })
    }

    #[cfg(feature = "zstd")]
    fn zstd_reader(file: File) -> Result<Box<dyn BufRead>> {
        let decoder = zstd::stream::read::Decoder::new(file)?;
        Ok(Box::new(BufReader::with_capacity(IO_BUFFER_SIZE, decoder)))
    }

    #[cfg(not(feature = "zstd"))]
    fn zstd_reader(_file: File) -> Result<Box<dyn BufRead>> {
        Err(Mbp10Error::generic(
            "input is zstd-compressed but the `zstd` feature is disabled",
        ))
    }

    /// Wrap any reader (e.g. an in-memory buffer or stdin).
    pub fn from_reader<R: Read + 'static>(reader: R) -> Self {
        Self {
            reader: Box::new(BufReader::with_capacity(IO_BUFFER_SIZE, reader)),
            path: None,
            skip_header: true,
            mbo_rtype: MBO_RTYPE,
        }
    }

    /// Whether the first line is a header to discard (default: true).
    pub fn skip_header(mut self, skip: bool) -> Self {
        self.skip_header = skip;
        self
    }

    /// Record type accepted as MBO (default: 160).
    pub fn mbo_rtype(mut self, rtype: u16) -> Self {
        self.mbo_rtype = rtype;
        self
    }

    /// Path this loader was opened from, if any.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Stream parsed lines.
    pub fn events(self) -> LineEvents {
        LineEvents {
            reader: self.reader,
            skip_header: self.skip_header,
            mbo_rtype: self.mbo_rtype,
            buf: Vec::with_capacity(256),
            stats: LoaderStats::default(),
        }
    }

    /// Stream only usable records, dropping skipped lines.
    pub fn records(self) -> impl Iterator<Item = Result<MboRecord>> {
        self.events().filter_map(|event| match event {
            Ok(LineEvent::Record { record, .. }) => Some(Ok(record)),
            Ok(LineEvent::Skipped { .. }) => None,
            Err(e) => Some(Err(e)),
        })
    }
}

/// Iterator over parsed input lines.
///
/// Yields `Err` only for I/O failures; iteration should stop after one.
pub struct LineEvents {
    reader: Box<dyn BufRead>,
    skip_header: bool,
    mbo_rtype: u16,
    buf: Vec<u8>,
    stats: LoaderStats,
}

impl LineEvents {
    /// Get current statistics.
    pub fn stats(&self) -> &LoaderStats {
        &self.stats
    }

    fn read_line(&mut self) -> Result<bool> {
        self.buf.clear();
        let n = self.reader.read_until(b'\n', &mut self.buf)?;
        if n == 0 {
            return Ok(false);
        }
        self.stats.lines_read += 1;
        self.stats.bytes_read += n as u64;
        if self.buf.last() == Some(&b'\n') {
            self.buf.pop();
        }
        Ok(true)
    }

    fn parse_current(&mut self) -> LineEvent {
        let line = self.stats.lines_read;
        let rtype = self.mbo_rtype;
        let parsed = std::str::from_utf8(&self.buf)
            .map_err(|e| Mbp10Error::generic(format!("invalid UTF-8: {e}")))
            .and_then(|text| MboRecord::parse_line_as(text, rtype));

        match parsed {
            Ok(ParsedLine::Record(record)) => {
                self.stats.records_parsed += 1;
                LineEvent::Record { line, record }
            }
            Ok(ParsedLine::Short(n)) => {
                self.stats.short_lines += 1;
                LineEvent::Skipped {
                    line,
                    reason: SkipReason::Short(n),
                }
            }
            Ok(ParsedLine::OtherRecord(rtype)) => {
                self.stats.non_mbo_records += 1;
                LineEvent::Skipped {
                    line,
                    reason: SkipReason::OtherRecord(rtype),
                }
            }
            Err(e) => {
                self.stats.malformed_records += 1;
                LineEvent::Skipped {
                    line,
                    reason: SkipReason::Malformed(Mbp10Error::malformed(line, e)),
                }
            }
        }
    }
}

impl Iterator for LineEvents {
    type Item = Result<LineEvent>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.skip_header {
            self.skip_header = false;
            match self.read_line() {
                Ok(true) => {}
                Ok(false) => return None,
                Err(e) => return Some(Err(e)),
            }
        }

        match self.read_line() {
            Ok(true) => Some(Ok(self.parse_current())),
            Ok(false) => None,
            Err(e) => {
                log::error!("Failed to read MBO input: {e}");
                Some(Err(e))
            }
        }
    }
}

//! MBP-10 CSV serialization.
//!
//! One header line, then one row per emitted snapshot:
//!
//! ```text
//! ts_recv,ts_event,rtype,publisher_id,instrument_id,action,side,depth,price,size,flags,ts_in_delta,sequence,
//! bid_px_00,bid_sz_00,bid_ct_00, ... bid_ct_09, ask_px_00, ... ask_ct_09,symbol,order_id
//! ```
//!
//! Missing levels are written as three empty fields. Prices carry exactly two
//! decimals.

use std::fmt::Write as _;
use std::io::Write;

use crate::error::Result;
use crate::types::{LevelSnapshot, Mbp10Snapshot, MboRecord, MBP10_RTYPE, MBP_DEPTH};

/// Build the header line (without trailing newline) for `depth` levels.
pub fn header(depth: usize) -> String {
    let mut out = String::from(
        "ts_recv,ts_event,rtype,publisher_id,instrument_id,action,side,depth,price,size,flags,ts_in_delta,sequence",
    );
    for side in ["bid", "ask"] {
        for i in 0..depth {
            // Writing to a String cannot fail.
            let _ = write!(out, ",{side}_px_{i:02},{side}_sz_{i:02},{side}_ct_{i:02}");
        }
    }
    out.push_str(",symbol,order_id");
    out
}

fn push_levels(out: &mut String, levels: &[LevelSnapshot], depth: usize) {
    for i in 0..depth {
        match levels.get(i) {
            Some(level) => {
                let _ = write!(out, ",{},{},{}", level.price, level.size, level.count);
            }
            None => out.push_str(",,,"),
        }
    }
}

/// Streams MBP-10 rows to any `io::Write`.
#[derive(Debug)]
pub struct Mbp10Writer<W: Write> {
    inner: W,
    depth: usize,
    rtype: u16,
    depth_marker: usize,
    rows_written: u64,
    buf: String,
}

impl<W: Write> Mbp10Writer<W> {
    /// Writer with standard MBP-10 layout (10 levels, rtype 10, depth 10).
    pub fn new(inner: W) -> Self {
        Self::with_layout(inner, MBP_DEPTH, MBP10_RTYPE, MBP_DEPTH)
    }

    /// Writer with a custom layout.
    ///
    /// `depth` is the number of level columns per side; `rtype` and
    /// `depth_marker` are the fixed values written in those columns.
    pub fn with_layout(inner: W, depth: usize, rtype: u16, depth_marker: usize) -> Self {
        Self {
            inner,
            depth,
            rtype,
            depth_marker,
            rows_written: 0,
            buf: String::with_capacity(512),
        }
    }

    /// Write the column header line.
    pub fn write_header(&mut self) -> Result<()> {
        writeln!(self.inner, "{}", header(self.depth))?;
        Ok(())
    }

    /// Format one row into a string (without trailing newline).
    pub fn format_row(&self, record: &MboRecord, snapshot: &Mbp10Snapshot) -> String {
        let mut out = String::with_capacity(512);
        self.format_into(&mut out, record, snapshot);
        out
    }

    fn format_into(&self, out: &mut String, record: &MboRecord, snapshot: &Mbp10Snapshot) {
        let _ = write!(
            out,
            "{},{},{},{},{},{},{},{},{},{},{},{},{}",
            record.ts_recv,
            record.ts_event,
            self.rtype,
            record.publisher_id,
            record.instrument_id,
            record.action_raw,
            record.side_raw,
            self.depth_marker,
            record.price_raw,
            record.size_raw,
            record.flags,
            record.ts_in_delta,
            record.sequence,
        );
        push_levels(out, &snapshot.bids, self.depth);
        push_levels(out, &snapshot.asks, self.depth);
        let _ = write!(out, ",{},{}", record.symbol, record.order_id);
    }

    /// Write one row for `record` with the book state in `snapshot`.
    pub fn write_row(&mut self, record: &MboRecord, snapshot: &Mbp10Snapshot) -> Result<()> {
        let mut buf = std::mem::take(&mut self.buf);
        buf.clear();
        self.format_into(&mut buf, record, snapshot);
        buf.push('\n');
        let written = self.inner.write_all(buf.as_bytes());
        self.buf = buf;
        written?;
        self.rows_written += 1;
        Ok(())
    }

    /// Rows written so far (header excluded).
    pub fn rows_written(&self) -> u64 {
        self.rows_written
    }

    /// Flush the underlying writer.
    pub fn flush(&mut self) -> Result<()> {
        self.inner.flush()?;
        Ok(())
    }

    /// Recover the underlying writer.
    pub fn into_inner(self) -> W {
        self.inner
    }
}

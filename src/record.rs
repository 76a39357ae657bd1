//! Parsing of MBO CSV lines into [`MboRecord`]s.
//!
//! Input layout (0-indexed, comma separated, no quoting):
//!
//! | # | field | use |
//! |---|-------|-----|
//! | 0 | `ts_recv` | echoed |
//! | 1 | `ts_event` | echoed |
//! | 2 | `rtype` | only `160` (MBO) is processed |
//! | 3 | `publisher_id` | echoed |
//! | 4 | `instrument_id` | echoed |
//! | 5 | `action` | `A` `M` `C` `T` `F`; others ignored by the book |
//! | 6 | `side` | `B` bid, `A`/`S` ask |
//! | 7 | `price` | decimal, empty => 0 |
//! | 8 | `size` | integer, empty => 0 |
//! | 9 | `order_id` | integer |
//! | 10 | `flags` | echoed |
//! | 11 | `channel_id` | unused |
//! | 12 | `ts_in_delta` | echoed |
//! | 13 | `sequence` | echoed |
//! | 14 | `symbol` | echoed |

use crate::error::{Mbp10Error, Result};
use crate::types::{MboRecord, Price, MBO_RTYPE};

/// Minimum number of fields in a usable line.
pub const MIN_FIELDS: usize = 15;

const RTYPE: usize = 2;
const ACTION: usize = 5;
const SIDE: usize = 6;
const PRICE: usize = 7;
const SIZE: usize = 8;
const ORDER_ID: usize = 9;

/// Outcome of parsing one line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedLine {
    /// An MBO record ready for the book
    Record(MboRecord),
    /// Fewer than [`MIN_FIELDS`] fields; carries the field count
    Short(usize),
    /// A well-formed line of another record type; carries the raw rtype
    OtherRecord(String),
}

/// Split a line on commas, dropping one trailing carriage return.
#[inline]
pub fn split_fields(line: &str) -> Vec<&str> {
    line.strip_suffix('\r').unwrap_or(line).split(',').collect()
}

fn first_byte(field: &str) -> u8 {
    field.as_bytes().first().copied().unwrap_or(b' ')
}

fn first_char(field: &str) -> String {
    field.chars().next().unwrap_or(' ').to_string()
}

fn parse_size(field: &str) -> Result<u32> {
    let text = field.trim();
    if text.is_empty() {
        return Ok(0);
    }
    text.parse()
        .map_err(|_| Mbp10Error::InvalidSize(text.to_string()))
}

fn parse_order_id(field: &str) -> Result<u64> {
    let text = field.trim();
    text.parse()
        .map_err(|_| Mbp10Error::InvalidOrderId(text.to_string()))
}

impl MboRecord {
    /// Parse one input line.
    ///
    /// Short lines and non-MBO record types are reported as such rather than
    /// as errors; the caller skips them.
    ///
    /// # Errors
    /// An MBO line whose price, size or order id does not parse.
    pub fn parse_line(line: &str) -> Result<ParsedLine> {
        Self::parse_line_as(line, MBO_RTYPE)
    }

    /// Like [`parse_line`](Self::parse_line), accepting `rtype` as the MBO
    /// record type.
    pub fn parse_line_as(line: &str, rtype: u16) -> Result<ParsedLine> {
        let fields = split_fields(line);
        if fields.len() < MIN_FIELDS {
            return Ok(ParsedLine::Short(fields.len()));
        }

        let raw_rtype = fields[RTYPE];
        if raw_rtype.trim().parse::<u16>().ok() != Some(rtype) {
            return Ok(ParsedLine::OtherRecord(raw_rtype.to_string()));
        }

        let price = Price::parse(fields[PRICE])?;
        let size = parse_size(fields[SIZE])?;
        let order_id = parse_order_id(fields[ORDER_ID])?;

        Ok(ParsedLine::Record(MboRecord {
            ts_recv: fields[0].to_string(),
            ts_event: fields[1].to_string(),
            publisher_id: fields[3].to_string(),
            instrument_id: fields[4].to_string(),
            action_code: first_byte(fields[ACTION]),
            action_raw: first_char(fields[ACTION]),
            side_code: first_byte(fields[SIDE]),
            side_raw: first_char(fields[SIDE]),
            price,
            price_raw: fields[PRICE].to_string(),
            size,
            size_raw: fields[SIZE].to_string(),
            order_id,
            flags: fields[10].to_string(),
            ts_in_delta: fields[12].to_string(),
            sequence: fields[13].to_string(),
            symbol: fields[14].to_string(),
        }))
    }
}

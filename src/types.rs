//! Core data types for MBO records and MBP-10 snapshots.
//!
//! These types are designed to be:
//! - Small and `Copy` where they sit on the hot path (`Action`, `Side`, `Price`)
//! - Exact: prices are integer hundredths, never floats, so they can key an
//!   ordered map without rounding surprises
//! - Compatible with Databento's MBO/MBP-10 CSV layout

use std::fmt;
use std::str::FromStr;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::error::{Mbp10Error, Result};

/// Record type value that marks a per-order (MBO) event in the input.
pub const MBO_RTYPE: u16 = 160;

/// Record type written into every output row (MBP-10).
pub const MBP10_RTYPE: u16 = 10;

/// Number of price levels reported per side.
pub const MBP_DEPTH: usize = 10;

/// Fractional digits carried by `Price`.
pub const PRICE_DECIMALS: u32 = 2;

/// Scale factor between a price and its integer representation.
pub const PRICE_SCALE: i64 = 100;

/// MBO action type (what happened to the order)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Action {
    /// Add new order to book
    Add = b'A',
    /// Modify existing order (loses queue priority)
    Modify = b'M',
    /// Cancel some or all of an order's quantity
    Cancel = b'C',
    /// Aggressor announced; first event of a trade sequence
    Trade = b'T',
    /// Resting order filled by the aggressor
    Fill = b'F',
}

impl Action {
    /// Parse action from a byte (Databento format).
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            b'A' => Some(Action::Add),
            b'M' => Some(Action::Modify),
            b'C' => Some(Action::Cancel),
            b'T' => Some(Action::Trade),
            b'F' => Some(Action::Fill),
            _ => None,
        }
    }

    /// Convert to byte representation.
    pub fn to_byte(self) -> u8 {
        self as u8
    }
}

/// Order side (bid or ask)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Side {
    /// Buy order (bid)
    Bid = b'B',
    /// Sell order (ask)
    Ask = b'A',
    /// Non-directional (trades, clears, unknown codes)
    None = b'N',
}

impl Side {
    /// Parse side from a byte. `S` is accepted as an alias for the ask side.
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            b'B' => Some(Side::Bid),
            b'A' | b'S' => Some(Side::Ask),
            b'N' => Some(Side::None),
            _ => None,
        }
    }

    /// Convert to byte representation.
    pub fn to_byte(self) -> u8 {
        self as u8
    }

    /// Check if this is a bid.
    #[inline(always)]
    pub fn is_bid(self) -> bool {
        matches!(self, Side::Bid)
    }

    /// Check if this is an ask.
    #[inline(always)]
    pub fn is_ask(self) -> bool {
        matches!(self, Side::Ask)
    }
}

/// Price in integer hundredths (`10.01` is stored as `1001`).
///
/// Ordering is plain integer ordering, which makes `Price` usable as a
/// `BTreeMap` key for both book sides.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Price(i64);

impl Price {
    /// Zero price, used when the input field is empty.
    pub const ZERO: Price = Price(0);

    /// Build a price from integer hundredths.
    #[inline]
    pub const fn from_ticks(ticks: i64) -> Self {
        Price(ticks)
    }

    /// Integer hundredths.
    #[inline]
    pub const fn ticks(self) -> i64 {
        self.0
    }

    /// Price as floating point, for analytics only.
    #[inline]
    pub fn as_f64(self) -> f64 {
        self.0 as f64 / PRICE_SCALE as f64
    }

    /// Parse a decimal string, rounding half away from zero to two digits.
    ///
    /// An empty (or all-whitespace) field is treated as zero.
    pub fn parse(text: &str) -> Result<Self> {
        let text = text.trim();
        if text.is_empty() {
            return Ok(Price::ZERO);
        }

        let value = Decimal::from_str(text)
            .map_err(|_| Mbp10Error::InvalidPrice(text.to_string()))?;
        value
            .round_dp_with_strategy(PRICE_DECIMALS, RoundingStrategy::MidpointAwayFromZero)
            .checked_mul(Decimal::from(PRICE_SCALE))
            .and_then(|scaled| scaled.to_i64())
            .map(Price)
            .ok_or_else(|| Mbp10Error::InvalidPrice(text.to_string()))
    }
}

impl FromStr for Price {
    type Err = Mbp10Error;

    fn from_str(s: &str) -> Result<Self> {
        Price::parse(s)
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        let scale = PRICE_SCALE as u64;
        write!(f, "{sign}{}.{:02}", abs / scale, abs % scale)
    }
}

/// Order information stored in the registry.
///
/// `size` is the remaining quantity; the order leaves the book once it hits 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Order {
    pub side: Side,
    pub price: Price,
    pub size: u32,
}

/// One parsed MBO input line.
///
/// Fields the book needs are parsed; fields that are only echoed into the
/// output row are kept as the raw input text so they round-trip untouched.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MboRecord {
    pub ts_recv: String,
    pub ts_event: String,
    pub publisher_id: String,
    pub instrument_id: String,

    /// Raw action byte (`b' '` when the field is empty)
    pub action_code: u8,

    /// First character of the action field, echoed into the output row
    pub action_raw: String,

    /// Raw side byte (`b' '` when the field is empty)
    pub side_code: u8,

    /// First character of the side field, echoed into the output row
    pub side_raw: String,

    /// Price as parsed (empty field => 0)
    pub price: Price,

    /// Price exactly as it appeared in the input
    pub price_raw: String,

    /// Size as parsed (empty field => 0)
    pub size: u32,

    /// Size exactly as it appeared in the input
    pub size_raw: String,

    pub order_id: u64,
    pub flags: String,
    pub ts_in_delta: String,
    pub sequence: String,
    pub symbol: String,
}

impl MboRecord {
    /// Create a record carrying only the book-relevant fields.
    ///
    /// Passthrough fields are left empty; handy for tests and benchmarks.
    pub fn new(order_id: u64, action: Action, side: Side, price: Price, size: u32) -> Self {
        Self {
            action_code: action.to_byte(),
            action_raw: char::from(action.to_byte()).to_string(),
            side_code: side.to_byte(),
            side_raw: char::from(side.to_byte()).to_string(),
            price,
            price_raw: price.to_string(),
            size,
            size_raw: size.to_string(),
            order_id,
            ..Default::default()
        }
    }

    /// Decoded action, or `None` for codes the book ignores.
    #[inline]
    pub fn action(&self) -> Option<Action> {
        Action::from_byte(self.action_code)
    }

    /// Decoded side; unknown codes are non-directional.
    #[inline]
    pub fn side(&self) -> Side {
        Side::from_byte(self.side_code).unwrap_or(Side::None)
    }
}

/// Aggregate view of one price level at snapshot time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelSnapshot {
    pub price: Price,
    /// Sum of remaining quantity of all orders at this price
    pub size: u64,
    /// Number of distinct orders at this price
    pub count: u32,
}

/// Book consistency status of a snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookConsistency {
    /// Book is valid: best_bid < best_ask
    Valid,
    /// Book is empty (no quotes on one or both sides)
    Empty,
    /// Book is locked: best_bid == best_ask
    Locked,
    /// Book is crossed: best_bid > best_ask
    Crossed,
}

impl BookConsistency {
    /// Returns true if the book state is valid.
    #[inline]
    pub fn is_valid(&self) -> bool {
        matches!(self, BookConsistency::Valid)
    }

    /// Returns true if the book is crossed.
    #[inline]
    pub fn is_crossed(&self) -> bool {
        matches!(self, BookConsistency::Crossed)
    }

    /// Returns true if the book is locked (bid == ask).
    #[inline]
    pub fn is_locked(&self) -> bool {
        matches!(self, BookConsistency::Locked)
    }
}

/// Top-of-book depth snapshot, best level first on each side.
///
/// Each side holds at most `depth` entries; shorter sides are padded with
/// empty fields only when the row is written.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Mbp10Snapshot {
    /// Bid levels, highest price first
    pub bids: Vec<LevelSnapshot>,
    /// Ask levels, lowest price first
    pub asks: Vec<LevelSnapshot>,
}

impl Mbp10Snapshot {
    /// Best (highest) bid price.
    #[inline]
    pub fn best_bid(&self) -> Option<Price> {
        self.bids.first().map(|l| l.price)
    }

    /// Best (lowest) ask price.
    #[inline]
    pub fn best_ask(&self) -> Option<Price> {
        self.asks.first().map(|l| l.price)
    }

    /// Level at `rank` on the given side (0 = best).
    pub fn level(&self, side: Side, rank: usize) -> Option<&LevelSnapshot> {
        match side {
            Side::Bid => self.bids.get(rank),
            Side::Ask => self.asks.get(rank),
            Side::None => None,
        }
    }

    /// Mid-price (average of best bid and ask).
    pub fn mid_price(&self) -> Option<f64> {
        match (self.best_bid(), self.best_ask()) {
            (Some(bid), Some(ask)) => Some((bid.as_f64() + ask.as_f64()) / 2.0),
            _ => None,
        }
    }

    /// Spread in hundredths (best ask minus best bid).
    pub fn spread(&self) -> Option<i64> {
        match (self.best_bid(), self.best_ask()) {
            (Some(bid), Some(ask)) => Some(ask.ticks() - bid.ticks()),
            _ => None,
        }
    }

    /// Check book consistency (whether bid < ask).
    pub fn check_consistency(&self) -> BookConsistency {
        match (self.best_bid(), self.best_ask()) {
            (Some(bid), Some(ask)) if bid < ask => BookConsistency::Valid,
            (Some(bid), Some(ask)) if bid == ask => BookConsistency::Locked,
            (Some(_), Some(_)) => BookConsistency::Crossed,
            _ => BookConsistency::Empty,
        }
    }
}

//! # MBP-10 Reconstructor
//!
//! Rebuilds a 10-level market-by-price (MBP-10) view from a market-by-order
//! (MBO) event stream.
//!
//! Every MBO record is folded into a per-order book; after each record that
//! produces output, the top 10 bid and ask price levels (price, aggregate
//! size, order count) are emitted as one MBP-10 row.
//!
//! ## Features
//!
//! - **Order-level book**: FIFO queue per price level, O(1) aggregate size
//! - **Trade collapsing**: the Trade/Fill/Cancel sequence of an aggressive
//!   order reduces the resting side once and never rests the aggressor
//! - **Never halts on bad data**: short lines, foreign record types,
//!   malformed fields and unknown order ids become categorized warnings
//! - **Streaming I/O**: 1 MB buffered reads, optional zstd input
//!
//! ## Quick Start
//!
//! ```rust
//! use mbp10_reconstructor::{Action, MboRecord, Mbp10Reconstructor, Price, Side};
//!
//! let mut recon = Mbp10Reconstructor::new();
//!
//! let bid = MboRecord::new(1, Action::Add, Side::Bid, Price::from_ticks(10_000), 100);
//! let ask = MboRecord::new(2, Action::Add, Side::Ask, Price::from_ticks(10_001), 50);
//! recon.process(&bid).unwrap();
//! let snapshot = recon.process(&ask).unwrap().unwrap();
//!
//! assert_eq!(snapshot.best_bid(), Some(Price::from_ticks(10_000)));
//! assert_eq!(snapshot.spread(), Some(1));
//! ```
//!
//! ### File to file
//!
//! ```no_run
//! use mbp10_reconstructor::replay::{replay_files, ReplayConfig};
//!
//! let summary = replay_files("mbo.csv", "mbp.csv", &ReplayConfig::default())?;
//! println!("{} rows written", summary.rows_written);
//! # Ok::<(), mbp10_reconstructor::Mbp10Error>(())
//! ```
//!
//! ## Module Overview
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`types`] | `MboRecord`, `Price`, `Action`, `Side`, `Mbp10Snapshot` |
//! | [`lob`] | `OrderBook`, `EventClassifier`, `Mbp10Reconstructor` |
//! | [`record`] | MBO CSV line parsing |
//! | [`loader`] | `CsvLoader`: buffered, optionally compressed input |
//! | [`writer`] | `Mbp10Writer`: MBP-10 CSV output |
//! | [`replay`] | End-to-end file replay |
//! | [`warnings`] | `WarningTracker`, `WarningCategory` |
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `zstd` | ✅ | Read `.zst`-compressed input |

#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod error;
pub mod loader;
pub mod lob;
pub mod record;
pub mod replay;
pub mod types;
pub mod warnings;
pub mod writer;

// Re-exports - Core types
pub use error::{Mbp10Error, Result};
pub use types::{
    Action, BookConsistency, LevelSnapshot, MboRecord, Mbp10Snapshot, Order, Price, Side,
    MBO_RTYPE, MBP10_RTYPE, MBP_DEPTH,
};

// Re-exports - Book reconstruction
pub use lob::{
    DuplicateAddPolicy, EventClassifier, Mbp10Reconstructor, OrderBook, ReconstructorConfig,
    ReconstructorStats,
};

// Re-exports - I/O
pub use loader::{CsvLoader, LineEvent, LoaderStats, SkipReason, IO_BUFFER_SIZE};
pub use record::ParsedLine;
pub use replay::{replay, replay_files, ReplayConfig, ReplaySummary};
pub use writer::Mbp10Writer;

// Re-exports - Warnings
pub use warnings::{
    Warning, WarningCategory, WarningSummary, WarningTracker, WarningTrackerConfig,
};

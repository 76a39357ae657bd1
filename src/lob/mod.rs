//! Order book reconstruction.
//!
//! [`OrderBook`] holds resting orders, [`EventClassifier`] turns the
//! Trade/Fill/Cancel sequence of an aggressive order into book operations,
//! and [`Mbp10Reconstructor`] ties the two together.

pub mod book;
pub mod classifier;
pub mod price_level;
pub mod reconstructor;

pub use book::OrderBook;
pub use classifier::{BookOp, Decision, EventClassifier, PendingAggressor};
pub use price_level::PriceLevel;
pub use reconstructor::{
    DuplicateAddPolicy, Mbp10Reconstructor, ReconstructorConfig, ReconstructorStats,
};

//! MBO → MBP-10 reconstructor.
//!
//! Glues the [`EventClassifier`] to the [`OrderBook`]: each record is
//! classified, the chosen operation is applied, and a depth snapshot is taken
//! for every record that produces an output row.

use super::book::OrderBook;
use super::classifier::{BookOp, Decision, EventClassifier};
use crate::error::{Mbp10Error, Result};
use crate::types::{Action, BookConsistency, Mbp10Snapshot, MboRecord, MBP_DEPTH};
use crate::warnings::{WarningCategory, WarningTracker, WarningTrackerConfig};

/// What to do with an Add whose order id is already resting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DuplicateAddPolicy {
    /// Leave the resting order untouched and record a warning (default)
    #[default]
    Reject,

    /// Treat the Add as a Modify of the resting order
    Replace,
}

/// Configuration for reconstructor behavior.
#[derive(Debug, Clone)]
pub struct ReconstructorConfig {
    /// Number of price levels per side in each snapshot
    pub depth: usize,

    /// Handling of duplicate Adds
    pub duplicate_add_policy: DuplicateAddPolicy,

    /// Whether to forward soft conditions to the `log` facade
    pub log_warnings: bool,

    /// Verify registry/level consistency after every event (O(orders) per
    /// event; off by default). A violation is returned as an error.
    pub check_invariants: bool,
}

impl Default for ReconstructorConfig {
    fn default() -> Self {
        Self {
            depth: MBP_DEPTH,
            duplicate_add_policy: DuplicateAddPolicy::Reject,
            log_warnings: true,
            check_invariants: false,
        }
    }
}

impl ReconstructorConfig {
    /// Create a new config with specified depth.
    pub fn new(depth: usize) -> Self {
        Self {
            depth,
            ..Default::default()
        }
    }

    /// Set duplicate Add handling.
    pub fn with_duplicate_add_policy(mut self, policy: DuplicateAddPolicy) -> Self {
        self.duplicate_add_policy = policy;
        self
    }

    /// Enable/disable warning logs.
    pub fn with_logging(mut self, log: bool) -> Self {
        self.log_warnings = log;
        self
    }

    /// Enable/disable per-event invariant checks.
    pub fn with_invariant_checks(mut self, check: bool) -> Self {
        self.check_invariants = check;
        self
    }
}

/// Statistics for monitoring reconstruction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconstructorStats {
    /// Records handed to `process`
    pub records_processed: u64,

    /// Snapshots emitted (one per output row)
    pub snapshots_emitted: u64,

    /// Trade sequences collapsed (aggressor cancels absorbed)
    pub trades_collapsed: u64,

    /// Fills applied to resting orders
    pub fills_applied: u64,

    /// Modify/Cancel/Fill references to orders not in the book
    pub unknown_references: u64,

    /// Adds for ids already resting
    pub duplicate_adds: u64,

    /// Records with an action code the book ignores
    pub ignored_actions: u64,

    /// Snapshots with best bid > best ask
    pub crossed_snapshots: u64,

    /// Snapshots with best bid == best ask
    pub locked_snapshots: u64,
}

/// Single-instrument MBP-10 reconstructor.
///
/// Owns the book and the pending-aggressor state; nothing is shared between
/// instances, so independent instruments can run on independent instances.
#[derive(Debug, Clone)]
pub struct Mbp10Reconstructor {
    config: ReconstructorConfig,
    book: OrderBook,
    classifier: EventClassifier,
    stats: ReconstructorStats,
    warnings: WarningTracker,
}

impl Default for Mbp10Reconstructor {
    fn default() -> Self {
        Self::new()
    }
}

impl Mbp10Reconstructor {
    /// Create a reconstructor with the default 10-level depth.
    ///
    /// # Example
    /// ```
    /// use mbp10_reconstructor::{Action, MboRecord, Mbp10Reconstructor, Price, Side};
    ///
    /// let mut recon = Mbp10Reconstructor::new();
    /// let add = MboRecord::new(1, Action::Add, Side::Bid, Price::from_ticks(1000), 5);
    /// let snapshot = recon.process(&add).unwrap().unwrap();
    /// assert_eq!(snapshot.bids[0].size, 5);
    /// ```
    pub fn new() -> Self {
        Self::with_config(ReconstructorConfig::default())
    }

    /// Create a reconstructor with custom configuration.
    pub fn with_config(config: ReconstructorConfig) -> Self {
        let warnings = WarningTracker::with_config(WarningTrackerConfig {
            log_warnings: config.log_warnings,
            ..Default::default()
        });
        Self {
            config,
            book: OrderBook::new(),
            classifier: EventClassifier::new(),
            stats: ReconstructorStats::default(),
            warnings,
        }
    }

    /// Get a reference to the current configuration.
    #[inline]
    pub fn config(&self) -> &ReconstructorConfig {
        &self.config
    }

    /// Process a single MBO record.
    ///
    /// # Returns
    /// - `Ok(Some(snapshot))` - the book after applying the record
    /// - `Ok(None)` - the record was absorbed into a trade sequence and emits
    ///   no row
    ///
    /// # Errors
    /// Only `InconsistentState`, and only when invariant checks are enabled.
    /// Data problems in the record itself are never errors.
    pub fn process(&mut self, record: &MboRecord) -> Result<Option<Mbp10Snapshot>> {
        self.stats.records_processed += 1;

        let decision = self.classifier.classify(record);
        self.note_decision(record, decision);

        if let Some(op) = decision.op() {
            self.apply(op, record);
        }

        if self.config.check_invariants {
            self.book.check_invariants().map_err(|e| {
                log::error!(
                    "Book invariant broken after order {} ({:?}): {e}",
                    record.order_id,
                    record.action()
                );
                e
            })?;
        }

        if !decision.emits_row() {
            return Ok(None);
        }

        let snapshot = self.book.snapshot(self.config.depth);
        self.track_consistency(&snapshot);
        self.stats.snapshots_emitted += 1;
        Ok(Some(snapshot))
    }

    fn note_decision(&mut self, record: &MboRecord, decision: Decision) {
        match (decision, record.action()) {
            (Decision::Ignore, None) => {
                self.stats.ignored_actions += 1;
                self.warnings.record_order(
                    WarningCategory::UnknownAction,
                    record.order_id,
                    format!("action {:?} ignored", record.action_raw),
                );
            }
            (Decision::Ignore, Some(Action::Fill)) => {
                self.warnings.record_order(
                    WarningCategory::UnmatchedFill,
                    record.order_id,
                    format!("fill for {} outside a trade sequence", record.order_id),
                );
            }
            (Decision::Absorb(None), Some(Action::Cancel)) => {
                self.stats.trades_collapsed += 1;
                log::debug!("Trade sequence for aggressor {} closed", record.order_id);
            }
            _ => {}
        }
    }

    fn apply(&mut self, op: BookOp, record: &MboRecord) {
        let order_id = record.order_id;
        match op {
            BookOp::Add => {
                let side = record.side();
                match self.book.add(order_id, side, record.price, record.size) {
                    Ok(_) => {}
                    Err(Mbp10Error::DuplicateOrder(_)) => {
                        self.stats.duplicate_adds += 1;
                        match self.config.duplicate_add_policy {
                            DuplicateAddPolicy::Reject => {
                                self.warnings.record_order(
                                    WarningCategory::DuplicateAdd,
                                    order_id,
                                    format!("add for resting order {order_id} rejected"),
                                );
                            }
                            DuplicateAddPolicy::Replace => {
                                self.warnings.record_order(
                                    WarningCategory::DuplicateAdd,
                                    order_id,
                                    format!("add for resting order {order_id} replaced it"),
                                );
                                self.book.replace(order_id, side, record.price, record.size);
                            }
                        }
                    }
                    Err(e) => log::warn!("Add for order {order_id} failed: {e}"),
                }
            }
            BookOp::Replace => {
                if !self
                    .book
                    .replace(order_id, record.side(), record.price, record.size)
                {
                    self.unknown_reference(order_id, "modify");
                }
            }
            BookOp::Reduce => {
                let fill = record.action() == Some(Action::Fill);
                match self.book.reduce(order_id, record.size) {
                    Some(_) if fill => self.stats.fills_applied += 1,
                    Some(_) => {}
                    None => self.unknown_reference(order_id, if fill { "fill" } else { "cancel" }),
                }
            }
        }
    }

    fn unknown_reference(&mut self, order_id: u64, what: &str) {
        self.stats.unknown_references += 1;
        self.warnings.record_order(
            WarningCategory::UnknownOrder,
            order_id,
            format!("{what} for unknown order {order_id}"),
        );
    }

    fn track_consistency(&mut self, snapshot: &Mbp10Snapshot) {
        match snapshot.check_consistency() {
            BookConsistency::Crossed => {
                self.stats.crossed_snapshots += 1;
                if let (Some(bid), Some(ask)) = (snapshot.best_bid(), snapshot.best_ask()) {
                    self.warnings.record_simple(
                        WarningCategory::CrossedBook,
                        format!(
                            "crossed book: bid={bid} > ask={ask} (record #{})",
                            self.stats.records_processed
                        ),
                    );
                }
            }
            BookConsistency::Locked => self.stats.locked_snapshots += 1,
            BookConsistency::Valid | BookConsistency::Empty => {}
        }
    }

    /// Current snapshot without processing anything.
    pub fn snapshot(&self) -> Mbp10Snapshot {
        self.book.snapshot(self.config.depth)
    }

    /// Read access to the book.
    pub fn book(&self) -> &OrderBook {
        &self.book
    }

    /// Read access to the trade-sequence classifier.
    pub fn classifier(&self) -> &EventClassifier {
        &self.classifier
    }

    /// Get current statistics.
    pub fn stats(&self) -> &ReconstructorStats {
        &self.stats
    }

    /// Warnings raised so far.
    pub fn warnings(&self) -> &WarningTracker {
        &self.warnings
    }

    /// Mutable warnings, for callers that record input-level problems.
    pub fn warnings_mut(&mut self) -> &mut WarningTracker {
        &mut self.warnings
    }

    /// Reset to an empty book with no pending trade.
    pub fn reset(&mut self) {
        self.book.clear();
        self.classifier.reset();
        self.stats = ReconstructorStats::default();
        self.warnings.clear();
    }
}

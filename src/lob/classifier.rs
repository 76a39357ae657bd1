//! Event classification and Trade/Fill/Cancel collapsing.
//!
//! A venue reports an aggressive order that executes on arrival as three
//! consecutive events sharing the aggressor's order id:
//!
//! 1. `Trade`  - the aggressor is announced (it never rests in the book)
//! 2. `Fill`   - quantity taken from the resting side
//! 3. `Cancel` - the aggressor's unexecuted remainder is withdrawn
//!
//! Applied naively, the `Cancel` would hit whatever order happens to carry
//! that id and the `Trade` would be booked as liquidity. The classifier
//! tracks a single pending aggressor and turns the triplet into one
//! quantity reduction.
//!
//! The classifier owns no book state; it only decides what the book should do.

use crate::types::{Action, MboRecord};

/// A book mutation decided by the classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookOp {
    /// Insert a new order (`OrderBook::add`)
    Add,
    /// Reverse the old order and insert it again (`OrderBook::replace`)
    Replace,
    /// Reduce the order's size, removing it at zero (`OrderBook::reduce`)
    Reduce,
}

/// What to do with one event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Apply the operation, then emit a snapshot row.
    Apply(BookOp),
    /// No book effect; a snapshot row is still emitted.
    Ignore,
    /// Part of a collapsed trade sequence: apply the operation if any, emit
    /// no row.
    Absorb(Option<BookOp>),
}

impl Decision {
    /// Operation to run against the book, if any.
    #[inline]
    pub fn op(self) -> Option<BookOp> {
        match self {
            Decision::Apply(op) => Some(op),
            Decision::Absorb(op) => op,
            Decision::Ignore => None,
        }
    }

    /// Whether this event produces an output row.
    #[inline]
    pub fn emits_row(self) -> bool {
        !matches!(self, Decision::Absorb(_))
    }
}

/// The in-flight aggressor of a trade sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingAggressor {
    pub order_id: u64,
    pub fill_applied: bool,
}

/// Single-slot state machine recognizing the Trade/Fill/Cancel idiom.
#[derive(Debug, Clone, Default)]
pub struct EventClassifier {
    pending: Option<PendingAggressor>,
}

impl EventClassifier {
    /// Create a classifier with no pending aggressor.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current pending aggressor, if a trade sequence is open.
    #[inline]
    pub fn pending(&self) -> Option<PendingAggressor> {
        self.pending
    }

    /// Decide how to apply one record, updating the pending marker.
    pub fn classify(&mut self, record: &MboRecord) -> Decision {
        self.classify_action(record.action(), record.order_id)
    }

    /// Same as [`classify`](Self::classify) with the fields passed directly.
    pub fn classify_action(&mut self, action: Option<Action>, order_id: u64) -> Decision {
        let Some(action) = action else {
            return Decision::Ignore;
        };

        match action {
            Action::Trade => {
                self.pending = Some(PendingAggressor {
                    order_id,
                    fill_applied: false,
                });
                Decision::Absorb(None)
            }
            Action::Fill => match self.pending.as_mut() {
                Some(p) if p.order_id == order_id && !p.fill_applied => {
                    p.fill_applied = true;
                    Decision::Absorb(Some(BookOp::Reduce))
                }
                _ => Decision::Ignore,
            },
            Action::Cancel => match self.pending {
                Some(p) if p.order_id == order_id && p.fill_applied => {
                    self.pending = None;
                    Decision::Absorb(None)
                }
                _ => Decision::Apply(BookOp::Reduce),
            },
            Action::Add => Decision::Apply(BookOp::Add),
            Action::Modify => Decision::Apply(BookOp::Replace),
        }
    }

    /// Drop any pending aggressor.
    pub fn reset(&mut self) {
        self.pending = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_actions() {
        let mut c = EventClassifier::new();
        assert_eq!(
            c.classify_action(Some(Action::Add), 1),
            Decision::Apply(BookOp::Add)
        );
        assert_eq!(
            c.classify_action(Some(Action::Modify), 1),
            Decision::Apply(BookOp::Replace)
        );
        assert_eq!(
            c.classify_action(Some(Action::Cancel), 1),
            Decision::Apply(BookOp::Reduce)
        );
        assert_eq!(c.classify_action(None, 1), Decision::Ignore);
        assert!(c.pending().is_none());
    }

    #[test]
    fn test_trade_fill_cancel_collapses() {
        let mut c = EventClassifier::new();

        let trade = c.classify_action(Some(Action::Trade), 5);
        assert_eq!(trade, Decision::Absorb(None));
        assert!(!trade.emits_row());
        assert_eq!(
            c.pending(),
            Some(PendingAggressor {
                order_id: 5,
                fill_applied: false
            })
        );

        let fill = c.classify_action(Some(Action::Fill), 5);
        assert_eq!(fill, Decision::Absorb(Some(BookOp::Reduce)));
        assert_eq!(fill.op(), Some(BookOp::Reduce));
        assert!(c.pending().unwrap().fill_applied);

        let cancel = c.classify_action(Some(Action::Cancel), 5);
        assert_eq!(cancel, Decision::Absorb(None));
        assert!(c.pending().is_none());
    }

    #[test]
    fn test_second_fill_is_ignored() {
        let mut c = EventClassifier::new();
        c.classify_action(Some(Action::Trade), 5);
        c.classify_action(Some(Action::Fill), 5);
        assert_eq!(c.classify_action(Some(Action::Fill), 5), Decision::Ignore);
    }

    #[test]
    fn test_fill_for_other_id_is_ignored() {
        let mut c = EventClassifier::new();
        c.classify_action(Some(Action::Trade), 5);
        assert_eq!(c.classify_action(Some(Action::Fill), 6), Decision::Ignore);
        assert!(!c.pending().unwrap().fill_applied);
    }

    #[test]
    fn test_fill_without_trade_is_ignored() {
        let mut c = EventClassifier::new();
        let d = c.classify_action(Some(Action::Fill), 5);
        assert_eq!(d, Decision::Ignore);
        assert!(d.emits_row());
        assert_eq!(d.op(), None);
    }

    #[test]
    fn test_cancel_before_fill_is_ordinary() {
        let mut c = EventClassifier::new();
        c.classify_action(Some(Action::Trade), 5);
        assert_eq!(
            c.classify_action(Some(Action::Cancel), 5),
            Decision::Apply(BookOp::Reduce)
        );
        // Marker survives; the sequence has not completed.
        assert!(c.pending().is_some());
    }

    #[test]
    fn test_unrelated_events_keep_marker() {
        let mut c = EventClassifier::new();
        c.classify_action(Some(Action::Trade), 5);
        c.classify_action(Some(Action::Fill), 5);
        c.classify_action(Some(Action::Add), 9);
        assert_eq!(
            c.classify_action(Some(Action::Cancel), 9),
            Decision::Apply(BookOp::Reduce)
        );
        assert_eq!(c.classify_action(Some(Action::Cancel), 5), Decision::Absorb(None));
    }

    #[test]
    fn test_new_trade_replaces_marker() {
        let mut c = EventClassifier::new();
        c.classify_action(Some(Action::Trade), 5);
        c.classify_action(Some(Action::Fill), 5);
        c.classify_action(Some(Action::Trade), 6);
        assert_eq!(
            c.pending(),
            Some(PendingAggressor {
                order_id: 6,
                fill_applied: false
            })
        );
        // Old aggressor's cancel is now ordinary.
        assert_eq!(
            c.classify_action(Some(Action::Cancel), 5),
            Decision::Apply(BookOp::Reduce)
        );
    }

    #[test]
    fn test_reset() {
        let mut c = EventClassifier::new();
        c.classify_action(Some(Action::Trade), 5);
        c.reset();
        assert!(c.pending().is_none());
    }
}

//! Book state: order registry plus price-sorted level aggregates.
//!
//! High-performance implementation using:
//! - BTreeMap for sorted price levels (one per side)
//! - ahash HashMap for fast order lookups
//! - `PriceLevel` caching aggregate size and count
//!
//! Every public mutation leaves the book consistent: each level present in a
//! side's map has at least one order, and its aggregate equals the sum of the
//! remaining sizes of the registry orders at that side and price.

use ahash::AHashMap;
use std::collections::BTreeMap;

use super::price_level::PriceLevel;
use crate::error::{Mbp10Error, Result};
use crate::types::{LevelSnapshot, Mbp10Snapshot, Order, Price, Side};

/// Registry of resting orders and the two level maps derived from it.
#[derive(Debug, Clone, Default)]
pub struct OrderBook {
    /// Bid levels: price -> level
    /// BTreeMap iterates ascending, so bids are read in reverse
    bids: BTreeMap<Price, PriceLevel>,

    /// Ask levels: price -> level (lowest first)
    asks: BTreeMap<Price, PriceLevel>,

    /// Order tracking: order_id -> Order
    orders: AHashMap<u64, Order>,
}

impl OrderBook {
    /// Create an empty book.
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    fn side_map_mut(&mut self, side: Side) -> Option<&mut BTreeMap<Price, PriceLevel>> {
        match side {
            Side::Bid => Some(&mut self.bids),
            Side::Ask => Some(&mut self.asks),
            Side::None => None,
        }
    }

    #[inline]
    fn side_map(&self, side: Side) -> Option<&BTreeMap<Price, PriceLevel>> {
        match side {
            Side::Bid => Some(&self.bids),
            Side::Ask => Some(&self.asks),
            Side::None => None,
        }
    }

    /// Insert a new resting order at the back of its price level.
    ///
    /// # Returns
    /// - `Ok(true)` if the order now rests in a price level
    /// - `Ok(false)` for non-directional orders, which are registered but
    ///   hold no level until a Modify gives them a side
    ///
    /// # Errors
    /// `DuplicateOrder` if `order_id` is already in the registry. The book is
    /// left untouched in that case.
    pub fn add(&mut self, order_id: u64, side: Side, price: Price, size: u32) -> Result<bool> {
        if self.orders.contains_key(&order_id) {
            return Err(Mbp10Error::DuplicateOrder(order_id));
        }

        let rests = match self.side_map_mut(side) {
            Some(levels) => {
                levels.entry(price).or_default().add_order(order_id, size);
                true
            }
            None => false,
        };

        self.orders.insert(order_id, Order { side, price, size });
        Ok(rests)
    }

    /// Reduce a resting order's size by `qty`.
    ///
    /// Once the remaining size reaches zero the order is removed and, if it was
    /// the last order at its price, so is the level.
    ///
    /// # Returns
    /// The remaining size (0 means the order was removed), or `None` when the
    /// order is unknown.
    pub fn reduce(&mut self, order_id: u64, qty: u32) -> Option<u32> {
        let order = *self.orders.get(&order_id)?;

        let remaining = match self.side_map_mut(order.side) {
            // Registered without a level: only the registry holds its size.
            None => order.size - qty.min(order.size),
            Some(levels) => {
                let Some(level) = levels.get_mut(&order.price) else {
                    log::warn!(
                        "Order {order_id} has no level at {} on {:?}; ignoring reduction",
                        order.price,
                        order.side
                    );
                    return None;
                };

                let remaining = level.reduce_order(order_id, qty)?;
                if remaining == 0 {
                    level.remove_order(order_id);
                    if level.is_empty() {
                        levels.remove(&order.price);
                    }
                }
                remaining
            }
        };

        if remaining == 0 {
            self.orders.remove(&order_id);
        } else if let Some(entry) = self.orders.get_mut(&order_id) {
            entry.size = remaining;
        }

        Some(remaining)
    }

    /// Remove an order entirely, whatever its remaining size.
    pub fn remove(&mut self, order_id: u64) -> Option<Order> {
        let order = self.orders.remove(&order_id)?;

        if let Some(levels) = self.side_map_mut(order.side) {
            if let Some(level) = levels.get_mut(&order.price) {
                level.remove_order(order_id);
                if level.is_empty() {
                    levels.remove(&order.price);
                }
            }
        }

        Some(order)
    }

    /// Replace an order's attributes: remove the old contribution, then add
    /// the order again as if new. The order goes to the back of the queue at
    /// its new price, even if the price did not change.
    ///
    /// Returns `false` (and changes nothing) when the order is unknown.
    pub fn replace(&mut self, order_id: u64, side: Side, price: Price, size: u32) -> bool {
        if self.remove(order_id).is_none() {
            return false;
        }
        // Cannot collide: the id was just removed.
        let _ = self.add(order_id, side, price, size);
        true
    }

    /// Top `n` levels on one side, best first.
    ///
    /// Bids come back in strictly descending price order, asks in strictly
    /// ascending order. Fewer than `n` entries are returned when the side is
    /// shallower than `n`.
    pub fn top_levels(&self, side: Side, n: usize) -> Vec<LevelSnapshot> {
        let to_snapshot = |(&price, level): (&Price, &PriceLevel)| LevelSnapshot {
            price,
            size: level.total_size(),
            count: level.order_count() as u32,
        };

        match side {
            Side::Bid => self.bids.iter().rev().take(n).map(to_snapshot).collect(),
            Side::Ask => self.asks.iter().take(n).map(to_snapshot).collect(),
            Side::None => Vec::new(),
        }
    }

    /// Snapshot of both sides to `depth` levels.
    pub fn snapshot(&self, depth: usize) -> Mbp10Snapshot {
        Mbp10Snapshot {
            bids: self.top_levels(Side::Bid, depth),
            asks: self.top_levels(Side::Ask, depth),
        }
    }

    /// Look up a resting order.
    #[inline]
    pub fn get_order(&self, order_id: u64) -> Option<&Order> {
        self.orders.get(&order_id)
    }

    /// Check whether an order is resting.
    #[inline]
    pub fn contains(&self, order_id: u64) -> bool {
        self.orders.contains_key(&order_id)
    }

    /// Level at an exact side and price.
    pub fn level(&self, side: Side, price: Price) -> Option<&PriceLevel> {
        self.side_map(side)?.get(&price)
    }

    /// FIFO position of an order within its price level (0 = front).
    pub fn queue_position(&self, order_id: u64) -> Option<usize> {
        let order = self.orders.get(&order_id)?;
        self.level(order.side, order.price)?.queue_position(&order_id)
    }

    /// Get number of active orders.
    pub fn order_count(&self) -> usize {
        self.orders.len()
    }

    /// Get number of price levels on bid side.
    pub fn bid_levels(&self) -> usize {
        self.bids.len()
    }

    /// Get number of price levels on ask side.
    pub fn ask_levels(&self) -> usize {
        self.asks.len()
    }

    /// Reset the book to empty.
    pub fn clear(&mut self) {
        self.bids.clear();
        self.asks.clear();
        self.orders.clear();
    }

    /// Verify that registry and level maps agree.
    ///
    /// Checks that no empty level is stored, that each registry order sits in
    /// the level matching its side and price with the same size, and that the
    /// levels hold no orders the registry does not know.
    pub fn check_invariants(&self) -> Result<()> {
        let mut queued = 0usize;
        for (side, levels) in [(Side::Bid, &self.bids), (Side::Ask, &self.asks)] {
            for (price, level) in levels {
                if level.is_empty() {
                    return Err(Mbp10Error::InconsistentState(format!(
                        "empty {side:?} level at {price}"
                    )));
                }
                if level.compute_actual_total() != level.total_size() {
                    return Err(Mbp10Error::InconsistentState(format!(
                        "{side:?} level {price} caches {} but holds {}",
                        level.total_size(),
                        level.compute_actual_total()
                    )));
                }
                queued += level.order_count();
            }
        }

        let mut directional = 0usize;
        for (&order_id, order) in &self.orders {
            if order.side == Side::None {
                continue;
            }
            directional += 1;
            let size = self
                .level(order.side, order.price)
                .and_then(|level| level.get(&order_id));
            if size != Some(order.size) {
                return Err(Mbp10Error::InconsistentState(format!(
                    "order {order_id} ({:?} {} x {}) found in level as {size:?}",
                    order.side, order.price, order.size
                )));
            }
        }

        if queued != directional {
            return Err(Mbp10Error::InconsistentState(format!(
                "levels hold {queued} orders but registry has {directional} with a side"
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn px(ticks: i64) -> Price {
        Price::from_ticks(ticks)
    }

    #[test]
    fn test_new_book() {
        let book = OrderBook::new();
        assert_eq!(book.order_count(), 0);
        assert_eq!(book.bid_levels(), 0);
        assert_eq!(book.ask_levels(), 0);
        assert!(book.check_invariants().is_ok());
    }

    #[test]
    fn test_add_aggregates_same_price() {
        let mut book = OrderBook::new();
        assert!(book.add(1, Side::Bid, px(1000), 5).unwrap());
        assert!(book.add(2, Side::Bid, px(1000), 3).unwrap());

        let top = book.top_levels(Side::Bid, 10);
        assert_eq!(
            top,
            vec![LevelSnapshot {
                price: px(1000),
                size: 8,
                count: 2
            }]
        );
        assert!(book.check_invariants().is_ok());
    }

    #[test]
    fn test_add_duplicate_is_rejected_without_side_effects() {
        let mut book = OrderBook::new();
        book.add(1, Side::Bid, px(1000), 5).unwrap();

        let err = book.add(1, Side::Ask, px(1100), 7).unwrap_err();
        assert_eq!(err, Mbp10Error::DuplicateOrder(1));
        assert_eq!(book.ask_levels(), 0);
        assert_eq!(book.level(Side::Bid, px(1000)).unwrap().total_size(), 5);
        assert!(book.check_invariants().is_ok());
    }

    #[test]
    fn test_add_non_directional_registers_without_level() {
        let mut book = OrderBook::new();
        assert!(!book.add(1, Side::None, px(1000), 5).unwrap());
        assert!(book.contains(1));
        assert_eq!(book.bid_levels() + book.ask_levels(), 0);
        assert_eq!(book.queue_position(1), None);
        assert!(book.check_invariants().is_ok());

        assert_eq!(book.reduce(1, 2), Some(3));
        assert_eq!(book.get_order(1).unwrap().size, 3);
        assert!(book.replace(1, Side::Bid, px(1000), 3));
        assert_eq!(
            book.top_levels(Side::Bid, 10),
            vec![LevelSnapshot {
                price: px(1000),
                size: 3,
                count: 1
            }]
        );
        assert!(book.check_invariants().is_ok());
    }

    #[test]
    fn test_non_directional_cancel_removes_registration() {
        let mut book = OrderBook::new();
        book.add(1, Side::None, px(1000), 5).unwrap();
        assert_eq!(book.reduce(1, 9), Some(0));
        assert!(!book.contains(1));
    }

    #[test]
    fn test_reduce_partial() {
        let mut book = OrderBook::new();
        book.add(1, Side::Ask, px(950), 10).unwrap();
        assert_eq!(book.reduce(1, 4), Some(6));
        assert_eq!(book.get_order(1).unwrap().size, 6);
        assert_eq!(book.top_levels(Side::Ask, 1)[0].size, 6);
        assert!(book.check_invariants().is_ok());
    }

    #[test]
    fn test_reduce_to_zero_removes_order_and_level() {
        let mut book = OrderBook::new();
        book.add(1, Side::Ask, px(950), 10).unwrap();
        assert_eq!(book.reduce(1, 10), Some(0));
        assert!(!book.contains(1));
        assert_eq!(book.ask_levels(), 0);
        assert!(book.check_invariants().is_ok());
    }

    #[test]
    fn test_over_reduction_only_touches_own_order() {
        let mut book = OrderBook::new();
        book.add(1, Side::Bid, px(1000), 5).unwrap();
        book.add(2, Side::Bid, px(1000), 3).unwrap();
        assert_eq!(book.reduce(1, 50), Some(0));

        let top = book.top_levels(Side::Bid, 1);
        assert_eq!(top[0].size, 3);
        assert_eq!(top[0].count, 1);
        assert!(book.check_invariants().is_ok());
    }

    #[test]
    fn test_reduce_unknown_is_noop() {
        let mut book = OrderBook::new();
        book.add(1, Side::Bid, px(1000), 5).unwrap();
        assert_eq!(book.reduce(99, 5), None);
        assert_eq!(book.order_count(), 1);
    }

    #[test]
    fn test_remove() {
        let mut book = OrderBook::new();
        book.add(1, Side::Bid, px(1000), 5).unwrap();
        book.add(2, Side::Bid, px(1000), 3).unwrap();

        let removed = book.remove(1).unwrap();
        assert_eq!(removed.size, 5);
        assert_eq!(book.top_levels(Side::Bid, 1)[0].count, 1);
        assert!(book.remove(1).is_none());

        book.remove(2);
        assert_eq!(book.bid_levels(), 0);
    }

    #[test]
    fn test_replace_moves_level() {
        let mut book = OrderBook::new();
        book.add(1, Side::Bid, px(1000), 5).unwrap();
        assert!(book.replace(1, Side::Bid, px(1001), 5));

        assert!(book.level(Side::Bid, px(1000)).is_none());
        let top = book.top_levels(Side::Bid, 10);
        assert_eq!(top.len(), 1);
        assert_eq!(top[0].price, px(1001));
        assert_eq!(top[0].size, 5);
        assert_eq!(top[0].count, 1);
    }

    #[test]
    fn test_replace_loses_queue_priority() {
        let mut book = OrderBook::new();
        book.add(1, Side::Ask, px(1000), 5).unwrap();
        book.add(2, Side::Ask, px(1000), 5).unwrap();
        assert_eq!(book.queue_position(1), Some(0));

        // Same price, same size: still goes to the back.
        book.replace(1, Side::Ask, px(1000), 5);
        assert_eq!(book.queue_position(2), Some(0));
        assert_eq!(book.queue_position(1), Some(1));
    }

    #[test]
    fn test_replace_unknown_is_noop() {
        let mut book = OrderBook::new();
        assert!(!book.replace(42, Side::Bid, px(1000), 1));
        assert_eq!(book.order_count(), 0);
    }

    #[test]
    fn test_replace_can_switch_side() {
        let mut book = OrderBook::new();
        book.add(1, Side::Bid, px(1000), 5).unwrap();
        book.replace(1, Side::Ask, px(1010), 2);
        assert_eq!(book.bid_levels(), 0);
        assert_eq!(book.top_levels(Side::Ask, 1)[0].size, 2);
        assert!(book.check_invariants().is_ok());
    }

    #[test]
    fn test_top_levels_ranking_and_limit() {
        let mut book = OrderBook::new();
        for i in 0..15u64 {
            book.add(i + 1, Side::Bid, px(1000 - i as i64), 1).unwrap();
            book.add(i + 100, Side::Ask, px(1001 + i as i64), 1).unwrap();
        }

        let bids = book.top_levels(Side::Bid, 10);
        let asks = book.top_levels(Side::Ask, 10);
        assert_eq!(bids.len(), 10);
        assert_eq!(asks.len(), 10);
        assert!(bids.windows(2).all(|w| w[0].price > w[1].price));
        assert!(asks.windows(2).all(|w| w[0].price < w[1].price));
        assert_eq!(bids[0].price, px(1000));
        assert_eq!(asks[0].price, px(1001));
        assert!(book.top_levels(Side::None, 10).is_empty());
    }

    #[test]
    fn test_zero_size_add_rests_until_cancelled() {
        let mut book = OrderBook::new();
        book.add(1, Side::Bid, px(1000), 0).unwrap();
        let top = book.top_levels(Side::Bid, 1);
        assert_eq!(top[0].size, 0);
        assert_eq!(top[0].count, 1);

        assert_eq!(book.reduce(1, 0), Some(0));
        assert_eq!(book.bid_levels(), 0);
    }

    #[test]
    fn test_clear() {
        let mut book = OrderBook::new();
        book.add(1, Side::Bid, px(1000), 5).unwrap();
        book.add(2, Side::Ask, px(1001), 5).unwrap();
        book.clear();
        assert_eq!(book.order_count(), 0);
        assert_eq!(book.snapshot(10), Mbp10Snapshot::default());
    }
}

//! Price level with cached aggregate size.
//!
//! This module provides a `PriceLevel` struct that maintains the individual
//! orders resting at one price (in arrival order) together with a cached
//! total size, so snapshots read aggregates in O(1).
//!
//! # Invariant
//!
//! The `total_size` field MUST always equal `orders.values().sum()`.
//! This invariant is enforced through encapsulated mutation methods and
//! verified in debug builds via `verify_invariant()`.
//!
//! # Queue order
//!
//! Orders are kept in an `IndexMap`, so iteration order is time priority.
//! Removal uses `shift_remove` to keep the remaining orders in sequence.
//!
//! | Operation | Complexity |
//! |-----------|------------|
//! | `add_order` | O(1) amortized |
//! | `remove_order` | O(n) in orders at this price |
//! | `reduce_order` | O(1) |
//! | `total_size` | O(1) |
//! | `order_count` | O(1) |

use indexmap::IndexMap;

/// A price level in the order book with cached aggregate size.
#[derive(Debug, Clone, Default)]
pub struct PriceLevel {
    /// Individual orders at this price level in queue order: order_id → size
    orders: IndexMap<u64, u32>,
    /// Cached total size (invariant: == orders.values().sum())
    total_size: u64,
}

impl PriceLevel {
    /// Create a new empty price level.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an order to the back of the queue.
    ///
    /// If the id is already queued here its size is replaced in place and the
    /// old size is returned.
    #[inline]
    pub fn add_order(&mut self, order_id: u64, size: u32) -> Option<u32> {
        let old = self.orders.insert(order_id, size);
        self.total_size = self.total_size - old.map_or(0, u64::from) + u64::from(size);

        #[cfg(debug_assertions)]
        self.verify_invariant();

        old
    }

    /// Remove an order from this price level, returning its remaining size.
    #[inline]
    pub fn remove_order(&mut self, order_id: u64) -> Option<u32> {
        let size = self.orders.shift_remove(&order_id)?;
        self.total_size -= u64::from(size);

        #[cfg(debug_assertions)]
        self.verify_invariant();

        Some(size)
    }

    /// Reduce an order's size (for partial cancels or fills).
    ///
    /// The reduction is clamped to the order's remaining size, so the level
    /// aggregate never loses more than the order contributed. Returns the new
    /// size; the caller removes the order once it reaches zero.
    #[inline]
    pub fn reduce_order(&mut self, order_id: u64, delta: u32) -> Option<u32> {
        let size = self.orders.get_mut(&order_id)?;
        let actual_reduction = delta.min(*size);
        *size -= actual_reduction;
        self.total_size -= u64::from(actual_reduction);
        let new_size = *size;

        #[cfg(debug_assertions)]
        self.verify_invariant();

        Some(new_size)
    }

    /// Get the cached total size (O(1)).
    #[inline]
    pub fn total_size(&self) -> u64 {
        self.total_size
    }

    /// Check if the price level has no orders.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }

    /// Get the number of orders at this price level.
    #[inline]
    pub fn order_count(&self) -> usize {
        self.orders.len()
    }

    /// Get an order's current size.
    #[inline]
    pub fn get(&self, order_id: &u64) -> Option<u32> {
        self.orders.get(order_id).copied()
    }

    /// Check if an order exists at this price level.
    #[inline]
    pub fn contains(&self, order_id: &u64) -> bool {
        self.orders.contains_key(order_id)
    }

    /// Position of an order in the queue (0 = next to fill).
    #[inline]
    pub fn queue_position(&self, order_id: &u64) -> Option<usize> {
        self.orders.get_index_of(order_id)
    }

    /// Compute the actual total by summing all orders (O(n)).
    #[inline]
    pub fn compute_actual_total(&self) -> u64 {
        self.orders.values().map(|&v| u64::from(v)).sum()
    }

    /// Verify the size invariant holds.
    #[cfg(debug_assertions)]
    #[inline]
    pub fn verify_invariant(&self) {
        let actual = self.compute_actual_total();
        debug_assert_eq!(
            actual, self.total_size,
            "PriceLevel invariant violated: actual={}, cached={}",
            actual, self.total_size
        );
    }

    #[cfg(not(debug_assertions))]
    #[inline]
    pub fn verify_invariant(&self) {}

    /// Iterate over all orders (order_id, size) in queue order.
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = (&u64, &u32)> {
        self.orders.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_price_level_is_empty() {
        let level = PriceLevel::new();
        assert!(level.is_empty());
        assert_eq!(level.total_size(), 0);
        assert_eq!(level.order_count(), 0);
    }

    #[test]
    fn test_add_multiple_orders() {
        let mut level = PriceLevel::new();
        assert_eq!(level.add_order(1, 100), None);
        level.add_order(2, 200);
        level.add_order(3, 150);
        assert_eq!(level.total_size(), 450);
        assert_eq!(level.order_count(), 3);
    }

    #[test]
    fn test_add_order_replace_in_place() {
        let mut level = PriceLevel::new();
        level.add_order(1, 200);
        level.add_order(2, 10);
        let old = level.add_order(1, 50);
        assert_eq!(old, Some(200));
        assert_eq!(level.total_size(), 60);
        assert_eq!(level.order_count(), 2);
        assert_eq!(level.queue_position(&1), Some(0));
    }

    #[test]
    fn test_remove_existing_order() {
        let mut level = PriceLevel::new();
        level.add_order(1, 100);
        level.add_order(2, 200);
        assert_eq!(level.remove_order(1), Some(100));
        assert_eq!(level.total_size(), 200);
        assert!(!level.contains(&1));
    }

    #[test]
    fn test_remove_nonexistent_order() {
        let mut level = PriceLevel::new();
        level.add_order(1, 100);
        assert_eq!(level.remove_order(999), None);
        assert_eq!(level.total_size(), 100);
    }

    #[test]
    fn test_reduce_order_partial() {
        let mut level = PriceLevel::new();
        level.add_order(1, 100);
        assert_eq!(level.reduce_order(1, 30), Some(70));
        assert_eq!(level.total_size(), 70);
        assert_eq!(level.get(&1), Some(70));
    }

    #[test]
    fn test_reduce_order_beyond_size_is_clamped() {
        let mut level = PriceLevel::new();
        level.add_order(1, 100);
        level.add_order(2, 40);
        assert_eq!(level.reduce_order(1, 150), Some(0));
        // Order 2's contribution is untouched.
        assert_eq!(level.total_size(), 40);
    }

    #[test]
    fn test_reduce_nonexistent_order() {
        let mut level = PriceLevel::new();
        level.add_order(1, 100);
        assert_eq!(level.reduce_order(999, 50), None);
        assert_eq!(level.total_size(), 100);
    }

    #[test]
    fn test_queue_order_survives_removal() {
        let mut level = PriceLevel::new();
        level.add_order(10, 1);
        level.add_order(20, 1);
        level.add_order(30, 1);
        level.remove_order(10);
        assert_eq!(level.queue_position(&20), Some(0));
        assert_eq!(level.queue_position(&30), Some(1));

        let ids: Vec<u64> = level.iter().map(|(&id, _)| id).collect();
        assert_eq!(ids, vec![20, 30]);
    }

    #[test]
    fn test_no_overflow_on_large_sizes() {
        let mut level = PriceLevel::new();
        level.add_order(1, u32::MAX);
        level.add_order(2, u32::MAX);
        assert_eq!(level.total_size(), 2 * u64::from(u32::MAX));
        level.verify_invariant();
    }

    #[test]
    fn test_realistic_order_lifecycle() {
        let mut level = PriceLevel::new();
        level.add_order(1001, 500);
        level.add_order(1002, 300);
        assert_eq!(level.total_size(), 800);
        level.reduce_order(1001, 100);
        assert_eq!(level.total_size(), 700);
        level.remove_order(1001);
        assert_eq!(level.total_size(), 300);
        level.remove_order(1002);
        assert!(level.is_empty());
        assert_eq!(level.compute_actual_total(), level.total_size());
    }
}

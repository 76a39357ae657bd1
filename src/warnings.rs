//! Warning and issue tracking for MBP-10 reconstruction.
//!
//! Reconstruction never stops on a bad record: short lines, foreign record
//! types, unparseable fields and references to unknown orders all become
//! no-ops. This module keeps a categorized account of those no-ops so a run
//! can be audited afterwards.
//!
//! # Example
//!
//! ```
//! use mbp10_reconstructor::warnings::{WarningCategory, WarningTracker};
//!
//! let mut tracker = WarningTracker::new();
//! tracker.record_simple(WarningCategory::ShortLine, "line 3 has 9 fields");
//! assert_eq!(tracker.count_by_category(WarningCategory::ShortLine), 1);
//!
//! let summary = tracker.summary();
//! assert_eq!(summary.total, 1);
//! ```

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::error::Result;

/// Category of warning for classification and filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WarningCategory {
    /// Line has fewer fields than an MBO record
    ShortLine,

    /// Record type is not MBO; line passed over
    NonMboRecord,

    /// Price, size or order id did not parse
    MalformedField,

    /// Action code outside Add/Modify/Cancel/Trade/Fill
    UnknownAction,

    /// Modify, Cancel or Fill for an order that is not resting
    UnknownOrder,

    /// Add for an order id that is already resting
    DuplicateAdd,

    /// Fill that does not belong to the pending trade sequence
    UnmatchedFill,

    /// Snapshot with best bid at or above best ask
    CrossedBook,
}

impl WarningCategory {
    /// Get a human-readable name for the category.
    pub fn name(&self) -> &'static str {
        match self {
            WarningCategory::ShortLine => "SHORT_LINE",
            WarningCategory::NonMboRecord => "NON_MBO_RECORD",
            WarningCategory::MalformedField => "MALFORMED_FIELD",
            WarningCategory::UnknownAction => "UNKNOWN_ACTION",
            WarningCategory::UnknownOrder => "UNKNOWN_ORDER",
            WarningCategory::DuplicateAdd => "DUPLICATE_ADD",
            WarningCategory::UnmatchedFill => "UNMATCHED_FILL",
            WarningCategory::CrossedBook => "CROSSED_BOOK",
        }
    }

    /// Get severity level (1=low, 2=medium, 3=high).
    pub fn severity(&self) -> u8 {
        match self {
            WarningCategory::NonMboRecord => 1,
            WarningCategory::UnknownAction => 1,
            WarningCategory::UnknownOrder => 1,
            WarningCategory::UnmatchedFill => 1,
            WarningCategory::ShortLine => 2,
            WarningCategory::CrossedBook => 3,
            WarningCategory::MalformedField => 3,
            WarningCategory::DuplicateAdd => 3,
        }
    }
}

/// A single warning record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Warning {
    /// Unique warning ID (auto-incremented)
    pub id: u64,

    /// Warning category
    pub category: WarningCategory,

    /// Human-readable message
    pub message: String,

    /// Input line number (1-based, header included)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<u64>,

    /// Related order ID (if applicable)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_id: Option<u64>,
}

impl Warning {
    /// Create a new warning with minimal information.
    pub fn new(id: u64, category: WarningCategory, message: impl Into<String>) -> Self {
        Self {
            id,
            category,
            message: message.into(),
            line: None,
            order_id: None,
        }
    }

    /// Set the input line number.
    pub fn with_line(mut self, line: u64) -> Self {
        self.line = Some(line);
        self
    }

    /// Set the order ID.
    pub fn with_order_id(mut self, order_id: u64) -> Self {
        self.order_id = Some(order_id);
        self
    }
}

/// Summary statistics for warnings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WarningSummary {
    /// Total number of warnings, including ones past the storage cap
    pub total: u64,

    /// Count by category name
    pub by_category: BTreeMap<String, u64>,

    /// Count by severity
    pub by_severity: BTreeMap<u8, u64>,

    /// Number of unique order IDs involved (tracked up to `max_warnings`)
    pub unique_orders: u64,
}

/// Configuration for warning tracker.
#[derive(Debug, Clone)]
pub struct WarningTrackerConfig {
    /// Maximum number of warnings (and distinct order ids) kept in memory;
    /// category counts keep going
    pub max_warnings: usize,

    /// Whether to forward warnings to the `log` facade
    pub log_warnings: bool,

    /// Minimum severity forwarded at `warn` level; lower ones go to `debug`
    pub min_warn_severity: u8,
}

impl Default for WarningTrackerConfig {
    fn default() -> Self {
        Self {
            max_warnings: 100_000,
            log_warnings: true,
            min_warn_severity: 3,
        }
    }
}

/// Collects warnings raised while reconstructing.
#[derive(Debug, Clone)]
pub struct WarningTracker {
    config: WarningTrackerConfig,
    warnings: Vec<Warning>,
    next_id: u64,
    category_counts: HashMap<WarningCategory, u64>,
    unique_orders: HashSet<u64>,
}

#[derive(Serialize)]
struct WarningExport<'a> {
    summary: WarningSummary,
    warnings: &'a [Warning],
}

impl WarningTracker {
    /// Create a new warning tracker with default configuration.
    pub fn new() -> Self {
        Self::with_config(WarningTrackerConfig::default())
    }

    /// Create a new warning tracker with custom configuration.
    pub fn with_config(config: WarningTrackerConfig) -> Self {
        Self {
            config,
            warnings: Vec::new(),
            next_id: 1,
            category_counts: HashMap::new(),
            unique_orders: HashSet::new(),
        }
    }

    /// Allocate the next warning id.
    pub fn next_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Record a warning and return its id.
    pub fn record(&mut self, warning: Warning) -> u64 {
        if self.config.log_warnings {
            if warning.category.severity() >= self.config.min_warn_severity {
                log::warn!("[{}] {}", warning.category.name(), warning.message);
            } else {
                log::debug!("[{}] {}", warning.category.name(), warning.message);
            }
        }

        if let Some(order_id) = warning.order_id {
            if self.unique_orders.len() < self.config.max_warnings {
                self.unique_orders.insert(order_id);
            }
        }
        *self.category_counts.entry(warning.category).or_insert(0) += 1;

        let id = warning.id;
        if self.warnings.len() < self.config.max_warnings {
            self.warnings.push(warning);
        }
        id
    }

    /// Record a simple warning with just category and message.
    pub fn record_simple(&mut self, category: WarningCategory, message: impl Into<String>) -> u64 {
        let id = self.next_id();
        self.record(Warning::new(id, category, message))
    }

    /// Record a warning tied to an input line.
    pub fn record_line(
        &mut self,
        category: WarningCategory,
        line: u64,
        message: impl Into<String>,
    ) -> u64 {
        let id = self.next_id();
        self.record(Warning::new(id, category, message).with_line(line))
    }

    /// Record a warning tied to an order.
    pub fn record_order(
        &mut self,
        category: WarningCategory,
        order_id: u64,
        message: impl Into<String>,
    ) -> u64 {
        let id = self.next_id();
        self.record(Warning::new(id, category, message).with_order_id(order_id))
    }

    /// Get the number of warnings stored.
    pub fn len(&self) -> usize {
        self.warnings.len()
    }

    /// Check if no warnings have been stored.
    pub fn is_empty(&self) -> bool {
        self.warnings.is_empty()
    }

    /// Total count, including warnings past the storage cap.
    pub fn total_count(&self) -> u64 {
        self.category_counts.values().sum()
    }

    /// Get count for a specific category.
    pub fn count_by_category(&self, category: WarningCategory) -> u64 {
        self.category_counts.get(&category).copied().unwrap_or(0)
    }

    /// Get all stored warnings.
    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    /// Get summary statistics.
    pub fn summary(&self) -> WarningSummary {
        let mut by_category = BTreeMap::new();
        let mut by_severity = BTreeMap::new();

        for (cat, count) in &self.category_counts {
            by_category.insert(cat.name().to_string(), *count);
            *by_severity.entry(cat.severity()).or_insert(0) += *count;
        }

        WarningSummary {
            total: self.total_count(),
            by_category,
            by_severity,
            unique_orders: self.unique_orders.len() as u64,
        }
    }

    /// Export summary and stored warnings to a JSON file.
    pub fn export_to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut writer = BufWriter::new(File::create(path)?);
        let export = WarningExport {
            summary: self.summary(),
            warnings: &self.warnings,
        };
        serde_json::to_writer_pretty(&mut writer, &export)
            .map_err(|e| crate::error::Mbp10Error::Io(e.to_string()))?;
        writer.flush()?;
        Ok(())
    }

    /// Clear all warnings.
    pub fn clear(&mut self) {
        self.warnings.clear();
        self.category_counts.clear();
        self.unique_orders.clear();
    }
}

impl Default for WarningTracker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quiet() -> WarningTracker {
        WarningTracker::with_config(WarningTrackerConfig {
            log_warnings: false,
            ..Default::default()
        })
    }

    #[test]
    fn test_warning_category_names() {
        assert_eq!(WarningCategory::UnknownOrder.name(), "UNKNOWN_ORDER");
        assert_eq!(WarningCategory::MalformedField.name(), "MALFORMED_FIELD");
        assert_eq!(WarningCategory::UnknownOrder.severity(), 1);
        assert_eq!(WarningCategory::DuplicateAdd.severity(), 3);
    }

    #[test]
    fn test_warning_tracker_basic() {
        let mut tracker = quiet();
        tracker.record_order(WarningCategory::UnknownOrder, 123, "cancel for 123");
        tracker.record_order(WarningCategory::UnknownOrder, 456, "cancel for 456");
        tracker.record_line(WarningCategory::ShortLine, 9, "3 fields");

        assert_eq!(tracker.len(), 3);
        assert_eq!(tracker.count_by_category(WarningCategory::UnknownOrder), 2);
        assert_eq!(tracker.count_by_category(WarningCategory::ShortLine), 1);
        assert_eq!(tracker.warnings()[2].line, Some(9));
    }

    #[test]
    fn test_ids_are_sequential() {
        let mut tracker = quiet();
        let a = tracker.record_simple(WarningCategory::UnknownAction, "R");
        let b = tracker.record_simple(WarningCategory::UnknownAction, "R");
        assert_eq!(b, a + 1);
    }

    #[test]
    fn test_storage_cap_keeps_counting() {
        let mut tracker = WarningTracker::with_config(WarningTrackerConfig {
            max_warnings: 2,
            log_warnings: false,
            ..Default::default()
        });
        for _ in 0..5 {
            tracker.record_simple(WarningCategory::NonMboRecord, "rtype 10");
        }
        assert_eq!(tracker.len(), 2);
        assert_eq!(tracker.total_count(), 5);
    }

    #[test]
    fn test_unique_orders_bounded_by_cap() {
        let mut tracker = WarningTracker::with_config(WarningTrackerConfig {
            max_warnings: 3,
            log_warnings: false,
            ..Default::default()
        });
        for order_id in 0..50 {
            tracker.record_order(WarningCategory::UnknownOrder, order_id, "cancel");
        }
        assert_eq!(tracker.len(), 3);
        assert_eq!(tracker.total_count(), 50);
        assert_eq!(tracker.summary().unique_orders, 3);
    }

    #[test]
    fn test_warning_tracker_summary() {
        let mut tracker = quiet();
        tracker.record_order(WarningCategory::UnknownOrder, 12345, "modify");
        tracker.record_order(WarningCategory::DuplicateAdd, 67890, "add");
        tracker.record_order(WarningCategory::UnknownOrder, 12345, "cancel");

        let summary = tracker.summary();
        assert_eq!(summary.total, 3);
        assert_eq!(summary.unique_orders, 2);
        assert_eq!(summary.by_category.get("UNKNOWN_ORDER"), Some(&2));
        assert_eq!(summary.by_severity.get(&3), Some(&1));
    }

    #[test]
    fn test_export_to_file() {
        let mut tracker = quiet();
        tracker.record_line(WarningCategory::MalformedField, 4, "size \"x\"");

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("warnings.json");
        tracker.export_to_file(&path).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let json: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(json["summary"]["total"], 1);
        assert_eq!(json["warnings"][0]["category"], "MalformedField");
        assert_eq!(json["warnings"][0]["line"], 4);
    }

    #[test]
    fn test_clear() {
        let mut tracker = quiet();
        tracker.record_simple(WarningCategory::CrossedBook, "crossed");
        tracker.clear();
        assert!(tracker.is_empty());
        assert_eq!(tracker.total_count(), 0);
    }
}

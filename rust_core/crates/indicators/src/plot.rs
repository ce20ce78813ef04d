//! Labeled diagnostic marks.

use crate::buffer::RollingBuffer;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Marks retained per label unless configured otherwise.
pub const DEFAULT_MARKS_PER_LABEL: usize = 10_000;

fn default_capacity() -> usize {
    DEFAULT_MARKS_PER_LABEL
}

/// One `(timestamp, value)` mark.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlotMark {
    /// Mark time in nanoseconds
    pub timestamp_ns: i64,
    /// Marked value
    pub value: f64,
}

/// Sink for labeled marks written by indicators and strategies.
///
/// Purely observational; nothing reads the marks back during computation.
/// Each label keeps its most recent `capacity` marks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlotCollector {
    #[serde(default = "default_capacity")]
    capacity: usize,
    #[serde(default)]
    marks: BTreeMap<String, RollingBuffer<PlotMark>>,
}

impl Default for PlotCollector {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_MARKS_PER_LABEL)
    }
}

impl PlotCollector {
    /// Creates an empty collector keeping [`DEFAULT_MARKS_PER_LABEL`] marks
    /// per label.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty collector keeping `capacity` marks per label.
    /// A zero capacity records nothing.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity,
            marks: BTreeMap::new(),
        }
    }

    /// Marks retained per label.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Appends a mark under `label`, dropping the label's oldest mark when full.
    pub fn add_mark(&mut self, label: impl Into<String>, timestamp_ns: i64, value: f64) {
        if self.capacity == 0 {
            return;
        }
        let capacity = self.capacity;
        self.marks
            .entry(label.into())
            .or_insert_with(|| RollingBuffer::with_capacity(capacity))
            .push(PlotMark {
                timestamp_ns,
                value,
            });
    }

    /// Marks retained under `label`, oldest first.
    pub fn marks(&self, label: &str) -> impl DoubleEndedIterator<Item = &PlotMark> {
        self.marks.get(label).into_iter().flat_map(RollingBuffer::iter)
    }

    /// Labels in sorted order.
    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.marks.keys().map(String::as_str)
    }

    /// Total number of retained marks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.marks.values().map(RollingBuffer::len).sum()
    }

    /// Returns true when no mark is retained.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.marks.is_empty()
    }

    /// Drops every mark.
    pub fn clear(&mut self) {
        self.marks.clear();
    }
}

//! Bounded rolling window used by every indicator to retain history.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Multiple of an indicator's interval kept in its buffers.
///
/// Smoothed series (EMA, RSI, Wilder ATR) converge only after far more
/// samples than their period, so buffers retain this many intervals.
pub const KEEP_OLD_DATA_FACTOR: usize = 30;

/// Ordered sequence with a fixed maximum length.
///
/// Pushing onto a full buffer drops the oldest element. The length never
/// exceeds [`RollingBuffer::capacity`], also after deserialization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    from = "RollingBufferRaw<T>",
    bound(deserialize = "T: Deserialize<'de>")
)]
pub struct RollingBuffer<T> {
    capacity: usize,
    items: VecDeque<T>,
}

#[derive(Deserialize)]
struct RollingBufferRaw<T> {
    capacity: usize,
    #[serde(default = "VecDeque::new")]
    items: VecDeque<T>,
}

impl<T> From<RollingBufferRaw<T>> for RollingBuffer<T> {
    fn from(raw: RollingBufferRaw<T>) -> Self {
        let mut items = raw.items;
        while items.len() > raw.capacity {
            items.pop_front();
        }
        Self {
            capacity: raw.capacity,
            items,
        }
    }
}

impl<T> RollingBuffer<T> {
    /// Creates an empty buffer holding at most `capacity` elements.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity,
            items: VecDeque::with_capacity(capacity.min(4096)),
        }
    }

    /// Creates a buffer sized for an indicator interval
    /// (`interval * KEEP_OLD_DATA_FACTOR`).
    #[must_use]
    pub fn for_interval(interval: usize) -> Self {
        Self::with_capacity(interval.saturating_mul(KEEP_OLD_DATA_FACTOR))
    }

    /// Appends an element, evicting the oldest one when full.
    ///
    /// Returns the evicted element, if any.
    pub fn push(&mut self, item: T) -> Option<T> {
        if self.capacity == 0 {
            return Some(item);
        }
        let evicted = if self.items.len() >= self.capacity {
            self.items.pop_front()
        } else {
            None
        };
        self.items.push_back(item);
        evicted
    }

    /// Maximum number of retained elements.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of retained elements.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns true when no element is retained.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Returns true when the next push evicts.
    #[inline]
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.items.len() >= self.capacity
    }

    /// Most recent element.
    #[must_use]
    pub fn latest(&self) -> Option<&T> {
        self.items.back()
    }

    /// Iterates oldest to newest.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &T> + ExactSizeIterator {
        self.items.iter()
    }

    /// Last `n` elements, oldest first.
    pub fn last_n(&self, n: usize) -> impl Iterator<Item = &T> {
        self.items.iter().skip(self.items.len().saturating_sub(n))
    }

    /// Drops every element.
    pub fn clear(&mut self) {
        self.items.clear();
    }
}

impl<T> Extend<T> for RollingBuffer<T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for item in iter {
            self.push(item);
        }
    }
}

impl<T> IntoIterator for RollingBuffer<T> {
    type Item = T;
    type IntoIter = std::collections::vec_deque::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl<T: Clone> RollingBuffer<T> {
    /// Copies the retained elements into a vector, oldest first.
    #[must_use]
    pub fn to_vec(&self) -> Vec<T> {
        self.items.iter().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_push_evicts_oldest() {
        let mut buffer = RollingBuffer::with_capacity(3);
        assert_eq!(buffer.push(1), None);
        assert_eq!(buffer.push(2), None);
        assert_eq!(buffer.push(3), None);
        assert!(buffer.is_full());

        assert_eq!(buffer.push(4), Some(1));
        assert_eq!(buffer.to_vec(), vec![2, 3, 4]);
        assert_eq!(buffer.latest(), Some(&4));
    }

    #[test]
    fn test_for_interval_applies_factor() {
        let buffer: RollingBuffer<f64> = RollingBuffer::for_interval(14);
        assert_eq!(buffer.capacity(), 14 * KEEP_OLD_DATA_FACTOR);
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_zero_capacity_retains_nothing() {
        let mut buffer = RollingBuffer::with_capacity(0);
        assert_eq!(buffer.push(7), Some(7));
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_last_n() {
        let mut buffer = RollingBuffer::with_capacity(5);
        for i in 0..5 {
            buffer.push(i);
        }
        let tail: Vec<i32> = buffer.last_n(2).copied().collect();
        assert_eq!(tail, vec![3, 4]);

        let all: Vec<i32> = buffer.last_n(10).copied().collect();
        assert_eq!(all, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_serde_roundtrip() {
        let mut buffer = RollingBuffer::with_capacity(4);
        for v in [1.5, 2.5, 3.5] {
            buffer.push(v);
        }

        let json = serde_json::to_value(&buffer).unwrap();
        assert_eq!(json["capacity"], 4);

        let restored: RollingBuffer<f64> = serde_json::from_value(json).unwrap();
        assert_eq!(restored, buffer);
    }

    #[test]
    fn test_extend_into_smaller_buffer() {
        let mut source = RollingBuffer::with_capacity(6);
        source.extend(1..=6);

        let mut target = RollingBuffer::with_capacity(4);
        target.extend(source);
        assert_eq!(target.to_vec(), vec![3, 4, 5, 6]);
    }

    #[test]
    fn test_deserialize_enforces_bound() {
        let json = serde_json::json!({ "capacity": 2, "items": [1, 2, 3, 4] });
        let buffer: RollingBuffer<i32> = serde_json::from_value(json).unwrap();
        assert_eq!(buffer.to_vec(), vec![3, 4]);
    }

    #[test]
    fn test_json_text_preserves_float_bits() {
        let mut buffer = RollingBuffer::with_capacity(16);
        buffer.push(100.0 + 10.0 * 4.2f64.sin() + 0.6);
        buffer.push(0.1 + 0.2);
        buffer.push(f64::MIN_POSITIVE);

        let text = serde_json::to_string(&buffer).unwrap();
        let restored: RollingBuffer<f64> = serde_json::from_str(&text).unwrap();
        let bits = |b: &RollingBuffer<f64>| b.iter().map(|v| v.to_bits()).collect::<Vec<_>>();
        assert_eq!(bits(&restored), bits(&buffer));
    }

    proptest! {
        #[test]
        fn prop_json_text_roundtrip_is_exact(
            values in proptest::collection::vec(-1e9f64..1e9, 0..64),
        ) {
            let mut buffer = RollingBuffer::with_capacity(64);
            buffer.extend(values.iter().copied());
            let text = serde_json::to_string(&buffer).unwrap();
            let restored: RollingBuffer<f64> = serde_json::from_str(&text).unwrap();
            for (a, b) in restored.iter().zip(buffer.iter()) {
                prop_assert_eq!(a.to_bits(), b.to_bits());
            }
        }

        #[test]
        fn prop_length_bounded_and_keeps_most_recent(
            capacity in 1usize..64,
            values in proptest::collection::vec(any::<i32>(), 0..256),
        ) {
            let mut buffer = RollingBuffer::with_capacity(capacity);
            for (pushed, value) in values.iter().enumerate() {
                buffer.push(*value);
                prop_assert_eq!(buffer.len(), (pushed + 1).min(capacity));
            }

            let start = values.len().saturating_sub(capacity);
            prop_assert_eq!(buffer.to_vec(), values[start..].to_vec());
        }
    }
}

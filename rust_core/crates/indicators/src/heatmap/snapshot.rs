//! Price-bucketed depth snapshots and their merge rules.

use crate::error::IndicatorError;
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::collections::btree_map::Entry;

fn default_sample_count() -> u32 {
    1
}

/// Depth of one price bucket `[price_low, price_high)`.
///
/// Samples of the same bucket accumulate through [`OrderbookSnapshot::add`];
/// [`OrderbookSnapshot::finalize`] turns the sums into averages exactly once.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderbookSnapshot {
    /// Inclusive lower edge
    pub price_low: f64,
    /// Exclusive upper edge
    pub price_high: f64,
    /// Sample time in nanoseconds
    pub start: i64,
    /// Granularity in minutes
    pub interval: u32,
    /// Ask amount in the bucket
    pub asks: f64,
    /// Bid amount in the bucket
    pub bids: f64,
    /// `asks + bids`
    pub total: f64,
    /// Samples accumulated so far
    #[serde(default = "default_sample_count")]
    pub sample_count: u32,
    /// True once sums were turned into averages
    #[serde(default)]
    pub finalized: bool,
}

impl OrderbookSnapshot {
    /// Creates a single-sample bucket.
    #[must_use]
    pub fn new(price_low: f64, price_high: f64, start: i64, interval: u32, asks: f64, bids: f64) -> Self {
        Self {
            price_low,
            price_high,
            start,
            interval,
            asks,
            bids,
            total: asks + bids,
            sample_count: 1,
            finalized: false,
        }
    }

    /// Accumulates another sample of the same bucket.
    ///
    /// Edges widen to the union, the start moves to the earliest sample.
    ///
    /// # Errors
    /// Returns [`IndicatorError::InvalidState`] when either side is finalized.
    pub fn add(&mut self, other: &OrderbookSnapshot) -> Result<(), IndicatorError> {
        if self.finalized {
            return Err(IndicatorError::invalid_state(format!(
                "cannot add to finalized bucket at {}",
                self.price_low
            )));
        }
        if other.finalized {
            return Err(IndicatorError::invalid_state(format!(
                "cannot merge finalized bucket at {}",
                other.price_low
            )));
        }
        self.price_low = self.price_low.min(other.price_low);
        self.price_high = self.price_high.max(other.price_high);
        self.start = self.start.min(other.start);
        self.asks += other.asks;
        self.bids += other.bids;
        self.total += other.total;
        self.sample_count += other.sample_count;
        Ok(())
    }

    /// Divides the accumulated sums by the sample count.
    ///
    /// # Errors
    /// Returns [`IndicatorError::InvalidState`] when already finalized or
    /// when no sample was accumulated.
    pub fn finalize(&mut self) -> Result<(), IndicatorError> {
        if self.finalized {
            return Err(IndicatorError::invalid_state(format!(
                "bucket at {} already finalized",
                self.price_low
            )));
        }
        if self.sample_count == 0 {
            return Err(IndicatorError::invalid_state(format!(
                "bucket at {} has no samples",
                self.price_low
            )));
        }
        let count = f64::from(self.sample_count);
        self.asks /= count;
        self.bids /= count;
        self.total /= count;
        self.finalized = true;
        Ok(())
    }

    /// Half-open membership test.
    #[must_use]
    pub fn contains(&self, price: f64) -> bool {
        price >= self.price_low && price < self.price_high
    }
}

/// Every non-empty bucket at one instant, or merged over one candle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderbookFullSnapshot {
    /// Sample time, or candle open time once merged
    pub start: i64,
    /// Granularity in minutes
    pub interval: u32,
    /// Buckets sorted by `price_low`
    pub buckets: Vec<OrderbookSnapshot>,
}

impl OrderbookFullSnapshot {
    /// Creates a snapshot, sorting the buckets by price.
    #[must_use]
    pub fn new(start: i64, interval: u32, mut buckets: Vec<OrderbookSnapshot>) -> Self {
        buckets.sort_by(|a, b| a.price_low.total_cmp(&b.price_low));
        Self {
            start,
            interval,
            buckets,
        }
    }

    /// Bucket holding `price`.
    #[must_use]
    pub fn bucket_at(&self, price: f64) -> Option<&OrderbookSnapshot> {
        let idx = self.buckets.partition_point(|bucket| bucket.price_low <= price);
        idx.checked_sub(1)
            .map(|i| &self.buckets[i])
            .filter(|bucket| bucket.contains(price))
    }

    /// Sum of ask amounts over all buckets.
    #[must_use]
    pub fn total_asks(&self) -> f64 {
        self.buckets.iter().map(|bucket| bucket.asks).sum()
    }

    /// Sum of bid amounts over all buckets.
    #[must_use]
    pub fn total_bids(&self) -> f64 {
        self.buckets.iter().map(|bucket| bucket.bids).sum()
    }

    /// Number of buckets.
    #[must_use]
    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    /// Returns true when no bucket is held.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    /// Merges per-minute samples bucket by bucket into one finalized snapshot.
    ///
    /// Buckets are keyed by `price_low`. Returns `None` when the samples hold
    /// no bucket.
    ///
    /// # Errors
    /// Returns [`IndicatorError::InvalidState`] when a sample was already
    /// finalized.
    pub fn merge(
        samples: &[OrderbookFullSnapshot],
        start: i64,
        interval: u32,
    ) -> Result<Option<Self>, IndicatorError> {
        let mut merged: BTreeMap<OrderedFloat<f64>, OrderbookSnapshot> = BTreeMap::new();
        for bucket in samples.iter().flat_map(|sample| &sample.buckets) {
            match merged.entry(OrderedFloat(bucket.price_low)) {
                Entry::Vacant(entry) => {
                    if bucket.finalized {
                        return Err(IndicatorError::invalid_state(format!(
                            "cannot merge finalized bucket at {}",
                            bucket.price_low
                        )));
                    }
                    entry.insert(bucket.clone());
                }
                Entry::Occupied(mut entry) => entry.get_mut().add(bucket)?,
            }
        }

        if merged.is_empty() {
            return Ok(None);
        }

        let mut buckets = Vec::with_capacity(merged.len());
        for (_, mut bucket) in merged {
            bucket.interval = interval;
            bucket.finalize()?;
            buckets.push(bucket);
        }
        Ok(Some(Self {
            start,
            interval,
            buckets,
        }))
    }
}

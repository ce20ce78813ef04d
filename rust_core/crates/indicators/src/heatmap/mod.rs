//! Orderbook depth heatmap.
//!
//! Once per minute the live book is bucketed by `price_step_bucket` around
//! the average market price. On every candle the per-minute samples are
//! merged into one averaged snapshot for that candle and appended to a
//! bounded history.

pub mod book;
pub mod snapshot;

pub use book::{DepthBook, OrderBookView};
pub use snapshot::{OrderbookFullSnapshot, OrderbookSnapshot};

use crate::buffer::RollingBuffer;
use crate::error::IndicatorError;
use crate::traits::{Indicator, IndicatorKind, MarketSync, Readiness};
use serde::{Deserialize, Serialize};
use sextant_types::Candle;
use std::any::Any;
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Minimum time between two book samples.
pub const SAMPLE_PERIOD_NS: i64 = 60_000_000_000;

/// Highest supported price precision (decimals).
pub const MAX_PRICE_PRECISION: u32 = 12;

fn default_interval() -> usize {
    30
}

fn default_price_step_bucket() -> f64 {
    10.0
}

fn default_price_precision() -> u32 {
    8
}

fn default_candle_size_min() -> u32 {
    60
}

/// Heatmap parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HeatmapParams {
    /// Merged snapshots kept in the history
    #[serde(default = "default_interval")]
    pub interval: usize,
    /// Bucket width in quote currency
    #[serde(default = "default_price_step_bucket")]
    pub price_step_bucket: f64,
    /// Decimals bucket edges are floored to
    #[serde(default = "default_price_precision")]
    pub price_precision: u32,
    /// Candle size in minutes, stamped on merged snapshots
    #[serde(default = "default_candle_size_min")]
    pub candle_size_min: u32,
}

impl Default for HeatmapParams {
    fn default() -> Self {
        Self {
            interval: default_interval(),
            price_step_bucket: default_price_step_bucket(),
            price_precision: default_price_precision(),
            candle_size_min: default_candle_size_min(),
        }
    }
}

impl HeatmapParams {
    /// Checks history size, bucket step, precision and candle size.
    ///
    /// # Errors
    /// Returns [`IndicatorError::InvalidParams`] or
    /// [`IndicatorError::ParamOutOfRange`] on violation.
    pub fn validate(&self) -> Result<(), IndicatorError> {
        if self.interval == 0 {
            return Err(IndicatorError::invalid_params("interval must be > 0"));
        }
        if !self.price_step_bucket.is_finite() || self.price_step_bucket <= 0.0 {
            return Err(IndicatorError::invalid_params(format!(
                "price_step_bucket must be positive, got {}",
                self.price_step_bucket
            )));
        }
        if self.price_precision > MAX_PRICE_PRECISION {
            return Err(IndicatorError::param_out_of_range(
                "price_precision",
                f64::from(self.price_precision),
                0.0,
                f64::from(MAX_PRICE_PRECISION),
            ));
        }
        let resolution = 10f64.powi(-(self.price_precision as i32));
        if self.price_step_bucket < resolution {
            return Err(IndicatorError::invalid_params(format!(
                "price_step_bucket {} is below the price resolution {resolution}",
                self.price_step_bucket
            )));
        }
        if self.candle_size_min == 0 {
            return Err(IndicatorError::invalid_params("candle_size_min must be > 0"));
        }
        Ok(())
    }
}

/// Floors `value` to `decimals` decimal places.
#[must_use]
pub fn floor_to_precision(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (value * factor).floor() / factor
}

/// Why a sample was not taken.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// No order book was supplied
    BookUnavailable,
    /// The book holds no asks yet
    BookEmpty,
    /// No usable average market price was synced
    NoMarketPrice,
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let reason = match self {
            SkipReason::BookUnavailable => "order book unavailable",
            SkipReason::BookEmpty => "order book not warmed up",
            SkipReason::NoMarketPrice => "average market price unknown",
        };
        f.write_str(reason)
    }
}

/// Result of [`OrderbookHeatmap::sample`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleOutcome {
    /// A sample with this many non-empty buckets was recorded
    Recorded(usize),
    /// Less than a minute since the previous attempt
    RateLimited,
    /// Sampling was skipped for this minute
    Skipped(SkipReason),
}

/// Orderbook heatmap indicator.
#[derive(Debug, Clone)]
pub struct OrderbookHeatmap {
    name: String,
    params: HeatmapParams,
    pending: Vec<OrderbookFullSnapshot>,
    history: RollingBuffer<OrderbookFullSnapshot>,
    last_sample_ns: Option<i64>,
    readiness: Readiness,
    market: MarketSync,
}

#[derive(Serialize, Deserialize)]
struct HeatmapState {
    #[serde(default)]
    pending: Vec<OrderbookFullSnapshot>,
    history: RollingBuffer<OrderbookFullSnapshot>,
    #[serde(default)]
    last_sample_ns: Option<i64>,
    #[serde(default)]
    readiness: Readiness,
}

impl OrderbookHeatmap {
    /// Creates a heatmap.
    ///
    /// # Errors
    /// Returns an error when the parameters are invalid.
    pub fn new(name: impl Into<String>, params: HeatmapParams) -> Result<Self, IndicatorError> {
        params.validate()?;
        Ok(Self {
            name: name.into(),
            params,
            pending: Vec::new(),
            history: RollingBuffer::with_capacity(params.interval),
            last_sample_ns: None,
            readiness: Readiness::default(),
            market: MarketSync::default(),
        })
    }

    /// Parameters in use.
    #[must_use]
    pub fn params(&self) -> &HeatmapParams {
        &self.params
    }

    /// Most recent merged snapshot.
    #[must_use]
    pub fn latest(&self) -> Option<&OrderbookFullSnapshot> {
        self.history.latest()
    }

    /// Merged snapshots, oldest first.
    pub fn history(&self) -> impl DoubleEndedIterator<Item = &OrderbookFullSnapshot> + ExactSizeIterator {
        self.history.iter()
    }

    /// Per-minute samples waiting for the next candle.
    #[must_use]
    pub fn pending_samples(&self) -> &[OrderbookFullSnapshot] {
        &self.pending
    }

    /// Takes a per-minute sample of the book.
    ///
    /// Rate limited to one attempt per [`SAMPLE_PERIOD_NS`]; a skipped
    /// attempt still uses up its minute.
    pub fn sample(&mut self, book: Option<&dyn OrderBookView>, now_ns: i64) -> SampleOutcome {
        if let Some(last) = self.last_sample_ns
            && now_ns - last < SAMPLE_PERIOD_NS
        {
            return SampleOutcome::RateLimited;
        }
        self.last_sample_ns = Some(now_ns);

        let Some(book) = book else {
            return self.skip(SkipReason::BookUnavailable);
        };
        if book.ask_amount(None, None) <= 0.0 {
            return self.skip(SkipReason::BookEmpty);
        }
        let Some(avg_price) = self.market.avg_price else {
            return self.skip(SkipReason::NoMarketPrice);
        };

        let buckets = self.walk(book, avg_price, now_ns);
        let recorded = buckets.len();
        if recorded > 0 {
            self.pending.push(OrderbookFullSnapshot::new(now_ns, 1, buckets));
        }
        SampleOutcome::Recorded(recorded)
    }

    fn skip(&self, reason: SkipReason) -> SampleOutcome {
        warn!("{}: skipping orderbook sample: {}", self.name, reason);
        SampleOutcome::Skipped(reason)
    }

    /// Buckets the book outward from the average price.
    ///
    /// Step `i` covers the ask bucket `k0 + i` and the bid bucket
    /// `k0 - 1 - i`, where `k0 = floor(avg / step)`. The walk ends with the
    /// bid bucket whose lower edge is 0.
    fn walk(&self, book: &dyn OrderBookView, avg_price: f64, now_ns: i64) -> Vec<OrderbookSnapshot> {
        let step = self.params.price_step_bucket;
        let precision = self.params.price_precision;
        let edge = |k: i64| floor_to_precision(k as f64 * step, precision);

        let k0 = (avg_price / step).floor() as i64;
        let steps = k0.max(1);

        let mut buckets = Vec::new();
        let mut record = |k: i64| {
            let (low, high) = (edge(k), edge(k + 1));
            let asks = book.ask_amount(Some(low), Some(high));
            let bids = book.bid_amount(Some(low), Some(high));
            if asks + bids > 0.0 {
                buckets.push(OrderbookSnapshot::new(low, high, now_ns, 1, asks, bids));
            }
        };

        for i in 0..steps {
            record(k0 + i);
            let bid_k = k0 - 1 - i;
            if bid_k >= 0 {
                record(bid_k);
            }
        }
        buckets
    }

    fn merge_pending(&mut self, candle: &Candle) -> Result<(), IndicatorError> {
        let merged = OrderbookFullSnapshot::merge(
            &self.pending,
            candle.timestamp_ns,
            self.params.candle_size_min,
        )?;
        self.pending.clear();
        match merged {
            Some(snapshot) => {
                self.history.push(snapshot);
            }
            None => debug!(
                "{}: no orderbook samples for candle at {}",
                self.name, candle.timestamp_ns
            ),
        }
        Ok(())
    }
}

impl Indicator for OrderbookHeatmap {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> IndicatorKind {
        IndicatorKind::OrderbookHeatmap
    }

    fn add_candle(&mut self, candle: &Candle) -> Result<(), IndicatorError> {
        self.merge_pending(candle)?;
        self.readiness.update(!self.history.is_empty());
        Ok(())
    }

    fn is_ready(&self) -> bool {
        self.readiness.is_ready()
    }

    fn all_values(&self) -> BTreeMap<String, f64> {
        let mut values = BTreeMap::new();
        values.insert("snapshots".to_string(), self.history.len() as f64);
        if let Some(latest) = self.latest() {
            values.insert("latest_asks".to_string(), latest.total_asks());
            values.insert("latest_bids".to_string(), latest.total_bids());
            values.insert("latest_buckets".to_string(), latest.len() as f64);
        }
        values
    }

    fn serialize_state(&self) -> Result<serde_json::Value, IndicatorError> {
        Ok(serde_json::to_value(HeatmapState {
            pending: self.pending.clone(),
            history: self.history.clone(),
            last_sample_ns: self.last_sample_ns,
            readiness: self.readiness,
        })?)
    }

    fn restore_state(&mut self, state: serde_json::Value) -> Result<(), IndicatorError> {
        let state: HeatmapState = serde_json::from_value(state)?;
        self.pending = state.pending;
        self.history = RollingBuffer::with_capacity(self.params.interval);
        self.history.extend(state.history);
        self.last_sample_ns = state.last_sample_ns;
        self.readiness = state.readiness;
        Ok(())
    }

    fn market(&self) -> &MarketSync {
        &self.market
    }

    fn market_mut(&mut self) -> &mut MarketSync {
        &mut self.market
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

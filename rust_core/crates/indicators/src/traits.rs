//! Indicator traits and specifications.
//!
//! Defines the lifecycle every indicator follows: ingest candles (and
//! optionally trades or price points), report readiness, expose the latest
//! values and persist its rolling state.

use crate::error::IndicatorError;
use serde::{Deserialize, Serialize};
use sextant_types::{Candle, Trade};
use std::any::Any;
use std::collections::BTreeMap;

/// Enumerated indicator kinds known to the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum IndicatorKind {
    /// Simple moving average
    Sma,
    /// Exponential moving average
    Ema,
    /// Relative strength index
    Rsi,
    /// Moving average convergence/divergence
    Macd,
    /// Average true range
    Atr,
    /// Bollinger bands
    Bollinger,
    /// Volume profile with value area
    VolumeProfile,
    /// Orderbook depth heatmap
    OrderbookHeatmap,
}

impl IndicatorKind {
    /// Every kind, in registration order.
    pub const ALL: [IndicatorKind; 8] = [
        IndicatorKind::Sma,
        IndicatorKind::Ema,
        IndicatorKind::Rsi,
        IndicatorKind::Macd,
        IndicatorKind::Atr,
        IndicatorKind::Bollinger,
        IndicatorKind::VolumeProfile,
        IndicatorKind::OrderbookHeatmap,
    ];

    /// Canonical upper-case tag.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            IndicatorKind::Sma => "SMA",
            IndicatorKind::Ema => "EMA",
            IndicatorKind::Rsi => "RSI",
            IndicatorKind::Macd => "MACD",
            IndicatorKind::Atr => "ATR",
            IndicatorKind::Bollinger => "BOLLINGER",
            IndicatorKind::VolumeProfile => "VOLUME_PROFILE",
            IndicatorKind::OrderbookHeatmap => "ORDERBOOK_HEATMAP",
        }
    }
}

impl std::str::FromStr for IndicatorKind {
    type Err = IndicatorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let tag = s.trim().to_uppercase().replace('-', "_");
        IndicatorKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == tag)
            .ok_or_else(|| IndicatorError::UnknownIndicator(s.to_string()))
    }
}

impl TryFrom<String> for IndicatorKind {
    type Error = IndicatorError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<IndicatorKind> for String {
    fn from(kind: IndicatorKind) -> Self {
        kind.as_str().to_string()
    }
}

impl std::fmt::Display for IndicatorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Named indicator instance with its kind and raw parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorSpec {
    /// Instance name, unique within an analysis state
    pub name: String,
    /// Indicator kind
    pub kind: IndicatorKind,
    /// Kind-specific parameters; missing fields take their defaults
    #[serde(default)]
    pub params: serde_json::Value,
}

impl IndicatorSpec {
    /// Creates a new indicator specification.
    #[must_use]
    pub fn new(name: impl Into<String>, kind: IndicatorKind, params: serde_json::Value) -> Self {
        Self {
            name: name.into(),
            kind,
            params,
        }
    }
}

/// Latched readiness flag.
///
/// Once set it never clears, also when a later computation fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Readiness {
    ready: bool,
}

impl Readiness {
    /// Latches readiness when `condition` holds and returns the current state.
    pub fn update(&mut self, condition: bool) -> bool {
        self.ready |= condition;
        self.ready
    }

    /// Returns true once latched.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.ready
    }
}

/// Current market reference set by [`Indicator::sync`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MarketSync {
    /// Open time of the last synced candle
    pub time_ns: Option<i64>,
    /// Average market price at sync time
    pub avg_price: Option<f64>,
}

impl MarketSync {
    /// Updates the reference from a candle and the average market price.
    ///
    /// Non-finite or non-positive prices clear the price reference.
    pub fn update(&mut self, candle: &Candle, avg_market_price: f64) {
        self.time_ns = Some(candle.timestamp_ns);
        self.avg_price = (avg_market_price.is_finite() && avg_market_price > 0.0)
            .then_some(avg_market_price);
    }
}

/// Incremental indicator lifecycle.
///
/// Implementations keep bounded rolling buffers, recompute on every candle
/// once enough history is held and cache the latest result. A failed
/// computation returns `Err` for that tick only; cached values and readiness
/// stay as they were.
pub trait Indicator: Send + Sync {
    /// Instance name.
    fn name(&self) -> &str;

    /// Indicator kind.
    fn kind(&self) -> IndicatorKind;

    /// Incorporates a closed candle.
    ///
    /// # Errors
    /// Returns [`IndicatorError`] when the computation for this tick fails.
    fn add_candle(&mut self, candle: &Candle) -> Result<(), IndicatorError>;

    /// Incorporates raw trades. No-op unless overridden.
    ///
    /// # Errors
    /// Returns [`IndicatorError`] when the computation for this tick fails.
    fn add_trades(&mut self, _trades: &[Trade]) -> Result<(), IndicatorError> {
        Ok(())
    }

    /// Incorporates a single price point. No-op unless overridden.
    ///
    /// # Errors
    /// Returns [`IndicatorError`] when the computation for this tick fails.
    fn add_price_point(&mut self, _price: f64) -> Result<(), IndicatorError> {
        Ok(())
    }

    /// True once every buffer holds enough samples and a value was computed.
    fn is_ready(&self) -> bool;

    /// Every metric that currently has a value.
    fn all_values(&self) -> BTreeMap<String, f64>;

    /// Captures the rolling state as JSON.
    ///
    /// # Errors
    /// Returns [`IndicatorError::Serialization`] when encoding fails.
    fn serialize_state(&self) -> Result<serde_json::Value, IndicatorError>;

    /// Replaces the rolling state with one produced by
    /// [`Indicator::serialize_state`].
    ///
    /// # Errors
    /// Returns [`IndicatorError::Serialization`] when the state does not decode.
    fn restore_state(&mut self, state: serde_json::Value) -> Result<(), IndicatorError>;

    /// Market reference.
    fn market(&self) -> &MarketSync;

    /// Mutable market reference.
    fn market_mut(&mut self) -> &mut MarketSync;

    /// Updates the market time and average price reference.
    fn sync(&mut self, candle: &Candle, avg_market_price: f64) {
        self.market_mut().update(candle, avg_market_price);
    }

    /// Upcast for typed access.
    fn as_any(&self) -> &dyn Any;

    /// Mutable upcast for typed access.
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

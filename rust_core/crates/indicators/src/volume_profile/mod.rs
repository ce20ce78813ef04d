//! Volume profile with value area.
//!
//! Every candle, once `interval` candles are held, the close range of the
//! window is split into `volume_rows` equal-width zones, candle (or trade)
//! volume is attributed to the zone holding its price and the value area is
//! expanded around the highest-volume zone. The computation is a full
//! rebuild on each tick, never incremental.

pub mod bar;
pub mod value_area;

pub use bar::VolumeProfileBar;
pub use value_area::ValueArea;

use crate::buffer::RollingBuffer;
use crate::error::IndicatorError;
use crate::traits::{Indicator, IndicatorKind, MarketSync, Readiness};
use serde::{Deserialize, Serialize};
use sextant_types::{Candle, Trade};
use std::any::Any;
use std::collections::BTreeMap;
use tracing::debug;

fn default_interval() -> usize {
    48
}

fn default_volume_rows() -> usize {
    24
}

fn default_value_area_percent() -> f64 {
    70.0
}

/// Volume profile parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VolumeProfileParams {
    /// Number of candles in the window
    #[serde(default = "default_interval")]
    pub interval: usize,
    /// Number of price zones
    #[serde(default = "default_volume_rows")]
    pub volume_rows: usize,
    /// Share of total volume the value area must reach, in percent
    #[serde(default = "default_value_area_percent")]
    pub value_area_percent: f64,
    /// Attribute embedded trades by trade price instead of candle close
    #[serde(default)]
    pub use_trades: bool,
}

impl Default for VolumeProfileParams {
    fn default() -> Self {
        Self {
            interval: default_interval(),
            volume_rows: default_volume_rows(),
            value_area_percent: default_value_area_percent(),
            use_trades: false,
        }
    }
}

impl VolumeProfileParams {
    /// Rejects empty windows, zero rows and percentages outside `(0, 100]`.
    ///
    /// # Errors
    /// Returns [`IndicatorError::InvalidParams`] on violation.
    pub fn validate(&self) -> Result<(), IndicatorError> {
        if self.interval == 0 {
            return Err(IndicatorError::invalid_params("interval must be > 0"));
        }
        if self.volume_rows == 0 {
            return Err(IndicatorError::invalid_params("volume_rows must be > 0"));
        }
        let percent = self.value_area_percent;
        if percent.is_nan() || percent <= 0.0 || percent > 100.0 {
            return Err(IndicatorError::invalid_params(format!(
                "value_area_percent must be in (0, 100], got {percent}"
            )));
        }
        Ok(())
    }
}

/// Volume profile indicator.
#[derive(Debug, Clone)]
pub struct VolumeProfile {
    name: String,
    params: VolumeProfileParams,
    candles: RollingBuffer<Candle>,
    pending_trades: Vec<Trade>,
    bars_by_price: Vec<VolumeProfileBar>,
    bars: Vec<VolumeProfileBar>,
    value_area: Option<ValueArea>,
    readiness: Readiness,
    market: MarketSync,
}

#[derive(Serialize, Deserialize)]
struct VolumeProfileState {
    candles: RollingBuffer<Candle>,
    #[serde(default)]
    pending_trades: Vec<Trade>,
    #[serde(default)]
    readiness: Readiness,
}

impl VolumeProfile {
    /// Creates a volume profile.
    ///
    /// # Errors
    /// Returns [`IndicatorError::InvalidParams`] when the parameters are invalid.
    pub fn new(name: impl Into<String>, params: VolumeProfileParams) -> Result<Self, IndicatorError> {
        params.validate()?;
        Ok(Self {
            name: name.into(),
            params,
            candles: RollingBuffer::with_capacity(params.interval),
            pending_trades: Vec::new(),
            bars_by_price: Vec::new(),
            bars: Vec::new(),
            value_area: None,
            readiness: Readiness::default(),
            market: MarketSync::default(),
        })
    }

    /// Parameters in use.
    #[must_use]
    pub fn params(&self) -> &VolumeProfileParams {
        &self.params
    }

    /// Bars ranked by descending volume; equal volumes keep ascending price.
    #[must_use]
    pub fn bars(&self) -> &[VolumeProfileBar] {
        &self.bars
    }

    /// Bars in ascending price order.
    #[must_use]
    pub fn bars_by_price(&self) -> &[VolumeProfileBar] {
        &self.bars_by_price
    }

    /// Latest value area.
    #[must_use]
    pub fn value_area(&self) -> Option<&ValueArea> {
        self.value_area.as_ref()
    }

    /// Highest-volume bar.
    #[must_use]
    pub fn point_of_control(&self) -> Option<&VolumeProfileBar> {
        self.bars.first()
    }

    /// Bar whose zone holds `price`.
    #[must_use]
    pub fn bar_at_price(&self, price: f64) -> Option<&VolumeProfileBar> {
        bar::bar_index(&self.bars_by_price, price).map(|idx| &self.bars_by_price[idx])
    }

    /// Share of total volume traded in the zone holding `price`, in percent.
    ///
    /// 0 when the price is outside the profile or no volume was traded.
    #[must_use]
    pub fn volume_percent_at(&self, price: f64) -> f64 {
        let total = self.total_volume();
        if total <= 0.0 {
            return 0.0;
        }
        self.bar_at_price(price)
            .map_or(0.0, |bar| bar.volume / total * 100.0)
    }

    /// Trades fed through [`Indicator::add_trades`] not yet attached to a candle.
    #[must_use]
    pub fn pending_trades(&self) -> &[Trade] {
        &self.pending_trades
    }

    /// Sum of all bar volumes.
    #[must_use]
    pub fn total_volume(&self) -> f64 {
        self.value_area.as_ref().map_or(0.0, |area| area.total_volume)
    }

    fn recompute(&mut self) {
        if self.candles.len() < self.params.interval {
            return;
        }

        let (min_price, max_price) = self
            .candles
            .iter()
            .map(|candle| candle.close)
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), close| {
                (lo.min(close), hi.max(close))
            });

        if max_price <= min_price || !min_price.is_finite() || !max_price.is_finite() {
            debug!(
                "{}: degenerate price range [{}, {}], keeping previous profile",
                self.name, min_price, max_price
            );
            return;
        }

        let price_zone = (max_price - min_price) / self.params.volume_rows as f64;
        let mut bars_by_price = bar::build_bars(min_price, price_zone, self.params.volume_rows);
        bar::attribute(&mut bars_by_price, self.candles.iter(), self.params.use_trades);

        let mut ranked = bars_by_price.clone();
        ranked.sort_by(|a, b| b.volume.total_cmp(&a.volume));

        self.value_area = ValueArea::compute(
            &bars_by_price,
            &ranked,
            self.params.value_area_percent,
            min_price,
            max_price,
        );
        self.bars_by_price = bars_by_price;
        self.bars = ranked;
        self.readiness.update(self.value_area.is_some());
    }
}

impl Indicator for VolumeProfile {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> IndicatorKind {
        IndicatorKind::VolumeProfile
    }

    fn add_candle(&mut self, candle: &Candle) -> Result<(), IndicatorError> {
        let mut candle = candle.clone();
        if candle.has_trades() {
            self.pending_trades.clear();
        } else if !self.pending_trades.is_empty() {
            let (closed, later): (Vec<Trade>, Vec<Trade>) = self
                .pending_trades
                .drain(..)
                .partition(|trade| trade.timestamp_ns <= candle.close_time_ns);
            candle.trades = closed;
            self.pending_trades = later;
        }
        self.candles.push(candle);
        self.recompute();
        Ok(())
    }

    /// Buffers trades for the open candle when profiling per trade.
    ///
    /// They are attached to the next candle that carries no trades of its
    /// own and closes at or after their timestamp.
    fn add_trades(&mut self, trades: &[Trade]) -> Result<(), IndicatorError> {
        if self.params.use_trades {
            self.pending_trades.extend_from_slice(trades);
        }
        Ok(())
    }

    fn is_ready(&self) -> bool {
        self.readiness.is_ready()
    }

    fn all_values(&self) -> BTreeMap<String, f64> {
        let mut values = BTreeMap::new();
        let Some(area) = &self.value_area else {
            return values;
        };
        if let Some(poc) = self.point_of_control() {
            values.insert("poc_price".to_string(), poc.mid_price());
        }
        values.insert("value_area_high".to_string(), area.value_area_high);
        values.insert("value_area_low".to_string(), area.value_area_low);
        values.insert("value_area_volume".to_string(), area.value_area_volume);
        values.insert("profile_high".to_string(), area.profile_high);
        values.insert("profile_low".to_string(), area.profile_low);
        values.insert("total_volume".to_string(), area.total_volume);
        values
    }

    fn serialize_state(&self) -> Result<serde_json::Value, IndicatorError> {
        Ok(serde_json::to_value(VolumeProfileState {
            candles: self.candles.clone(),
            pending_trades: self.pending_trades.clone(),
            readiness: self.readiness,
        })?)
    }

    fn restore_state(&mut self, state: serde_json::Value) -> Result<(), IndicatorError> {
        let state: VolumeProfileState = serde_json::from_value(state)?;
        self.candles = RollingBuffer::with_capacity(self.params.interval);
        self.candles.extend(state.candles);
        self.pending_trades = state.pending_trades;
        self.bars_by_price.clear();
        self.bars.clear();
        self.value_area = None;
        self.readiness = state.readiness;
        self.recompute();
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

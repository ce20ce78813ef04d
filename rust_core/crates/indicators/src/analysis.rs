//! Technical analysis state owned by a strategy.
//!
//! Holds a named set of indicators in insertion order and drives them with
//! candles, trades and order book samples. A failing indicator never stops
//! the others; its error is logged and reported for the tick.

use crate::config::AnalysisConfig;
use crate::error::IndicatorError;
use crate::heatmap::{OrderBookView, OrderbookHeatmap, SampleOutcome};
use crate::plot::PlotCollector;
use crate::registry::IndicatorRegistry;
use crate::traits::Indicator;
use crate::volume_profile::VolumeProfile;
use sextant_types::{Candle, Timeframe, Trade};
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

/// Outcome of feeding one event to every indicator.
#[derive(Debug, Default)]
pub struct UpdateReport {
    /// Indicators that accepted the event
    pub updated: usize,
    /// Indicators whose computation failed, by name
    pub failures: Vec<(String, IndicatorError)>,
}

impl UpdateReport {
    /// Returns true when no indicator failed.
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.failures.is_empty()
    }

    fn record(&mut self, name: &str, event: &str, result: Result<(), IndicatorError>) {
        match result {
            Ok(()) => self.updated += 1,
            Err(err) => {
                warn!("{}: {} update failed: {}", name, event, err);
                self.failures.push((name.to_string(), err));
            }
        }
    }
}

/// Named indicators plus the plot collector they report to.
pub struct TechnicalAnalysisState {
    timeframe: Timeframe,
    indicators: Vec<Box<dyn Indicator>>,
    plot: PlotCollector,
}

impl TechnicalAnalysisState {
    /// Creates an empty state.
    #[must_use]
    pub fn new(timeframe: Timeframe) -> Self {
        Self {
            timeframe,
            indicators: Vec::new(),
            plot: PlotCollector::new(),
        }
    }

    /// Keeps at most `marks_per_label` plot marks per label; zero disables
    /// plotting.
    #[must_use]
    pub fn with_plot_capacity(mut self, marks_per_label: usize) -> Self {
        self.plot = PlotCollector::with_capacity(marks_per_label);
        self
    }

    /// Builds every configured indicator through the registry.
    ///
    /// # Errors
    /// Returns the first creation error, or [`IndicatorError::InvalidParams`]
    /// for duplicate names.
    pub fn from_config(
        config: &AnalysisConfig,
        registry: &IndicatorRegistry,
    ) -> Result<Self, IndicatorError> {
        let mut state = Self::new(config.timeframe);
        for spec in &config.indicators {
            state.add(registry.create(spec)?)?;
        }

        info!(
            "Analysis state built: {} indicators on {}",
            state.indicators.len(),
            state.timeframe
        );
        Ok(state)
    }

    /// Adds an indicator.
    ///
    /// # Errors
    /// Returns [`IndicatorError::InvalidParams`] when the name is taken.
    pub fn add(&mut self, indicator: Box<dyn Indicator>) -> Result<(), IndicatorError> {
        if self.get(indicator.name()).is_some() {
            return Err(IndicatorError::invalid_params(format!(
                "duplicate indicator name: {}",
                indicator.name()
            )));
        }
        self.indicators.push(indicator);
        Ok(())
    }

    /// Candle size of the feed.
    #[must_use]
    pub fn timeframe(&self) -> Timeframe {
        self.timeframe
    }

    /// Number of indicators.
    #[must_use]
    pub fn len(&self) -> usize {
        self.indicators.len()
    }

    /// Returns true when no indicator is held.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.indicators.is_empty()
    }

    /// Indicator names in insertion order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.indicators.iter().map(|indicator| indicator.name())
    }

    /// Feeds a closed candle to every indicator.
    ///
    /// Ready indicators then write their values to the plot collector,
    /// stamped with their market time.
    ///
    /// # Errors
    /// Returns [`IndicatorError::Market`] when the candle is malformed; no
    /// indicator sees it then.
    pub fn add_candle(&mut self, candle: &Candle) -> Result<UpdateReport, IndicatorError> {
        candle.validate()?;

        let mut report = UpdateReport::default();
        for indicator in &mut self.indicators {
            let result = indicator.add_candle(candle);
            report.record(indicator.name(), "candle", result);
        }

        for indicator in self.indicators.iter().filter(|i| i.is_ready()) {
            let timestamp_ns = indicator.market().time_ns.unwrap_or(candle.timestamp_ns);
            for (metric, value) in indicator.all_values() {
                self.plot
                    .add_mark(format!("{}.{}", indicator.name(), metric), timestamp_ns, value);
            }
        }
        Ok(report)
    }

    /// Feeds raw trades to every indicator.
    pub fn add_trades(&mut self, trades: &[Trade]) -> UpdateReport {
        let mut report = UpdateReport::default();
        for indicator in &mut self.indicators {
            let result = indicator.add_trades(trades);
            report.record(indicator.name(), "trades", result);
        }
        report
    }

    /// Feeds a price point to every indicator.
    pub fn add_price_point(&mut self, price: f64) -> UpdateReport {
        let mut report = UpdateReport::default();
        for indicator in &mut self.indicators {
            let result = indicator.add_price_point(price);
            report.record(indicator.name(), "price", result);
        }
        report
    }

    /// Updates every indicator's market reference.
    pub fn sync(&mut self, candle: &Candle, avg_market_price: f64) {
        for indicator in &mut self.indicators {
            indicator.sync(candle, avg_market_price);
        }
    }

    /// Samples the order book into every heatmap.
    pub fn sample_orderbook(
        &mut self,
        book: Option<&dyn OrderBookView>,
        now_ns: i64,
    ) -> Vec<(String, SampleOutcome)> {
        self.indicators
            .iter_mut()
            .filter_map(|indicator| {
                let heatmap = indicator.as_any_mut().downcast_mut::<OrderbookHeatmap>()?;
                let outcome = heatmap.sample(book, now_ns);
                Some((heatmap.name().to_string(), outcome))
            })
            .collect()
    }

    /// Returns true when at least one indicator is held and all are ready.
    #[must_use]
    pub fn all_ready(&self) -> bool {
        !self.indicators.is_empty() && self.indicators.iter().all(|i| i.is_ready())
    }

    /// Indicator by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&dyn Indicator> {
        self.indicators
            .iter()
            .find(|indicator| indicator.name() == name)
            .map(|indicator| &**indicator)
    }

    /// Indicator by name, downcast to its concrete type.
    #[must_use]
    pub fn get_as<T: Indicator + 'static>(&self, name: &str) -> Option<&T> {
        self.get(name)?.as_any().downcast_ref::<T>()
    }

    /// Mutable indicator by name, downcast to its concrete type.
    pub fn get_as_mut<T: Indicator + 'static>(&mut self, name: &str) -> Option<&mut T> {
        self.indicators
            .iter_mut()
            .find(|indicator| indicator.name() == name)?
            .as_any_mut()
            .downcast_mut::<T>()
    }

    /// Volume profile by name.
    #[must_use]
    pub fn volume_profile(&self, name: &str) -> Option<&VolumeProfile> {
        self.get_as(name)
    }

    /// Orderbook heatmap by name.
    #[must_use]
    pub fn heatmap(&self, name: &str) -> Option<&OrderbookHeatmap> {
        self.get_as(name)
    }

    /// Current values of every indicator, keyed by indicator name.
    #[must_use]
    pub fn values(&self) -> BTreeMap<String, BTreeMap<String, f64>> {
        self.indicators
            .iter()
            .map(|indicator| (indicator.name().to_string(), indicator.all_values()))
            .collect()
    }

    /// Diagnostic marks.
    #[must_use]
    pub fn plot(&self) -> &PlotCollector {
        &self.plot
    }

    /// Mutable diagnostic marks, for strategy-level marks.
    pub fn plot_mut(&mut self) -> &mut PlotCollector {
        &mut self.plot
    }

    /// Captures every indicator's state, keyed by name.
    ///
    /// # Errors
    /// Returns the first serialization error.
    pub fn serialize_state(&self) -> Result<serde_json::Value, IndicatorError> {
        let mut states = serde_json::Map::new();
        for indicator in &self.indicators {
            states.insert(indicator.name().to_string(), indicator.serialize_state()?);
        }
        Ok(serde_json::Value::Object(states))
    }

    /// Restores indicator states captured by [`Self::serialize_state`].
    ///
    /// Indicators without a saved state keep their current state; saved
    /// states without a matching indicator are ignored.
    ///
    /// # Errors
    /// Returns [`IndicatorError::Serialization`] when `state` is not an object
    /// or an indicator state does not decode.
    pub fn restore_state(&mut self, state: serde_json::Value) -> Result<(), IndicatorError> {
        let mut states: serde_json::Map<String, serde_json::Value> = serde_json::from_value(state)?;
        for indicator in &mut self.indicators {
            match states.remove(indicator.name()) {
                Some(saved) => indicator.restore_state(saved)?,
                None => debug!("{}: no saved state", indicator.name()),
            }
        }
        Ok(())
    }
}

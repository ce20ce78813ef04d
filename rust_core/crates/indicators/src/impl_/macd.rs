//! Moving Average Convergence/Divergence indicator

use crate::buffer::RollingBuffer;
use crate::error::IndicatorError;
use crate::ta::macd::MACD;
use crate::ta::{OUT_MACD, OUT_MACD_HIST, OUT_MACD_SIGNAL, TaFunction, TaLibrary, TaRequest};
use crate::traits::{Indicator, IndicatorKind, MarketSync, Readiness};
use serde::{Deserialize, Serialize};
use sextant_types::Candle;
use std::any::Any;
use std::collections::BTreeMap;
use std::sync::Arc;

fn default_fast() -> usize {
    12
}

fn default_slow() -> usize {
    26
}

fn default_signal() -> usize {
    9
}

/// MACD parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MacdParams {
    /// Fast EMA period
    #[serde(default = "default_fast")]
    pub fast_period: usize,
    /// Slow EMA period
    #[serde(default = "default_slow")]
    pub slow_period: usize,
    /// Signal EMA period
    #[serde(default = "default_signal")]
    pub signal_period: usize,
}

impl Default for MacdParams {
    fn default() -> Self {
        Self {
            fast_period: default_fast(),
            slow_period: default_slow(),
            signal_period: default_signal(),
        }
    }
}

impl MacdParams {
    /// Checks periods are positive and `fast < slow`.
    ///
    /// # Errors
    /// Returns [`IndicatorError::InvalidParams`] on violation.
    pub fn validate(&self) -> Result<(), IndicatorError> {
        if self.fast_period == 0 || self.slow_period == 0 || self.signal_period == 0 {
            return Err(IndicatorError::invalid_params("MACD periods must be > 0"));
        }
        if self.fast_period >= self.slow_period {
            return Err(IndicatorError::invalid_params(format!(
                "MACD fast_period {} must be below slow_period {}",
                self.fast_period, self.slow_period
            )));
        }
        Ok(())
    }

    /// Closes needed before the histogram has a value.
    #[must_use]
    pub fn required_samples(&self) -> usize {
        MACD::new(self.fast_period, self.slow_period, self.signal_period).lookback() + 1
    }
}

/// Latest MACD triple.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MacdValue {
    /// MACD line
    pub macd: f64,
    /// Signal line
    pub signal: f64,
    /// Histogram (macd - signal)
    pub histogram: f64,
}

/// MACD over candle closes.
pub struct Macd {
    name: String,
    params: MacdParams,
    library: Arc<dyn TaLibrary>,
    closes: RollingBuffer<f64>,
    value: Option<MacdValue>,
    readiness: Readiness,
    market: MarketSync,
}

#[derive(Serialize, Deserialize)]
struct MacdState {
    closes: RollingBuffer<f64>,
    value: Option<MacdValue>,
    #[serde(default)]
    readiness: Readiness,
}

impl Macd {
    /// Creates a MACD indicator.
    ///
    /// # Errors
    /// Returns [`IndicatorError::InvalidParams`] for invalid periods.
    pub fn new(
        name: impl Into<String>,
        params: MacdParams,
        library: Arc<dyn TaLibrary>,
    ) -> Result<Self, IndicatorError> {
        params.validate()?;
        Ok(Self {
            name: name.into(),
            params,
            library,
            closes: RollingBuffer::for_interval(params.slow_period + params.signal_period),
            value: None,
            readiness: Readiness::default(),
            market: MarketSync::default(),
        })
    }

    /// Latest MACD triple.
    #[must_use]
    pub fn value(&self) -> Option<MacdValue> {
        self.value
    }
}

impl Indicator for Macd {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> IndicatorKind {
        IndicatorKind::Macd
    }

    fn add_candle(&mut self, candle: &Candle) -> Result<(), IndicatorError> {
        self.closes.push(candle.close);
        if self.closes.len() < self.params.required_samples() {
            return Ok(());
        }

        let request = TaRequest::new(TaFunction::Macd, self.closes.to_vec()).macd_periods(
            self.params.fast_period,
            self.params.slow_period,
            self.params.signal_period,
        );
        let output = self.library.calculate(&request)?;
        if let (Some(macd), Some(signal), Some(histogram)) = (
            output.latest(OUT_MACD),
            output.latest(OUT_MACD_SIGNAL),
            output.latest(OUT_MACD_HIST),
        ) {
            self.value = Some(MacdValue {
                macd,
                signal,
                histogram,
            });
        }
        self.readiness.update(self.value.is_some());
        Ok(())
    }

    fn is_ready(&self) -> bool {
        self.readiness.is_ready()
    }

    fn all_values(&self) -> BTreeMap<String, f64> {
        let mut values = BTreeMap::new();
        if let Some(value) = self.value {
            values.insert("macd".to_string(), value.macd);
            values.insert("signal".to_string(), value.signal);
            values.insert("histogram".to_string(), value.histogram);
        }
        values
    }

    fn serialize_state(&self) -> Result<serde_json::Value, IndicatorError> {
        Ok(serde_json::to_value(MacdState {
            closes: self.closes.clone(),
            value: self.value,
            readiness: self.readiness,
        })?)
    }

    fn restore_state(&mut self, state: serde_json::Value) -> Result<(), IndicatorError> {
        let state: MacdState = serde_json::from_value(state)?;
        self.closes =
            RollingBuffer::for_interval(self.params.slow_period + self.params.signal_period);
        self.closes.extend(state.closes);
        self.value = state.value;
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

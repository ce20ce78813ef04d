//! Relative Strength Index indicator

use crate::buffer::RollingBuffer;
use crate::error::IndicatorError;
use crate::impl_::PeriodParams;
use crate::ta::{OUT_REAL, TaFunction, TaLibrary, TaRequest};
use crate::traits::{Indicator, IndicatorKind, MarketSync, Readiness};
use serde::{Deserialize, Serialize};
use sextant_types::Candle;
use std::any::Any;
use std::collections::BTreeMap;
use std::sync::Arc;

/// RSI over candle closes. Needs `interval + 1` closes for a first value.
pub struct Rsi {
    name: String,
    params: PeriodParams,
    library: Arc<dyn TaLibrary>,
    closes: RollingBuffer<f64>,
    value: Option<f64>,
    readiness: Readiness,
    market: MarketSync,
}

#[derive(Serialize, Deserialize)]
struct RsiState {
    closes: RollingBuffer<f64>,
    value: Option<f64>,
    #[serde(default)]
    readiness: Readiness,
}

impl Rsi {
    /// Creates an RSI indicator.
    ///
    /// # Errors
    /// Returns [`IndicatorError::InvalidParams`] for a zero period.
    pub fn new(
        name: impl Into<String>,
        params: PeriodParams,
        library: Arc<dyn TaLibrary>,
    ) -> Result<Self, IndicatorError> {
        params.validate()?;
        Ok(Self {
            name: name.into(),
            params,
            library,
            closes: RollingBuffer::for_interval(params.interval),
            value: None,
            readiness: Readiness::default(),
            market: MarketSync::default(),
        })
    }

    /// Latest RSI in `[0, 100]`.
    #[must_use]
    pub fn value(&self) -> Option<f64> {
        self.value
    }
}

impl Indicator for Rsi {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> IndicatorKind {
        IndicatorKind::Rsi
    }

    fn add_candle(&mut self, candle: &Candle) -> Result<(), IndicatorError> {
        self.closes.push(candle.close);
        if self.closes.len() <= self.params.interval {
            return Ok(());
        }

        let request =
            TaRequest::new(TaFunction::Rsi, self.closes.to_vec()).time_period(self.params.interval);
        let output = self.library.calculate(&request)?;
        if let Some(value) = output.latest(OUT_REAL) {
            self.value = Some(value);
        }
        self.readiness.update(self.value.is_some());
        Ok(())
    }

    fn is_ready(&self) -> bool {
        self.readiness.is_ready()
    }

    fn all_values(&self) -> BTreeMap<String, f64> {
        self.value
            .map(|v| ("rsi".to_string(), v))
            .into_iter()
            .collect()
    }

    fn serialize_state(&self) -> Result<serde_json::Value, IndicatorError> {
        Ok(serde_json::to_value(RsiState {
            closes: self.closes.clone(),
            value: self.value,
            readiness: self.readiness,
        })?)
    }

    fn restore_state(&mut self, state: serde_json::Value) -> Result<(), IndicatorError> {
        let state: RsiState = serde_json::from_value(state)?;
        self.closes = RollingBuffer::for_interval(self.params.interval);
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

//! Simple and exponential moving average indicators

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

/// Moving average of candle closes, SMA or EMA.
pub struct MovingAverage {
    name: String,
    kind: IndicatorKind,
    params: PeriodParams,
    library: Arc<dyn TaLibrary>,
    closes: RollingBuffer<f64>,
    value: Option<f64>,
    readiness: Readiness,
    market: MarketSync,
}

#[derive(Serialize, Deserialize)]
struct MovingAverageState {
    closes: RollingBuffer<f64>,
    value: Option<f64>,
    #[serde(default)]
    readiness: Readiness,
}

impl MovingAverage {
    /// Creates a moving average. `kind` must be SMA or EMA.
    ///
    /// # Errors
    /// Returns [`IndicatorError::InvalidParams`] for other kinds or a zero period.
    pub fn new(
        name: impl Into<String>,
        kind: IndicatorKind,
        params: PeriodParams,
        library: Arc<dyn TaLibrary>,
    ) -> Result<Self, IndicatorError> {
        if !matches!(kind, IndicatorKind::Sma | IndicatorKind::Ema) {
            return Err(IndicatorError::invalid_params(format!(
                "{kind} is not a moving average"
            )));
        }
        params.validate()?;
        Ok(Self {
            name: name.into(),
            kind,
            params,
            library,
            closes: RollingBuffer::for_interval(params.interval),
            value: None,
            readiness: Readiness::default(),
            market: MarketSync::default(),
        })
    }

    /// Latest average.
    #[must_use]
    pub fn value(&self) -> Option<f64> {
        self.value
    }

    fn function(&self) -> TaFunction {
        match self.kind {
            IndicatorKind::Ema => TaFunction::Ema,
            _ => TaFunction::Sma,
        }
    }
}

impl Indicator for MovingAverage {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> IndicatorKind {
        self.kind
    }

    fn add_candle(&mut self, candle: &Candle) -> Result<(), IndicatorError> {
        self.closes.push(candle.close);
        if self.closes.len() < self.params.interval {
            return Ok(());
        }

        let request = TaRequest::new(self.function(), self.closes.to_vec())
            .time_period(self.params.interval);
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
            .map(|v| ("value".to_string(), v))
            .into_iter()
            .collect()
    }

    fn serialize_state(&self) -> Result<serde_json::Value, IndicatorError> {
        Ok(serde_json::to_value(MovingAverageState {
            closes: self.closes.clone(),
            value: self.value,
            readiness: self.readiness,
        })?)
    }

    fn restore_state(&mut self, state: serde_json::Value) -> Result<(), IndicatorError> {
        let state: MovingAverageState = serde_json::from_value(state)?;
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ta::NativeTaLibrary;
    use approx::assert_relative_eq;

    fn make_candle(close: f64) -> Candle {
        Candle {
            timestamp_ns: 0,
            close_time_ns: 60_000_000_000 - 1,
            open: close,
            high: close,
            low: close,
            close,
            volume: 0.0,
            up_volume: 0.0,
            down_volume: 0.0,
            trades: Vec::new(),
        }
    }

    fn sma(period: usize) -> MovingAverage {
        MovingAverage::new(
            "sma",
            IndicatorKind::Sma,
            PeriodParams::new(period),
            Arc::new(NativeTaLibrary::new()),
        )
        .unwrap()
    }

    #[test]
    fn test_sma_ready_after_period() {
        let mut indicator = sma(3);
        for close in [1.0, 2.0] {
            indicator.add_candle(&make_candle(close)).unwrap();
            assert!(!indicator.is_ready());
            assert!(indicator.all_values().is_empty());
        }

        indicator.add_candle(&make_candle(3.0)).unwrap();
        assert!(indicator.is_ready());
        assert_relative_eq!(indicator.value().unwrap(), 2.0);

        indicator.add_candle(&make_candle(4.0)).unwrap();
        assert_relative_eq!(indicator.all_values()["value"], 3.0);
    }

    #[test]
    fn test_ema_tracks_closes() {
        let mut indicator = MovingAverage::new(
            "ema",
            IndicatorKind::Ema,
            PeriodParams::new(3),
            Arc::new(NativeTaLibrary::new()),
        )
        .unwrap();
        for close in [1.0, 2.0, 3.0, 4.0, 5.0] {
            indicator.add_candle(&make_candle(close)).unwrap();
        }
        assert_relative_eq!(indicator.value().unwrap(), 4.0625, epsilon = 1e-10);
    }

    #[test]
    fn test_rejects_non_average_kind() {
        let result = MovingAverage::new(
            "x",
            IndicatorKind::Rsi,
            PeriodParams::new(3),
            Arc::new(NativeTaLibrary::new()),
        );
        assert!(matches!(result, Err(IndicatorError::InvalidParams(_))));
    }

    #[test]
    fn test_buffer_bounded_by_keep_factor() {
        let mut indicator = sma(2);
        for i in 0..200 {
            indicator.add_candle(&make_candle(f64::from(i))).unwrap();
        }
        assert_eq!(indicator.closes.len(), indicator.closes.capacity());
        assert_relative_eq!(indicator.value().unwrap(), 198.5);
    }

    #[test]
    fn test_state_roundtrip() {
        let mut original = sma(3);
        for close in [1.0, 2.0, 3.0, 4.0] {
            original.add_candle(&make_candle(close)).unwrap();
        }

        let mut restored = sma(3);
        restored.restore_state(original.serialize_state().unwrap()).unwrap();
        assert!(restored.is_ready());

        original.add_candle(&make_candle(10.0)).unwrap();
        restored.add_candle(&make_candle(10.0)).unwrap();
        assert_eq!(
            original.value().unwrap().to_bits(),
            restored.value().unwrap().to_bits()
        );
    }
}

//! Average True Range (ATR) indicator with Wilder smoothing

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

/// Average True Range over candle high/low/close.
///
/// The three buffers are pushed together and always have equal length.
pub struct Atr {
    name: String,
    params: PeriodParams,
    library: Arc<dyn TaLibrary>,
    highs: RollingBuffer<f64>,
    lows: RollingBuffer<f64>,
    closes: RollingBuffer<f64>,
    value: Option<f64>,
    readiness: Readiness,
    market: MarketSync,
}

#[derive(Serialize, Deserialize)]
struct AtrState {
    highs: RollingBuffer<f64>,
    lows: RollingBuffer<f64>,
    closes: RollingBuffer<f64>,
    value: Option<f64>,
    #[serde(default)]
    readiness: Readiness,
}

impl Atr {
    /// Creates an ATR indicator.
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
            highs: RollingBuffer::for_interval(params.interval),
            lows: RollingBuffer::for_interval(params.interval),
            closes: RollingBuffer::for_interval(params.interval),
            value: None,
            readiness: Readiness::default(),
            market: MarketSync::default(),
        })
    }

    /// Latest ATR.
    #[must_use]
    pub fn value(&self) -> Option<f64> {
        self.value
    }
}

impl Indicator for Atr {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> IndicatorKind {
        IndicatorKind::Atr
    }

    fn add_candle(&mut self, candle: &Candle) -> Result<(), IndicatorError> {
        self.highs.push(candle.high);
        self.lows.push(candle.low);
        self.closes.push(candle.close);
        if self.closes.len() < self.params.interval {
            return Ok(());
        }

        let request = TaRequest::with_hlc(
            TaFunction::Atr,
            self.highs.to_vec(),
            self.lows.to_vec(),
            self.closes.to_vec(),
        )
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
            .map(|v| ("atr".to_string(), v))
            .into_iter()
            .collect()
    }

    fn serialize_state(&self) -> Result<serde_json::Value, IndicatorError> {
        Ok(serde_json::to_value(AtrState {
            highs: self.highs.clone(),
            lows: self.lows.clone(),
            closes: self.closes.clone(),
            value: self.value,
            readiness: self.readiness,
        })?)
    }

    fn restore_state(&mut self, state: serde_json::Value) -> Result<(), IndicatorError> {
        let state: AtrState = serde_json::from_value(state)?;
        if state.highs.len() != state.closes.len() || state.lows.len() != state.closes.len() {
            return Err(IndicatorError::invalid_state(format!(
                "ATR buffers out of step: {} highs, {} lows, {} closes",
                state.highs.len(),
                state.lows.len(),
                state.closes.len()
            )));
        }
        let interval = self.params.interval;
        self.highs = RollingBuffer::for_interval(interval);
        self.highs.extend(state.highs);
        self.lows = RollingBuffer::for_interval(interval);
        self.lows.extend(state.lows);
        self.closes = RollingBuffer::for_interval(interval);
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

    fn make_candle(high: f64, low: f64, close: f64) -> Candle {
        Candle {
            timestamp_ns: 0,
            close_time_ns: 60_000_000_000 - 1,
            open: close,
            high,
            low,
            close,
            volume: 0.0,
            up_volume: 0.0,
            down_volume: 0.0,
            trades: Vec::new(),
        }
    }

    #[test]
    fn test_atr_constant_range() {
        let mut atr = Atr::new("atr", PeriodParams::new(3), Arc::new(NativeTaLibrary::new())).unwrap();
        for _ in 0..2 {
            atr.add_candle(&make_candle(11.0, 9.0, 10.0)).unwrap();
        }
        assert!(!atr.is_ready());

        atr.add_candle(&make_candle(11.0, 9.0, 10.0)).unwrap();
        assert!(atr.is_ready());
        assert_relative_eq!(atr.value().unwrap(), 2.0);
        assert_relative_eq!(atr.all_values()["atr"], 2.0);
    }

    #[test]
    fn test_restore_rejects_misaligned_buffers() {
        let mut atr = Atr::new("atr", PeriodParams::new(3), Arc::new(NativeTaLibrary::new())).unwrap();
        let state = serde_json::json!({
            "highs": { "capacity": 90, "items": [1.0, 2.0] },
            "lows": { "capacity": 90, "items": [1.0] },
            "closes": { "capacity": 90, "items": [1.0, 2.0] },
            "value": null
        });
        assert!(matches!(
            atr.restore_state(state),
            Err(IndicatorError::InvalidState(_))
        ));
    }
}

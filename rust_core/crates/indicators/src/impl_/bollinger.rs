//! Bollinger Bands indicator

use crate::buffer::RollingBuffer;
use crate::error::IndicatorError;
use crate::ta::{OUT_LOWER_BAND, OUT_MIDDLE_BAND, OUT_UPPER_BAND, TaFunction, TaLibrary, TaRequest};
use crate::traits::{Indicator, IndicatorKind, MarketSync, Readiness};
use serde::{Deserialize, Serialize};
use sextant_types::Candle;
use std::any::Any;
use std::collections::BTreeMap;
use std::sync::Arc;

fn default_interval() -> usize {
    20
}

fn default_deviation() -> f64 {
    2.0
}

/// Bollinger Bands parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BollingerParams {
    /// Window length for the SMA and standard deviation
    #[serde(default = "default_interval")]
    pub interval: usize,
    /// Upper band deviation multiplier
    #[serde(default = "default_deviation")]
    pub dev_up: f64,
    /// Lower band deviation multiplier
    #[serde(default = "default_deviation")]
    pub dev_down: f64,
}

impl Default for BollingerParams {
    fn default() -> Self {
        Self {
            interval: default_interval(),
            dev_up: default_deviation(),
            dev_down: default_deviation(),
        }
    }
}

impl BollingerParams {
    /// Checks the window and multipliers.
    ///
    /// # Errors
    /// Returns [`IndicatorError::InvalidParams`] for a zero window and
    /// [`IndicatorError::ParamOutOfRange`] for negative or non-finite multipliers.
    pub fn validate(&self) -> Result<(), IndicatorError> {
        if self.interval == 0 {
            return Err(IndicatorError::invalid_params("interval must be > 0"));
        }
        for (param, value) in [("dev_up", self.dev_up), ("dev_down", self.dev_down)] {
            if !value.is_finite() || value < 0.0 {
                return Err(IndicatorError::param_out_of_range(param, value, 0.0, f64::MAX));
            }
        }
        Ok(())
    }
}

/// Latest band values.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bands {
    /// Upper band
    pub upper: f64,
    /// Middle band (SMA)
    pub middle: f64,
    /// Lower band
    pub lower: f64,
}

/// Bollinger Bands over candle closes.
pub struct BollingerBands {
    name: String,
    params: BollingerParams,
    library: Arc<dyn TaLibrary>,
    closes: RollingBuffer<f64>,
    value: Option<Bands>,
    readiness: Readiness,
    market: MarketSync,
}

#[derive(Serialize, Deserialize)]
struct BollingerState {
    closes: RollingBuffer<f64>,
    value: Option<Bands>,
    #[serde(default)]
    readiness: Readiness,
}

impl BollingerBands {
    /// Creates a Bollinger Bands indicator.
    ///
    /// # Errors
    /// Returns an error when the parameters are invalid.
    pub fn new(
        name: impl Into<String>,
        params: BollingerParams,
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

    /// Latest bands.
    #[must_use]
    pub fn value(&self) -> Option<Bands> {
        self.value
    }
}

impl Indicator for BollingerBands {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> IndicatorKind {
        IndicatorKind::Bollinger
    }

    fn add_candle(&mut self, candle: &Candle) -> Result<(), IndicatorError> {
        self.closes.push(candle.close);
        if self.closes.len() < self.params.interval {
            return Ok(());
        }

        let request = TaRequest::new(TaFunction::Bbands, self.closes.to_vec())
            .time_period(self.params.interval)
            .deviations(self.params.dev_up, self.params.dev_down);
        let output = self.library.calculate(&request)?;
        if let (Some(upper), Some(middle), Some(lower)) = (
            output.latest(OUT_UPPER_BAND),
            output.latest(OUT_MIDDLE_BAND),
            output.latest(OUT_LOWER_BAND),
        ) {
            self.value = Some(Bands {
                upper,
                middle,
                lower,
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
        if let Some(bands) = self.value {
            values.insert("upper".to_string(), bands.upper);
            values.insert("middle".to_string(), bands.middle);
            values.insert("lower".to_string(), bands.lower);
        }
        values
    }

    fn serialize_state(&self) -> Result<serde_json::Value, IndicatorError> {
        Ok(serde_json::to_value(BollingerState {
            closes: self.closes.clone(),
            value: self.value,
            readiness: self.readiness,
        })?)
    }

    fn restore_state(&mut self, state: serde_json::Value) -> Result<(), IndicatorError> {
        let state: BollingerState = serde_json::from_value(state)?;
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

    #[test]
    fn test_bands_symmetric() {
        let params = BollingerParams {
            interval: 3,
            ..BollingerParams::default()
        };
        let mut bands = BollingerBands::new("bb", params, Arc::new(NativeTaLibrary::new())).unwrap();
        for close in [1.0, 2.0, 3.0, 4.0, 5.0] {
            bands.add_candle(&make_candle(close)).unwrap();
        }

        let value = bands.value().unwrap();
        assert_relative_eq!(value.middle, 4.0);
        assert_relative_eq!(value.upper - value.middle, value.middle - value.lower, epsilon = 1e-12);
        assert!(value.upper > value.middle);
    }

    #[test]
    fn test_constant_closes_collapse_bands() {
        let params = BollingerParams {
            interval: 4,
            ..BollingerParams::default()
        };
        let mut bands = BollingerBands::new("bb", params, Arc::new(NativeTaLibrary::new())).unwrap();
        for _ in 0..4 {
            bands.add_candle(&make_candle(7.0)).unwrap();
        }
        let values = bands.all_values();
        assert_relative_eq!(values["upper"], 7.0);
        assert_relative_eq!(values["lower"], 7.0);
    }

    #[test]
    fn test_params_defaults_and_validation() {
        let params: BollingerParams = serde_json::from_str("{}").unwrap();
        assert_eq!(params, BollingerParams::default());

        let params = BollingerParams {
            dev_up: -1.0,
            ..BollingerParams::default()
        };
        assert!(matches!(
            params.validate(),
            Err(IndicatorError::ParamOutOfRange { .. })
        ));
    }
}

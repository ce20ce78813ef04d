//! Indicator implementations
//!
//! Thin indicators over the numeric library boundary. Each keeps its inputs
//! in rolling buffers and caches the latest library output.

pub mod atr;
pub mod bollinger;
pub mod macd;
pub mod moving_average;
pub mod rsi;

use crate::error::IndicatorError;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Decodes indicator parameters, treating `null` as "all defaults".
///
/// # Errors
/// Returns [`IndicatorError::InvalidParams`] when the value does not match `P`.
pub fn parse_params<P: DeserializeOwned>(params: &serde_json::Value) -> Result<P, IndicatorError> {
    let value = if params.is_null() {
        serde_json::Value::Object(serde_json::Map::new())
    } else {
        params.clone()
    };
    serde_json::from_value(value).map_err(|e| IndicatorError::invalid_params(e.to_string()))
}

fn default_interval() -> usize {
    14
}

/// Single-period parameters (SMA, EMA, RSI, ATR).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodParams {
    /// Lookback period in candles
    #[serde(default = "default_interval")]
    pub interval: usize,
}

impl Default for PeriodParams {
    fn default() -> Self {
        Self {
            interval: default_interval(),
        }
    }
}

impl PeriodParams {
    /// Creates parameters with the given period.
    #[must_use]
    pub fn new(interval: usize) -> Self {
        Self { interval }
    }

    /// Rejects a zero period.
    ///
    /// # Errors
    /// Returns [`IndicatorError::InvalidParams`] when `interval == 0`.
    pub fn validate(&self) -> Result<(), IndicatorError> {
        if self.interval == 0 {
            return Err(IndicatorError::invalid_params("interval must be > 0"));
        }
        Ok(())
    }
}

//! Numeric library boundary.
//!
//! Thin indicators never compute formulas themselves. They build a
//! [`TaRequest`], hand it to a [`TaLibrary`] and read the latest point of the
//! returned [`TaOutput`]. [`NativeTaLibrary`] is the bundled implementation;
//! any other library can be plugged in behind the same trait.

pub mod atr;
pub mod bbands;
pub mod ema;
pub mod macd;
pub mod native;
pub mod rsi;
pub mod sma;

use crate::error::IndicatorError;
use std::collections::HashMap;

pub use native::NativeTaLibrary;

/// Main output of single-series functions.
pub const OUT_REAL: &str = "outReal";
/// MACD line.
pub const OUT_MACD: &str = "outMACD";
/// MACD signal line.
pub const OUT_MACD_SIGNAL: &str = "outMACDSignal";
/// MACD histogram.
pub const OUT_MACD_HIST: &str = "outMACDHist";
/// Upper Bollinger band.
pub const OUT_UPPER_BAND: &str = "outRealUpperBand";
/// Middle Bollinger band.
pub const OUT_MIDDLE_BAND: &str = "outRealMiddleBand";
/// Lower Bollinger band.
pub const OUT_LOWER_BAND: &str = "outRealLowerBand";

/// Functions a numeric library must provide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaFunction {
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
    Bbands,
}

impl TaFunction {
    /// Library-level function name.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            TaFunction::Sma => "SMA",
            TaFunction::Ema => "EMA",
            TaFunction::Rsi => "RSI",
            TaFunction::Macd => "MACD",
            TaFunction::Atr => "ATR",
            TaFunction::Bbands => "BBANDS",
        }
    }
}

impl std::fmt::Display for TaFunction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parameter object passed to [`TaLibrary::calculate`].
///
/// `start_idx..=end_idx` selects the input range to compute over. Input
/// arrays that a function does not use stay empty.
#[derive(Debug, Clone, PartialEq)]
pub struct TaRequest {
    /// Function to compute
    pub name: TaFunction,
    /// First input index (inclusive)
    pub start_idx: usize,
    /// Last input index (inclusive)
    pub end_idx: usize,
    /// Open prices
    pub open: Vec<f64>,
    /// High prices
    pub high: Vec<f64>,
    /// Low prices
    pub low: Vec<f64>,
    /// Close prices
    pub close: Vec<f64>,
    /// Volumes
    pub volume: Vec<f64>,
    /// Period for single-period functions
    pub opt_in_time_period: Option<usize>,
    /// MACD fast period
    pub opt_in_fast_period: Option<usize>,
    /// MACD slow period
    pub opt_in_slow_period: Option<usize>,
    /// MACD signal period
    pub opt_in_signal_period: Option<usize>,
    /// Bollinger upper deviation multiplier
    pub opt_in_nb_dev_up: Option<f64>,
    /// Bollinger lower deviation multiplier
    pub opt_in_nb_dev_dn: Option<f64>,
}

impl TaRequest {
    /// Creates a request over a close series covering all of it.
    #[must_use]
    pub fn new(name: TaFunction, close: Vec<f64>) -> Self {
        Self {
            name,
            start_idx: 0,
            end_idx: close.len().saturating_sub(1),
            open: Vec::new(),
            high: Vec::new(),
            low: Vec::new(),
            close,
            volume: Vec::new(),
            opt_in_time_period: None,
            opt_in_fast_period: None,
            opt_in_slow_period: None,
            opt_in_signal_period: None,
            opt_in_nb_dev_up: None,
            opt_in_nb_dev_dn: None,
        }
    }

    /// Creates a request over high/low/close series.
    #[must_use]
    pub fn with_hlc(name: TaFunction, high: Vec<f64>, low: Vec<f64>, close: Vec<f64>) -> Self {
        let mut request = Self::new(name, close);
        request.high = high;
        request.low = low;
        request
    }

    /// Sets `opt_in_time_period`.
    #[must_use]
    pub fn time_period(mut self, period: usize) -> Self {
        self.opt_in_time_period = Some(period);
        self
    }

    /// Sets the MACD periods.
    #[must_use]
    pub fn macd_periods(mut self, fast: usize, slow: usize, signal: usize) -> Self {
        self.opt_in_fast_period = Some(fast);
        self.opt_in_slow_period = Some(slow);
        self.opt_in_signal_period = Some(signal);
        self
    }

    /// Sets the Bollinger deviation multipliers.
    #[must_use]
    pub fn deviations(mut self, up: f64, down: f64) -> Self {
        self.opt_in_nb_dev_up = Some(up);
        self.opt_in_nb_dev_dn = Some(down);
        self
    }

    /// Number of points in `start_idx..=end_idx`.
    #[must_use]
    pub fn range_len(&self) -> usize {
        if self.close.is_empty() || self.end_idx < self.start_idx {
            0
        } else {
            self.end_idx - self.start_idx + 1
        }
    }
}

/// Result of a library call.
///
/// `result[name][i]` is the output for input index `beg_index + i`, for
/// `i < nb_element`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaOutput {
    /// Input index of the first output point
    pub beg_index: usize,
    /// Number of output points
    pub nb_element: usize,
    /// Output series by name
    pub result: HashMap<String, Vec<f64>>,
}

impl TaOutput {
    /// Builds an output from full-length series whose warmup is NaN.
    ///
    /// Points before the first index where every series is finite are cut
    /// off, as are points outside `start_idx..=end_idx`.
    #[must_use]
    pub fn from_series(start_idx: usize, end_idx: usize, series: Vec<(&str, Vec<f64>)>) -> Self {
        let len = series.iter().map(|(_, s)| s.len()).min().unwrap_or(0);
        if len == 0 || start_idx > end_idx || start_idx >= len {
            return Self::default();
        }
        let end = end_idx.min(len - 1);

        let first_valid = (start_idx..=end).find(|&i| series.iter().all(|(_, s)| s[i].is_finite()));
        let Some(beg_index) = first_valid else {
            return Self::default();
        };

        let result = series
            .into_iter()
            .map(|(name, values)| (name.to_string(), values[beg_index..=end].to_vec()))
            .collect();

        Self {
            beg_index,
            nb_element: end - beg_index + 1,
            result,
        }
    }

    /// Latest point of the named output.
    ///
    /// `None` when the library produced no points or the output is absent.
    #[must_use]
    pub fn latest(&self, name: &str) -> Option<f64> {
        if self.nb_element == 0 {
            return None;
        }
        self.result
            .get(name)
            .and_then(|values| values.get(self.nb_element - 1))
            .copied()
            .filter(|v| v.is_finite())
    }
}

/// Technical-analysis computation library.
pub trait TaLibrary: Send + Sync {
    /// Runs one function over the request's input range.
    ///
    /// # Errors
    /// Returns [`IndicatorError`] when the request is malformed or the
    /// computation fails.
    fn calculate(&self, request: &TaRequest) -> Result<TaOutput, IndicatorError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_output_trims_warmup() {
        let series = vec![f64::NAN, f64::NAN, 2.0, 3.0, 4.0];
        let output = TaOutput::from_series(0, 4, vec![(OUT_REAL, series)]);

        assert_eq!(output.beg_index, 2);
        assert_eq!(output.nb_element, 3);
        assert_relative_eq!(output.latest(OUT_REAL).unwrap(), 4.0);
    }

    #[test]
    fn test_output_respects_end_idx() {
        let series = vec![1.0, 2.0, 3.0, 4.0];
        let output = TaOutput::from_series(1, 2, vec![(OUT_REAL, series)]);

        assert_eq!(output.beg_index, 1);
        assert_eq!(output.nb_element, 2);
        assert_relative_eq!(output.latest(OUT_REAL).unwrap(), 3.0);
    }

    #[test]
    fn test_latest_without_points() {
        let output = TaOutput::from_series(0, 2, vec![(OUT_REAL, vec![f64::NAN; 3])]);
        assert_eq!(output.nb_element, 0);
        assert!(output.latest(OUT_REAL).is_none());
    }

    #[test]
    fn test_latest_missing_output() {
        let output = TaOutput::from_series(0, 1, vec![(OUT_REAL, vec![1.0, 2.0])]);
        assert!(output.latest(OUT_MACD).is_none());
    }

    #[test]
    fn test_request_builders() {
        let request = TaRequest::new(TaFunction::Macd, vec![1.0; 40]).macd_periods(12, 26, 9);
        assert_eq!(request.end_idx, 39);
        assert_eq!(request.range_len(), 40);
        assert_eq!(request.opt_in_slow_period, Some(26));
        assert_eq!(request.name.to_string(), "MACD");

        let empty = TaRequest::new(TaFunction::Sma, Vec::new());
        assert_eq!(empty.range_len(), 0);
    }
}

//! Bundled numeric library backed by the in-crate kernels.

use crate::error::IndicatorError;
use crate::ta::atr::ATR;
use crate::ta::bbands::BBands;
use crate::ta::ema::EMA;
use crate::ta::macd::MACD;
use crate::ta::rsi::RSI;
use crate::ta::sma::SMA;
use crate::ta::{
    OUT_LOWER_BAND, OUT_MACD, OUT_MACD_HIST, OUT_MACD_SIGNAL, OUT_MIDDLE_BAND, OUT_REAL,
    OUT_UPPER_BAND, TaFunction, TaLibrary, TaOutput, TaRequest,
};

/// Deterministic in-process implementation of [`TaLibrary`].
#[derive(Debug, Clone, Copy, Default)]
pub struct NativeTaLibrary;

impl NativeTaLibrary {
    /// Creates the library.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

fn require_period(value: Option<usize>, field: &str, function: TaFunction) -> Result<usize, IndicatorError> {
    match value {
        Some(period) if period > 0 => Ok(period),
        Some(_) => Err(IndicatorError::invalid_params(format!(
            "{function} {field} must be > 0"
        ))),
        None => Err(IndicatorError::invalid_params(format!(
            "{function} requires {field}"
        ))),
    }
}

fn require_input<'a>(
    values: &'a [f64],
    field: &str,
    request: &TaRequest,
) -> Result<&'a [f64], IndicatorError> {
    if values.len() <= request.end_idx {
        return Err(IndicatorError::invalid_params(format!(
            "{} requires {field} covering end_idx {} (got {} points)",
            request.name,
            request.end_idx,
            values.len()
        )));
    }
    Ok(&values[..=request.end_idx])
}

fn require_finite(value: Option<f64>, field: &str, function: TaFunction) -> Result<f64, IndicatorError> {
    match value {
        Some(v) if v.is_finite() && v >= 0.0 => Ok(v),
        Some(v) => Err(IndicatorError::param_out_of_range(field, v, 0.0, f64::MAX)),
        None => Err(IndicatorError::invalid_params(format!(
            "{function} requires {field}"
        ))),
    }
}

impl TaLibrary for NativeTaLibrary {
    fn calculate(&self, request: &TaRequest) -> Result<TaOutput, IndicatorError> {
        if request.range_len() == 0 {
            return Err(IndicatorError::InsufficientData {
                required: 1,
                actual: 0,
            });
        }
        let close = require_input(&request.close, "close", request)?;
        let (start, end) = (request.start_idx, request.end_idx);

        let output = match request.name {
            TaFunction::Sma => {
                let period = require_period(request.opt_in_time_period, "opt_in_time_period", request.name)?;
                TaOutput::from_series(start, end, vec![(OUT_REAL, SMA::new(period).compute(close))])
            }
            TaFunction::Ema => {
                let period = require_period(request.opt_in_time_period, "opt_in_time_period", request.name)?;
                TaOutput::from_series(start, end, vec![(OUT_REAL, EMA::new(period).compute(close))])
            }
            TaFunction::Rsi => {
                let period = require_period(request.opt_in_time_period, "opt_in_time_period", request.name)?;
                TaOutput::from_series(start, end, vec![(OUT_REAL, RSI::new(period).compute(close))])
            }
            TaFunction::Atr => {
                let period = require_period(request.opt_in_time_period, "opt_in_time_period", request.name)?;
                let high = require_input(&request.high, "high", request)?;
                let low = require_input(&request.low, "low", request)?;
                let series = ATR::new(period).compute(high, low, close);
                TaOutput::from_series(start, end, vec![(OUT_REAL, series)])
            }
            TaFunction::Macd => {
                let fast = require_period(request.opt_in_fast_period, "opt_in_fast_period", request.name)?;
                let slow = require_period(request.opt_in_slow_period, "opt_in_slow_period", request.name)?;
                let signal = require_period(request.opt_in_signal_period, "opt_in_signal_period", request.name)?;
                if fast >= slow {
                    return Err(IndicatorError::invalid_params(format!(
                        "MACD fast period {fast} must be below slow period {slow}"
                    )));
                }
                let series = MACD::new(fast, slow, signal).compute(close);
                TaOutput::from_series(
                    start,
                    end,
                    vec![
                        (OUT_MACD, series.macd),
                        (OUT_MACD_SIGNAL, series.signal),
                        (OUT_MACD_HIST, series.hist),
                    ],
                )
            }
            TaFunction::Bbands => {
                let period = require_period(request.opt_in_time_period, "opt_in_time_period", request.name)?;
                let up = require_finite(request.opt_in_nb_dev_up, "opt_in_nb_dev_up", request.name)?;
                let down = require_finite(request.opt_in_nb_dev_dn, "opt_in_nb_dev_dn", request.name)?;
                let bands = BBands::new(period, up, down).compute(close);
                TaOutput::from_series(
                    start,
                    end,
                    vec![
                        (OUT_UPPER_BAND, bands.upper),
                        (OUT_MIDDLE_BAND, bands.middle),
                        (OUT_LOWER_BAND, bands.lower),
                    ],
                )
            }
        };

        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn closes() -> Vec<f64> {
        vec![1.0, 2.0, 3.0, 4.0, 5.0]
    }

    #[test]
    fn test_sma_request() {
        let request = TaRequest::new(TaFunction::Sma, closes()).time_period(3);
        let output = NativeTaLibrary::new().calculate(&request).unwrap();

        assert_eq!(output.beg_index, 2);
        assert_eq!(output.nb_element, 3);
        assert_eq!(output.result[OUT_REAL], vec![2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_missing_period_is_invalid() {
        let request = TaRequest::new(TaFunction::Ema, closes());
        let err = NativeTaLibrary::new().calculate(&request).unwrap_err();
        assert!(matches!(err, IndicatorError::InvalidParams(ref msg) if msg.contains("EMA")));
    }

    #[test]
    fn test_atr_requires_high_low() {
        let request = TaRequest::new(TaFunction::Atr, closes()).time_period(2);
        let err = NativeTaLibrary::new().calculate(&request).unwrap_err();
        assert!(matches!(err, IndicatorError::InvalidParams(_)));
    }

    #[test]
    fn test_empty_request_is_insufficient() {
        let request = TaRequest::new(TaFunction::Sma, Vec::new()).time_period(3);
        let err = NativeTaLibrary::new().calculate(&request).unwrap_err();
        assert!(matches!(err, IndicatorError::InsufficientData { .. }));
    }

    #[test]
    fn test_macd_outputs() {
        let values: Vec<f64> = (0..60).map(|i| 100.0 + f64::from(i).sin()).collect();
        let request = TaRequest::new(TaFunction::Macd, values).macd_periods(12, 26, 9);
        let output = NativeTaLibrary::new().calculate(&request).unwrap();

        assert_eq!(output.beg_index, 33);
        let macd = output.latest(OUT_MACD).unwrap();
        let signal = output.latest(OUT_MACD_SIGNAL).unwrap();
        let hist = output.latest(OUT_MACD_HIST).unwrap();
        assert_relative_eq!(hist, macd - signal, epsilon = 1e-12);
    }

    #[test]
    fn test_macd_rejects_inverted_periods() {
        let request = TaRequest::new(TaFunction::Macd, closes()).macd_periods(5, 3, 2);
        assert!(NativeTaLibrary::new().calculate(&request).is_err());
    }

    #[test]
    fn test_bbands_outputs() {
        let request = TaRequest::new(TaFunction::Bbands, closes())
            .time_period(3)
            .deviations(2.0, 2.0);
        let output = NativeTaLibrary::new().calculate(&request).unwrap();

        let middle = output.latest(OUT_MIDDLE_BAND).unwrap();
        let upper = output.latest(OUT_UPPER_BAND).unwrap();
        let lower = output.latest(OUT_LOWER_BAND).unwrap();
        assert_relative_eq!(middle, 4.0);
        assert_relative_eq!(upper - middle, middle - lower, epsilon = 1e-12);
    }

    #[test]
    fn test_bbands_negative_deviation_out_of_range() {
        let request = TaRequest::new(TaFunction::Bbands, closes())
            .time_period(3)
            .deviations(-1.0, 2.0);
        let err = NativeTaLibrary::new().calculate(&request).unwrap_err();
        assert!(matches!(err, IndicatorError::ParamOutOfRange { .. }));
    }
}

//! Indicator error types.

use sextant_types::CoreError;
use thiserror::Error;

/// Errors that can occur during indicator computation, configuration or
/// state persistence.
#[derive(Debug, Error)]
pub enum IndicatorError {
    /// Unknown indicator kind requested from registry or config
    #[error("unknown indicator: {0}")]
    UnknownIndicator(String),

    /// Invalid parameters for the indicator
    #[error("invalid parameters: {0}")]
    InvalidParams(String),

    /// Insufficient data for computation
    #[error("insufficient data: need {required} samples, got {actual}")]
    InsufficientData {
        /// Required number of samples.
        required: usize,
        /// Actual number of samples provided.
        actual: usize,
    },

    /// Computation error reported by the numeric library
    #[error("computation error: {0}")]
    ComputationError(String),

    /// Parameter out of valid range
    #[error("parameter out of range: {param} = {value} (valid: {min}..{max})")]
    ParamOutOfRange {
        /// Parameter name.
        param: String,
        /// Parameter value.
        value: f64,
        /// Minimum allowed value.
        min: f64,
        /// Maximum allowed value.
        max: f64,
    },

    /// Operation not allowed in the current state (e.g. merging into a
    /// finalized orderbook snapshot)
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// Rejected market data
    #[error("market data error: {0}")]
    Market(#[from] CoreError),

    /// State or config (de)serialization failed
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl IndicatorError {
    /// Creates an `InvalidParams` error with a message.
    #[must_use]
    pub fn invalid_params(msg: impl Into<String>) -> Self {
        IndicatorError::InvalidParams(msg.into())
    }

    /// Creates a `ComputationError` with a message.
    #[must_use]
    pub fn computation(msg: impl Into<String>) -> Self {
        IndicatorError::ComputationError(msg.into())
    }

    /// Creates an `InvalidState` error with a message.
    #[must_use]
    pub fn invalid_state(msg: impl Into<String>) -> Self {
        IndicatorError::InvalidState(msg.into())
    }

    /// Creates a `ParamOutOfRange` error.
    #[must_use]
    pub fn param_out_of_range(param: impl Into<String>, value: f64, min: f64, max: f64) -> Self {
        IndicatorError::ParamOutOfRange {
            param: param.into(),
            value,
            min,
            max,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = IndicatorError::InsufficientData {
            required: 14,
            actual: 3,
        };
        assert_eq!(err.to_string(), "insufficient data: need 14 samples, got 3");

        let err = IndicatorError::param_out_of_range("value_area_percent", 120.0, 0.0, 100.0);
        assert!(err.to_string().contains("value_area_percent = 120"));
    }

    #[test]
    fn test_error_from_core() {
        let err: IndicatorError = CoreError::InvalidTimeframe("X1".to_string()).into();
        assert!(matches!(err, IndicatorError::Market(_)));
    }
}

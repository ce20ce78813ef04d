use thiserror::Error;

/// Core error types for Sextant market data
#[derive(Debug, Error)]
pub enum CoreError {
    /// Candle violates OHLCV consistency
    #[error("Invalid candle: {0}")]
    InvalidCandle(String),

    /// Unknown timeframe string
    #[error("Invalid timeframe: {0}")]
    InvalidTimeframe(String),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

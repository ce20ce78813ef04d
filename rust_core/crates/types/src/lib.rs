//! Sextant Types
//!
//! Market data value types shared by the Sextant indicator engine.
//! Candles, raw trades and candle timeframes live here so that every
//! indicator reads the same immutable representation.

#![deny(clippy::all)]

pub mod candle;
pub mod error;
pub mod timeframe;
pub mod trade;

// Re-export main types for convenience
pub use candle::Candle;
pub use error::CoreError;
pub use timeframe::Timeframe;
pub use trade::{Trade, TradeSide};

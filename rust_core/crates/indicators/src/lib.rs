//! Sextant Indicators
//!
//! Incremental technical indicator engine for the Sextant trading bot.
//! Indicators consume one candle per interval, keep bounded rolling buffers
//! and cache their latest values.
//!
//! # Features
//! - Indicator lifecycle trait with latched readiness and JSON state persistence
//! - Volume profile with value area around the point of control
//! - Orderbook heatmap averaging per-minute depth samples per candle
//! - Swappable numeric library behind [`TaLibrary`], with a native default
//! - Registry keyed by [`IndicatorKind`] and a config-driven analysis state
//!
//! # Available Indicators
//! - SMA / EMA: Moving averages
//! - RSI: Relative Strength Index
//! - MACD: Moving Average Convergence/Divergence
//! - ATR: Average True Range
//! - Bollinger Bands: Upper, Middle, Lower bands
//! - Volume Profile: Point of control and value area
//! - Orderbook Heatmap: Depth by price bucket over time

#![deny(clippy::all)]

pub mod analysis;
pub mod buffer;
pub mod config;
pub mod error;
pub mod heatmap;
pub mod impl_;
pub mod plot;
pub mod registry;
pub mod ta;
pub mod traits;
pub mod volume_profile;

// Re-export main types
pub use analysis::{TechnicalAnalysisState, UpdateReport};
pub use buffer::{KEEP_OLD_DATA_FACTOR, RollingBuffer};
pub use config::AnalysisConfig;
pub use error::IndicatorError;
pub use heatmap::{
    DepthBook, HeatmapParams, OrderBookView, OrderbookFullSnapshot, OrderbookHeatmap,
    OrderbookSnapshot, SampleOutcome, SkipReason,
};
pub use plot::{DEFAULT_MARKS_PER_LABEL, PlotCollector, PlotMark};
pub use registry::IndicatorRegistry;
pub use ta::{NativeTaLibrary, TaFunction, TaLibrary, TaOutput, TaRequest};
pub use traits::{Indicator, IndicatorKind, IndicatorSpec, MarketSync, Readiness};
pub use volume_profile::{ValueArea, VolumeProfile, VolumeProfileBar, VolumeProfileParams};

// Re-export indicator implementations
pub use impl_::{
    PeriodParams,
    atr::Atr,
    bollinger::{Bands, BollingerBands, BollingerParams},
    macd::{Macd, MacdParams, MacdValue},
    moving_average::MovingAverage,
    rsi::Rsi,
};

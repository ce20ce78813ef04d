use crate::error::CoreError;
use crate::trade::{Trade, TradeSide};

/// OHLCV bar for one candle interval.
///
/// `timestamp_ns` is the **open time**. `up_volume` and `down_volume` split
/// `volume` by aggressor side; `trades` optionally embeds the raw trades the
/// candle was aggregated from (empty when the feed does not provide them).
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Candle {
    /// Unix epoch nanoseconds UTC (Open-Time)
    pub timestamp_ns: i64,
    /// Unix epoch nanoseconds UTC (Close-Time = open + duration - 1ns)
    pub close_time_ns: i64,
    /// Open price
    pub open: f64,
    /// High price
    pub high: f64,
    /// Low price
    pub low: f64,
    /// Close price
    pub close: f64,
    /// Volume
    pub volume: f64,
    /// Volume traded by buy-side aggressors
    #[serde(default)]
    pub up_volume: f64,
    /// Volume traded by sell-side aggressors
    #[serde(default)]
    pub down_volume: f64,
    /// Raw trades aggregated into this candle
    #[serde(default)]
    pub trades: Vec<Trade>,
}

impl Candle {
    /// Builds a candle from raw trades.
    ///
    /// Returns `None` when `trades` is empty. The trades are embedded into the
    /// candle and up/down volume is split by trade side.
    #[must_use]
    pub fn from_trades(timestamp_ns: i64, duration_ns: i64, trades: Vec<Trade>) -> Option<Self> {
        let first = trades.first()?;
        let last = trades.last()?;

        let mut candle = Self {
            timestamp_ns,
            close_time_ns: timestamp_ns + duration_ns - 1,
            open: first.price,
            high: f64::MIN,
            low: f64::MAX,
            close: last.price,
            volume: 0.0,
            up_volume: 0.0,
            down_volume: 0.0,
            trades: Vec::new(),
        };

        for trade in &trades {
            candle.high = candle.high.max(trade.price);
            candle.low = candle.low.min(trade.price);
            candle.volume += trade.amount;
            match trade.side {
                TradeSide::Buy => candle.up_volume += trade.amount,
                TradeSide::Sell => candle.down_volume += trade.amount,
            }
        }
        candle.trades = trades;

        Some(candle)
    }

    /// Returns true when raw trades are embedded.
    #[must_use]
    pub fn has_trades(&self) -> bool {
        !self.trades.is_empty()
    }

    /// Checks OHLCV consistency.
    ///
    /// # Errors
    /// Returns [`CoreError::InvalidCandle`] for non-finite prices, negative
    /// volume or a high below the low.
    pub fn validate(&self) -> Result<(), CoreError> {
        let prices = [self.open, self.high, self.low, self.close];
        if prices.iter().any(|p| !p.is_finite()) {
            return Err(CoreError::InvalidCandle(format!(
                "non-finite price at {}",
                self.timestamp_ns
            )));
        }
        if !self.volume.is_finite() || self.volume < 0.0 {
            return Err(CoreError::InvalidCandle(format!(
                "invalid volume {} at {}",
                self.volume, self.timestamp_ns
            )));
        }
        if self.high < self.low {
            return Err(CoreError::InvalidCandle(format!(
                "high {} below low {} at {}",
                self.high, self.low, self.timestamp_ns
            )));
        }
        Ok(())
    }
}

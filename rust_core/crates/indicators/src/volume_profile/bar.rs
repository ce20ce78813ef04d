//! Price buckets of a volume profile.

use serde::{Deserialize, Serialize};
use sextant_types::{Candle, Trade, TradeSide};

/// One equal-width price zone `[price_zone_low, price_zone_high)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VolumeProfileBar {
    /// Sequential id, 1 for the lowest zone
    pub id: usize,
    /// Inclusive lower edge
    pub price_zone_low: f64,
    /// Exclusive upper edge
    pub price_zone_high: f64,
    /// Total volume attributed to the zone
    pub volume: f64,
    /// Buy-side volume
    pub up_volume: f64,
    /// Sell-side volume
    pub down_volume: f64,
}

impl VolumeProfileBar {
    /// Creates an empty bar.
    #[must_use]
    pub fn new(id: usize, price_zone_low: f64, price_zone_high: f64) -> Self {
        Self {
            id,
            price_zone_low,
            price_zone_high,
            volume: 0.0,
            up_volume: 0.0,
            down_volume: 0.0,
        }
    }

    /// Half-open membership test.
    #[inline]
    #[must_use]
    pub fn contains(&self, price: f64) -> bool {
        price >= self.price_zone_low && price < self.price_zone_high
    }

    /// Midpoint of the zone.
    #[must_use]
    pub fn mid_price(&self) -> f64 {
        (self.price_zone_low + self.price_zone_high) / 2.0
    }

    fn add_candle(&mut self, candle: &Candle) {
        self.volume += candle.volume;
        self.up_volume += candle.up_volume;
        self.down_volume += candle.down_volume;
    }

    fn add_trade(&mut self, trade: &Trade) {
        self.volume += trade.amount;
        match trade.side {
            TradeSide::Buy => self.up_volume += trade.amount,
            TradeSide::Sell => self.down_volume += trade.amount,
        }
    }
}

/// Builds `rows` contiguous zones starting at `min_price`.
///
/// Edges are walked by repeated addition, so each bar's low equals the
/// previous bar's high exactly. The top edge may differ from
/// `min_price + rows * price_zone` by accumulated rounding.
#[must_use]
pub fn build_bars(min_price: f64, price_zone: f64, rows: usize) -> Vec<VolumeProfileBar> {
    let mut bars = Vec::with_capacity(rows);
    let mut low = min_price;
    for id in 1..=rows {
        let high = low + price_zone;
        bars.push(VolumeProfileBar::new(id, low, high));
        low = high;
    }
    bars
}

/// Index of the bar containing `price` in an ascending, contiguous bar list.
#[must_use]
pub fn bar_index(bars: &[VolumeProfileBar], price: f64) -> Option<usize> {
    let idx = bars.partition_point(|bar| bar.price_zone_high <= price);
    bars.get(idx)
        .filter(|bar| bar.contains(price))
        .map(|_| idx)
}

/// Attributes candle volume to the bar holding each close.
///
/// With `use_trades`, candles carrying embedded trades are attributed per
/// trade price instead. Prices outside every bar are dropped.
pub fn attribute<'a>(
    bars: &mut [VolumeProfileBar],
    candles: impl IntoIterator<Item = &'a Candle>,
    use_trades: bool,
) {
    for candle in candles {
        if use_trades && candle.has_trades() {
            for trade in &candle.trades {
                if let Some(idx) = bar_index(bars, trade.price) {
                    bars[idx].add_trade(trade);
                }
            }
        } else if let Some(idx) = bar_index(bars, candle.close) {
            bars[idx].add_candle(candle);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn make_candle(close: f64, volume: f64) -> Candle {
        Candle {
            timestamp_ns: 0,
            close_time_ns: 60_000_000_000 - 1,
            open: close,
            high: close,
            low: close,
            close,
            volume,
            up_volume: volume * 0.75,
            down_volume: volume * 0.25,
            trades: Vec::new(),
        }
    }

    #[test]
    fn test_build_bars_contiguous() {
        let bars = build_bars(10.0, 0.1, 7);
        assert_eq!(bars.len(), 7);
        assert_eq!(bars[0].id, 1);
        assert_eq!(bars[6].id, 7);
        for pair in bars.windows(2) {
            assert_eq!(pair[0].price_zone_high.to_bits(), pair[1].price_zone_low.to_bits());
        }
    }

    #[test]
    fn test_boundary_belongs_to_upper_bar() {
        let bars = build_bars(10.0, 5.0, 2);
        assert_eq!(bar_index(&bars, 10.0), Some(0));
        assert_eq!(bar_index(&bars, 14.999), Some(0));
        assert_eq!(bar_index(&bars, 15.0), Some(1));
        assert_eq!(bar_index(&bars, 20.0), None);
        assert_eq!(bar_index(&bars, 9.999), None);
    }

    #[test]
    fn test_attribute_candles() {
        let mut bars = build_bars(10.0, 5.0, 2);
        let candles = [
            make_candle(10.0, 100.0),
            make_candle(12.0, 100.0),
            make_candle(18.0, 100.0),
            make_candle(20.0, 100.0),
        ];
        attribute(&mut bars, &candles, false);

        assert_relative_eq!(bars[0].volume, 200.0);
        assert_relative_eq!(bars[0].up_volume, 150.0);
        assert_relative_eq!(bars[0].down_volume, 50.0);
        assert_relative_eq!(bars[1].volume, 100.0);
    }

    #[test]
    fn test_attribute_trades() {
        let mut bars = build_bars(10.0, 5.0, 2);
        let mut candle = make_candle(12.0, 3.0);
        candle.trades = vec![
            Trade::new(1, 11.0, 1.0, TradeSide::Buy),
            Trade::new(2, 16.0, 2.0, TradeSide::Sell),
        ];

        attribute(&mut bars, std::slice::from_ref(&candle), true);
        assert_relative_eq!(bars[0].volume, 1.0);
        assert_relative_eq!(bars[0].up_volume, 1.0);
        assert_relative_eq!(bars[1].volume, 2.0);
        assert_relative_eq!(bars[1].down_volume, 2.0);

        let mut bars = build_bars(10.0, 5.0, 2);
        attribute(&mut bars, std::slice::from_ref(&candle), false);
        assert_relative_eq!(bars[0].volume, 3.0);
        assert_relative_eq!(bars[1].volume, 0.0);
    }

    #[test]
    fn test_mid_price() {
        let bar = VolumeProfileBar::new(1, 10.0, 15.0);
        assert_relative_eq!(bar.mid_price(), 12.5);
    }
}

//! Read-only order book boundary.

use ordered_float::OrderedFloat;
use std::collections::BTreeMap;
use std::ops::Bound;

type Price = OrderedFloat<f64>;
type Quantity = f64;

/// Depth queries the heatmap needs from a live order book.
///
/// Ranges are `[low, high)`; `None` leaves that side unbounded.
pub trait OrderBookView {
    /// Cumulative ask amount in the range.
    fn ask_amount(&self, low: Option<f64>, high: Option<f64>) -> f64;

    /// Cumulative bid amount in the range.
    fn bid_amount(&self, low: Option<f64>, high: Option<f64>) -> f64;
}

/// In-memory price-level book.
#[derive(Debug, Clone, Default)]
pub struct DepthBook {
    asks: BTreeMap<Price, Quantity>,
    bids: BTreeMap<Price, Quantity>,
}

impl DepthBook {
    /// Creates an empty book.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the ask amount at a level; a non-positive amount removes it.
    pub fn set_ask(&mut self, price: f64, amount: f64) {
        Self::set_level(&mut self.asks, price, amount);
    }

    /// Sets the bid amount at a level; a non-positive amount removes it.
    pub fn set_bid(&mut self, price: f64, amount: f64) {
        Self::set_level(&mut self.bids, price, amount);
    }

    fn set_level(side: &mut BTreeMap<Price, Quantity>, price: f64, amount: f64) {
        if !price.is_finite() {
            return;
        }
        if amount > 0.0 {
            side.insert(OrderedFloat(price), amount);
        } else {
            side.remove(&OrderedFloat(price));
        }
    }

    /// Lowest ask price.
    #[must_use]
    pub fn best_ask(&self) -> Option<f64> {
        self.asks.keys().next().map(|p| p.0)
    }

    /// Highest bid price.
    #[must_use]
    pub fn best_bid(&self) -> Option<f64> {
        self.bids.keys().next_back().map(|p| p.0)
    }

    /// Midpoint of the best bid and ask.
    #[must_use]
    pub fn mid_price(&self) -> Option<f64> {
        Some((self.best_bid()? + self.best_ask()?) / 2.0)
    }

    /// Removes every level.
    pub fn clear(&mut self) {
        self.asks.clear();
        self.bids.clear();
    }

    fn range_amount(side: &BTreeMap<Price, Quantity>, low: Option<f64>, high: Option<f64>) -> f64 {
        if let (Some(low), Some(high)) = (low, high)
            && low >= high
        {
            return 0.0;
        }
        let start = low.map_or(Bound::Unbounded, |p| Bound::Included(OrderedFloat(p)));
        let end = high.map_or(Bound::Unbounded, |p| Bound::Excluded(OrderedFloat(p)));
        side.range((start, end)).map(|(_, amount)| amount).sum()
    }
}

impl OrderBookView for DepthBook {
    fn ask_amount(&self, low: Option<f64>, high: Option<f64>) -> f64 {
        Self::range_amount(&self.asks, low, high)
    }

    fn bid_amount(&self, low: Option<f64>, high: Option<f64>) -> f64 {
        Self::range_amount(&self.bids, low, high)
    }
}

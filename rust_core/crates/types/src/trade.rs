/// Aggressor side of a market trade
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TradeSide {
    /// Buyer lifted the ask
    Buy,
    /// Seller hit the bid
    Sell,
}

/// Raw market trade
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Trade {
    /// Execution timestamp in nanoseconds
    pub timestamp_ns: i64,
    /// Execution price
    pub price: f64,
    /// Traded amount (base currency)
    pub amount: f64,
    /// Aggressor side
    pub side: TradeSide,
}

impl Trade {
    /// Creates a new trade.
    #[must_use]
    pub fn new(timestamp_ns: i64, price: f64, amount: f64, side: TradeSide) -> Self {
        Self {
            timestamp_ns,
            price,
            amount,
            side,
        }
    }
}

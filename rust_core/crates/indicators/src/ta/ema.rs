//! Exponential Moving Average kernel

/// Exponential Moving Average
///
/// Seeded with the first finite value, multiplier = 2 / (period + 1).
/// Non-finite inputs repeat the previous value, so a NaN-prefixed series
/// (e.g. a MACD line) starts at its first finite point.
#[derive(Debug, Clone)]
pub struct EMA {
    /// Number of periods for the EMA
    pub period: usize,
}

impl EMA {
    /// Creates a new EMA kernel with the given period.
    #[must_use]
    pub fn new(period: usize) -> Self {
        Self { period }
    }

    /// Smoothing factor.
    fn multiplier(&self) -> f64 {
        2.0 / (self.period as f64 + 1.0)
    }

    /// Computes the EMA series.
    #[must_use]
    pub fn compute(&self, values: &[f64]) -> Vec<f64> {
        let len = values.len();
        let mut result = vec![f64::NAN; len];

        if self.period == 0 || len == 0 {
            return result;
        }

        let alpha = self.multiplier();
        let mut prev = f64::NAN;

        for (i, &value) in values.iter().enumerate() {
            if !value.is_finite() {
                if prev.is_finite() {
                    result[i] = prev;
                }
                continue;
            }

            if prev.is_finite() {
                prev = alpha * value + (1.0 - alpha) * prev;
            } else {
                prev = value;
            }
            result[i] = prev;
        }

        result
    }
}

//! Simple Moving Average kernel

/// Simple Moving Average
///
/// Arithmetic mean of the last N values.
#[derive(Debug, Clone)]
pub struct SMA {
    /// Number of periods for the moving average
    pub period: usize,
}

impl SMA {
    /// Creates a new SMA kernel with the given period.
    #[must_use]
    pub fn new(period: usize) -> Self {
        Self { period }
    }

    /// Computes the SMA series. Values before the first full window are NaN.
    #[must_use]
    pub fn compute(&self, values: &[f64]) -> Vec<f64> {
        let len = values.len();
        let mut result = vec![f64::NAN; len];

        if len < self.period || self.period == 0 {
            return result;
        }

        let period = self.period as f64;
        let mut sum: f64 = values[..self.period].iter().sum();
        result[self.period - 1] = sum / period;

        for i in self.period..len {
            sum += values[i] - values[i - self.period];
            result[i] = sum / period;
        }

        result
    }
}

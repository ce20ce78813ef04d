//! Relative Strength Index kernel (Wilder smoothing)

/// Relative Strength Index
///
/// The first average gain/loss is the plain mean of the first `period`
/// changes; later ones use Wilder smoothing. Output lies in `[0, 100]`.
#[derive(Debug, Clone)]
pub struct RSI {
    /// Number of periods
    pub period: usize,
}

impl RSI {
    /// Creates a new RSI kernel with the given period.
    #[must_use]
    pub fn new(period: usize) -> Self {
        Self { period }
    }

    fn value(avg_gain: f64, avg_loss: f64) -> f64 {
        if avg_loss == 0.0 {
            if avg_gain == 0.0 { 50.0 } else { 100.0 }
        } else {
            100.0 - 100.0 / (1.0 + avg_gain / avg_loss)
        }
    }

    /// Computes the RSI series. The first `period` values are NaN.
    #[must_use]
    pub fn compute(&self, values: &[f64]) -> Vec<f64> {
        let len = values.len();
        let mut result = vec![f64::NAN; len];

        if self.period == 0 || len <= self.period {
            return result;
        }

        let period = self.period as f64;
        let mut avg_gain = 0.0;
        let mut avg_loss = 0.0;
        for i in 1..=self.period {
            let change = values[i] - values[i - 1];
            if change > 0.0 {
                avg_gain += change;
            } else {
                avg_loss -= change;
            }
        }
        avg_gain /= period;
        avg_loss /= period;
        result[self.period] = Self::value(avg_gain, avg_loss);

        for i in (self.period + 1)..len {
            let change = values[i] - values[i - 1];
            let (gain, loss) = if change > 0.0 {
                (change, 0.0)
            } else {
                (0.0, -change)
            };
            avg_gain = (avg_gain * (period - 1.0) + gain) / period;
            avg_loss = (avg_loss * (period - 1.0) + loss) / period;
            result[i] = Self::value(avg_gain, avg_loss);
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rsi_only_gains() {
        let values: Vec<f64> = (0..20).map(f64::from).collect();
        let result = RSI::new(14).compute(&values);

        assert!(result[13].is_nan());
        assert!((result[14] - 100.0).abs() < 1e-10);
        assert!((result[19] - 100.0).abs() < 1e-10);
    }

    #[test]
    fn test_rsi_balanced_changes() {
        // +1, -1 alternating: equal average gain and loss
        let values = vec![10.0, 11.0, 10.0, 11.0, 10.0];
        let result = RSI::new(4).compute(&values);

        assert!((result[4] - 50.0).abs() < 1e-10);
    }

    #[test]
    fn test_rsi_flat_series() {
        let result = RSI::new(3).compute(&[5.0; 6]);
        assert!((result[5] - 50.0).abs() < 1e-10);
    }

    #[test]
    fn test_rsi_insufficient_data() {
        let result = RSI::new(14).compute(&[1.0; 14]);
        assert!(result.iter().all(|v| v.is_nan()));
    }
}

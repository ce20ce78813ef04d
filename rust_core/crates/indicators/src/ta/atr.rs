//! Average True Range kernel with Wilder smoothing

/// Average True Range (Wilder)
///
/// ATR = (prev_ATR * (n-1) + TR) / n, seeded with the mean of the first n
/// true ranges.
#[derive(Debug, Clone)]
pub struct ATR {
    /// Number of periods for ATR calculation
    pub period: usize,
}

impl ATR {
    /// Creates a new ATR kernel with the given period.
    #[must_use]
    pub fn new(period: usize) -> Self {
        Self { period }
    }

    /// TR = max(High - Low, |High - Prev_Close|, |Low - Prev_Close|)
    #[inline]
    fn true_range(high: f64, low: f64, prev_close: f64) -> f64 {
        let hl = high - low;
        let hc = (high - prev_close).abs();
        let lc = (low - prev_close).abs();
        hl.max(hc).max(lc)
    }

    /// Computes the ATR series over aligned high/low/close slices.
    #[must_use]
    pub fn compute(&self, high: &[f64], low: &[f64], close: &[f64]) -> Vec<f64> {
        let len = high.len().min(low.len()).min(close.len());
        let mut result = vec![f64::NAN; len];

        if self.period == 0 || len < self.period {
            return result;
        }

        let mut tr = vec![0.0; len];
        tr[0] = high[0] - low[0];
        for i in 1..len {
            tr[i] = Self::true_range(high[i], low[i], close[i - 1]);
        }

        let first_valid = tr.iter().position(|v| v.is_finite());
        let Some(first_valid) = first_valid else {
            return result;
        };

        if first_valid + self.period <= len
            && tr[first_valid..first_valid + self.period]
                .iter()
                .all(|v| v.is_finite())
        {
            let period = self.period as f64;
            let initial: f64 =
                tr[first_valid..first_valid + self.period].iter().sum::<f64>() / period;
            let start_idx = first_valid + self.period - 1;
            result[start_idx] = initial;

            for i in (start_idx + 1)..len {
                if !tr[i].is_finite() {
                    result[i] = result[i - 1];
                    continue;
                }
                result[i] = (result[i - 1] * (period - 1.0) + tr[i]) / period;
            }
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_true_range() {
        assert!((ATR::true_range(105.0, 95.0, 100.0) - 10.0).abs() < 1e-10);
        // Gap up
        assert!((ATR::true_range(115.0, 108.0, 100.0) - 15.0).abs() < 1e-10);
        // Gap down
        assert!((ATR::true_range(92.0, 85.0, 100.0) - 15.0).abs() < 1e-10);
    }

    #[test]
    fn test_atr_basic() {
        let high = [102.0, 104.0, 106.0, 108.0, 110.0];
        let low = [98.0, 99.0, 101.0, 103.0, 105.0];
        let close = [101.0, 103.0, 105.0, 107.0, 109.0];

        let result = ATR::new(3).compute(&high, &low, &close);

        assert!(result[0].is_nan());
        assert!(result[1].is_nan());
        // (4 + 5 + 5) / 3
        assert!((result[2] - 4.666_666_666_7).abs() < 1e-8);
        // (4.666.. * 2 + 5) / 3
        assert!((result[3] - 4.777_777_777_8).abs() < 1e-8);
    }

    #[test]
    fn test_atr_insufficient_data() {
        let result = ATR::new(5).compute(&[102.0, 104.0], &[98.0, 99.0], &[101.0, 103.0]);
        assert!(result.iter().all(|v| v.is_nan()));
    }
}

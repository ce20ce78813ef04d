//! Bollinger Bands kernel

/// Bollinger band series.
#[derive(Debug, Clone)]
pub struct BandSeries {
    /// Upper band = SMA + dev_up * std
    pub upper: Vec<f64>,
    /// Middle band = SMA
    pub middle: Vec<f64>,
    /// Lower band = SMA - dev_down * std
    pub lower: Vec<f64>,
}

/// Bollinger Bands
///
/// Uses the population standard deviation (n, not n-1).
#[derive(Debug, Clone)]
pub struct BBands {
    /// Period for the SMA and standard deviation
    pub period: usize,
    /// Upper deviation multiplier
    pub dev_up: f64,
    /// Lower deviation multiplier
    pub dev_down: f64,
}

impl BBands {
    /// Creates new Bollinger Bands with the given parameters.
    #[must_use]
    pub fn new(period: usize, dev_up: f64, dev_down: f64) -> Self {
        Self {
            period,
            dev_up,
            dev_down,
        }
    }

    /// Computes the three bands.
    #[must_use]
    pub fn compute(&self, values: &[f64]) -> BandSeries {
        let len = values.len();
        let mut upper = vec![f64::NAN; len];
        let mut middle = vec![f64::NAN; len];
        let mut lower = vec![f64::NAN; len];

        if len < self.period || self.period == 0 {
            return BandSeries {
                upper,
                middle,
                lower,
            };
        }

        let period = self.period as f64;
        for i in (self.period - 1)..len {
            let window = &values[i + 1 - self.period..=i];
            let sma = window.iter().sum::<f64>() / period;
            let variance = window.iter().map(|x| (x - sma).powi(2)).sum::<f64>() / period;
            let std = variance.sqrt();

            middle[i] = sma;
            upper[i] = sma + self.dev_up * std;
            lower[i] = sma - self.dev_down * std;
        }

        BandSeries {
            upper,
            middle,
            lower,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bbands_basic() {
        let result = BBands::new(3, 2.0, 2.0).compute(&[1.0, 2.0, 3.0, 4.0, 5.0]);

        assert!(result.middle[1].is_nan());

        // window [1, 2, 3]: sma 2, std sqrt(2/3)
        let expected_std = (2.0_f64 / 3.0).sqrt();
        assert!((result.middle[2] - 2.0).abs() < 1e-10);
        assert!((result.upper[2] - (2.0 + 2.0 * expected_std)).abs() < 1e-10);
        assert!((result.lower[2] - (2.0 - 2.0 * expected_std)).abs() < 1e-10);
    }

    #[test]
    fn test_bbands_asymmetric_deviations() {
        let result = BBands::new(3, 1.0, 3.0).compute(&[1.0, 2.0, 3.0]);
        let std = (2.0_f64 / 3.0).sqrt();

        assert!((result.upper[2] - (2.0 + std)).abs() < 1e-10);
        assert!((result.lower[2] - (2.0 - 3.0 * std)).abs() < 1e-10);
    }

    #[test]
    fn test_bbands_constant_input() {
        let result = BBands::new(5, 2.0, 2.0).compute(&[100.0; 10]);
        for i in 4..10 {
            assert!((result.upper[i] - 100.0).abs() < 1e-10);
            assert!((result.lower[i] - 100.0).abs() < 1e-10);
        }
    }
}

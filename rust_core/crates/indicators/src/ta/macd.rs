//! MACD kernel

use crate::ta::ema::EMA;

/// MACD series (line, signal, histogram).
#[derive(Debug, Clone)]
pub struct MacdSeries {
    /// Fast EMA - slow EMA
    pub macd: Vec<f64>,
    /// EMA of the MACD line
    pub signal: Vec<f64>,
    /// MACD - signal
    pub hist: Vec<f64>,
}

/// Moving Average Convergence/Divergence
///
/// The MACD line is NaN until the slow EMA has seen `slow_period` values and
/// the signal line until its own EMA has seen `signal_period` MACD points.
#[derive(Debug, Clone)]
pub struct MACD {
    /// Fast EMA period
    pub fast_period: usize,
    /// Slow EMA period
    pub slow_period: usize,
    /// Signal EMA period
    pub signal_period: usize,
}

impl MACD {
    /// Creates a new MACD kernel.
    #[must_use]
    pub fn new(fast_period: usize, slow_period: usize, signal_period: usize) -> Self {
        Self {
            fast_period,
            slow_period,
            signal_period,
        }
    }

    /// Number of inputs before the first complete output point.
    #[must_use]
    pub fn lookback(&self) -> usize {
        self.slow_period.max(self.fast_period) + self.signal_period.saturating_sub(2)
    }

    /// Computes all three series.
    #[must_use]
    pub fn compute(&self, values: &[f64]) -> MacdSeries {
        let len = values.len();
        let nan = || vec![f64::NAN; len];
        if self.fast_period == 0 || self.slow_period == 0 || self.signal_period == 0 {
            return MacdSeries {
                macd: nan(),
                signal: nan(),
                hist: nan(),
            };
        }

        let fast = EMA::new(self.fast_period).compute(values);
        let slow = EMA::new(self.slow_period).compute(values);
        let line_start = self.slow_period.max(self.fast_period) - 1;

        let mut macd = nan();
        for i in line_start..len {
            macd[i] = fast[i] - slow[i];
        }

        let mut signal = EMA::new(self.signal_period).compute(&macd);
        let signal_start = line_start + self.signal_period - 1;
        for value in signal.iter_mut().take(signal_start.min(len)) {
            *value = f64::NAN;
        }

        let hist = macd.iter().zip(&signal).map(|(m, s)| m - s).collect();

        MacdSeries { macd, signal, hist }
    }
}

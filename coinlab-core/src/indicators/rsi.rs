//! Relative Strength Index (RSI), Wilder's smoothing.
//!
//! Average gain/loss are seeded over the first `period` close-to-close
//! deltas, then smoothed with alpha = 1/period. First defined value at
//! index `period` (one delta needs two closes).

use super::Indicator;
use crate::domain::Bar;

#[derive(Debug, Clone)]
pub struct Rsi {
    period: usize,
    name: String,
}

impl Rsi {
    pub fn new(period: usize) -> Self {
        assert!(period >= 2, "RSI period must be >= 2");
        Self {
            period,
            name: format!("rsi_{period}"),
        }
    }
}

impl Indicator for Rsi {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        let n = bars.len();
        let mut result = vec![f64::NAN; n];
        if n <= self.period {
            return result;
        }

        let period = self.period as f64;
        let mut avg_gain = 0.0;
        let mut avg_loss = 0.0;
        for i in 1..=self.period {
            let delta = bars[i].close - bars[i - 1].close;
            if delta > 0.0 {
                avg_gain += delta;
            } else {
                avg_loss += -delta;
            }
        }
        avg_gain /= period;
        avg_loss /= period;
        result[self.period] = rsi_value(avg_gain, avg_loss);

        for i in (self.period + 1)..n {
            let delta = bars[i].close - bars[i - 1].close;
            let (gain, loss) = if delta > 0.0 { (delta, 0.0) } else { (0.0, -delta) };
            avg_gain = (avg_gain * (period - 1.0) + gain) / period;
            avg_loss = (avg_loss * (period - 1.0) + loss) / period;
            result[i] = rsi_value(avg_gain, avg_loss);
        }

        result
    }
}

/// RSI from smoothed averages, with the degenerate windows pinned:
/// flat → 50, all-gain → 100, all-loss → 0.
fn rsi_value(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_gain == 0.0 && avg_loss == 0.0 {
        return 50.0;
    }
    if avg_loss == 0.0 {
        return 100.0;
    }
    if avg_gain == 0.0 {
        return 0.0;
    }
    100.0 - 100.0 / (1.0 + avg_gain / avg_loss)
}

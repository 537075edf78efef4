//! Exponential Moving Average (EMA).
//!
//! Multiplier 2 / (period + 1), seeded with the SMA of the first `period`
//! closes. First defined value at index period - 1.

use super::Indicator;
use crate::domain::Bar;

#[derive(Debug, Clone)]
pub struct Ema {
    period: usize,
    name: String,
}

impl Ema {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "EMA period must be >= 1");
        Self {
            period,
            name: format!("ema_{period}"),
        }
    }
}

impl Indicator for Ema {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period - 1
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
        ema_of_series(&closes, self.period)
    }
}

/// EMA over an arbitrary series, preserving leading NaNs.
///
/// Seeded with the mean of the first `period` defined values; used by
/// composed indicators (MACD signal line) whose inputs carry a warmup
/// prefix. Returns all-NaN when fewer than `period` defined values exist.
pub(crate) fn ema_of_series(values: &[f64], period: usize) -> Vec<f64> {
    let n = values.len();
    let mut result = vec![f64::NAN; n];

    let first = match values.iter().position(|v| !v.is_nan()) {
        Some(i) => i,
        None => return result,
    };
    if n - first < period {
        return result;
    }

    let alpha = 2.0 / (period as f64 + 1.0);
    let seed_end = first + period;
    let seed: f64 = values[first..seed_end].iter().sum::<f64>() / period as f64;
    result[seed_end - 1] = seed;

    let mut ema = seed;
    for i in seed_end..n {
        ema = alpha * values[i] + (1.0 - alpha) * ema;
        result[i] = ema;
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, make_bars, DEFAULT_EPSILON};

    #[test]
    fn ema_3_seeds_with_sma() {
        let bars = make_bars(&[10.0, 11.0, 12.0, 13.0, 14.0]);
        let result = Ema::new(3).compute(&bars);

        assert!(result[0].is_nan());
        assert!(result[1].is_nan());
        // Seed = mean(10,11,12) = 11, alpha = 0.5
        assert_approx(result[2], 11.0, DEFAULT_EPSILON);
        // 0.5*13 + 0.5*11 = 12
        assert_approx(result[3], 12.0, DEFAULT_EPSILON);
        // 0.5*14 + 0.5*12 = 13
        assert_approx(result[4], 13.0, DEFAULT_EPSILON);
    }

    #[test]
    fn ema_1_is_close() {
        let bars = make_bars(&[100.0, 200.0, 300.0]);
        let result = Ema::new(1).compute(&bars);
        assert_approx(result[0], 100.0, DEFAULT_EPSILON);
        assert_approx(result[1], 200.0, DEFAULT_EPSILON);
        assert_approx(result[2], 300.0, DEFAULT_EPSILON);
    }

    #[test]
    fn ema_lookback() {
        assert_eq!(Ema::new(26).lookback(), 25);
    }

    #[test]
    fn ema_too_few_bars() {
        let bars = make_bars(&[10.0, 11.0]);
        let result = Ema::new(5).compute(&bars);
        assert!(result.iter().all(|v| v.is_nan()));
    }

    #[test]
    fn series_ema_skips_leading_nans() {
        let values = [f64::NAN, f64::NAN, 10.0, 11.0, 12.0, 13.0];
        let result = ema_of_series(&values, 2);

        for i in 0..3 {
            assert!(result[i].is_nan(), "expected NaN at index {i}");
        }
        // Seed = mean(10,11) = 10.5 at index 3, alpha = 2/3
        assert_approx(result[3], 10.5, DEFAULT_EPSILON);
        assert_approx(result[4], 11.5, DEFAULT_EPSILON);
        assert_approx(result[5], 12.5, DEFAULT_EPSILON);
    }

    #[test]
    fn series_ema_all_nan_input() {
        let values = [f64::NAN, f64::NAN];
        assert!(ema_of_series(&values, 2).iter().all(|v| v.is_nan()));
    }
}

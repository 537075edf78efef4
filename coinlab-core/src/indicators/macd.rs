//! MACD — Moving Average Convergence Divergence.
//!
//! Line = EMA(fast) − EMA(slow); signal = EMA of the line over
//! `signal` periods; histogram = line − signal. NaN warmup does the
//! alignment: the line is defined from index slow − 1, signal and
//! histogram from slow + signal − 2. Three selectors expose the series
//! as separate `Indicator`s over one shared computation path.

use super::ema::ema_of_series;
use super::Indicator;
use crate::domain::Bar;

fn line_series(closes: &[f64], fast: usize, slow: usize) -> Vec<f64> {
    let fast_ema = ema_of_series(closes, fast);
    let slow_ema = ema_of_series(closes, slow);
    fast_ema
        .iter()
        .zip(&slow_ema)
        .map(|(f, s)| f - s)
        .collect()
}

fn assert_line_params(fast: usize, slow: usize) {
    assert!(fast >= 1, "MACD fast period must be >= 1");
    assert!(fast < slow, "MACD fast period must be < slow period");
}

/// The MACD line itself: EMA(fast) − EMA(slow).
#[derive(Debug, Clone)]
pub struct MacdLine {
    fast: usize,
    slow: usize,
    name: String,
}

impl MacdLine {
    pub fn new(fast: usize, slow: usize) -> Self {
        assert_line_params(fast, slow);
        Self {
            fast,
            slow,
            name: format!("macd_{fast}_{slow}"),
        }
    }
}

impl Indicator for MacdLine {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.slow - 1
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
        line_series(&closes, self.fast, self.slow)
    }
}

/// Signal line: EMA of the MACD line over `signal` periods.
#[derive(Debug, Clone)]
pub struct MacdSignal {
    fast: usize,
    slow: usize,
    signal: usize,
    name: String,
}

impl MacdSignal {
    pub fn new(fast: usize, slow: usize, signal: usize) -> Self {
        assert_line_params(fast, slow);
        assert!(signal >= 1, "MACD signal period must be >= 1");
        Self {
            fast,
            slow,
            signal,
            name: format!("macd_signal_{fast}_{slow}_{signal}"),
        }
    }
}

impl Indicator for MacdSignal {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.slow + self.signal - 2
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
        let line = line_series(&closes, self.fast, self.slow);
        ema_of_series(&line, self.signal)
    }
}

/// Histogram: line − signal.
#[derive(Debug, Clone)]
pub struct MacdHistogram {
    fast: usize,
    slow: usize,
    signal: usize,
    name: String,
}

impl MacdHistogram {
    pub fn new(fast: usize, slow: usize, signal: usize) -> Self {
        assert_line_params(fast, slow);
        assert!(signal >= 1, "MACD signal period must be >= 1");
        Self {
            fast,
            slow,
            signal,
            name: format!("macd_hist_{fast}_{slow}_{signal}"),
        }
    }
}

impl Indicator for MacdHistogram {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.slow + self.signal - 2
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
        let line = line_series(&closes, self.fast, self.slow);
        let signal = ema_of_series(&line, self.signal);
        line.iter().zip(&signal).map(|(l, s)| l - s).collect()
    }
}

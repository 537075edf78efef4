//! MACD signal-line crossover strategy.
//!
//! BUY when the MACD line crosses above its signal line, SELL on the
//! downward cross. Strength scales with the histogram magnitude
//! relative to the current close, floored at 0.5.

use super::{crossed_above, crossed_below, Strategy};
use crate::domain::{Bar, Signal, Timeframe};
use crate::indicators::{IndicatorSet, IndicatorValues, MacdLine, MacdSignal};

/// Histogram-to-price ratio that saturates the strength scale; a 0.5%
/// divergence maps to full strength.
const HIST_SCALE: f64 = 200.0;

#[derive(Debug, Clone)]
pub struct MacdCross {
    fast_period: usize,
    slow_period: usize,
    signal_period: usize,
    timeframe: Timeframe,
    line_key: String,
    signal_key: String,
}

impl MacdCross {
    pub fn new(
        fast_period: usize,
        slow_period: usize,
        signal_period: usize,
        timeframe: Timeframe,
    ) -> Self {
        assert!(fast_period >= 1, "fast period must be >= 1");
        assert!(fast_period < slow_period, "fast period must be < slow period");
        assert!(signal_period >= 1, "signal period must be >= 1");
        Self {
            fast_period,
            slow_period,
            signal_period,
            timeframe,
            line_key: format!("macd_{fast_period}_{slow_period}"),
            signal_key: format!("macd_signal_{fast_period}_{slow_period}_{signal_period}"),
        }
    }
}

impl Strategy for MacdCross {
    fn name(&self) -> &str {
        "macd"
    }

    fn required_timeframes(&self) -> Vec<Timeframe> {
        vec![self.timeframe]
    }

    fn required_lookback(&self) -> usize {
        // Signal line defined from slow + signal - 2.
        self.slow_period + self.signal_period - 1
    }

    fn indicators(&self) -> IndicatorSet {
        let mut set = IndicatorSet::new();
        set.push(Box::new(MacdLine::new(self.fast_period, self.slow_period)));
        set.push(Box::new(MacdSignal::new(
            self.fast_period,
            self.slow_period,
            self.signal_period,
        )));
        set
    }

    fn evaluate(&self, bars: &[Bar], index: usize, values: &IndicatorValues) -> Signal {
        let Some(cur) = values
            .get(&self.line_key, index)
            .zip(values.get(&self.signal_key, index))
        else {
            return Signal::hold();
        };
        let prev = (index > 0)
            .then(|| {
                values
                    .get(&self.line_key, index - 1)
                    .zip(values.get(&self.signal_key, index - 1))
            })
            .flatten();

        let buy = crossed_above(cur, prev);
        let sell = crossed_below(cur, prev);
        if !buy && !sell {
            return Signal::hold();
        }

        let histogram = (cur.0 - cur.1).abs();
        let depth = (histogram / bars[index].close * HIST_SCALE).min(1.0);
        let strength = 0.5 + 0.5 * depth;
        if buy {
            Signal::buy(strength)
        } else {
            Signal::sell(strength)
        }
    }
}

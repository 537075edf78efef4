//! Moving-average crossover strategy.
//!
//! BUY when the fast EMA crosses above the slow EMA, SELL on the
//! downward cross, HOLD otherwise. Entries and exits are decisive, so
//! both signals carry full strength.

use super::{crossed_above, crossed_below, Strategy};
use crate::domain::{Bar, Signal, Timeframe};
use crate::indicators::{Ema, IndicatorSet, IndicatorValues};

#[derive(Debug, Clone)]
pub struct MaCross {
    fast_period: usize,
    slow_period: usize,
    timeframe: Timeframe,
    fast_key: String,
    slow_key: String,
}

impl MaCross {
    pub fn new(fast_period: usize, slow_period: usize, timeframe: Timeframe) -> Self {
        assert!(fast_period >= 1, "fast period must be >= 1");
        assert!(fast_period < slow_period, "fast period must be < slow period");
        Self {
            fast_period,
            slow_period,
            timeframe,
            fast_key: format!("ema_{fast_period}"),
            slow_key: format!("ema_{slow_period}"),
        }
    }
}

impl Strategy for MaCross {
    fn name(&self) -> &str {
        "ma_cross"
    }

    fn required_timeframes(&self) -> Vec<Timeframe> {
        vec![self.timeframe]
    }

    fn required_lookback(&self) -> usize {
        // Slow EMA defined from slow_period - 1; the cross test reads one
        // more bar of history.
        self.slow_period
    }

    fn indicators(&self) -> IndicatorSet {
        let mut set = IndicatorSet::new();
        set.push(Box::new(Ema::new(self.fast_period)));
        set.push(Box::new(Ema::new(self.slow_period)));
        set
    }

    fn evaluate(&self, _bars: &[Bar], index: usize, values: &IndicatorValues) -> Signal {
        let Some(cur) = values
            .get(&self.fast_key, index)
            .zip(values.get(&self.slow_key, index))
        else {
            return Signal::hold();
        };
        let prev = (index > 0)
            .then(|| {
                values
                    .get(&self.fast_key, index - 1)
                    .zip(values.get(&self.slow_key, index - 1))
            })
            .flatten();

        if crossed_above(cur, prev) {
            Signal::buy(1.0)
        } else if crossed_below(cur, prev) {
            Signal::sell(1.0)
        } else {
            Signal::hold()
        }
    }
}

//! RSI band-crossing strategy.
//!
//! BUY when RSI crosses down into the oversold band, SELL when it
//! crosses up into the overbought band. Only the crossing bar signals;
//! staying inside a band re-arms nothing, so an oscillating series
//! produces strictly alternating entries and exits.

use super::Strategy;
use crate::domain::{Bar, Signal, Timeframe};
use crate::indicators::{IndicatorSet, IndicatorValues, Rsi};

#[derive(Debug, Clone)]
pub struct RsiReversal {
    period: usize,
    oversold: f64,
    overbought: f64,
    timeframe: Timeframe,
    key: String,
}

impl RsiReversal {
    pub fn new(period: usize, oversold: f64, overbought: f64, timeframe: Timeframe) -> Self {
        assert!(period >= 2, "RSI period must be >= 2");
        assert!(
            0.0 < oversold && oversold < overbought && overbought < 100.0,
            "RSI bands must satisfy 0 < oversold < overbought < 100"
        );
        Self {
            period,
            oversold,
            overbought,
            timeframe,
            key: format!("rsi_{period}"),
        }
    }
}

impl Strategy for RsiReversal {
    fn name(&self) -> &str {
        "rsi"
    }

    fn required_timeframes(&self) -> Vec<Timeframe> {
        vec![self.timeframe]
    }

    fn required_lookback(&self) -> usize {
        // RSI defined from index `period`; the band-crossing test needs
        // the previous value defined as well.
        self.period + 2
    }

    fn indicators(&self) -> IndicatorSet {
        let mut set = IndicatorSet::new();
        set.push(Box::new(Rsi::new(self.period)));
        set
    }

    fn evaluate(&self, _bars: &[Bar], index: usize, values: &IndicatorValues) -> Signal {
        let Some(cur) = values.get(&self.key, index) else {
            return Signal::hold();
        };
        // Band entry is only observable with the prior reading defined.
        let Some(prev) = (index > 0).then(|| values.get(&self.key, index - 1)).flatten() else {
            return Signal::hold();
        };

        if cur < self.oversold && prev >= self.oversold {
            let depth = (self.oversold - cur) / self.oversold;
            Signal::buy(0.5 + 0.5 * depth)
        } else if cur > self.overbought && prev <= self.overbought {
            let depth = (cur - self.overbought) / (100.0 - self.overbought);
            Signal::sell(0.5 + 0.5 * depth)
        } else {
            Signal::hold()
        }
    }
}

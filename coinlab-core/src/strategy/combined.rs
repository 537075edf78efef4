//! Vote-based composite strategy.
//!
//! Aggregates the signals of several member strategies. A direction wins
//! when it collects at least `min_agree` votes and a strict majority over
//! the opposing direction; ties and thin votes resolve to HOLD. The
//! emitted strength is the mean strength of the winning votes.

use super::Strategy;
use crate::domain::{Action, Bar, Signal, Timeframe};
use crate::indicators::{IndicatorSet, IndicatorValues};

#[derive(Debug)]
pub struct Combined {
    members: Vec<Box<dyn Strategy>>,
    min_agree: usize,
}

impl Combined {
    pub fn new(members: Vec<Box<dyn Strategy>>, min_agree: usize) -> Self {
        assert!(members.len() >= 2, "combined strategy needs at least two members");
        assert!(
            min_agree >= 1 && min_agree <= members.len(),
            "min_agree must be between 1 and the member count"
        );
        Self { members, min_agree }
    }

    fn mean_strength(votes: &[f64]) -> f64 {
        votes.iter().sum::<f64>() / votes.len() as f64
    }
}

impl Strategy for Combined {
    fn name(&self) -> &str {
        "combined"
    }

    fn required_timeframes(&self) -> Vec<Timeframe> {
        let mut timeframes = Vec::new();
        for member in &self.members {
            for tf in member.required_timeframes() {
                if !timeframes.contains(&tf) {
                    timeframes.push(tf);
                }
            }
        }
        timeframes
    }

    fn required_lookback(&self) -> usize {
        self.members
            .iter()
            .map(|m| m.required_lookback())
            .max()
            .unwrap_or(0)
    }

    fn indicators(&self) -> IndicatorSet {
        let mut set = IndicatorSet::new();
        for member in &self.members {
            set.extend(member.indicators());
        }
        set
    }

    fn evaluate(&self, bars: &[Bar], index: usize, values: &IndicatorValues) -> Signal {
        let mut buys = Vec::new();
        let mut sells = Vec::new();
        for member in &self.members {
            let signal = member.evaluate(bars, index, values);
            match signal.action {
                Action::Buy => buys.push(signal.strength),
                Action::Sell => sells.push(signal.strength),
                Action::Hold => {}
            }
        }

        if buys.len() >= self.min_agree && buys.len() > sells.len() {
            Signal::buy(Self::mean_strength(&buys))
        } else if sells.len() >= self.min_agree && sells.len() > buys.len() {
            Signal::sell(Self::mean_strength(&sells))
        } else {
            Signal::hold()
        }
    }
}

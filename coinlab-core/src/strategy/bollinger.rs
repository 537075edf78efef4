//! Bollinger band mean-reversion strategy.
//!
//! BUY when the close touches or pierces the lower band, SELL at the
//! upper band. Strength scales with how deep the close sits beyond the
//! band relative to the band width.

use super::Strategy;
use crate::domain::{Bar, Signal, Timeframe};
use crate::indicators::{Bollinger, Indicator, IndicatorSet, IndicatorValues};

#[derive(Debug, Clone)]
pub struct BollingerReversion {
    period: usize,
    multiplier: f64,
    timeframe: Timeframe,
    upper_key: String,
    lower_key: String,
}

impl BollingerReversion {
    pub fn new(period: usize, multiplier: f64, timeframe: Timeframe) -> Self {
        assert!(period >= 2, "period must be >= 2");
        assert!(
            multiplier.is_finite() && multiplier > 0.0,
            "multiplier must be a positive finite number"
        );
        let upper_key = Bollinger::upper(period, multiplier).name().to_string();
        let lower_key = Bollinger::lower(period, multiplier).name().to_string();
        Self {
            period,
            multiplier,
            timeframe,
            upper_key,
            lower_key,
        }
    }

    /// Penetration beyond the band as a fraction of the band width,
    /// clamped to [0, 1]. Collapsed bands yield zero depth.
    fn depth(excursion: f64, width: f64) -> f64 {
        if width <= 0.0 {
            return 0.0;
        }
        (excursion / width).clamp(0.0, 1.0)
    }
}

impl Strategy for BollingerReversion {
    fn name(&self) -> &str {
        "bollinger_bands"
    }

    fn required_timeframes(&self) -> Vec<Timeframe> {
        vec![self.timeframe]
    }

    fn required_lookback(&self) -> usize {
        self.period
    }

    fn indicators(&self) -> IndicatorSet {
        let mut set = IndicatorSet::new();
        set.push(Box::new(Bollinger::upper(self.period, self.multiplier)));
        set.push(Box::new(Bollinger::lower(self.period, self.multiplier)));
        set
    }

    fn evaluate(&self, bars: &[Bar], index: usize, values: &IndicatorValues) -> Signal {
        let Some((upper, lower)) = values
            .get(&self.upper_key, index)
            .zip(values.get(&self.lower_key, index))
        else {
            return Signal::hold();
        };
        let close = bars[index].close;
        let width = upper - lower;

        if close <= lower {
            let depth = Self::depth(lower - close, width);
            Signal::buy(0.5 + 0.5 * depth)
        } else if close >= upper {
            let depth = Self::depth(close - upper, width);
            Signal::sell(0.5 + 0.5 * depth)
        } else {
            Signal::hold()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Action;
    use crate::indicators::make_bars;

    fn evaluate_all(strategy: &BollingerReversion, closes: &[f64]) -> Vec<Signal> {
        let bars = make_bars(closes);
        let values = strategy.indicators().compute(&bars);
        (0..bars.len())
            .map(|i| strategy.evaluate(&bars, i, &values))
            .collect()
    }

    #[test]
    fn buys_at_lower_band() {
        // Window [12, 11, 7]: mean 10, stddev sqrt(14/3), lower band with
        // k=1 is 10 - 2.16 = 7.84, so the close at 7 pierces it.
        let strategy = BollingerReversion::new(3, 1.0, Timeframe::H1);
        let signals = evaluate_all(&strategy, &[12.0, 11.0, 7.0]);

        assert_eq!(signals[2].action, Action::Buy);
        assert!(signals[2].strength > 0.5);
    }

    #[test]
    fn sells_at_upper_band() {
        let strategy = BollingerReversion::new(3, 1.0, Timeframe::H1);
        let signals = evaluate_all(&strategy, &[8.0, 9.0, 13.0]);

        assert_eq!(signals[2].action, Action::Sell);
        assert!(signals[2].strength > 0.5);
    }

    #[test]
    fn holds_inside_bands() {
        let strategy = BollingerReversion::new(3, 2.0, Timeframe::H1);
        let signals = evaluate_all(&strategy, &[10.0, 11.0, 10.5, 10.8]);

        for signal in &signals[2..] {
            assert_eq!(signal.action, Action::Hold);
        }
    }

    #[test]
    fn flat_series_signals_at_floor_strength() {
        // Zero variance collapses both bands onto the close; the touch
        // fires but the depth contribution is zero.
        let strategy = BollingerReversion::new(3, 2.0, Timeframe::H1);
        let signals = evaluate_all(&strategy, &[10.0, 10.0, 10.0, 10.0]);

        assert_eq!(signals[3].action, Action::Buy);
        assert_eq!(signals[3].strength, 0.5);
    }

    #[test]
    fn strength_exact_for_hand_computed_window() {
        // Window [12, 11, 7]: lower = 10 - sqrt(14/3), width = 2*sqrt(14/3).
        let strategy = BollingerReversion::new(3, 1.0, Timeframe::H1);
        let signals = evaluate_all(&strategy, &[12.0, 11.0, 7.0]);

        let sd = (14.0f64 / 3.0).sqrt();
        let depth = ((10.0 - sd) - 7.0) / (2.0 * sd);
        assert!((signals[2].strength - (0.5 + 0.5 * depth)).abs() < 1e-10);
    }

    #[test]
    fn holds_during_warmup() {
        let strategy = BollingerReversion::new(3, 2.0, Timeframe::H1);
        let signals = evaluate_all(&strategy, &[10.0, 20.0, 30.0]);

        assert_eq!(signals[0].action, Action::Hold);
        assert_eq!(signals[1].action, Action::Hold);
    }

    #[test]
    fn declares_inputs() {
        let strategy = BollingerReversion::new(20, 2.0, Timeframe::H1);
        assert_eq!(strategy.required_lookback(), 20);
        assert_eq!(strategy.required_timeframes(), vec![Timeframe::H1]);
        let set = strategy.indicators();
        assert!(set.contains("bollinger_upper_20_2"));
        assert!(set.contains("bollinger_lower_20_2"));
    }
}

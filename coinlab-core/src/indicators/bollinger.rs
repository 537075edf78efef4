//! Bollinger Bands.
//!
//! Middle band: SMA(period). Upper/lower: middle ± multiplier × population
//! standard deviation of closes over the same window. One struct serves all
//! three bands via a band selector. First defined value at index period - 1.

use super::Indicator;
use crate::domain::Bar;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BollingerBand {
    Upper,
    Middle,
    Lower,
}

#[derive(Debug, Clone)]
pub struct Bollinger {
    period: usize,
    multiplier: f64,
    band: BollingerBand,
    name: String,
}

impl Bollinger {
    pub fn new(period: usize, multiplier: f64, band: BollingerBand) -> Self {
        assert!(period >= 2, "Bollinger period must be >= 2");
        assert!(
            multiplier.is_finite() && multiplier > 0.0,
            "Bollinger multiplier must be positive"
        );
        let band_name = match band {
            BollingerBand::Upper => "upper",
            BollingerBand::Middle => "middle",
            BollingerBand::Lower => "lower",
        };
        Self {
            period,
            multiplier,
            band,
            name: format!("bollinger_{band_name}_{period}_{multiplier}"),
        }
    }

    pub fn upper(period: usize, multiplier: f64) -> Self {
        Self::new(period, multiplier, BollingerBand::Upper)
    }

    pub fn middle(period: usize, multiplier: f64) -> Self {
        Self::new(period, multiplier, BollingerBand::Middle)
    }

    pub fn lower(period: usize, multiplier: f64) -> Self {
        Self::new(period, multiplier, BollingerBand::Lower)
    }
}

impl Indicator for Bollinger {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period - 1
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        let n = bars.len();
        let mut result = vec![f64::NAN; n];
        if n < self.period {
            return result;
        }

        for i in (self.period - 1)..n {
            let window = &bars[(i + 1 - self.period)..=i];
            let mean = window.iter().map(|b| b.close).sum::<f64>() / self.period as f64;
            result[i] = match self.band {
                BollingerBand::Middle => mean,
                band => {
                    let variance = window
                        .iter()
                        .map(|b| (b.close - mean).powi(2))
                        .sum::<f64>()
                        / self.period as f64;
                    let sd = variance.sqrt();
                    if band == BollingerBand::Upper {
                        mean + self.multiplier * sd
                    } else {
                        mean - self.multiplier * sd
                    }
                }
            };
        }

        result
    }
}

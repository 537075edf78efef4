//! Indicator library: pure functions from bar history to numeric series.
//!
//! Indicators are precomputed once before the bar loop and queried by bar
//! index during it. Every output series is aligned 1:1 with the input;
//! indices before the lookback window is satisfied hold `f64::NAN`.
//!
//! # Look-ahead guard
//! No indicator value at bar t may depend on price data from bar t+1 or
//! later. Strategies read these series only through [`IndicatorValues::get`],
//! which reports warmup slots as `None`.

mod bollinger;
mod ema;
mod macd;
mod rsi;
mod sma;

pub use bollinger::{Bollinger, BollingerBand};
pub use ema::Ema;
pub use macd::{MacdHistogram, MacdLine, MacdSignal};
pub use rsi::Rsi;
pub use sma::Sma;

use crate::domain::Bar;
use std::collections::HashMap;

/// Trait for indicators.
///
/// Indicators take a full bar series and produce an output series of the
/// same length, `f64::NAN` during warmup. They are pure: no input mutation,
/// no state carried across `compute` calls. A series shorter than the
/// lookback window yields an all-NaN output, not an error.
pub trait Indicator: Send + Sync {
    /// Parameter-qualified name, unique within a set (e.g., "sma_20").
    fn name(&self) -> &str;

    /// Number of bars needed before the first defined output value.
    fn lookback(&self) -> usize;

    /// Compute the indicator for the entire bar series.
    fn compute(&self, bars: &[Bar]) -> Vec<f64>;
}

/// An ordered collection of indicators, computed together over one series.
///
/// Pushing two indicators with the same name keeps the first; strategies
/// composed of overlapping members share columns instead of recomputing.
#[derive(Default)]
pub struct IndicatorSet {
    indicators: Vec<Box<dyn Indicator>>,
}

impl IndicatorSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, indicator: Box<dyn Indicator>) {
        if !self.contains(indicator.name()) {
            self.indicators.push(indicator);
        }
    }

    pub fn extend(&mut self, other: IndicatorSet) {
        for indicator in other.indicators {
            self.push(indicator);
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.indicators.iter().any(|i| i.name() == name)
    }

    /// Largest lookback across members; 0 for an empty set.
    pub fn max_lookback(&self) -> usize {
        self.indicators.iter().map(|i| i.lookback()).max().unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.indicators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indicators.is_empty()
    }

    /// Compute every member over `bars` into one value container.
    pub fn compute(&self, bars: &[Bar]) -> IndicatorValues {
        let mut values = IndicatorValues::new();
        for indicator in &self.indicators {
            values.insert(indicator.name(), indicator.compute(bars));
        }
        values
    }
}

/// Container for precomputed indicator values, keyed by indicator name.
#[derive(Debug, Clone, Default)]
pub struct IndicatorValues {
    series: HashMap<String, Vec<f64>>,
}

impl IndicatorValues {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, values: Vec<f64>) {
        self.series.insert(name.into(), values);
    }

    /// Value at a bar index.
    ///
    /// Returns `None` for unknown names, out-of-range indices, and warmup
    /// slots, so callers never branch on NaN.
    pub fn get(&self, name: &str, bar_index: usize) -> Option<f64> {
        self.series
            .get(name)
            .and_then(|v| v.get(bar_index).copied())
            .filter(|v| !v.is_nan())
    }

    /// Full series for a named indicator, warmup NaNs included.
    pub fn get_series(&self, name: &str) -> Option<&[f64]> {
        self.series.get(name).map(|v| v.as_slice())
    }

    /// True when every stored series has a defined value at `index`.
    /// Vacuously true for an empty container.
    pub fn all_defined(&self, index: usize) -> bool {
        self.series
            .values()
            .all(|v| v.get(index).is_some_and(|x| !x.is_nan()))
    }

    /// Number of indicator series stored.
    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }
}

// ─── Test helpers ────────────────────────────────────────────────────

#[cfg(test)]
pub(crate) const DEFAULT_EPSILON: f64 = 1e-10;

/// Build a coherent bar series from close prices, hourly spacing.
#[cfg(test)]
pub(crate) fn make_bars(closes: &[f64]) -> Vec<Bar> {
    use chrono::{Duration, TimeZone, Utc};

    let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let open = if i == 0 { close } else { closes[i - 1] };
            Bar {
                timestamp: base + Duration::hours(i as i64),
                open,
                high: open.max(close) + 1.0,
                low: open.min(close) - 1.0,
                close,
                volume: 1_000.0,
            }
        })
        .collect()
}

#[cfg(test)]
pub(crate) fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "expected {expected}, got {actual}"
    );
}

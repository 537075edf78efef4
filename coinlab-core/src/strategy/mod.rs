//! Strategy contract and built-in strategies.
//!
//! A strategy consumes an indicator-annotated bar series and emits one
//! signal per bar. Evaluation is deterministic: same history and same
//! parameters give the same output, with no clocks, RNG, or external
//! state. New strategies implement the trait and extend `StrategySpec`;
//! the simulation loop never changes.

mod bollinger;
mod combined;
mod factory;
mod ma_cross;
mod macd;
mod rsi;

pub use bollinger::BollingerReversion;
pub use combined::Combined;
pub use factory::{build_strategy, StrategySpec};
pub use ma_cross::MaCross;
pub use macd::MacdCross;
pub use rsi::RsiReversal;

use crate::domain::{Bar, Signal, Timeframe};
use crate::indicators::{IndicatorSet, IndicatorValues};

/// Trait for trading strategies.
///
/// # Architecture invariant
/// Strategies never see portfolio state. `evaluate` receives only the
/// bar history and precomputed indicator values, so a signal cannot
/// depend on cash, open positions, or fill history.
pub trait Strategy: Send + Sync + std::fmt::Debug {
    /// Stable identifier used in reports and logs.
    fn name(&self) -> &str;

    /// Timeframes this strategy expects its bars to be sampled at.
    fn required_timeframes(&self) -> Vec<Timeframe>;

    /// Minimum history length before `evaluate` can emit a non-HOLD
    /// signal. The engine marks equity but skips evaluation below it.
    fn required_lookback(&self) -> usize;

    /// Indicator columns consumed by `evaluate`, computed once per run.
    fn indicators(&self) -> IndicatorSet;

    /// Decision for the bar at `index`, given history up to and
    /// including it. Implementations must not read past `index`.
    fn evaluate(&self, bars: &[Bar], index: usize, values: &IndicatorValues) -> Signal;
}

/// Upward line-relation cross: the pair sits strictly above now and did
/// not at the previous index. An undefined previous pair counts as "not
/// above", so the first defined comparison can fire; a series that
/// begins mid-trend produces its entry at the first observable bar.
pub(crate) fn crossed_above(cur: (f64, f64), prev: Option<(f64, f64)>) -> bool {
    let (fast, slow) = cur;
    fast > slow && !prev.is_some_and(|(f, s)| f > s)
}

/// Downward counterpart of [`crossed_above`].
pub(crate) fn crossed_below(cur: (f64, f64), prev: Option<(f64, f64)>) -> bool {
    let (fast, slow) = cur;
    fast < slow && !prev.is_some_and(|(f, s)| f < s)
}

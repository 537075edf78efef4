//! Bar-by-bar simulation loop.
//!
//! Indicator values are computed once up front; the loop then replays
//! the series in order, enforcing risk limits before each strategy
//! evaluation and force-liquidating whatever is still open at the last
//! processed bar so every run ends flat.

use std::sync::atomic::{AtomicBool, Ordering};

use super::{EngineConfig, EngineError, PortfolioTracker, RunState};
use crate::domain::{Action, Bar, CloseReason, EquityPoint, Portfolio, Timeframe, TradeRecord};
use crate::strategy::Strategy;

/// Everything a finished run produces.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub state: RunState,
    pub equity_curve: Vec<EquityPoint>,
    pub trades: Vec<TradeRecord>,
    pub portfolio: Portfolio,
    pub bars_processed: usize,
    pub buy_signals: usize,
    pub sell_signals: usize,
    /// Timestamp gaps plus undefined-indicator bars, both non-fatal.
    pub gap_warnings: usize,
    pub cancelled: bool,
}

/// Replays `bars` through `strategy` under `config`.
///
/// Per bar: cancellation check, chronology check, warmup skip, risk
/// limits, strategy evaluation, signal application, mark-to-market.
/// Cancellation is cooperative at bar granularity via `cancel`, checked
/// with relaxed ordering; a cancelled run liquidates at the last
/// processed bar and is returned as completed with `cancelled` set.
pub fn run_backtest(
    symbol: &str,
    timeframe: Timeframe,
    bars: &[Bar],
    strategy: &dyn Strategy,
    config: &EngineConfig,
    cancel: Option<&AtomicBool>,
) -> Result<RunOutcome, EngineError> {
    config.validate()?;
    if bars.is_empty() {
        return Err(EngineError::EmptySeries);
    }

    let values = strategy.indicators().compute(bars);
    let lookback = strategy.required_lookback();
    let max_gap = timeframe.duration();

    let mut tracker = PortfolioTracker::new(symbol, config.clone());
    let mut bars_processed = 0usize;
    let mut buy_signals = 0usize;
    let mut sell_signals = 0usize;
    let mut gap_warnings = 0usize;
    let mut cancelled = false;

    for (index, bar) in bars.iter().enumerate() {
        if cancel.is_some_and(|flag| flag.load(Ordering::Relaxed)) {
            cancelled = true;
            break;
        }

        if index > 0 {
            let previous = bars[index - 1].timestamp;
            if bar.timestamp <= previous {
                return Err(EngineError::NonChronological {
                    index,
                    timestamp: bar.timestamp,
                    previous,
                });
            }
            if bar.timestamp - previous > max_gap {
                gap_warnings += 1;
            }
        }
        bars_processed = index + 1;

        // Warmup: record equity only, no risk checks or evaluation.
        if index + 1 < lookback {
            tracker.mark_to_market(bar);
            continue;
        }

        tracker.enforce_risk_limits(bar, index);

        if !values.all_defined(index) {
            gap_warnings += 1;
        }
        let signal = strategy.evaluate(bars, index, &values);
        match signal.action {
            Action::Buy => buy_signals += 1,
            Action::Sell => sell_signals += 1,
            Action::Hold => {}
        }
        tracker.apply_signal(signal, bar, index);
        tracker.mark_to_market(bar);
    }

    // Close out flat at the last processed bar; re-marking replaces that
    // bar's equity point so the curve ends at the realized balance.
    if bars_processed > 0 {
        let index = bars_processed - 1;
        let last = &bars[index];
        tracker.liquidate_all(last, index, CloseReason::Liquidation);
        tracker.mark_to_market(last);
    }

    let (portfolio, trades, equity_curve) = tracker.into_parts();
    Ok(RunOutcome {
        state: RunState::Completed,
        equity_curve,
        trades,
        portfolio,
        bars_processed,
        buy_signals,
        sell_signals,
        gap_warnings,
        cancelled,
    })
}

//! Backtest runner — wires together data loading, strategy
//! construction, the simulation loop, and reporting.
//!
//! Two entry points:
//! - [`run`]: loads data per the config, then runs. Used by the CLI.
//! - [`run_with_bars`]: takes a pre-loaded series. Used by sweeps to
//!   load once and replay many grid points.

use std::sync::atomic::AtomicBool;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use coinlab_core::domain::{Bar, EquityPoint, TradeRecord};
use coinlab_core::engine::{run_backtest, EngineError, RunState};
use coinlab_core::strategy::build_strategy;

use crate::config::{default_schema_version, BacktestConfig, ConfigError, SCHEMA_VERSION};
use crate::data::{load_bars, LoadError};
use crate::report::{compute_report, PerformanceReport};

/// Errors from the runner.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("data error: {0}")]
    Data(#[from] LoadError),
    #[error("engine error: {0}")]
    Engine(#[from] EngineError),
}

/// Complete, serializable result of a single backtest run.
///
/// Carries the full config for reproducibility: `report.json` alone is
/// enough to rerun the backtest that produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestResult {
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    /// Content hash of `config`; artifact directories are named by it.
    pub run_id: String,
    pub config: BacktestConfig,
    pub state: RunState,
    pub report: PerformanceReport,
    pub trades: Vec<TradeRecord>,
    pub equity_curve: Vec<EquityPoint>,
    pub bar_count: usize,
    pub bars_processed: usize,
    pub buy_signals: usize,
    pub sell_signals: usize,
    pub gap_warnings: usize,
    pub cancelled: bool,
}

/// Run a single backtest from a config: load data, build the strategy,
/// replay, report.
///
/// `cancel` is a cooperative stop flag checked once per bar; a
/// cancelled run still liquidates and reports over the bars it saw.
pub fn run(
    config: &BacktestConfig,
    cancel: Option<&AtomicBool>,
) -> Result<BacktestResult, RunError> {
    config.validate()?;
    let bars = load_bars(&config.data, &config.symbol, config.timeframe)?;
    run_with_bars(config, &bars, cancel)
}

/// Run against a pre-loaded series; no I/O.
pub fn run_with_bars(
    config: &BacktestConfig,
    bars: &[Bar],
    cancel: Option<&AtomicBool>,
) -> Result<BacktestResult, RunError> {
    let run_id = config.run_id();
    let strategy = build_strategy(&config.strategy)?;

    if !strategy.required_timeframes().contains(&config.timeframe) {
        let tuned: Vec<&str> = strategy
            .required_timeframes()
            .iter()
            .map(|tf| tf.as_str())
            .collect();
        log::warn!(
            "run {run_id}: strategy '{}' is tuned for [{}], data is {}",
            strategy.name(),
            tuned.join(", "),
            config.timeframe
        );
    }
    log::info!(
        "run {run_id}: {} bars of {} at {} with '{}'",
        bars.len(),
        config.symbol,
        config.timeframe,
        strategy.name()
    );

    let outcome = run_backtest(
        &config.symbol,
        config.timeframe,
        bars,
        strategy.as_ref(),
        &config.execution,
        cancel,
    )?;

    if outcome.gap_warnings > 0 {
        log::warn!("run {run_id}: {} gap warnings", outcome.gap_warnings);
    }
    for trade in &outcome.trades {
        log::debug!(
            "run {run_id}: {:?} {:.2} -> {:.2}, net {:+.2} over {} bars",
            trade.reason,
            trade.entry_price,
            trade.exit_price,
            trade.net_pnl,
            trade.bars_held
        );
    }

    let report = compute_report(
        config.execution.initial_balance,
        &outcome.equity_curve,
        &outcome.trades,
        config.timeframe,
    );
    log::info!(
        "run {run_id}: {} after {} bars, {} trades, return {:+.2}%",
        outcome.state,
        outcome.bars_processed,
        outcome.trades.len(),
        report.total_return_pct * 100.0
    );

    Ok(BacktestResult {
        schema_version: SCHEMA_VERSION,
        run_id,
        config: config.clone(),
        state: outcome.state,
        report,
        trades: outcome.trades,
        equity_curve: outcome.equity_curve,
        bar_count: bars.len(),
        bars_processed: outcome.bars_processed,
        buy_signals: outcome.buy_signals,
        sell_signals: outcome.sell_signals,
        gap_warnings: outcome.gap_warnings,
        cancelled: outcome.cancelled,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    use coinlab_core::domain::Timeframe;
    use coinlab_core::strategy::StrategySpec;

    use crate::data::DataConfig;

    fn synthetic_config(seed: u64, bars: usize) -> BacktestConfig {
        BacktestConfig {
            data: DataConfig::Synthetic {
                seed,
                bars,
                start_price: 30_000.0,
            },
            ..BacktestConfig::default()
        }
    }

    #[test]
    fn synthetic_run_completes_and_reconciles() {
        let config = synthetic_config(42, 300);
        let result = run(&config, None).unwrap();

        assert_eq!(result.state, RunState::Completed);
        assert!(!result.cancelled);
        assert_eq!(result.run_id, config.run_id());
        assert_eq!(result.bar_count, 300);
        assert_eq!(result.bars_processed, 300);
        assert_eq!(result.equity_curve.len(), 300);
        assert_eq!(result.report.trade_count, result.trades.len());
        // Ends flat: the last equity point is all cash.
        let last = result.equity_curve.last().unwrap();
        assert_eq!(last.position_value, 0.0);
        assert!((last.equity - result.report.final_balance).abs() < 1e-9);
    }

    #[test]
    fn invalid_strategy_parameters_fail_before_the_loop() {
        let config = BacktestConfig {
            strategy: StrategySpec::MaCross {
                fast_period: 30,
                slow_period: 10,
                timeframe: Timeframe::H1,
            },
            ..synthetic_config(1, 50)
        };
        assert!(matches!(
            run(&config, None).unwrap_err(),
            RunError::Config(_)
        ));
    }

    #[test]
    fn preset_cancel_flag_yields_an_empty_cancelled_run() {
        let cancel = AtomicBool::new(true);
        let config = synthetic_config(5, 100);
        let result = run(&config, Some(&cancel)).unwrap();

        assert!(result.cancelled);
        assert_eq!(result.bars_processed, 0);
        assert!(result.trades.is_empty());
        assert_eq!(result.report.final_balance, config.execution.initial_balance);
        assert_eq!(result.report.total_return, 0.0);
    }

    #[test]
    fn mismatched_strategy_timeframe_still_runs() {
        // Warns, never fails: the declared tuning is advisory.
        let config = BacktestConfig {
            strategy: StrategySpec::MaCross {
                fast_period: 5,
                slow_period: 20,
                timeframe: Timeframe::M15,
            },
            timeframe: Timeframe::H1,
            ..synthetic_config(9, 120)
        };
        let result = run(&config, None).unwrap();
        assert_eq!(result.state, RunState::Completed);
    }
}

//! Performance reporting — pure statistics over an equity curve and
//! trade log.
//!
//! Every metric is a pure function: curve and/or trades in, scalar out.
//! Degenerate inputs produce defined sentinels instead of NaN or
//! infinity, so a report always serializes cleanly and sorts sanely in
//! sweeps.

use serde::{Deserialize, Serialize};

use coinlab_core::domain::{EquityPoint, Timeframe, TradeRecord};

use crate::config::default_schema_version;

/// Profit factor ceiling; also the sentinel when a run has gains and no
/// losses.
pub const PROFIT_FACTOR_CAP: f64 = 100.0;

/// Aggregate statistics for one backtest run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceReport {
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub initial_balance: f64,
    pub final_balance: f64,
    /// Absolute return in quote currency.
    pub total_return: f64,
    /// Return as a fraction of the initial balance.
    pub total_return_pct: f64,
    /// Worst peak-to-trough loss as a non-negative fraction of the peak.
    pub max_drawdown: f64,
    /// Mean over sample-stddev of per-bar equity returns, annualized by
    /// the square root of the timeframe's periods per year.
    pub sharpe: f64,
    /// Fraction of trades with positive net P&L.
    pub win_rate: f64,
    pub profit_factor: f64,
    pub trade_count: usize,
    pub winning_trades: usize,
    pub losing_trades: usize,
    pub avg_win: f64,
    /// Mean losing net P&L; zero or negative.
    pub avg_loss: f64,
    pub largest_win: f64,
    pub largest_loss: f64,
    /// Mean holding time in bars of the run's timeframe.
    pub avg_bars_held: f64,
    pub total_fees: f64,
}

/// Compute the full report for one run.
pub fn compute_report(
    initial_balance: f64,
    equity_curve: &[EquityPoint],
    trades: &[TradeRecord],
    timeframe: Timeframe,
) -> PerformanceReport {
    let final_balance = equity_curve.last().map_or(initial_balance, |p| p.equity);
    let total_return = final_balance - initial_balance;
    let total_return_pct = if initial_balance > 0.0 {
        total_return / initial_balance
    } else {
        0.0
    };

    let wins: Vec<f64> = trades
        .iter()
        .filter(|t| t.net_pnl > 0.0)
        .map(|t| t.net_pnl)
        .collect();
    let losses: Vec<f64> = trades
        .iter()
        .filter(|t| t.net_pnl < 0.0)
        .map(|t| t.net_pnl)
        .collect();

    let avg_bars_held = if trades.is_empty() {
        0.0
    } else {
        trades.iter().map(|t| t.bars_held as f64).sum::<f64>() / trades.len() as f64
    };

    PerformanceReport {
        schema_version: default_schema_version(),
        initial_balance,
        final_balance,
        total_return,
        total_return_pct,
        max_drawdown: max_drawdown(equity_curve),
        sharpe: sharpe_ratio(equity_curve, timeframe),
        win_rate: win_rate(trades),
        profit_factor: profit_factor(trades),
        trade_count: trades.len(),
        winning_trades: wins.len(),
        losing_trades: losses.len(),
        avg_win: mean_or_zero(&wins),
        avg_loss: mean_or_zero(&losses),
        largest_win: wins.iter().copied().fold(0.0, f64::max),
        largest_loss: losses.iter().copied().fold(0.0, f64::min),
        avg_bars_held,
        total_fees: trades.iter().map(|t| t.fees).sum(),
    }
}

// ─── Individual metric functions ────────────────────────────────────

/// Worst peak-to-trough drop as a non-negative fraction of the peak.
/// Zero for empty, single-point, or monotonically non-decreasing curves.
pub fn max_drawdown(equity_curve: &[EquityPoint]) -> f64 {
    let mut peak = f64::NEG_INFINITY;
    let mut worst = 0.0_f64;
    for point in equity_curve {
        if point.equity > peak {
            peak = point.equity;
        }
        if peak > 0.0 {
            worst = worst.max((peak - point.equity) / peak);
        }
    }
    worst
}

/// Annualized Sharpe ratio over per-bar equity returns.
///
/// Sharpe = mean(returns) / sample_stddev(returns) * sqrt(periods/year),
/// with the annualization factor taken from the run's timeframe. Zero
/// when there are fewer than two returns or the variance vanishes.
pub fn sharpe_ratio(equity_curve: &[EquityPoint], timeframe: Timeframe) -> f64 {
    let returns = bar_returns(equity_curve);
    if returns.len() < 2 {
        return 0.0;
    }
    let mean = mean_or_zero(&returns);
    let stddev = sample_stddev(&returns);
    if stddev < 1e-15 {
        return 0.0;
    }
    (mean / stddev) * timeframe.periods_per_year().sqrt()
}

/// Fraction of trades with positive net P&L; zero with no trades.
/// Breakeven trades count against the rate.
pub fn win_rate(trades: &[TradeRecord]) -> f64 {
    if trades.is_empty() {
        return 0.0;
    }
    trades.iter().filter(|t| t.is_winner()).count() as f64 / trades.len() as f64
}

/// Gross gains over gross losses, capped at [`PROFIT_FACTOR_CAP`].
///
/// Sentinels: no trades (or all breakeven) → 0; gains with zero losses
/// → the cap.
pub fn profit_factor(trades: &[TradeRecord]) -> f64 {
    let gross_gain: f64 = trades
        .iter()
        .filter(|t| t.net_pnl > 0.0)
        .map(|t| t.net_pnl)
        .sum();
    let gross_loss: f64 = trades
        .iter()
        .filter(|t| t.net_pnl < 0.0)
        .map(|t| -t.net_pnl)
        .sum();

    if gross_loss > 0.0 {
        (gross_gain / gross_loss).min(PROFIT_FACTOR_CAP)
    } else if gross_gain > 0.0 {
        PROFIT_FACTOR_CAP
    } else {
        0.0
    }
}

/// Simple per-bar returns. Points after a non-positive equity value are
/// skipped rather than producing infinities.
fn bar_returns(equity_curve: &[EquityPoint]) -> Vec<f64> {
    equity_curve
        .windows(2)
        .filter(|pair| pair[0].equity > 0.0)
        .map(|pair| pair[1].equity / pair[0].equity - 1.0)
        .collect()
}

fn mean_or_zero(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample standard deviation (n - 1 denominator).
fn sample_stddev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let mean = mean_or_zero(values);
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>()
        / (values.len() - 1) as f64;
    variance.sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use coinlab_core::domain::CloseReason;

    fn point(hour: u32, equity: f64) -> EquityPoint {
        EquityPoint {
            timestamp: Utc.with_ymd_and_hms(2024, 1, 1, hour, 0, 0).unwrap(),
            equity,
            cash: equity,
            position_value: 0.0,
        }
    }

    fn curve(equities: &[f64]) -> Vec<EquityPoint> {
        equities
            .iter()
            .enumerate()
            .map(|(i, &e)| point(i as u32, e))
            .collect()
    }

    fn trade(net_pnl: f64, fees: f64, bars_held: usize) -> TradeRecord {
        TradeRecord {
            symbol: "BTCUSDT".into(),
            reason: CloseReason::Signal,
            entry_time: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            entry_price: 100.0,
            exit_time: Utc.with_ymd_and_hms(2024, 1, 1, bars_held as u32, 0, 0).unwrap(),
            exit_price: 100.0,
            quantity: 1.0,
            fees,
            net_pnl,
            bars_held,
        }
    }

    #[test]
    fn drawdown_on_a_known_curve() {
        // Peak 120, trough 80: (120 - 80) / 120 = 1/3.
        let dd = max_drawdown(&curve(&[100.0, 120.0, 90.0, 110.0, 80.0]));
        assert!((dd - 1.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn drawdown_is_zero_on_non_decreasing_curve() {
        assert_eq!(max_drawdown(&curve(&[100.0, 100.0, 105.0, 110.0])), 0.0);
        assert_eq!(max_drawdown(&curve(&[100.0])), 0.0);
        assert_eq!(max_drawdown(&[]), 0.0);
    }

    #[test]
    fn sharpe_matches_hand_computation() {
        // Returns: 102/100 - 1 = 0.02, 103.02/102 - 1 = 0.01.
        // mean = 0.015, sample stddev = sqrt(2 * 0.005^2 / 1) = 0.005 * sqrt(2).
        // Per-bar Sharpe = 0.015 / (0.005 * sqrt(2)) = 3 / sqrt(2).
        let curve = curve(&[100.0, 102.0, 103.02]);
        let expected = 3.0 / 2.0_f64.sqrt() * Timeframe::H1.periods_per_year().sqrt();
        assert!((sharpe_ratio(&curve, Timeframe::H1) - expected).abs() < 1e-6);
    }

    #[test]
    fn sharpe_annualization_scales_with_timeframe() {
        let curve = curve(&[100.0, 102.0, 103.02, 104.0, 102.5]);
        let hourly = sharpe_ratio(&curve, Timeframe::H1);
        let daily = sharpe_ratio(&curve, Timeframe::D1);
        let ratio = (Timeframe::H1.periods_per_year() / Timeframe::D1.periods_per_year()).sqrt();
        assert!((hourly / daily - ratio).abs() < 1e-9);
    }

    #[test]
    fn sharpe_sentinels() {
        assert_eq!(sharpe_ratio(&[], Timeframe::H1), 0.0);
        assert_eq!(sharpe_ratio(&curve(&[100.0]), Timeframe::H1), 0.0);
        assert_eq!(sharpe_ratio(&curve(&[100.0, 101.0]), Timeframe::H1), 0.0);
        // Constant returns: zero variance.
        assert_eq!(sharpe_ratio(&curve(&[100.0, 110.0, 121.0]), Timeframe::H1), 0.0);
        assert_eq!(sharpe_ratio(&curve(&[100.0, 100.0, 100.0, 100.0]), Timeframe::H1), 0.0);
    }

    #[test]
    fn win_rate_counts_breakeven_against() {
        let trades = [trade(50.0, 0.0, 1), trade(0.0, 0.0, 1), trade(-25.0, 0.0, 1)];
        assert!((win_rate(&trades) - 1.0 / 3.0).abs() < 1e-12);
        assert_eq!(win_rate(&[]), 0.0);
    }

    #[test]
    fn profit_factor_with_both_sides() {
        let trades = [trade(60.0, 0.0, 1), trade(30.0, 0.0, 1), trade(-45.0, 0.0, 1)];
        assert!((profit_factor(&trades) - 2.0).abs() < 1e-12);
    }

    #[test]
    fn profit_factor_sentinels() {
        assert_eq!(profit_factor(&[]), 0.0);
        assert_eq!(profit_factor(&[trade(10.0, 0.0, 1)]), PROFIT_FACTOR_CAP);
        assert_eq!(profit_factor(&[trade(-10.0, 0.0, 1)]), 0.0);
        assert_eq!(profit_factor(&[trade(0.0, 0.0, 1)]), 0.0);
        // Tiny loss against a large gain still hits the ceiling.
        let lopsided = [trade(1_000.0, 0.0, 1), trade(-0.01, 0.0, 1)];
        assert_eq!(profit_factor(&lopsided), PROFIT_FACTOR_CAP);
    }

    #[test]
    fn full_report_composes_the_pieces() {
        let curve = curve(&[10_000.0, 10_200.0, 10_050.0, 10_500.0]);
        let trades = [trade(600.0, 2.0, 4), trade(-100.0, 1.0, 2)];
        let report = compute_report(10_000.0, &curve, &trades, Timeframe::H1);

        assert_eq!(report.initial_balance, 10_000.0);
        assert_eq!(report.final_balance, 10_500.0);
        assert_eq!(report.total_return, 500.0);
        assert!((report.total_return_pct - 0.05).abs() < 1e-12);
        assert_eq!(report.trade_count, 2);
        assert_eq!(report.winning_trades, 1);
        assert_eq!(report.losing_trades, 1);
        assert_eq!(report.avg_win, 600.0);
        assert_eq!(report.avg_loss, -100.0);
        assert_eq!(report.largest_win, 600.0);
        assert_eq!(report.largest_loss, -100.0);
        assert!((report.profit_factor - 6.0).abs() < 1e-12);
        assert_eq!(report.win_rate, 0.5);
        assert_eq!(report.total_fees, 3.0);
        assert_eq!(report.avg_bars_held, 3.0);
        // Peak 10_200, trough 10_050.
        assert!((report.max_drawdown - 150.0 / 10_200.0).abs() < 1e-12);
    }

    #[test]
    fn empty_run_reports_flat_sentinels() {
        let report = compute_report(10_000.0, &[], &[], Timeframe::H1);
        assert_eq!(report.final_balance, 10_000.0);
        assert_eq!(report.total_return, 0.0);
        assert_eq!(report.sharpe, 0.0);
        assert_eq!(report.max_drawdown, 0.0);
        assert_eq!(report.win_rate, 0.0);
        assert_eq!(report.profit_factor, 0.0);
        assert_eq!(report.avg_bars_held, 0.0);
    }

    #[test]
    fn report_round_trips_through_json() {
        let curve = curve(&[10_000.0, 10_100.0, 10_050.0]);
        let trades = [trade(50.0, 0.5, 2)];
        let report = compute_report(10_000.0, &curve, &trades, Timeframe::M15);

        let json = serde_json::to_string(&report).unwrap();
        let back: PerformanceReport = serde_json::from_str(&json).unwrap();
        assert_eq!(back, report);
    }
}

//! Property suite for the reporter. Invariants:
//!
//! 1. Every metric stays defined and bounded on arbitrary inputs.
//! 2. Win/loss bookkeeping decomposes the trade list exactly.
//! 3. Drawdown is zero precisely on non-decreasing curves.

use chrono::{Duration, TimeZone, Utc};
use proptest::prelude::*;

use coinlab_core::domain::{CloseReason, EquityPoint, Timeframe, TradeRecord};
use coinlab_runner::{compute_report, PROFIT_FACTOR_CAP};

// ── Strategies (proptest) ───────────────────────────────────────────

fn curve_from(equities: &[f64]) -> Vec<EquityPoint> {
    let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    equities
        .iter()
        .enumerate()
        .map(|(i, &equity)| EquityPoint {
            timestamp: start + Duration::hours(i as i64),
            equity,
            cash: equity,
            position_value: 0.0,
        })
        .collect()
}

fn arb_equity_curve() -> impl Strategy<Value = Vec<EquityPoint>> {
    prop::collection::vec(1_000.0..100_000.0f64, 0..60).prop_map(|e| curve_from(&e))
}

fn arb_trades() -> impl Strategy<Value = Vec<TradeRecord>> {
    prop::collection::vec((-500.0..500.0f64, 0usize..48), 0..30).prop_map(|rows| {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        rows.iter()
            .enumerate()
            .map(|(i, &(net_pnl, bars_held))| TradeRecord {
                symbol: "BTCUSDT".into(),
                reason: CloseReason::Signal,
                entry_time: start + Duration::hours(i as i64 * 50),
                exit_time: start + Duration::hours(i as i64 * 50 + bars_held as i64),
                entry_price: 100.0,
                exit_price: 100.0,
                quantity: 1.0,
                fees: 0.1,
                net_pnl,
                bars_held,
            })
            .collect()
    })
}

// ── 1. Metrics stay defined and bounded ─────────────────────────────

proptest! {
    #[test]
    fn report_metrics_stay_bounded(
        curve in arb_equity_curve(),
        trades in arb_trades(),
    ) {
        let report = compute_report(10_000.0, &curve, &trades, Timeframe::H1);

        prop_assert!((0.0..=1.0).contains(&report.win_rate));
        prop_assert!((0.0..=PROFIT_FACTOR_CAP).contains(&report.profit_factor));
        prop_assert!((0.0..1.0).contains(&report.max_drawdown));
        prop_assert!(report.sharpe.is_finite());
        prop_assert!(report.total_return.is_finite());
        prop_assert!(report.avg_win >= 0.0);
        prop_assert!(report.avg_loss <= 0.0);
        prop_assert!(report.largest_win >= 0.0);
        prop_assert!(report.largest_loss <= 0.0);
        prop_assert!(report.avg_bars_held >= 0.0);
    }
}

// ── 2. Win/loss bookkeeping decomposes the trade list ───────────────

proptest! {
    #[test]
    fn win_loss_counts_decompose_trades(trades in arb_trades()) {
        let report = compute_report(10_000.0, &[], &trades, Timeframe::H1);

        prop_assert_eq!(report.trade_count, trades.len());
        prop_assert!(report.winning_trades + report.losing_trades <= report.trade_count);

        // avg * count recovers each gross side.
        let gross = report.avg_win * report.winning_trades as f64
            + report.avg_loss * report.losing_trades as f64;
        let expected: f64 = trades
            .iter()
            .filter(|t| t.net_pnl != 0.0)
            .map(|t| t.net_pnl)
            .sum();
        prop_assert!(
            (gross - expected).abs() < 1e-6 * (1.0 + expected.abs()),
            "gross {} vs expected {}",
            gross,
            expected
        );
    }
}

// ── 3. Drawdown is zero exactly on non-decreasing curves ────────────

proptest! {
    #[test]
    fn sorted_curves_have_zero_drawdown(mut equities in prop::collection::vec(1_000.0..100_000.0f64, 2..40)) {
        equities.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
        let report = compute_report(equities[0], &curve_from(&equities), &[], Timeframe::H1);
        prop_assert_eq!(report.max_drawdown, 0.0);
    }

    #[test]
    fn any_dip_shows_up_as_drawdown(
        peak in 10_000.0..50_000.0f64,
        dip_fraction in 0.01..0.9f64,
    ) {
        let trough = peak * (1.0 - dip_fraction);
        let report = compute_report(peak, &curve_from(&[peak, trough]), &[], Timeframe::H1);
        prop_assert!((report.max_drawdown - dip_fraction).abs() < 1e-9);
    }
}

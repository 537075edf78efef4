//! End-to-end strategy scenarios through the full simulation loop.
//!
//! Golden tests with hand-computed expectations: each scenario builds a
//! small bar sequence that forces one specific exit path (signal,
//! stop-loss, take-profit) and checks the resulting trade and cash.

use chrono::{Duration, TimeZone, Utc};
use coinlab_core::domain::{Bar, CloseReason, Timeframe};
use coinlab_core::engine::{run_backtest, EngineConfig, RunState, SlippageConfig};
use coinlab_core::strategy::{build_strategy, MaCross, RsiReversal, StrategySpec};

fn bars_from_closes(closes: &[f64]) -> Vec<Bar> {
    let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let open = if i == 0 { close } else { closes[i - 1] };
            Bar {
                timestamp: start + Duration::hours(i as i64),
                open,
                high: open.max(close) + 0.5,
                low: open.min(close) - 0.5,
                close,
                volume: 1_000.0,
            }
        })
        .collect()
}

fn frictionless() -> EngineConfig {
    EngineConfig {
        fee_rate: 0.0,
        slippage: SlippageConfig::None,
        ..EngineConfig::default()
    }
}

#[test]
fn rsi_dip_buy_exits_on_overbought_signal() {
    // RSI(2) over [10,11,12,11,10,11,12,13]:
    //   idx 4: RSI 25, prev 50  -> BUY, strength 0.5 + 0.5*(5/30) = 7/12
    //   idx 6: RSI 81.25, prev 62.5 -> SELL
    // Stops disarmed so the overbought signal is the only exit.
    let bars = bars_from_closes(&[10.0, 11.0, 12.0, 11.0, 10.0, 11.0, 12.0, 13.0]);
    let strategy = RsiReversal::new(2, 30.0, 70.0, Timeframe::H1);
    let config = EngineConfig {
        min_signal_strength: 0.5,
        stop_loss_pct: None,
        take_profit_pct: None,
        ..frictionless()
    };

    let outcome =
        run_backtest("BTCUSDT", Timeframe::H1, &bars, &strategy, &config, None).unwrap();

    assert_eq!(outcome.state, RunState::Completed);
    assert_eq!(outcome.buy_signals, 1);
    assert_eq!(outcome.sell_signals, 1);
    assert_eq!(outcome.trades.len(), 1);

    let trade = &outcome.trades[0];
    assert_eq!(trade.reason, CloseReason::Signal);
    assert_eq!(trade.entry_price, 10.0);
    assert_eq!(trade.exit_price, 12.0);
    assert_eq!(trade.bars_held, 2);

    // Notional 10_000 * 0.1 * 7/12 at 10.0, +2.0 per unit on exit.
    let strength = 0.5 + 0.5 * (5.0 / 30.0);
    let quantity = 10_000.0 * 0.1 * strength / 10.0;
    assert!((trade.net_pnl - quantity * 2.0).abs() < 1e-9);
    assert!((outcome.portfolio.cash - (10_000.0 + quantity * 2.0)).abs() < 1e-9);
}

#[test]
fn stop_loss_cuts_crash_at_threshold() {
    // MA(2/4) buys at idx 3 (close 103), arming the 5% stop at 97.85.
    // The crash bar opens at 104 and closes at 90: it trades through
    // the stop, so the fill is the threshold, not the open.
    //   P&L = 1000/103 * (97.85 - 103) = -50 exactly.
    let bars = bars_from_closes(&[
        100.0, 101.0, 102.0, 103.0, 104.0, 90.0, 88.0, 87.0, 86.0, 85.0,
    ]);
    let strategy = MaCross::new(2, 4, Timeframe::H1);

    let outcome =
        run_backtest("BTCUSDT", Timeframe::H1, &bars, &strategy, &frictionless(), None).unwrap();

    assert_eq!(outcome.trades.len(), 1);
    let trade = &outcome.trades[0];
    assert_eq!(trade.reason, CloseReason::StopLoss);
    assert_eq!(trade.entry_price, 103.0);
    assert!((trade.exit_price - 97.85).abs() < 1e-9);
    assert!((trade.net_pnl - (-50.0)).abs() < 1e-9);

    // The downward EMA cross arrives on the crash bar, after the stop
    // already flattened the book; it must not double-close.
    assert_eq!(outcome.sell_signals, 1);
    assert!((outcome.portfolio.cash - 9_950.0).abs() < 1e-9);
}

#[test]
fn take_profit_locks_in_pump() {
    // Entry at idx 3 (close 103) arms the 15% target at 118.45. The
    // pump bar opens at 103 and spikes to 120.5, filling the target at
    // the threshold: P&L = 1000/103 * 15.45 = +150 exactly.
    let bars = bars_from_closes(&[100.0, 101.0, 102.0, 103.0, 120.0, 125.0, 130.0]);
    let strategy = MaCross::new(2, 4, Timeframe::H1);

    let outcome =
        run_backtest("BTCUSDT", Timeframe::H1, &bars, &strategy, &frictionless(), None).unwrap();

    assert_eq!(outcome.trades.len(), 1);
    let trade = &outcome.trades[0];
    assert_eq!(trade.reason, CloseReason::TakeProfit);
    assert_eq!(trade.bars_held, 1);
    assert!((trade.exit_price - 118.45).abs() < 1e-9);
    assert!((trade.net_pnl - 150.0).abs() < 1e-9);
    assert!((outcome.portfolio.cash - 10_150.0).abs() < 1e-9);
}

#[test]
fn combined_default_runs_clean_over_a_wave() {
    let closes: Vec<f64> = (0..200)
        .map(|i| 100.0 + (i as f64 * 0.15).sin() * 15.0)
        .collect();
    let bars = bars_from_closes(&closes);
    let spec = StrategySpec::default_for("combined").unwrap();
    let strategy = build_strategy(&spec).unwrap();

    let outcome = run_backtest(
        "BTCUSDT",
        Timeframe::H1,
        &bars,
        strategy.as_ref(),
        &EngineConfig::default(),
        None,
    )
    .unwrap();

    assert_eq!(outcome.state, RunState::Completed);
    assert_eq!(outcome.bars_processed, 200);
    assert_eq!(outcome.equity_curve.len(), 200);
    assert!(outcome.portfolio.positions.is_empty());
    assert!(outcome.portfolio.cash > 0.0);
    for trade in &outcome.trades {
        assert!(trade.exit_time >= trade.entry_time);
        assert!(trade.quantity > 0.0);
        assert!(trade.fees >= 0.0);
    }
}

#[test]
fn trades_never_enter_during_warmup() {
    let closes: Vec<f64> = (0..60)
        .map(|i| 100.0 + (i as f64 * 0.4).sin() * 10.0)
        .collect();
    let bars = bars_from_closes(&closes);
    let strategy = MaCross::new(2, 4, Timeframe::H1);

    let outcome =
        run_backtest("BTCUSDT", Timeframe::H1, &bars, &strategy, &frictionless(), None).unwrap();

    // Lookback 4: nothing may open before the fourth bar.
    let first_evaluated = bars[3].timestamp;
    for trade in &outcome.trades {
        assert!(
            trade.entry_time >= first_evaluated,
            "trade entered during warmup at {}",
            trade.entry_time
        );
    }
}

//! Portfolio tracker: applies signals, risk exits, and mark-to-market
//! updates to a single run's portfolio state.
//!
//! The tracker owns the portfolio, the trade log, and the equity curve.
//! It performs no I/O; every mutation comes in through one of the four
//! operations the simulation loop calls.

use chrono::{DateTime, Utc};

use super::EngineConfig;
use crate::domain::{
    Action, Bar, CloseReason, EquityPoint, Portfolio, Position, Signal, Symbol, TradeRecord,
};

#[cfg(debug_assertions)]
const ACCOUNTING_EPSILON: f64 = 1e-6;

pub struct PortfolioTracker {
    config: EngineConfig,
    symbol: Symbol,
    portfolio: Portfolio,
    trades: Vec<TradeRecord>,
    equity_curve: Vec<EquityPoint>,
}

impl PortfolioTracker {
    pub fn new(symbol: impl Into<Symbol>, config: EngineConfig) -> Self {
        let portfolio = Portfolio::new(config.initial_balance);
        Self {
            config,
            symbol: symbol.into(),
            portfolio,
            trades: Vec::new(),
            equity_curve: Vec::new(),
        }
    }

    pub fn portfolio(&self) -> &Portfolio {
        &self.portfolio
    }

    pub fn trades(&self) -> &[TradeRecord] {
        &self.trades
    }

    pub fn equity_curve(&self) -> &[EquityPoint] {
        &self.equity_curve
    }

    pub fn into_parts(self) -> (Portfolio, Vec<TradeRecord>, Vec<EquityPoint>) {
        (self.portfolio, self.trades, self.equity_curve)
    }

    /// Acts on a strategy signal for the bar at `index`.
    ///
    /// BUY opens a position when none is held; SELL closes the held
    /// position. HOLD, BUY while holding, and SELL while flat are
    /// no-ops rather than errors. Long-only: SELL never opens a short.
    pub fn apply_signal(&mut self, signal: Signal, bar: &Bar, index: usize) {
        match signal.action {
            Action::Buy if !self.portfolio.has_position(&self.symbol) => {
                self.try_open(signal.strength, bar, index);
            }
            Action::Sell if self.portfolio.has_position(&self.symbol) => {
                let fill = self.config.slippage.sell_price(bar.close);
                self.close(fill, bar.timestamp, index, CloseReason::Signal);
            }
            _ => {}
        }
    }

    /// Records one equity point for the bar. Marking the same bar again
    /// replaces its point, so the curve stays one-point-per-bar even
    /// when liquidation re-marks the final bar.
    pub fn mark_to_market(&mut self, bar: &Bar) {
        let position_value: f64 = self
            .portfolio
            .positions
            .values()
            .map(|p| p.market_value(bar.close))
            .sum();
        let point = EquityPoint {
            timestamp: bar.timestamp,
            equity: self.portfolio.cash + position_value,
            cash: self.portfolio.cash,
            position_value,
        };
        match self.equity_curve.last_mut() {
            Some(last) if last.timestamp == bar.timestamp => *last = point,
            _ => self.equity_curve.push(point),
        }
    }

    /// Force-closes the held position when the bar crosses its stop-loss
    /// or take-profit threshold intrabar. The stop wins when one bar
    /// breaches both thresholds. A bar that opens beyond a threshold
    /// fills at the open, not at the threshold.
    pub fn enforce_risk_limits(&mut self, bar: &Bar, index: usize) {
        let Some((stop_loss, take_profit)) = self
            .portfolio
            .position(&self.symbol)
            .map(|p| (p.stop_loss, p.take_profit))
        else {
            return;
        };

        if let Some(stop) = stop_loss {
            if bar.low <= stop {
                let fill = if bar.open <= stop { bar.open } else { stop };
                self.close(fill, bar.timestamp, index, CloseReason::StopLoss);
                return;
            }
        }
        if let Some(target) = take_profit {
            if bar.high >= target {
                let fill = if bar.open >= target { bar.open } else { target };
                self.close(fill, bar.timestamp, index, CloseReason::TakeProfit);
            }
        }
    }

    /// Force-closes every open position at the bar's close,
    /// slippage-adjusted.
    pub fn liquidate_all(&mut self, bar: &Bar, index: usize, reason: CloseReason) {
        let symbols: Vec<Symbol> = self.portfolio.positions.keys().cloned().collect();
        let fill = self.config.slippage.sell_price(bar.close);
        for symbol in symbols {
            self.close_symbol(&symbol, fill, bar.timestamp, index, reason);
        }
    }

    fn try_open(&mut self, strength: f64, bar: &Bar, index: usize) {
        if strength < self.config.min_signal_strength {
            return;
        }
        let position_value: f64 = self
            .portfolio
            .positions
            .values()
            .map(|p| p.market_value(bar.close))
            .sum();
        let equity = self.portfolio.cash + position_value;
        let notional = self.config.sizing.target_notional(equity, strength);
        if notional < self.config.min_notional {
            return;
        }
        let fee = notional * self.config.fee_rate;
        if self.portfolio.cash < notional + fee {
            return;
        }

        let fill = self.config.slippage.buy_price(bar.close);
        let quantity = notional / fill;
        self.portfolio.cash -= notional + fee;
        self.portfolio.total_fees += fee;
        self.portfolio.positions.insert(
            self.symbol.clone(),
            Position {
                symbol: self.symbol.clone(),
                quantity,
                entry_price: fill,
                entry_time: bar.timestamp,
                entry_fee: fee,
                entry_bar: index,
                stop_loss: self.config.stop_loss_pct.map(|pct| fill * (1.0 - pct)),
                take_profit: self.config.take_profit_pct.map(|pct| fill * (1.0 + pct)),
            },
        );
        self.verify_accounting();
    }

    fn close(&mut self, fill: f64, time: DateTime<Utc>, index: usize, reason: CloseReason) {
        let symbol = self.symbol.clone();
        self.close_symbol(&symbol, fill, time, index, reason);
    }

    fn close_symbol(
        &mut self,
        symbol: &str,
        fill: f64,
        time: DateTime<Utc>,
        index: usize,
        reason: CloseReason,
    ) {
        let Some(position) = self.portfolio.positions.remove(symbol) else {
            return;
        };
        let proceeds = position.quantity * fill;
        let exit_fee = proceeds * self.config.fee_rate;
        let net_pnl = proceeds - exit_fee - position.entry_cost() - position.entry_fee;

        self.portfolio.cash += proceeds - exit_fee;
        self.portfolio.total_fees += exit_fee;
        self.portfolio.realized_pnl += net_pnl;
        self.trades.push(TradeRecord {
            symbol: position.symbol,
            reason,
            entry_time: position.entry_time,
            entry_price: position.entry_price,
            exit_time: time,
            exit_price: fill,
            quantity: position.quantity,
            fees: position.entry_fee + exit_fee,
            net_pnl,
            bars_held: index - position.entry_bar,
        });
        self.verify_accounting();
    }

    /// Accounting identity: cash equals the initial balance plus
    /// realized P&L minus the cost basis of whatever is still open.
    fn verify_accounting(&self) {
        #[cfg(debug_assertions)]
        {
            let open_cost: f64 = self
                .portfolio
                .positions
                .values()
                .map(|p| p.entry_cost() + p.entry_fee)
                .sum();
            let expected = self.portfolio.initial_balance + self.portfolio.realized_pnl - open_cost;
            debug_assert!(
                (self.portfolio.cash - expected).abs() < ACCOUNTING_EPSILON,
                "cash {} diverged from accounting identity {}",
                self.portfolio.cash,
                expected
            );
            debug_assert!(
                self.portfolio.cash >= -ACCOUNTING_EPSILON,
                "cash went negative: {}",
                self.portfolio.cash
            );
        }
    }
}

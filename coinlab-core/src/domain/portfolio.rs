//! Portfolio — aggregate state of cash + open positions.

use super::position::Position;
use super::Symbol;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One sample of portfolio value, taken once per bar after mark-to-market.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquityPoint {
    pub timestamp: DateTime<Utc>,
    pub equity: f64,
    pub cash: f64,
    pub position_value: f64,
}

/// Aggregate portfolio state for one backtest run.
///
/// The equity accounting identity must hold after every mutation:
/// `equity == cash + sum(position market values)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Portfolio {
    pub cash: f64,
    pub initial_balance: f64,
    pub positions: HashMap<Symbol, Position>,
    pub realized_pnl: f64,
    pub total_fees: f64,
}

impl Portfolio {
    pub fn new(initial_balance: f64) -> Self {
        Self {
            cash: initial_balance,
            initial_balance,
            positions: HashMap::new(),
            realized_pnl: 0.0,
            total_fees: 0.0,
        }
    }

    /// Total equity = cash + sum of all position market values.
    ///
    /// A symbol missing from `prices` is marked at its entry price.
    pub fn equity(&self, prices: &HashMap<Symbol, f64>) -> f64 {
        let position_value: f64 = self
            .positions
            .iter()
            .map(|(sym, pos)| {
                let price = prices.get(sym).copied().unwrap_or(pos.entry_price);
                pos.market_value(price)
            })
            .sum();
        self.cash + position_value
    }

    pub fn has_position(&self, symbol: &str) -> bool {
        self.positions.contains_key(symbol)
    }

    pub fn position(&self, symbol: &str) -> Option<&Position> {
        self.positions.get(symbol)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn open_position(symbol: &str, quantity: f64, entry_price: f64) -> Position {
        Position {
            symbol: symbol.into(),
            quantity,
            entry_price,
            entry_time: Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap(),
            entry_fee: 0.0,
            entry_bar: 0,
            stop_loss: None,
            take_profit: None,
        }
    }

    #[test]
    fn equity_with_no_positions() {
        let portfolio = Portfolio::new(10_000.0);
        assert_eq!(portfolio.equity(&HashMap::new()), 10_000.0);
    }

    #[test]
    fn equity_with_position() {
        let mut portfolio = Portfolio::new(9_000.0);
        portfolio
            .positions
            .insert("BTCUSDT".into(), open_position("BTCUSDT", 0.5, 2_000.0));
        let mut prices = HashMap::new();
        prices.insert("BTCUSDT".to_string(), 2_200.0);
        // 9_000 + 0.5 * 2_200 = 10_100
        assert_eq!(portfolio.equity(&prices), 10_100.0);
    }

    #[test]
    fn missing_price_marks_at_entry() {
        let mut portfolio = Portfolio::new(9_000.0);
        portfolio
            .positions
            .insert("BTCUSDT".into(), open_position("BTCUSDT", 0.5, 2_000.0));
        assert_eq!(portfolio.equity(&HashMap::new()), 10_000.0);
    }

    #[test]
    fn has_position_checks() {
        let mut portfolio = Portfolio::new(10_000.0);
        assert!(!portfolio.has_position("BTCUSDT"));
        portfolio
            .positions
            .insert("BTCUSDT".into(), open_position("BTCUSDT", 1.0, 100.0));
        assert!(portfolio.has_position("BTCUSDT"));
        assert!(portfolio.position("BTCUSDT").is_some());
    }
}

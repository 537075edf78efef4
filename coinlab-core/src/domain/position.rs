//! Position — an open long holding.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An open long position in one symbol.
///
/// Stop-loss and take-profit levels are armed at entry from the engine's
/// risk percentages and checked intrabar on every post-warmup bar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub symbol: String,
    pub quantity: f64,
    pub entry_price: f64,
    pub entry_time: DateTime<Utc>,
    pub entry_fee: f64,
    pub entry_bar: usize,
    pub stop_loss: Option<f64>,
    pub take_profit: Option<f64>,
}

impl Position {
    pub fn market_value(&self, price: f64) -> f64 {
        self.quantity * price
    }

    pub fn unrealized_pnl(&self, price: f64) -> f64 {
        (price - self.entry_price) * self.quantity
    }

    /// Notional paid at entry, before fees.
    pub fn entry_cost(&self) -> f64 {
        self.entry_price * self.quantity
    }
}

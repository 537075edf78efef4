//! TradeRecord — a completed round-trip trade.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Why a position left the book.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CloseReason {
    /// Closed by a strategy SELL signal.
    Signal,
    /// Stop-loss threshold crossed intrabar.
    StopLoss,
    /// Take-profit threshold crossed intrabar.
    TakeProfit,
    /// Forced close at the end of the run.
    Liquidation,
}

/// A complete round-trip trade record: entry → exit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeRecord {
    // ── Identification ──
    pub symbol: String,
    pub reason: CloseReason,

    // ── Entry ──
    pub entry_time: DateTime<Utc>,
    pub entry_price: f64,

    // ── Exit ──
    pub exit_time: DateTime<Utc>,
    pub exit_price: f64,

    // ── Size ──
    pub quantity: f64,

    // ── PnL ──
    /// Entry fee + exit fee, already deducted from `net_pnl`.
    pub fees: f64,
    pub net_pnl: f64,

    // ── Duration ──
    pub bars_held: usize,
}

impl TradeRecord {
    /// Return on the trade as a fraction of entry cost.
    pub fn return_pct(&self) -> f64 {
        if self.entry_price == 0.0 || self.quantity == 0.0 {
            return 0.0;
        }
        self.net_pnl / (self.entry_price * self.quantity)
    }

    pub fn is_winner(&self) -> bool {
        self.net_pnl > 0.0
    }
}

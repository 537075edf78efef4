//! Execution parameters for a backtest run.
//!
//! Everything the tracker needs to cost and size orders lives here.
//! Configs are validated before a run starts; the tracker assumes
//! in-range values.

use serde::{Deserialize, Serialize};

use super::EngineError;

/// Per-run execution settings. Serde defaults let a config file name
/// only the fields it overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub initial_balance: f64,
    /// Taker fee as a fraction per side.
    pub fee_rate: f64,
    pub slippage: SlippageConfig,
    pub sizing: SizingConfig,
    /// Stop distance as a fraction of the entry fill, long side:
    /// stop = entry * (1 - pct).
    pub stop_loss_pct: Option<f64>,
    /// Target distance as a fraction of the entry fill, long side:
    /// take-profit = entry * (1 + pct).
    pub take_profit_pct: Option<f64>,
    /// Signals weaker than this never open a position.
    pub min_signal_strength: f64,
    /// Orders below this notional are suppressed as dust.
    pub min_notional: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            initial_balance: 10_000.0,
            fee_rate: 0.001,
            slippage: SlippageConfig::default(),
            sizing: SizingConfig::default(),
            stop_loss_pct: Some(0.05),
            take_profit_pct: Some(0.15),
            min_signal_strength: 0.6,
            min_notional: 10.0,
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> Result<(), EngineError> {
        if !(self.initial_balance.is_finite() && self.initial_balance > 0.0) {
            return Err(EngineError::invalid(
                "initial_balance",
                "must be a positive finite number",
            ));
        }
        if !(self.fee_rate.is_finite() && (0.0..1.0).contains(&self.fee_rate)) {
            return Err(EngineError::invalid("fee_rate", "must be in [0, 1)"));
        }
        if let Some(pct) = self.stop_loss_pct {
            if !(pct.is_finite() && pct > 0.0 && pct < 1.0) {
                return Err(EngineError::invalid("stop_loss_pct", "must be in (0, 1)"));
            }
        }
        if let Some(pct) = self.take_profit_pct {
            if !(pct.is_finite() && pct > 0.0 && pct < 1.0) {
                return Err(EngineError::invalid("take_profit_pct", "must be in (0, 1)"));
            }
        }
        if !(self.min_signal_strength.is_finite()
            && (0.0..=1.0).contains(&self.min_signal_strength))
        {
            return Err(EngineError::invalid(
                "min_signal_strength",
                "must be in [0, 1]",
            ));
        }
        if !(self.min_notional.is_finite() && self.min_notional >= 0.0) {
            return Err(EngineError::invalid("min_notional", "must be non-negative"));
        }
        self.slippage.validate()?;
        self.sizing.validate()
    }
}

/// Fill-price adjustment model. Slippage is always adverse: buys fill
/// above the reference price, sells below it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SlippageConfig {
    None,
    FixedBps { bps: f64 },
    Percentage { pct: f64 },
}

impl Default for SlippageConfig {
    fn default() -> Self {
        Self::Percentage { pct: 0.001 }
    }
}

impl SlippageConfig {
    fn rate(&self) -> f64 {
        match self {
            Self::None => 0.0,
            Self::FixedBps { bps } => bps / 10_000.0,
            Self::Percentage { pct } => *pct,
        }
    }

    /// Ask-side fill for a buy.
    pub fn buy_price(&self, reference: f64) -> f64 {
        reference * (1.0 + self.rate())
    }

    /// Bid-side fill for a sell.
    pub fn sell_price(&self, reference: f64) -> f64 {
        reference * (1.0 - self.rate())
    }

    fn validate(&self) -> Result<(), EngineError> {
        let rate = self.rate();
        if !(rate.is_finite() && (0.0..1.0).contains(&rate)) {
            return Err(EngineError::invalid("slippage", "rate must be in [0, 1)"));
        }
        Ok(())
    }
}

/// Order sizing rule, expressed against current equity.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SizingConfig {
    /// Fixed fraction of equity per entry.
    EquityFraction { fraction: f64 },
    /// Equity * base_fraction * signal strength, capped at
    /// equity * max_fraction.
    StrengthScaled { base_fraction: f64, max_fraction: f64 },
    /// Constant notional regardless of equity.
    FixedNotional { amount: f64 },
}

impl Default for SizingConfig {
    fn default() -> Self {
        Self::StrengthScaled {
            base_fraction: 0.10,
            max_fraction: 0.20,
        }
    }
}

impl SizingConfig {
    /// Target order notional for the given equity and signal strength.
    pub fn target_notional(&self, equity: f64, strength: f64) -> f64 {
        match self {
            Self::EquityFraction { fraction } => equity * fraction,
            Self::StrengthScaled {
                base_fraction,
                max_fraction,
            } => (equity * base_fraction * strength).min(equity * max_fraction),
            Self::FixedNotional { amount } => *amount,
        }
    }

    fn validate(&self) -> Result<(), EngineError> {
        match self {
            Self::EquityFraction { fraction } => {
                if !(fraction.is_finite() && *fraction > 0.0 && *fraction <= 1.0) {
                    return Err(EngineError::invalid("fraction", "must be in (0, 1]"));
                }
            }
            Self::StrengthScaled {
                base_fraction,
                max_fraction,
            } => {
                if !(base_fraction.is_finite() && *base_fraction > 0.0 && *base_fraction <= 1.0) {
                    return Err(EngineError::invalid("base_fraction", "must be in (0, 1]"));
                }
                if !(max_fraction.is_finite() && *max_fraction > 0.0 && *max_fraction <= 1.0) {
                    return Err(EngineError::invalid("max_fraction", "must be in (0, 1]"));
                }
            }
            Self::FixedNotional { amount } => {
                if !(amount.is_finite() && *amount > 0.0) {
                    return Err(EngineError::invalid(
                        "amount",
                        "must be a positive finite number",
                    ));
                }
            }
        }
        Ok(())
    }
}

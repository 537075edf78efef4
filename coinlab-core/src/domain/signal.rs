//! Signal — a strategy's per-bar trading decision.

use serde::{Deserialize, Serialize};

/// Discrete trading action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Action {
    Buy,
    Sell,
    Hold,
}

/// A trading decision with a confidence weight.
///
/// `strength` lives in [0, 1] and feeds the position sizing rule. The
/// constructors clamp it (NaN becomes 0), so the tracker never sees an
/// out-of-range size fraction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    pub action: Action,
    pub strength: f64,
}

impl Signal {
    pub fn buy(strength: f64) -> Self {
        Self {
            action: Action::Buy,
            strength: clamp_strength(strength),
        }
    }

    pub fn sell(strength: f64) -> Self {
        Self {
            action: Action::Sell,
            strength: clamp_strength(strength),
        }
    }

    pub fn hold() -> Self {
        Self {
            action: Action::Hold,
            strength: 0.0,
        }
    }

    pub fn is_hold(&self) -> bool {
        self.action == Action::Hold
    }
}

fn clamp_strength(strength: f64) -> f64 {
    if strength.is_nan() {
        0.0
    } else {
        strength.clamp(0.0, 1.0)
    }
}

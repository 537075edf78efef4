//! Strategy construction from declarative specs.
//!
//! [`StrategySpec`] is the serializable description of a strategy and its
//! parameters; [`build_strategy`] validates a spec and turns it into a
//! boxed [`Strategy`]. Parameter defaults mirror the classic textbook
//! settings so a config file only has to name what it overrides.

use serde::{Deserialize, Serialize};

use super::{BollingerReversion, Combined, MaCross, MacdCross, RsiReversal, Strategy};
use crate::domain::Timeframe;
use crate::engine::EngineError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StrategySpec {
    MaCross {
        #[serde(default = "default_fast_period")]
        fast_period: usize,
        #[serde(default = "default_slow_period")]
        slow_period: usize,
        #[serde(default = "default_ma_timeframe")]
        timeframe: Timeframe,
    },
    Rsi {
        #[serde(default = "default_rsi_period")]
        period: usize,
        #[serde(default = "default_oversold")]
        oversold: f64,
        #[serde(default = "default_overbought")]
        overbought: f64,
        #[serde(default = "default_rsi_timeframe")]
        timeframe: Timeframe,
    },
    Macd {
        #[serde(default = "default_fast_period")]
        fast_period: usize,
        #[serde(default = "default_slow_period")]
        slow_period: usize,
        #[serde(default = "default_signal_period")]
        signal_period: usize,
        #[serde(default = "default_macd_timeframe")]
        timeframe: Timeframe,
    },
    BollingerBands {
        #[serde(default = "default_bollinger_period")]
        period: usize,
        #[serde(default = "default_bollinger_k")]
        k: f64,
        #[serde(default = "default_bollinger_timeframe")]
        timeframe: Timeframe,
    },
    Combined {
        #[serde(default = "default_members")]
        members: Vec<StrategySpec>,
        #[serde(default = "default_min_agree")]
        min_agree: usize,
    },
}

impl StrategySpec {
    /// Default spec for a registry name, as used by `--strategy` on the
    /// command line.
    pub fn default_for(name: &str) -> Result<Self, EngineError> {
        match name {
            "ma_cross" => Ok(ma_cross_defaults()),
            "rsi" => Ok(rsi_defaults()),
            "macd" => Ok(macd_defaults()),
            "bollinger_bands" => Ok(bollinger_defaults()),
            "combined" => Ok(Self::Combined {
                members: default_members(),
                min_agree: default_min_agree(),
            }),
            other => Err(EngineError::UnknownStrategy(other.to_string())),
        }
    }
}

fn ma_cross_defaults() -> StrategySpec {
    StrategySpec::MaCross {
        fast_period: default_fast_period(),
        slow_period: default_slow_period(),
        timeframe: default_ma_timeframe(),
    }
}

fn rsi_defaults() -> StrategySpec {
    StrategySpec::Rsi {
        period: default_rsi_period(),
        oversold: default_oversold(),
        overbought: default_overbought(),
        timeframe: default_rsi_timeframe(),
    }
}

fn macd_defaults() -> StrategySpec {
    StrategySpec::Macd {
        fast_period: default_fast_period(),
        slow_period: default_slow_period(),
        signal_period: default_signal_period(),
        timeframe: default_macd_timeframe(),
    }
}

fn bollinger_defaults() -> StrategySpec {
    StrategySpec::BollingerBands {
        period: default_bollinger_period(),
        k: default_bollinger_k(),
        timeframe: default_bollinger_timeframe(),
    }
}

fn default_fast_period() -> usize {
    12
}

fn default_slow_period() -> usize {
    26
}

fn default_signal_period() -> usize {
    9
}

fn default_rsi_period() -> usize {
    14
}

fn default_oversold() -> f64 {
    30.0
}

fn default_overbought() -> f64 {
    70.0
}

fn default_bollinger_period() -> usize {
    20
}

fn default_bollinger_k() -> f64 {
    2.0
}

fn default_ma_timeframe() -> Timeframe {
    Timeframe::M15
}

fn default_rsi_timeframe() -> Timeframe {
    Timeframe::H1
}

fn default_macd_timeframe() -> Timeframe {
    Timeframe::H4
}

fn default_bollinger_timeframe() -> Timeframe {
    Timeframe::H1
}

fn default_members() -> Vec<StrategySpec> {
    vec![
        ma_cross_defaults(),
        rsi_defaults(),
        macd_defaults(),
        bollinger_defaults(),
    ]
}

fn default_min_agree() -> usize {
    2
}

fn invalid(field: &'static str, constraint: impl Into<String>) -> EngineError {
    EngineError::invalid(field, constraint)
}

/// Validates a spec and builds the strategy it describes.
///
/// All parameter checking happens here so the constructors can assume
/// well-formed inputs.
pub fn build_strategy(spec: &StrategySpec) -> Result<Box<dyn Strategy>, EngineError> {
    match spec {
        StrategySpec::MaCross {
            fast_period,
            slow_period,
            timeframe,
        } => {
            if *fast_period < 1 {
                return Err(invalid("fast_period", "must be >= 1"));
            }
            if fast_period >= slow_period {
                return Err(invalid(
                    "fast_period",
                    format!("must be < slow_period ({slow_period})"),
                ));
            }
            Ok(Box::new(MaCross::new(*fast_period, *slow_period, *timeframe)))
        }
        StrategySpec::Rsi {
            period,
            oversold,
            overbought,
            timeframe,
        } => {
            if *period < 2 {
                return Err(invalid("period", "must be >= 2"));
            }
            if !(*oversold > 0.0 && oversold < overbought && *overbought < 100.0) {
                return Err(invalid(
                    "oversold",
                    "bands must satisfy 0 < oversold < overbought < 100",
                ));
            }
            Ok(Box::new(RsiReversal::new(
                *period,
                *oversold,
                *overbought,
                *timeframe,
            )))
        }
        StrategySpec::Macd {
            fast_period,
            slow_period,
            signal_period,
            timeframe,
        } => {
            if *fast_period < 1 {
                return Err(invalid("fast_period", "must be >= 1"));
            }
            if fast_period >= slow_period {
                return Err(invalid(
                    "fast_period",
                    format!("must be < slow_period ({slow_period})"),
                ));
            }
            if *signal_period < 1 {
                return Err(invalid("signal_period", "must be >= 1"));
            }
            Ok(Box::new(MacdCross::new(
                *fast_period,
                *slow_period,
                *signal_period,
                *timeframe,
            )))
        }
        StrategySpec::BollingerBands {
            period,
            k,
            timeframe,
        } => {
            if *period < 2 {
                return Err(invalid("period", "must be >= 2"));
            }
            if !(k.is_finite() && *k > 0.0) {
                return Err(invalid("k", "must be a positive finite number"));
            }
            Ok(Box::new(BollingerReversion::new(*period, *k, *timeframe)))
        }
        StrategySpec::Combined { members, min_agree } => {
            if members.len() < 2 {
                return Err(invalid("members", "needs at least two member strategies"));
            }
            if *min_agree < 1 || *min_agree > members.len() {
                return Err(invalid(
                    "min_agree",
                    format!("must be between 1 and {}", members.len()),
                ));
            }
            let built = members
                .iter()
                .map(build_strategy)
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Box::new(Combined::new(built, *min_agree)))
        }
    }
}

//! Backtest engine: run configuration, portfolio tracking, and the
//! bar-by-bar simulation loop.

mod config;
mod run;
mod state;
mod tracker;

pub use config::{EngineConfig, SizingConfig, SlippageConfig};
pub use run::{run_backtest, RunOutcome};
pub use state::RunState;
pub use tracker::PortfolioTracker;

use chrono::{DateTime, Utc};
use thiserror::Error;

/// Fatal engine errors. Anything that would make the equity curve or
/// the report internally inconsistent aborts the run; recoverable
/// conditions (indicator gaps, degenerate statistics) are counted or
/// defaulted instead of raised.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("invalid parameter {field}: {constraint}")]
    InvalidParameter {
        field: &'static str,
        constraint: String,
    },

    #[error("bar series is empty")]
    EmptySeries,

    /// Timestamps must strictly increase; the offending bar index is
    /// carried for diagnostics.
    #[error("bar {index} at {timestamp} does not advance past {previous}")]
    NonChronological {
        index: usize,
        timestamp: DateTime<Utc>,
        previous: DateTime<Utc>,
    },

    #[error("unknown strategy '{0}' (known: ma_cross, rsi, macd, bollinger_bands, combined)")]
    UnknownStrategy(String),
}

impl EngineError {
    pub(crate) fn invalid(field: &'static str, constraint: impl Into<String>) -> Self {
        Self::InvalidParameter {
            field,
            constraint: constraint.into(),
        }
    }
}

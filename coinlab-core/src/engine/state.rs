//! Run lifecycle states.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Lifecycle of a single backtest run.
///
/// A run moves `Initialized -> Running -> Completed`; `Failed` marks a
/// run aborted by a fatal data or configuration error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RunState {
    Initialized,
    Running,
    Completed,
    Failed,
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Initialized => "INITIALIZED",
            Self::Running => "RUNNING",
            Self::Completed => "COMPLETED",
            Self::Failed => "FAILED",
        };
        f.write_str(label)
    }
}

//! Domain types for coinlab.

pub mod bar;
pub mod portfolio;
pub mod position;
pub mod signal;
pub mod timeframe;
pub mod trade;

pub use bar::{Bar, BarError};
pub use portfolio::{EquityPoint, Portfolio};
pub use position::Position;
pub use signal::{Action, Signal};
pub use timeframe::{ParseTimeframeError, Timeframe};
pub use trade::{CloseReason, TradeRecord};

/// Symbol type alias
pub type Symbol = String;

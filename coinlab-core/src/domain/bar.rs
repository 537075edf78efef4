//! Bar — the fundamental market data unit.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// OHLCV candle for a single symbol at a single timeframe.
///
/// Immutable once constructed. `Bar::new` enforces OHLC coherence so the
/// engine never sees a candle whose range excludes its own open or close.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum BarError {
    #[error("bar at {0}: prices must be finite and positive")]
    InvalidPrice(DateTime<Utc>),
    #[error("bar at {0}: high is below open or close")]
    HighBelowBody(DateTime<Utc>),
    #[error("bar at {0}: low is above open or close")]
    LowAboveBody(DateTime<Utc>),
    #[error("bar at {0}: volume must be finite and non-negative")]
    InvalidVolume(DateTime<Utc>),
}

impl Bar {
    /// Validated constructor. Deserialized bars bypass this, so loaders
    /// that accept external data re-check with [`Bar::validate`].
    pub fn new(
        timestamp: DateTime<Utc>,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
        volume: f64,
    ) -> Result<Self, BarError> {
        let bar = Self {
            timestamp,
            open,
            high,
            low,
            close,
            volume,
        };
        bar.validate()?;
        Ok(bar)
    }

    /// OHLCV coherence check: finite positive prices, finite non-negative
    /// volume, and a high/low range that contains the open and close.
    pub fn validate(&self) -> Result<(), BarError> {
        let prices = [self.open, self.high, self.low, self.close];
        if prices.iter().any(|p| !p.is_finite() || *p <= 0.0) {
            return Err(BarError::InvalidPrice(self.timestamp));
        }
        if self.high < self.open.max(self.close) {
            return Err(BarError::HighBelowBody(self.timestamp));
        }
        if self.low > self.open.min(self.close) {
            return Err(BarError::LowAboveBody(self.timestamp));
        }
        if !self.volume.is_finite() || self.volume < 0.0 {
            return Err(BarError::InvalidVolume(self.timestamp));
        }
        Ok(())
    }
}

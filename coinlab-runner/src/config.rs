//! Serializable backtest configuration.
//!
//! A [`BacktestConfig`] is the complete, reproducible description of one
//! run: what to trade, over which data, with which strategy and execution
//! model. Configs load from TOML, validate eagerly, and hash to a stable
//! [`run_id`](BacktestConfig::run_id) used to name artifact directories
//! and correlate log lines.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use coinlab_core::domain::Timeframe;
use coinlab_core::engine::{EngineConfig, EngineError};
use coinlab_core::strategy::{build_strategy, StrategySpec};

use crate::data::DataConfig;

/// Current schema version for persisted configs and artifacts.
pub const SCHEMA_VERSION: u32 = 1;

/// Hex digits of the blake3 config hash kept as the run id.
const RUN_ID_LEN: usize = 16;

/// Serde default so files written before the field existed still load.
pub(crate) fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

/// Errors from configuration loading and validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("unsupported schema version {found} (max supported {max})")]
    SchemaVersion { found: u32, max: u32 },
    #[error("symbol must not be empty")]
    EmptySymbol,
    #[error("invalid data config: {0}")]
    Data(&'static str),
    #[error(transparent)]
    Invalid(#[from] EngineError),
}

/// Complete configuration for a single backtest run.
///
/// Every field has a default, so a minimal TOML file only names what it
/// overrides:
///
/// ```toml
/// symbol = "ETHUSDT"
/// timeframe = "4h"
///
/// [strategy]
/// type = "rsi"
/// period = 14
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BacktestConfig {
    pub schema_version: u32,
    pub symbol: String,
    pub timeframe: Timeframe,
    pub strategy: StrategySpec,
    pub execution: EngineConfig,
    pub data: DataConfig,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            symbol: "BTCUSDT".to_string(),
            timeframe: Timeframe::H1,
            strategy: StrategySpec::MaCross {
                fast_period: 12,
                slow_period: 26,
                timeframe: Timeframe::H1,
            },
            execution: EngineConfig::default(),
            data: DataConfig::default(),
        }
    }
}

impl BacktestConfig {
    /// Parse from TOML text. Parsed configs still need [`validate`].
    ///
    /// [`validate`]: BacktestConfig::validate
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Read, parse, and validate a TOML config file.
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let config = Self::from_toml(&text)?;
        config.validate()?;
        Ok(config)
    }

    /// Content-addressed run id: the blake3 hash of the canonical JSON
    /// form of this config, truncated to 16 hex characters. Identical
    /// configs always map to the same id, so re-running a config lands
    /// in the same artifact directory.
    pub fn run_id(&self) -> String {
        // Field order is declaration order under serde_json, so the
        // serialization is canonical for a given struct layout.
        let json = serde_json::to_string(self).unwrap_or_default();
        let hash = blake3::hash(json.as_bytes());
        hash.to_hex()[..RUN_ID_LEN].to_string()
    }

    /// Eager validation: schema version, symbol, engine parameter
    /// ranges, strategy parameters (via a throwaway build), and data
    /// source settings. A config that passes here can only fail at run
    /// time on bad data or I/O.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.schema_version > SCHEMA_VERSION {
            return Err(ConfigError::SchemaVersion {
                found: self.schema_version,
                max: SCHEMA_VERSION,
            });
        }
        if self.symbol.trim().is_empty() {
            return Err(ConfigError::EmptySymbol);
        }
        self.execution.validate()?;
        build_strategy(&self.strategy)?;
        match &self.data {
            DataConfig::Csv { .. } => {}
            DataConfig::Synthetic {
                bars, start_price, ..
            } => {
                if *bars == 0 {
                    return Err(ConfigError::Data("synthetic bar count must be at least 1"));
                }
                if !(start_price.is_finite() && *start_price > 0.0) {
                    return Err(ConfigError::Data("start price must be positive and finite"));
                }
            }
            DataConfig::Binance { bars, .. } => {
                if *bars == 0 {
                    return Err(ConfigError::Data("kline count must be at least 1"));
                }
            }
        }
        Ok(())
    }
}

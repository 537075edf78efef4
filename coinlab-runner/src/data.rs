//! Bar loading for the runner: CSV files, seeded synthetic walks, and
//! Binance klines behind one dispatch point.
//!
//! The core assumes the bars it is given are sane; this module is where
//! external data earns that trust. Every source passes the same
//! post-load check: non-empty series, strictly increasing timestamps.
//! OHLC coherence is enforced per bar at construction.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use coinlab_core::domain::{Bar, BarError, Timeframe};

use crate::binance::{self, FetchError};

/// Errors from the data loading layer.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to open '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("CSV error at line {line}: {source}")]
    Csv {
        line: u64,
        #[source]
        source: csv::Error,
    },
    #[error("line {line}: bad timestamp '{value}' (expected RFC 3339 or epoch milliseconds)")]
    Timestamp { line: u64, value: String },
    #[error("invalid bar at line {line}: {source}")]
    Bar {
        line: u64,
        #[source]
        source: BarError,
    },
    #[error("CSV write failed: {0}")]
    Write(#[from] csv::Error),
    #[error("loaded series is empty")]
    Empty,
    #[error("bar {index} at {timestamp} does not advance past the previous bar")]
    OutOfOrder {
        index: usize,
        timestamp: DateTime<Utc>,
    },
    #[error(transparent)]
    Fetch(#[from] FetchError),
}

/// Where bars come from. Tagged so TOML configs read naturally:
///
/// ```toml
/// [data]
/// source = "csv"
/// path = "data/btcusdt_1h.csv"
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum DataConfig {
    /// Local CSV with a `timestamp,open,high,low,close,volume` header.
    Csv { path: PathBuf },
    /// Seeded geometric random walk, for tests and offline runs.
    Synthetic {
        #[serde(default = "default_seed")]
        seed: u64,
        #[serde(default = "default_bar_count")]
        bars: usize,
        #[serde(default = "default_start_price")]
        start_price: f64,
    },
    /// Most recent `bars` candles from the public Binance REST API.
    Binance {
        #[serde(default = "binance::default_api_url")]
        api_url: String,
        #[serde(default = "default_bar_count")]
        bars: usize,
    },
}

impl Default for DataConfig {
    fn default() -> Self {
        DataConfig::Synthetic {
            seed: default_seed(),
            bars: default_bar_count(),
            start_price: default_start_price(),
        }
    }
}

fn default_seed() -> u64 {
    42
}

fn default_bar_count() -> usize {
    1_000
}

fn default_start_price() -> f64 {
    30_000.0
}

/// Load bars for `symbol` at `timeframe` from the configured source.
///
/// The runner's single entry point for market data. The returned series
/// has passed [`validate_series`].
pub fn load_bars(
    config: &DataConfig,
    symbol: &str,
    timeframe: Timeframe,
) -> Result<Vec<Bar>, LoadError> {
    let bars = match config {
        DataConfig::Csv { path } => load_csv(path)?,
        DataConfig::Synthetic {
            seed,
            bars,
            start_price,
        } => generate_synthetic(*seed, *bars, *start_price, timeframe),
        DataConfig::Binance { api_url, bars } => {
            binance::fetch_klines(api_url, symbol, timeframe, *bars)?
        }
    };
    validate_series(&bars)?;
    Ok(bars)
}

/// Non-empty and strictly increasing timestamps. Duplicate or reordered
/// rows are fatal here rather than deep inside the engine loop.
pub fn validate_series(bars: &[Bar]) -> Result<(), LoadError> {
    if bars.is_empty() {
        return Err(LoadError::Empty);
    }
    for (i, pair) in bars.windows(2).enumerate() {
        if pair[1].timestamp <= pair[0].timestamp {
            return Err(LoadError::OutOfOrder {
                index: i + 1,
                timestamp: pair[1].timestamp,
            });
        }
    }
    Ok(())
}

// ─── CSV ────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct CsvRow {
    timestamp: String,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    volume: f64,
}

/// Read bars from a CSV file with a `timestamp,open,high,low,close,volume`
/// header. Timestamps may be RFC 3339 strings or epoch milliseconds.
/// Any malformed row fails the load and names its line.
pub fn load_csv(path: &Path) -> Result<Vec<Bar>, LoadError> {
    let file = std::fs::File::open(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let mut reader = csv::Reader::from_reader(file);

    let mut bars = Vec::new();
    for (i, row) in reader.deserialize::<CsvRow>().enumerate() {
        // Line 1 is the header.
        let line = i as u64 + 2;
        let row = row.map_err(|source| LoadError::Csv { line, source })?;
        let timestamp = parse_timestamp(&row.timestamp).ok_or_else(|| LoadError::Timestamp {
            line,
            value: row.timestamp.clone(),
        })?;
        let bar = Bar::new(timestamp, row.open, row.high, row.low, row.close, row.volume)
            .map_err(|source| LoadError::Bar { line, source })?;
        bars.push(bar);
    }
    Ok(bars)
}

/// Write bars in the same schema [`load_csv`] reads, RFC 3339 timestamps.
pub fn write_csv(bars: &[Bar], path: &Path) -> Result<(), LoadError> {
    let file = std::fs::File::create(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let mut writer = csv::Writer::from_writer(file);
    writer.write_record(["timestamp", "open", "high", "low", "close", "volume"])?;
    for bar in bars {
        writer.write_record([
            bar.timestamp.to_rfc3339().as_str(),
            &bar.open.to_string(),
            &bar.high.to_string(),
            &bar.low.to_string(),
            &bar.close.to_string(),
            &bar.volume.to_string(),
        ])?;
    }
    writer.flush().map_err(csv::Error::from)?;
    Ok(())
}

/// RFC 3339 first, epoch milliseconds second.
fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }
    let millis: i64 = raw.trim().parse().ok()?;
    DateTime::from_timestamp_millis(millis)
}

// ─── Synthetic ──────────────────────────────────────────────────────

/// 2024-01-01T00:00:00Z, where every synthetic series starts.
const SYNTHETIC_EPOCH_SECS: i64 = 1_704_067_200;

/// Deterministic geometric random walk at the given timeframe.
///
/// Same seed, same series: tests, benches, and offline CLI runs rely on
/// this. Bars step by `timeframe.duration()` with no gaps.
pub fn generate_synthetic(
    seed: u64,
    count: usize,
    start_price: f64,
    timeframe: Timeframe,
) -> Vec<Bar> {
    let mut rng = StdRng::seed_from_u64(seed);
    let step = timeframe.duration();
    let mut timestamp =
        DateTime::from_timestamp(SYNTHETIC_EPOCH_SECS, 0).unwrap_or(DateTime::<Utc>::UNIX_EPOCH);

    let mut bars = Vec::with_capacity(count);
    let mut price = start_price;
    for _ in 0..count {
        let bar_return: f64 = rng.gen_range(-0.02..0.02);
        let open = price;
        let close = price * (1.0 + bar_return);
        let high = open.max(close) * (1.0 + rng.gen_range(0.0..0.005));
        let low = open.min(close) * (1.0 - rng.gen_range(0.0..0.005));
        let volume = rng.gen_range(10.0..1_000.0);
        bars.push(Bar {
            timestamp,
            open,
            high,
            low,
            close,
            volume,
        });
        price = close;
        timestamp += step;
    }
    bars
}

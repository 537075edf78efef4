//! Historical klines from the public Binance REST API.
//!
//! One-shot blocking fetch of the most recent N candles, paginated with
//! `endTime` past the 1000-bar page limit. No auth, no retries: a failed
//! page fails the whole fetch and the operator decides whether to run it
//! again.

use chrono::DateTime;
use serde_json::Value;
use thiserror::Error;

use coinlab_core::domain::{Bar, BarError, Timeframe};

/// Public REST base URL.
pub const DEFAULT_API_URL: &str = "https://api.binance.com";

/// Hard per-request row cap imposed by the endpoint.
const MAX_PAGE: usize = 1_000;

pub(crate) fn default_api_url() -> String {
    DEFAULT_API_URL.to_string()
}

/// Errors from the klines fetch.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("klines request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("malformed kline row: {0}")]
    Malformed(String),
    #[error("invalid bar in kline response: {0}")]
    Bar(#[from] BarError),
    #[error("no klines returned for '{0}'")]
    Empty(String),
}

/// Fetch the most recent `count` klines for `symbol` at `timeframe`.
///
/// Pages backwards through history: the first request takes the latest
/// page, each following request ends just before the earliest open time
/// seen so far. Returns bars ascending by open time, at most `count` of
/// them (fewer if the exchange runs out of history).
pub fn fetch_klines(
    api_url: &str,
    symbol: &str,
    timeframe: Timeframe,
    count: usize,
) -> Result<Vec<Bar>, FetchError> {
    let client = reqwest::blocking::Client::builder()
        .timeout(std::time::Duration::from_secs(30))
        .build()?;

    // Pages arrive newest-first; each page is ascending within itself.
    let mut pages: Vec<Vec<Bar>> = Vec::new();
    let mut fetched = 0usize;
    let mut end_time: Option<i64> = None;

    while fetched < count {
        let page_size = MAX_PAGE.min(count - fetched);
        let mut url = format!(
            "{api_url}/api/v3/klines?symbol={symbol}&interval={interval}&limit={page_size}",
            interval = timeframe.as_str(),
        );
        if let Some(end) = end_time {
            url.push_str(&format!("&endTime={end}"));
        }
        log::debug!("GET {url}");

        let rows: Vec<Vec<Value>> = client.get(&url).send()?.error_for_status()?.json()?;
        if rows.is_empty() {
            break;
        }
        let page: Vec<Bar> = rows.iter().map(|row| parse_kline(row)).collect::<Result<_, _>>()?;
        let earliest = field_i64(&rows[0], 0)?;
        end_time = Some(earliest - 1);
        fetched += page.len();
        log::info!(
            "fetched {} klines for {symbol} ({fetched} so far)",
            page.len()
        );

        let exhausted = page.len() < page_size;
        pages.push(page);
        if exhausted {
            break;
        }
    }

    let mut bars: Vec<Bar> = pages.into_iter().rev().flatten().collect();
    if bars.is_empty() {
        return Err(FetchError::Empty(symbol.to_string()));
    }
    // A page that exceeds its requested limit would overshoot `count`;
    // drop the oldest rows so the caller never gets more than asked.
    if bars.len() > count {
        bars.drain(..bars.len() - count);
    }
    Ok(bars)
}

/// One kline row: `[open_time, open, high, low, close, volume, ...]`.
/// Open time is epoch milliseconds; prices arrive as JSON strings.
fn parse_kline(row: &[Value]) -> Result<Bar, FetchError> {
    let millis = field_i64(row, 0)?;
    let timestamp = DateTime::from_timestamp_millis(millis)
        .ok_or_else(|| FetchError::Malformed(format!("open time {millis} out of range")))?;
    Ok(Bar::new(
        timestamp,
        field_f64(row, 1)?,
        field_f64(row, 2)?,
        field_f64(row, 3)?,
        field_f64(row, 4)?,
        field_f64(row, 5)?,
    )?)
}

fn field_i64(row: &[Value], index: usize) -> Result<i64, FetchError> {
    row.get(index)
        .and_then(Value::as_i64)
        .ok_or_else(|| FetchError::Malformed(format!("field {index} is not an integer")))
}

fn field_f64(row: &[Value], index: usize) -> Result<f64, FetchError> {
    let value = row
        .get(index)
        .ok_or_else(|| FetchError::Malformed(format!("field {index} is missing")))?;
    match value {
        Value::String(raw) => raw
            .parse()
            .map_err(|_| FetchError::Malformed(format!("field {index}: '{raw}' is not a number"))),
        Value::Number(n) => n
            .as_f64()
            .ok_or_else(|| FetchError::Malformed(format!("field {index} is not a number"))),
        other => Err(FetchError::Malformed(format!(
            "field {index} has unexpected type: {other}"
        ))),
    }
}

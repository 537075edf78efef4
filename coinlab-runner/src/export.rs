//! Artifact export — JSON result bundles and CSV tapes on disk.
//!
//! Layout: `<output_dir>/<run_id>/` holding `report.json` (the full
//! [`BacktestResult`]), `trades.csv`, and `equity.csv`. All JSON
//! artifacts carry `schema_version`; unknown versions are rejected on
//! load.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};

use coinlab_core::domain::{EquityPoint, TradeRecord};

use crate::config::SCHEMA_VERSION;
use crate::runner::BacktestResult;
use crate::sweep::SweepResult;

// ─── JSON ───────────────────────────────────────────────────────────

/// Serialize a result to pretty JSON.
pub fn export_json(result: &BacktestResult) -> Result<String> {
    serde_json::to_string_pretty(result).context("failed to serialize BacktestResult to JSON")
}

/// Deserialize a result from JSON, rejecting unknown schema versions.
pub fn import_json(json: &str) -> Result<BacktestResult> {
    let result: BacktestResult =
        serde_json::from_str(json).context("failed to deserialize BacktestResult from JSON")?;
    if result.schema_version > SCHEMA_VERSION {
        bail!(
            "unsupported schema version {} (max supported: {})",
            result.schema_version,
            SCHEMA_VERSION
        );
    }
    Ok(result)
}

// ─── CSV ────────────────────────────────────────────────────────────

/// Trade tape: one row per closed trade, RFC 3339 timestamps.
pub fn export_trades_csv(trades: &[TradeRecord]) -> Result<String> {
    let mut writer = csv::Writer::from_writer(vec![]);
    writer.write_record([
        "symbol",
        "entry_time",
        "exit_time",
        "entry_price",
        "exit_price",
        "quantity",
        "fees",
        "net_pnl",
        "return_pct",
        "bars_held",
        "reason",
    ])?;

    for trade in trades {
        writer.write_record([
            trade.symbol.as_str(),
            &trade.entry_time.to_rfc3339(),
            &trade.exit_time.to_rfc3339(),
            &format!("{:.8}", trade.entry_price),
            &format!("{:.8}", trade.exit_price),
            &format!("{:.8}", trade.quantity),
            &format!("{:.8}", trade.fees),
            &format!("{:.8}", trade.net_pnl),
            &format!("{:.6}", trade.return_pct()),
            &trade.bars_held.to_string(),
            &format!("{:?}", trade.reason),
        ])?;
    }

    let data = writer.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

/// Equity curve: timestamp, total equity, and its cash/position split.
pub fn export_equity_csv(equity_curve: &[EquityPoint]) -> Result<String> {
    let mut writer = csv::Writer::from_writer(vec![]);
    writer.write_record(["timestamp", "equity", "cash", "position_value"])?;
    for point in equity_curve {
        writer.write_record([
            point.timestamp.to_rfc3339().as_str(),
            &format!("{:.2}", point.equity),
            &format!("{:.2}", point.cash),
            &format!("{:.2}", point.position_value),
        ])?;
    }
    let data = writer.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

// ─── Artifact bundle ────────────────────────────────────────────────

/// Write the full artifact set under `<output_dir>/<run_id>/`.
///
/// Returns the created directory. Re-running an identical config
/// overwrites its own artifacts in place.
pub fn save_artifacts(result: &BacktestResult, output_dir: &Path) -> Result<PathBuf> {
    let run_dir = output_dir.join(&result.run_id);
    std::fs::create_dir_all(&run_dir)
        .with_context(|| format!("failed to create artifact dir {}", run_dir.display()))?;

    std::fs::write(run_dir.join("report.json"), export_json(result)?)
        .context("failed to write report.json")?;
    std::fs::write(run_dir.join("trades.csv"), export_trades_csv(&result.trades)?)
        .context("failed to write trades.csv")?;
    std::fs::write(
        run_dir.join("equity.csv"),
        export_equity_csv(&result.equity_curve)?,
    )
    .context("failed to write equity.csv")?;

    Ok(run_dir)
}

/// Load a result back from an artifact directory's `report.json`,
/// rejecting unknown schema versions.
pub fn load_artifacts(dir: &Path) -> Result<BacktestResult> {
    let path = dir.join("report.json");
    let json = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    import_json(&json)
}

/// Write a sweep's ranked outcomes as `sweep.json` under `output_dir`.
pub fn save_sweep(sweep: &SweepResult, output_dir: &Path) -> Result<PathBuf> {
    std::fs::create_dir_all(output_dir)
        .with_context(|| format!("failed to create {}", output_dir.display()))?;
    let path = output_dir.join("sweep.json");
    let json =
        serde_json::to_string_pretty(sweep).context("failed to serialize SweepResult to JSON")?;
    std::fs::write(&path, json).with_context(|| format!("failed to write {}", path.display()))?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use coinlab_core::domain::CloseReason;

    #[test]
    fn trade_tape_has_header_and_one_row_per_trade() {
        let trade = TradeRecord {
            symbol: "BTCUSDT".into(),
            reason: CloseReason::TakeProfit,
            entry_time: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            entry_price: 40_000.0,
            exit_time: Utc.with_ymd_and_hms(2024, 1, 1, 6, 0, 0).unwrap(),
            exit_price: 41_000.0,
            quantity: 0.025,
            fees: 2.025,
            net_pnl: 22.975,
            bars_held: 6,
        };
        let csv = export_trades_csv(&[trade.clone(), trade]).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("symbol,entry_time,exit_time"));
        assert!(lines[1].contains("TakeProfit"));
        assert!(lines[1].contains("2024-01-01T00:00:00+00:00"));
    }

    #[test]
    fn equity_tape_has_header_and_split_columns() {
        let point = EquityPoint {
            timestamp: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            equity: 10_050.0,
            cash: 9_000.0,
            position_value: 1_050.0,
        };
        let csv = export_equity_csv(&[point]).unwrap();
        assert_eq!(
            csv.lines().next().unwrap(),
            "timestamp,equity,cash,position_value"
        );
        assert!(csv.contains("10050.00,9000.00,1050.00"));
    }
}

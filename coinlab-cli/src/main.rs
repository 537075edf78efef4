//! CoinLab CLI — run, sweep, and fetch commands.
//!
//! Commands:
//! - `run` — execute a backtest from a TOML config file and save artifacts
//! - `sweep` — grid-search MA crossover periods over one shared data set
//! - `fetch` — download Binance klines and write them to a CSV file

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use coinlab_core::domain::Timeframe;
use coinlab_core::strategy::StrategySpec;
use coinlab_runner::{
    fetch_klines, run, run_sweep, save_artifacts, save_sweep, write_csv, BacktestConfig,
    BacktestResult, ParamGrid, SweepResult, DEFAULT_API_URL,
};
use std::path::{Path, PathBuf};
use std::str::FromStr;

#[derive(Parser)]
#[command(
    name = "coinlab",
    about = "CoinLab CLI — crypto strategy backtesting engine"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Execute a backtest from a TOML config file.
    Run {
        /// Path to a TOML config file.
        #[arg(long)]
        config: PathBuf,

        /// Override the config's strategy with the named one at default
        /// parameters: ma_cross, rsi, macd, bollinger_bands, combined.
        #[arg(long)]
        strategy: Option<String>,

        /// Output directory; artifacts land in <out>/<run_id>/.
        #[arg(long, default_value = "results")]
        out: PathBuf,

        /// Print the full report as JSON instead of the summary table.
        #[arg(long, default_value_t = false)]
        json: bool,

        /// Suppress the summary table (artifacts are still written).
        #[arg(long, default_value_t = false)]
        quiet: bool,
    },
    /// Grid-search MA crossover periods over one shared data set.
    Sweep {
        /// Path to a TOML config file. Its strategy section is ignored;
        /// each grid point substitutes its own crossover periods.
        #[arg(long)]
        config: PathBuf,

        /// Comma-separated fast periods (e.g. 5,8,12,20).
        #[arg(long)]
        fast: Option<String>,

        /// Comma-separated slow periods (e.g. 20,26,50,100).
        #[arg(long)]
        slow: Option<String>,

        /// Output directory for sweep.json.
        #[arg(long, default_value = "results")]
        out: PathBuf,
    },
    /// Download Binance klines and write them to a CSV file.
    Fetch {
        /// Trading pair (e.g. BTCUSDT).
        #[arg(long)]
        symbol: String,

        /// Candle interval: 1m, 5m, 15m, 1h, 4h, 1d.
        #[arg(long, default_value = "1h")]
        timeframe: String,

        /// Number of most recent candles to fetch.
        #[arg(long, default_value_t = 1000)]
        limit: usize,

        /// Destination CSV file.
        #[arg(long)]
        out: PathBuf,

        /// Binance REST API base URL.
        #[arg(long, default_value = DEFAULT_API_URL)]
        api_url: String,
    },
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            config,
            strategy,
            out,
            json,
            quiet,
        } => run_cmd(&config, strategy.as_deref(), &out, json, quiet),
        Commands::Sweep {
            config,
            fast,
            slow,
            out,
        } => sweep_cmd(&config, fast.as_deref(), slow.as_deref(), &out),
        Commands::Fetch {
            symbol,
            timeframe,
            limit,
            out,
            api_url,
        } => fetch_cmd(&symbol, &timeframe, limit, &out, &api_url),
    }
}

fn run_cmd(
    config_path: &Path,
    strategy: Option<&str>,
    out: &Path,
    json: bool,
    quiet: bool,
) -> Result<()> {
    if json && quiet {
        bail!("--json and --quiet are mutually exclusive");
    }

    let mut config = BacktestConfig::from_path(config_path)
        .with_context(|| format!("failed to load config {}", config_path.display()))?;
    if let Some(name) = strategy {
        config.strategy = StrategySpec::default_for(name)?;
        log::info!("strategy overridden to '{name}' at default parameters");
    }

    let result = run(&config, None)?;

    let run_dir = save_artifacts(&result, out)?;

    if json {
        // Keep stdout pure JSON; route the artifact path through the log.
        println!("{}", serde_json::to_string_pretty(&result.report)?);
        log::info!("artifacts saved to {}", run_dir.display());
    } else {
        if !quiet {
            print_summary(&result);
        }
        println!("Artifacts saved to: {}", run_dir.display());
    }

    Ok(())
}

fn sweep_cmd(config_path: &Path, fast: Option<&str>, slow: Option<&str>, out: &Path) -> Result<()> {
    let config = BacktestConfig::from_path(config_path)
        .with_context(|| format!("failed to load config {}", config_path.display()))?;

    let mut grid = ParamGrid::ma_cross_default();
    if let Some(list) = fast {
        grid.fast_periods = parse_period_list(list).context("invalid --fast list")?;
    }
    if let Some(list) = slow {
        grid.slow_periods = parse_period_list(list).context("invalid --slow list")?;
    }

    let sweep = run_sweep(&config, &grid)?;
    print_sweep_table(&sweep);

    let path = save_sweep(&sweep, out)?;
    println!("Sweep saved to: {}", path.display());

    Ok(())
}

fn fetch_cmd(
    symbol: &str,
    timeframe: &str,
    limit: usize,
    out: &Path,
    api_url: &str,
) -> Result<()> {
    let timeframe = Timeframe::from_str(timeframe)?;
    if limit == 0 {
        bail!("--limit must be at least 1");
    }

    let bars = fetch_klines(api_url, symbol, timeframe, limit)?;
    write_csv(&bars, out)?;

    match (bars.first(), bars.last()) {
        (Some(first), Some(last)) => println!(
            "Wrote {} {} bars ({} to {}) to {}",
            bars.len(),
            timeframe.as_str(),
            format_time(first.timestamp),
            format_time(last.timestamp),
            out.display()
        ),
        _ => println!("Wrote {} bars to {}", bars.len(), out.display()),
    }

    Ok(())
}

/// Comma- or whitespace-separated list of positive integers.
fn parse_period_list(list: &str) -> Result<Vec<usize>> {
    let periods = list
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|part| !part.is_empty())
        .map(|part| {
            part.parse::<usize>()
                .with_context(|| format!("bad period '{part}'"))
        })
        .collect::<Result<Vec<usize>>>()?;
    if periods.is_empty() {
        bail!("empty period list");
    }
    Ok(periods)
}

fn format_time(ts: DateTime<Utc>) -> String {
    ts.format("%Y-%m-%d %H:%M").to_string()
}

fn print_summary(result: &BacktestResult) {
    let report = &result.report;
    println!();
    println!("=== Backtest Result ===");
    println!("Run:            {}", result.run_id);
    println!("Symbol:         {}", result.config.symbol);
    println!("Timeframe:      {}", result.config.timeframe.as_str());
    if let (Some(first), Some(last)) = (result.equity_curve.first(), result.equity_curve.last()) {
        println!(
            "Period:         {} to {}",
            format_time(first.timestamp),
            format_time(last.timestamp)
        );
    }
    println!(
        "Bars:           {} ({} processed)",
        result.bar_count, result.bars_processed
    );
    println!(
        "Signals:        {} buy, {} sell",
        result.buy_signals, result.sell_signals
    );
    println!("Trades:         {}", report.trade_count);
    println!();
    println!("--- Performance ---");
    println!("Total Return:   {:.2}%", report.total_return_pct * 100.0);
    println!("Final Balance:  {:.2}", report.final_balance);
    println!("Sharpe:         {:.3}", report.sharpe);
    println!("Max Drawdown:   {:.2}%", report.max_drawdown * 100.0);
    println!("Win Rate:       {:.1}%", report.win_rate * 100.0);
    println!("Profit Factor:  {:.2}", report.profit_factor);
    println!(
        "Avg Win/Loss:   {:.2} / {:.2}",
        report.avg_win, report.avg_loss
    );
    println!("Avg Bars Held:  {:.1}", report.avg_bars_held);
    println!("Total Fees:     {:.2}", report.total_fees);
    if result.cancelled {
        println!();
        println!("WARNING: run cancelled before the final bar");
    }
    if result.gap_warnings > 0 {
        println!(
            "WARNING: {} timestamp gaps in the input series",
            result.gap_warnings
        );
    }
    println!();
}

fn print_sweep_table(sweep: &SweepResult) {
    println!();
    println!(
        "=== Sweep: {} {} over {} bars ===",
        sweep.symbol,
        sweep.timeframe.as_str(),
        sweep.bar_count
    );
    if sweep.skipped_pairs > 0 {
        println!("Skipped {} fast >= slow pairs", sweep.skipped_pairs);
    }
    println!();
    println!(
        "{:<6} {:<6} {:>10} {:>8} {:>10} {:>8} {:>8}",
        "Fast", "Slow", "Return", "Sharpe", "Drawdown", "Trades", "WinRate"
    );
    println!("{}", "-".repeat(62));
    for entry in &sweep.entries {
        println!(
            "{:<6} {:<6} {:>9.2}% {:>8.3} {:>9.2}% {:>8} {:>7.1}%",
            entry.fast_period,
            entry.slow_period,
            entry.report.total_return_pct * 100.0,
            entry.report.sharpe,
            entry.report.max_drawdown * 100.0,
            entry.report.trade_count,
            entry.report.win_rate * 100.0,
        );
    }
    if let Some(best) = sweep.best() {
        println!();
        println!(
            "Best: fast={} slow={} ({:+.2}%)",
            best.fast_period,
            best.slow_period,
            best.report.total_return_pct * 100.0
        );
    }
}

//! Parameter sweeps — parallel grid search over MA crossover periods.
//!
//! The grid expands to one run per (fast, slow) pair with fast < slow.
//! Data loads once; grid points replay it independently on the rayon
//! pool, each with its own portfolio. Results rank by total return,
//! best first.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use coinlab_core::domain::Timeframe;
use coinlab_core::strategy::StrategySpec;

use crate::config::{default_schema_version, BacktestConfig, SCHEMA_VERSION};
use crate::data::load_bars;
use crate::report::PerformanceReport;
use crate::runner::{run_with_bars, RunError};

/// Cartesian grid of MA crossover periods.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParamGrid {
    pub fast_periods: Vec<usize>,
    pub slow_periods: Vec<usize>,
}

impl ParamGrid {
    /// Starting grid around the classic 12/26 pairing.
    pub fn ma_cross_default() -> Self {
        Self {
            fast_periods: vec![5, 8, 12, 20],
            slow_periods: vec![20, 26, 50, 100],
        }
    }

    /// Upper bound on grid size; invalid pairs are dropped at expansion.
    pub fn size(&self) -> usize {
        self.fast_periods.len() * self.slow_periods.len()
    }

    /// Every (fast, slow) pair with fast < slow, in grid order.
    /// Degenerate pairs are skipped, not errors.
    pub fn valid_pairs(&self) -> Vec<(usize, usize)> {
        let mut pairs = Vec::new();
        for &fast in &self.fast_periods {
            for &slow in &self.slow_periods {
                if fast < slow {
                    pairs.push((fast, slow));
                }
            }
        }
        pairs
    }
}

/// One grid point's outcome, trimmed to what ranking needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepEntry {
    pub run_id: String,
    pub fast_period: usize,
    pub slow_period: usize,
    pub report: PerformanceReport,
}

/// All grid outcomes over one series, ranked by total return descending.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepResult {
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub symbol: String,
    pub timeframe: Timeframe,
    pub bar_count: usize,
    pub skipped_pairs: usize,
    pub entries: Vec<SweepEntry>,
}

impl SweepResult {
    /// The top-ranked entry, if the grid produced any runs.
    pub fn best(&self) -> Option<&SweepEntry> {
        self.entries.first()
    }
}

/// Expand the grid against `base` and run every point in parallel over
/// one shared series. Any failing run fails the whole sweep.
///
/// The base config's strategy section is ignored; each grid point
/// substitutes its own MA crossover spec at the base timeframe.
pub fn run_sweep(base: &BacktestConfig, grid: &ParamGrid) -> Result<SweepResult, RunError> {
    base.validate()?;
    let bars = load_bars(&base.data, &base.symbol, base.timeframe)?;
    let pairs = grid.valid_pairs();
    let skipped_pairs = grid.size() - pairs.len();
    log::info!(
        "sweep: {} grid points ({} skipped) over {} bars of {}",
        pairs.len(),
        skipped_pairs,
        bars.len(),
        base.symbol
    );

    let mut entries: Vec<SweepEntry> = pairs
        .par_iter()
        .map(|&(fast, slow)| {
            let mut config = base.clone();
            config.strategy = StrategySpec::MaCross {
                fast_period: fast,
                slow_period: slow,
                timeframe: base.timeframe,
            };
            let result = run_with_bars(&config, &bars, None)?;
            Ok(SweepEntry {
                run_id: result.run_id,
                fast_period: fast,
                slow_period: slow,
                report: result.report,
            })
        })
        .collect::<Result<_, RunError>>()?;

    entries.sort_by(|a, b| {
        b.report
            .total_return_pct
            .partial_cmp(&a.report.total_return_pct)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    Ok(SweepResult {
        schema_version: SCHEMA_VERSION,
        symbol: base.symbol.clone(),
        timeframe: base.timeframe,
        bar_count: bars.len(),
        skipped_pairs,
        entries,
    })
}

//! CoinLab runner — orchestration around the `coinlab-core` engine.
//!
//! This crate owns everything outside the pure simulation:
//! - TOML configs with content-addressed run ids
//! - Market data: CSV files, seeded synthetic walks, Binance klines
//! - Performance reports with annualized statistics
//! - Artifact export (JSON + CSV) with schema versioning
//! - Parallel parameter sweeps

pub mod binance;
pub mod config;
pub mod data;
pub mod export;
pub mod report;
pub mod runner;
pub mod sweep;

pub use binance::{fetch_klines, FetchError, DEFAULT_API_URL};
pub use config::{BacktestConfig, ConfigError, SCHEMA_VERSION};
pub use data::{generate_synthetic, load_bars, load_csv, write_csv, DataConfig, LoadError};
pub use export::{
    export_json, import_json, load_artifacts, save_artifacts, save_sweep,
};
pub use report::{compute_report, PerformanceReport, PROFIT_FACTOR_CAP};
pub use runner::{run, run_with_bars, BacktestResult, RunError};
pub use sweep::{run_sweep, ParamGrid, SweepEntry, SweepResult};

#[cfg(test)]
mod send_sync_checks {
    use super::*;

    fn assert_send<T: Send>() {}
    fn assert_sync<T: Sync>() {}

    #[test]
    fn config_is_send_sync() {
        assert_send::<BacktestConfig>();
        assert_sync::<BacktestConfig>();
        assert_send::<DataConfig>();
        assert_sync::<DataConfig>();
    }

    #[test]
    fn result_types_are_send_sync() {
        assert_send::<BacktestResult>();
        assert_sync::<BacktestResult>();
        assert_send::<PerformanceReport>();
        assert_sync::<PerformanceReport>();
    }

    #[test]
    fn sweep_types_are_send_sync() {
        assert_send::<SweepEntry>();
        assert_sync::<SweepEntry>();
        assert_send::<SweepResult>();
        assert_sync::<SweepResult>();
        // Rayon's fallible collect moves errors across threads.
        assert_send::<RunError>();
    }
}

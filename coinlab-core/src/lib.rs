//! CoinLab Core — domain types, indicators, strategies, and the
//! bar-by-bar backtest loop.
//!
//! This crate contains the heart of the simulation engine:
//! - Domain types (bars, timeframes, signals, positions, portfolio,
//!   trade records)
//! - Indicator library behind one look-ahead-safe contract
//! - Strategy trait with five built-ins and a declarative spec builder
//! - Portfolio tracker with fee, slippage, and stop/target handling
//! - Simulation loop with warmup, gap accounting, cooperative
//!   cancellation, and end-of-run liquidation

pub mod domain;
pub mod engine;
pub mod indicators;
pub mod strategy;

//! SwingLab Runner — backtest orchestration, signal matching, and tuning.
//!
//! This crate builds on `swinglab-core` to provide:
//! - CSV bar loading with light format inference
//! - Per-day real signal log loading and time-offset shifting
//! - Single-backtest runner with summary metrics
//! - Greedy signal-to-trade matching
//! - Parameter grid search scored against real signal logs
//! - Artifact export (CSV, JSON, Markdown)

pub mod config;
pub mod data_loader;
pub mod matcher;
pub mod metrics;
pub mod reporting;
pub mod runner;
pub mod signals;
pub mod tuning;

pub use config::{ConfigError, RunConfig};
pub use data_loader::{load_bars_csv, LoadError};
pub use matcher::{match_signals, median, MatchRecord, MatchReport};
pub use metrics::{summarize, Summary};
pub use reporting::{save_backtest_artifacts, save_match_report, save_tuning_artifacts};
pub use runner::{config_fingerprint, run_backtest, BacktestResult, SCHEMA_VERSION};
pub use signals::{load_signal_file, load_signals, shift_signals, RealSignal, SignalError};
pub use tuning::{
    is_better, parse_time_offsets, run_grid_search, BestArtifacts, CancelToken, CellScore,
    GridCell, GridMode, LeaderboardRow, ParamGrid, TuningOutcome, DEFAULT_TIME_OFFSETS,
    DEFAULT_TOLERANCE_MINUTES,
};

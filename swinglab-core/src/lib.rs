//! SwingLab Core — swing + Fibonacci-zone detection and walk-forward simulation.
//!
//! This crate contains the deterministic heart of the backtester:
//! - Domain types (bars, legs, trade setups and resolved trades)
//! - Leg segmentation over a trailing window
//! - Three-leg swing validation with candle confirmation
//! - Oriented Fibonacci retracement zones
//! - The bar-by-bar simulation engine with no look-ahead
//! - Session filter and injectable accept-trade capability
//! - R-based equity and monthly accounting

pub mod config;
pub mod domain;
pub mod engine;
pub mod fib;
pub mod filter;
pub mod legs;
pub mod swing;

pub use config::{SessionConfig, StrategyConfig};
pub use domain::{pips, pips_to_price, Bar, ExitReason, Leg, LegDirection, Trade, TradeDirection, TradeSetup, PIP_FACTOR};
pub use engine::{equity_curve, in_session, monthly_stats, resolve_exit, run_engine, EquityPoint, MonthlyStats};
pub use fib::{FibError, FibLevels};
pub use filter::{AcceptTrade, FilterError, TradeContext};
pub use legs::segment_legs;
pub use swing::{validate_swing, SwingType};

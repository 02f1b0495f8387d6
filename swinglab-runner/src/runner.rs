//! Backtest runner — wires together engine, accounting, and summary.

use serde::Serialize;

use swinglab_core::{
    equity_curve, monthly_stats, run_engine, AcceptTrade, Bar, EquityPoint, MonthlyStats,
    SessionConfig, StrategyConfig, Trade,
};

use crate::metrics::{summarize, Summary};

/// Current schema version for persisted artifacts.
pub const SCHEMA_VERSION: u32 = 1;

/// Complete result of a single backtest run.
#[derive(Debug, Clone, Serialize)]
pub struct BacktestResult {
    pub schema_version: u32,
    pub config: StrategyConfig,
    pub session: SessionConfig,
    pub config_fingerprint: String,
    pub bar_count: usize,
    pub summary: Summary,
    pub trades: Vec<Trade>,
    pub equity: Vec<EquityPoint>,
    pub monthly: Vec<MonthlyStats>,
}

/// Short blake3 fingerprint of a strategy + session configuration.
/// Stable across runs, so artifact directories and leaderboard rows can
/// be traced back to the exact parameters that produced them.
pub fn config_fingerprint(strategy: &StrategyConfig, session: &SessionConfig) -> String {
    let mut hasher = blake3::Hasher::new();
    // JSON serialization of these configs is deterministic (struct field order).
    hasher.update(
        serde_json::to_string(strategy)
            .unwrap_or_default()
            .as_bytes(),
    );
    hasher.update(
        serde_json::to_string(session)
            .unwrap_or_default()
            .as_bytes(),
    );
    hasher.finalize().to_hex()[..16].to_string()
}

/// Run a full backtest over pre-loaded bars — no I/O.
pub fn run_backtest(
    bars: &[Bar],
    strategy: &StrategyConfig,
    session: &SessionConfig,
    accept_trade: Option<&dyn AcceptTrade>,
) -> BacktestResult {
    let trades = run_engine(bars, strategy, session, accept_trade);
    let summary = summarize(&trades);
    let equity = equity_curve(&trades);
    let monthly = monthly_stats(&trades);
    BacktestResult {
        schema_version: SCHEMA_VERSION,
        config: strategy.clone(),
        session: session.clone(),
        config_fingerprint: config_fingerprint(strategy, session),
        bar_count: bars.len(),
        summary,
        trades,
        equity,
        monthly,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveDateTime};

    fn ts(i: usize) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 9, 2)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap()
            + chrono::Duration::minutes(i as i64)
    }

    fn flat_bars(n: usize) -> Vec<Bar> {
        (0..n)
            .map(|i| Bar {
                timestamp: ts(i),
                open: 1.1,
                high: 1.1,
                low: 1.1,
                close: 1.1,
                volume: None,
            })
            .collect()
    }

    #[test]
    fn quiet_series_produces_empty_result() {
        let bars = flat_bars(200);
        let result = run_backtest(
            &bars,
            &StrategyConfig::default(),
            &SessionConfig::disabled(),
            None,
        );
        assert_eq!(result.schema_version, SCHEMA_VERSION);
        assert_eq!(result.bar_count, 200);
        assert!(result.trades.is_empty());
        assert_eq!(result.summary, Summary::default());
        assert!(result.equity.is_empty());
        assert!(result.monthly.is_empty());
    }

    #[test]
    fn fingerprint_tracks_config_changes() {
        let base = StrategyConfig::default();
        let session = SessionConfig::default();
        let a = config_fingerprint(&base, &session);
        assert_eq!(a, config_fingerprint(&base, &session));
        assert_eq!(a.len(), 16);

        let tweaked = StrategyConfig {
            threshold: 7.0,
            ..base.clone()
        };
        assert_ne!(a, config_fingerprint(&tweaked, &session));
        assert_ne!(
            a,
            config_fingerprint(&base, &SessionConfig::disabled())
        );
    }
}

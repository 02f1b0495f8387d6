//! Serializable engine configuration.
//!
//! Explicit value structs passed to each component — there are no global
//! defaults and no shared mutable state between runs.

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

/// Strategy parameters. Every field's effect is documented on the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StrategyConfig {
    /// Leg reversal threshold in points (pips).
    pub threshold: f64,
    /// Zone-touch tolerance for entries, in pips.
    pub entry_tolerance_pips: f64,
    /// Trailing window length for re-segmentation; the engine always uses
    /// at least 100 bars.
    pub lookback_bars: usize,
    /// Minimum stop distance floor, in pips. Widens the structural stop,
    /// never tightens it.
    pub min_sl_pips: f64,
    /// Reward-to-risk ratio for target placement and R accounting.
    pub win_ratio: f64,
    /// Maximum bars a trade stays open before a TIMEOUT exit. Zero disables
    /// the bar-count timeout.
    pub timeout_bars: usize,
    /// Skip entries on bullish swings.
    pub sell_only: bool,
    /// Require two touches near the 0.705 level inside the lookback window
    /// before accepting an entry.
    pub two_touch_705: bool,
}

impl Default for StrategyConfig {
    fn default() -> Self {
        Self {
            threshold: 6.0,
            entry_tolerance_pips: 2.0,
            lookback_bars: 100,
            min_sl_pips: 2.0,
            win_ratio: 1.2,
            timeout_bars: 300,
            sell_only: false,
            two_touch_705: false,
        }
    }
}

impl StrategyConfig {
    /// Effective trailing window length.
    pub fn window_bars(&self) -> usize {
        self.lookback_bars.max(100)
    }
}

/// Session-time entry filter.
///
/// Bars whose time-of-day falls outside `[start, end]` (inclusive) are
/// skipped before any swing detection. When `timezone` is set, naive bar
/// timestamps are interpreted as UTC and converted first; when absent the
/// raw clock time is compared.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub enabled: bool,
    pub start: NaiveTime,
    pub end: NaiveTime,
    /// IANA timezone name, e.g. "Asia/Tehran".
    pub timezone: Option<String>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            start: NaiveTime::from_hms_opt(9, 0, 0).expect("valid time"),
            end: NaiveTime::from_hms_opt(21, 0, 0).expect("valid time"),
            timezone: None,
        }
    }
}

impl SessionConfig {
    /// A filter that accepts every bar.
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_strategy_values() {
        let cfg = StrategyConfig::default();
        assert_eq!(cfg.threshold, 6.0);
        assert_eq!(cfg.entry_tolerance_pips, 2.0);
        assert_eq!(cfg.lookback_bars, 100);
        assert_eq!(cfg.min_sl_pips, 2.0);
        assert_eq!(cfg.win_ratio, 1.2);
        assert_eq!(cfg.timeout_bars, 300);
        assert!(!cfg.sell_only);
        assert!(!cfg.two_touch_705);
    }

    #[test]
    fn window_floor_is_100() {
        let mut cfg = StrategyConfig::default();
        cfg.lookback_bars = 40;
        assert_eq!(cfg.window_bars(), 100);
        cfg.lookback_bars = 160;
        assert_eq!(cfg.window_bars(), 160);
    }

    #[test]
    fn config_serialization_roundtrip() {
        let cfg = StrategyConfig {
            threshold: 7.0,
            sell_only: true,
            ..StrategyConfig::default()
        };
        let json = serde_json::to_string(&cfg).unwrap();
        let deser: StrategyConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(cfg, deser);
    }

    #[test]
    fn partial_toml_uses_defaults() {
        let cfg: StrategyConfig = serde_json::from_str(r#"{"threshold": 5.0}"#).unwrap();
        assert_eq!(cfg.threshold, 5.0);
        assert_eq!(cfg.lookback_bars, 100);
    }
}

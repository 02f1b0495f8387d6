//! Trade records — an entry setup and its resolved round trip.
//!
//! A `TradeSetup` is created at the entry bar's close. The exit resolver
//! consumes it exactly once via [`TradeSetup::resolve`], producing an
//! immutable [`Trade`]. There is no mutable in-flight state.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Trade direction as it appears in signal logs and exports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TradeDirection {
    Buy,
    Sell,
}

impl TradeDirection {
    /// Wire/export form, matching the signal log convention.
    pub fn as_str(&self) -> &'static str {
        match self {
            TradeDirection::Buy => "BUY",
            TradeDirection::Sell => "SELL",
        }
    }
}

/// Why a trade closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExitReason {
    Tp,
    Sl,
    Timeout,
}

impl ExitReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExitReason::Tp => "TP",
            ExitReason::Sl => "SL",
            ExitReason::Timeout => "TIMEOUT",
        }
    }
}

/// An accepted entry, priced but not yet resolved.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradeSetup {
    /// Entry bar timestamp.
    pub timestamp: NaiveDateTime,
    pub direction: TradeDirection,
    pub entry: f64,
    pub sl: f64,
    pub tp: f64,
    /// Reward-to-risk ratio used to place the target.
    pub rr: f64,
    /// Risk distance |entry - sl| in pips.
    pub sl_pips: f64,
}

impl TradeSetup {
    /// Single-assignment exit transition: consumes the setup.
    pub fn resolve(
        self,
        exit_timestamp: NaiveDateTime,
        exit_reason: ExitReason,
        exit_price: f64,
    ) -> Trade {
        Trade {
            timestamp: self.timestamp,
            direction: self.direction,
            entry: self.entry,
            sl: self.sl,
            tp: self.tp,
            rr: self.rr,
            sl_pips: self.sl_pips,
            exit_timestamp,
            exit_reason,
            exit_price,
        }
    }
}

/// A fully resolved round-trip trade.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trade {
    pub timestamp: NaiveDateTime,
    pub direction: TradeDirection,
    pub entry: f64,
    pub sl: f64,
    pub tp: f64,
    pub rr: f64,
    pub sl_pips: f64,
    pub exit_timestamp: NaiveDateTime,
    pub exit_reason: ExitReason,
    pub exit_price: f64,
}

impl Trade {
    /// R-multiple under the fixed accounting convention:
    /// +rr on TP, -1 on SL, 0 on TIMEOUT.
    pub fn r_multiple(&self) -> f64 {
        match self.exit_reason {
            ExitReason::Tp => self.rr,
            ExitReason::Sl => -1.0,
            ExitReason::Timeout => 0.0,
        }
    }

    pub fn is_winner(&self) -> bool {
        self.exit_reason == ExitReason::Tp
    }
}

//! Bar — the fundamental market data unit.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// OHLC bar for a single instrument at a single timestamp.
///
/// Timestamps are strictly increasing and unique within a series; the
/// loader enforces ordering, the engine assumes it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bar {
    pub timestamp: NaiveDateTime,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    #[serde(default)]
    pub volume: Option<f64>,
}

impl Bar {
    /// Returns true if any OHLC field is NaN.
    pub fn is_void(&self) -> bool {
        self.open.is_nan() || self.high.is_nan() || self.low.is_nan() || self.close.is_nan()
    }

    /// Basic OHLC sanity check: low <= open,close <= high.
    pub fn is_sane(&self) -> bool {
        if self.is_void() {
            return false;
        }
        self.high >= self.low
            && self.high >= self.open
            && self.high >= self.close
            && self.low <= self.open
            && self.low <= self.close
    }

    /// True if the candle closed below its open.
    pub fn is_bearish(&self) -> bool {
        self.close < self.open
    }

    /// True if the candle closed above its open.
    pub fn is_bullish(&self) -> bool {
        self.close > self.open
    }
}

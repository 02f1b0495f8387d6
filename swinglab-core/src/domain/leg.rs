//! Leg — a directional price swing segment bounded by a threshold reversal.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::pips;

/// Direction of a price leg.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LegDirection {
    Up,
    Down,
}

/// A maximal directional move. Legs are contiguous in time: each leg's
/// start equals the previous leg's end. Immutable once the segmenter
/// appends it; only the trailing (still open) leg changes as bars arrive.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Leg {
    pub direction: LegDirection,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub start_value: f64,
    pub end_value: f64,
}

impl Leg {
    /// Leg height in pips.
    pub fn size_pips(&self) -> f64 {
        pips(self.start_value, self.end_value)
    }
}

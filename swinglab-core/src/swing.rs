//! Swing validation — classifies the last three legs as a tradeable setup.
//!
//! Of the last three legs, the oldest is the impulse, the middle the
//! pullback, and the newest only confirms that the pullback has ended.
//! A candidate is confirmed by counting opposite-colored candles inside
//! the pullback's bar range: the first such candle counts 1, every later
//! one counts 2, and the pattern is accepted once the running count
//! reaches 3. The doubling is a domain rule carried over from the live
//! system; see DESIGN.md before changing it.

use serde::{Deserialize, Serialize};

use crate::domain::{Bar, Leg};

/// Classification of a 3-leg pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SwingType {
    Bullish,
    Bearish,
    None,
}

impl SwingType {
    pub fn is_swing(&self) -> bool {
        !matches!(self, SwingType::None)
    }
}

/// Running count needed to confirm a candidate.
const CONFIRMATION_COUNT: u32 = 3;

/// Validate the last three legs against `bars`.
///
/// Returns `SwingType::None` when fewer than three legs exist or no
/// candidate passes confirmation. Never an error: "no swing" is a normal
/// outcome and the engine simply advances.
pub fn validate_swing(bars: &[Bar], legs: &[Leg]) -> SwingType {
    if legs.len() < 3 {
        return SwingType::None;
    }
    let impulse = &legs[legs.len() - 3];
    let pullback = &legs[legs.len() - 2];

    // Bullish: impulse up, pullback down, pullback holding above the
    // impulse origin and below the impulse extreme.
    if pullback.end_value > impulse.start_value && impulse.end_value > pullback.end_value {
        let count = confirmation_count(bars, pullback, |b| b.is_bearish());
        if count >= CONFIRMATION_COUNT {
            return SwingType::Bullish;
        }
    }

    // Bearish mirror.
    if pullback.end_value < impulse.start_value && impulse.end_value < pullback.end_value {
        let count = confirmation_count(bars, pullback, |b| b.is_bullish());
        if count >= CONFIRMATION_COUNT {
            return SwingType::Bearish;
        }
    }

    SwingType::None
}

/// Count confirmation candles in the pullback's inclusive bar range.
/// First match counts 1, every subsequent match counts 2.
fn confirmation_count(bars: &[Bar], pullback: &Leg, is_opposite: impl Fn(&Bar) -> bool) -> u32 {
    let s_idx = index_of_nearest(bars, pullback.start);
    let e_idx = index_of_nearest(bars, pullback.end);
    let mut count = 0u32;
    let mut seen_first = false;
    for b in &bars[s_idx..=e_idx.min(bars.len() - 1)] {
        if is_opposite(b) {
            count += if seen_first { 2 } else { 1 };
            seen_first = true;
        }
    }
    count
}

/// Position of `ts` in a timestamp-sorted series, falling back to the
/// nearest bar when the exact timestamp is absent (legs computed on a
/// trailing window can reference bars at the window edge).
fn index_of_nearest(bars: &[Bar], ts: chrono::NaiveDateTime) -> usize {
    match bars.binary_search_by_key(&ts, |b| b.timestamp) {
        Ok(i) => i,
        Err(i) => {
            if i == 0 {
                0
            } else if i >= bars.len() {
                bars.len() - 1
            } else {
                let before = ts - bars[i - 1].timestamp;
                let after = bars[i].timestamp - ts;
                if after < before {
                    i
                } else {
                    i - 1
                }
            }
        }
    }
}

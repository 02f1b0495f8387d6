//! Oriented Fibonacci retracement levels over an impulse leg.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::swing::SwingType;

/// Errors from zone construction.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FibError {
    /// Contract violation: the caller must only build zones for classified
    /// swings. Propagates rather than being absorbed.
    #[error("swing type must be bullish or bearish")]
    InvalidSwingType,
}

/// The four oriented retracement levels of an impulse leg.
///
/// Level 0.0 and 1.0 always sit on the impulse endpoints. For a bullish
/// swing 0.0 is the impulse high and 1.0 the low (retracement measured
/// down from the top); bearish is the mirror.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FibLevels {
    pub level_0: f64,
    pub level_705: f64,
    pub level_90: f64,
    pub level_100: f64,
}

impl FibLevels {
    /// Build oriented levels from the impulse endpoints.
    pub fn oriented(swing: SwingType, impulse_start: f64, impulse_end: f64) -> Result<Self, FibError> {
        let high = impulse_start.max(impulse_end);
        let low = impulse_start.min(impulse_end);
        let (from, to) = match swing {
            SwingType::Bullish => (high, low),
            SwingType::Bearish => (low, high),
            SwingType::None => return Err(FibError::InvalidSwingType),
        };
        Ok(Self {
            level_0: from,
            level_705: from + 0.705 * (to - from),
            level_90: from + 0.9 * (to - from),
            level_100: to,
        })
    }

    /// Lower bound of the 0.705–0.9 entry zone.
    pub fn zone_low(&self) -> f64 {
        self.level_705.min(self.level_90)
    }

    /// Upper bound of the 0.705–0.9 entry zone.
    pub fn zone_high(&self) -> f64 {
        self.level_705.max(self.level_90)
    }
}

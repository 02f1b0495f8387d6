//! Domain types: bars, legs, trades, pip arithmetic.

mod bar;
mod leg;
mod trade;

pub use bar::Bar;
pub use leg::{Leg, LegDirection};
pub use trade::{ExitReason, Trade, TradeDirection, TradeSetup};

/// Price units per pip. Instrument-specific scaling is assumed fixed
/// (four-decimal FX quoting).
pub const PIP_FACTOR: f64 = 10_000.0;

/// Absolute distance between two prices, in pips.
pub fn pips(a: f64, b: f64) -> f64 {
    (a - b).abs() * PIP_FACTOR
}

/// Convert a pip count to a price distance.
pub fn pips_to_price(pips: f64) -> f64 {
    pips / PIP_FACTOR
}

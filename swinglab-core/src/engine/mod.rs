//! Walk-forward trade simulation engine.
//!
//! A single cursor advances over the bar series with no look-ahead. At
//! each bar the trailing window is re-segmented into legs, the last three
//! legs are validated as a swing, and an entry is taken when the bar
//! intersects the oriented 0.705–0.9 retracement zone. Once a trade is
//! open its exit is resolved forward and the cursor jumps past the exit
//! bar, so no two trades ever overlap in time.

mod accounting;
mod exit;
mod session;

pub use accounting::{equity_curve, monthly_stats, EquityPoint, MonthlyStats};
pub use exit::resolve_exit;
pub use session::in_session;

use crate::config::{SessionConfig, StrategyConfig};
use crate::domain::{pips, pips_to_price, Bar, Trade, TradeDirection, TradeSetup};
use crate::fib::FibLevels;
use crate::filter::{accept_or_fail_open, AcceptTrade, TradeContext};
use crate::legs::segment_legs;
use crate::swing::{validate_swing, SwingType};

/// True when the bar's range comes within `tol` of the zone.
fn bar_touches_zone(bar: &Bar, zone_low: f64, zone_high: f64, tol: f64) -> bool {
    bar.low <= zone_high + tol && bar.high >= zone_low - tol
}

/// True when the bar's range comes within `tol` of a single level.
fn near_level(bar: &Bar, level: f64, tol: f64) -> bool {
    bar.low <= level + tol && bar.high >= level - tol
}

/// Run the engine over `bars` and return every resolved trade, in entry
/// order. An empty or too-short series yields no trades.
pub fn run_engine(
    bars: &[Bar],
    strategy: &StrategyConfig,
    session: &SessionConfig,
    accept_trade: Option<&dyn AcceptTrade>,
) -> Vec<Trade> {
    let mut trades = Vec::new();
    let tol = pips_to_price(strategy.entry_tolerance_pips);
    let window_bars = strategy.window_bars();

    let mut i = window_bars;
    let n = bars.len();
    while i < n {
        let bar = &bars[i];
        if !in_session(bar.timestamp, session) {
            i += 1;
            continue;
        }

        // Re-segment the trailing window ending at the cursor. Validation
        // sees the full history up to the cursor so the pullback's bars
        // can be located even when the window clipped its start.
        let history = &bars[..=i];
        let tail_start = history.len().saturating_sub(window_bars);
        let legs = segment_legs(&history[tail_start..], strategy.threshold);
        let swing = validate_swing(history, &legs);
        if !swing.is_swing() {
            i += 1;
            continue;
        }

        let impulse = &legs[legs.len() - 3];
        // Legs come from the validator's precondition; a classified swing
        // always has a bullish/bearish type, so the zone cannot fail.
        let fib = match FibLevels::oriented(swing, impulse.start_value, impulse.end_value) {
            Ok(fib) => fib,
            Err(_) => unreachable!("classified swing is always bullish or bearish"),
        };

        if !bar_touches_zone(bar, fib.zone_low(), fib.zone_high(), tol) {
            i += 1;
            continue;
        }

        if strategy.sell_only && swing == SwingType::Bullish {
            i += 1;
            continue;
        }

        if strategy.two_touch_705 {
            let look_start = i.saturating_sub(strategy.lookback_bars);
            let touches = bars[look_start..=i]
                .iter()
                .filter(|b| near_level(b, fib.level_705, tol))
                .count();
            if touches < 2 {
                i += 1;
                continue;
            }
        }

        if let Some(filter) = accept_trade {
            let ctx = TradeContext {
                bars,
                index: i,
                swing,
                impulse,
                fib: &fib,
                config: strategy,
            };
            // Fail-open: a filter error never aborts the run.
            if !accept_or_fail_open(filter, &ctx) {
                i += 1;
                continue;
            }
        }

        let entry = bar.close;
        let setup = match swing {
            SwingType::Bearish => {
                let sl = impulse
                    .start_value
                    .max(entry + pips_to_price(strategy.min_sl_pips));
                let risk = pips(entry, sl);
                TradeSetup {
                    timestamp: bar.timestamp,
                    direction: TradeDirection::Sell,
                    entry,
                    sl,
                    tp: entry - pips_to_price(risk * strategy.win_ratio),
                    rr: strategy.win_ratio,
                    sl_pips: risk,
                }
            }
            SwingType::Bullish => {
                let sl = impulse
                    .start_value
                    .min(entry - pips_to_price(strategy.min_sl_pips));
                let risk = pips(entry, sl);
                TradeSetup {
                    timestamp: bar.timestamp,
                    direction: TradeDirection::Buy,
                    entry,
                    sl,
                    tp: entry + pips_to_price(risk * strategy.win_ratio),
                    rr: strategy.win_ratio,
                    sl_pips: risk,
                }
            }
            SwingType::None => unreachable!("guarded by is_swing above"),
        };

        let (trade, exit_idx) = resolve_exit(bars, i, setup, strategy.timeout_bars);
        trades.push(trade);

        // Never re-enter while the just-closed trade's window is open.
        i = exit_idx + 1;
    }

    trades
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ExitReason, PIP_FACTOR};
    use crate::filter::FilterError;
    use chrono::{Duration, NaiveDate, NaiveDateTime};
    use proptest::prelude::*;

    fn ts(i: usize) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 9, 2)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap()
            + Duration::minutes(i as i64)
    }

    fn px(p: f64) -> f64 {
        1.1000 + p / PIP_FACTOR
    }

    fn bar(i: usize, open: f64, high: f64, low: f64, close: f64) -> Bar {
        Bar {
            timestamp: ts(i),
            open,
            high,
            low,
            close,
            volume: None,
        }
    }

    fn flat(i: usize, p: f64) -> Bar {
        bar(i, p, p, p, p)
    }

    /// Synthetic series engineered to produce exactly one bullish swing
    /// entry at bar 115: flat warmup, a 10-pip impulse, a bearish-candle
    /// pullback, a reversal leg, then a dip into the retracement zone.
    pub(super) fn bullish_scenario() -> Vec<Bar> {
        let mut bars: Vec<Bar> = (0..100).map(|i| flat(i, px(0.0))).collect();
        // Impulse: +1 pip per bar, closes P(1)..P(10).
        for i in 100..=109 {
            let p = (i - 99) as f64;
            bars.push(bar(i, px(p - 1.0), px(p), px(p - 1.0), px(p)));
        }
        // Pullback with bearish candles; the 7-pip drawdown at bar 111
        // closes the impulse leg.
        bars.push(bar(110, px(10.0), px(10.0), px(6.0), px(7.0)));
        bars.push(bar(111, px(7.0), px(7.0), px(3.0), px(4.0)));
        bars.push(bar(112, px(4.0), px(4.0), px(1.0), px(2.0)));
        bars.push(bar(113, px(2.0), px(2.0), px(1.0), px(1.0)));
        // Reversal: 6-pip rally closes the pullback leg.
        bars.push(bar(114, px(1.0), px(7.0), px(1.0), px(7.0)));
        // Entry bar: dips into the 0.705-0.9 zone, closes at P(4).
        bars.push(bar(115, px(7.0), px(7.0), px(3.0), px(4.0)));
        // Winner: rallies through the target.
        bars.push(bar(116, px(4.0), px(9.0), px(4.0), px(9.0)));
        for i in 117..130 {
            bars.push(flat(i, px(9.0)));
        }
        bars
    }

    #[test]
    fn bullish_scenario_yields_one_buy_trade() {
        let bars = bullish_scenario();
        let trades = run_engine(
            &bars,
            &StrategyConfig::default(),
            &SessionConfig::disabled(),
            None,
        );
        assert_eq!(trades.len(), 1);
        let t = &trades[0];
        assert_eq!(t.direction, TradeDirection::Buy);
        assert_eq!(t.timestamp, ts(115));
        assert!((t.entry - px(4.0)).abs() < 1e-9);
        // Structural low P(0) is beyond the 2-pip floor, so it is kept.
        assert!((t.sl - px(0.0)).abs() < 1e-9);
        assert!((t.sl_pips - 4.0).abs() < 1e-6);
        // Target = entry + risk * rr.
        assert!((t.tp - px(4.0 + 4.0 * 1.2)).abs() < 1e-9);
        assert_eq!(t.exit_reason, ExitReason::Tp);
        assert_eq!(t.exit_timestamp, ts(116));
    }

    #[test]
    fn min_stop_floor_widens_a_tight_structural_stop() {
        // Same scenario but with a 6-pip floor: the structural stop P(0)
        // sits 4 pips away, so the floor pushes it to entry - 6 pips.
        let bars = bullish_scenario();
        let cfg = StrategyConfig {
            min_sl_pips: 6.0,
            ..StrategyConfig::default()
        };
        let trades = run_engine(&bars, &cfg, &SessionConfig::disabled(), None);
        assert_eq!(trades.len(), 1);
        let t = &trades[0];
        assert!((t.sl - px(-2.0)).abs() < 1e-9);
        assert!((t.sl_pips - 6.0).abs() < 1e-6);
    }

    #[test]
    fn sell_only_skips_bullish_swings() {
        let bars = bullish_scenario();
        let cfg = StrategyConfig {
            sell_only: true,
            ..StrategyConfig::default()
        };
        let trades = run_engine(&bars, &cfg, &SessionConfig::disabled(), None);
        assert!(trades.is_empty());
    }

    #[test]
    fn session_filter_blocks_out_of_session_entries() {
        // Bars start at 09:00 one minute apart, so the entry bar (115)
        // lands at 10:55 — outside a 09:00-10:00 session.
        let bars = bullish_scenario();
        let session = SessionConfig {
            enabled: true,
            start: chrono::NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            end: chrono::NaiveTime::from_hms_opt(10, 0, 0).unwrap(),
            timezone: None,
        };
        let trades = run_engine(&bars, &StrategyConfig::default(), &session, None);
        assert!(trades.is_empty());
    }

    #[test]
    fn rejecting_filter_blocks_the_entry() {
        let bars = bullish_scenario();
        let reject = |_: &TradeContext<'_>| -> Result<bool, FilterError> { Ok(false) };
        let trades = run_engine(
            &bars,
            &StrategyConfig::default(),
            &SessionConfig::disabled(),
            Some(&reject),
        );
        assert!(trades.is_empty());
    }

    #[test]
    fn failing_filter_fails_open() {
        let bars = bullish_scenario();
        let flaky = |_: &TradeContext<'_>| -> Result<bool, FilterError> {
            Err("scorer crashed".into())
        };
        let trades = run_engine(
            &bars,
            &StrategyConfig::default(),
            &SessionConfig::disabled(),
            Some(&flaky),
        );
        assert_eq!(trades.len(), 1);
    }

    #[test]
    fn filter_sees_the_decision_context() {
        let bars = bullish_scenario();
        let check = |ctx: &TradeContext<'_>| -> Result<bool, FilterError> {
            assert_eq!(ctx.index, 115);
            assert_eq!(ctx.swing, SwingType::Bullish);
            assert!((ctx.impulse.start_value - px(0.0)).abs() < 1e-9);
            assert!((ctx.impulse.end_value - px(10.0)).abs() < 1e-9);
            Ok(true)
        };
        let trades = run_engine(
            &bars,
            &StrategyConfig::default(),
            &SessionConfig::disabled(),
            Some(&check),
        );
        assert_eq!(trades.len(), 1);
    }

    #[test]
    fn empty_and_short_series_yield_no_trades() {
        assert!(run_engine(
            &[],
            &StrategyConfig::default(),
            &SessionConfig::disabled(),
            None
        )
        .is_empty());
        let bars: Vec<Bar> = (0..50).map(|i| flat(i, px(0.0))).collect();
        assert!(run_engine(
            &bars,
            &StrategyConfig::default(),
            &SessionConfig::disabled(),
            None
        )
        .is_empty());
    }

    #[test]
    fn two_touch_705_counts_touches_in_the_lookback_window() {
        // The pullback bars 111-113 all trade through the 0.705 level, so
        // the confirmation sees two-plus touches and the entry stands.
        let bars = bullish_scenario();
        let trades = run_engine(
            &bars,
            &StrategyConfig {
                two_touch_705: true,
                ..StrategyConfig::default()
            },
            &SessionConfig::disabled(),
            None,
        );
        assert_eq!(trades.len(), 1);
    }

    #[test]
    fn zone_touch_geometry() {
        let b = bar(0, px(7.0), px(7.0), px(3.0), px(4.0));
        let tol = pips_to_price(2.0);
        assert!(bar_touches_zone(&b, px(1.0), px(2.95), tol));
        // Entirely above the zone plus tolerance.
        let high = flat(1, px(9.0));
        assert!(!bar_touches_zone(&high, px(1.0), px(2.95), tol));
        assert!(near_level(&b, px(2.95), tol));
        assert!(!near_level(&high, px(2.95), tol));
    }

    proptest! {
        /// No two resolved trades from one run overlap in time, on
        /// arbitrary contiguous random-walk series.
        #[test]
        fn trades_never_overlap(
            steps in prop::collection::vec(-4.0f64..4.0, 150..400),
        ) {
            let mut bars = Vec::with_capacity(steps.len() + 1);
            let mut close = px(0.0);
            bars.push(flat(0, close));
            for (i, step) in steps.iter().enumerate() {
                let open = close;
                close += step / PIP_FACTOR;
                bars.push(bar(i + 1, open, open.max(close), open.min(close), close));
            }

            let cfg = StrategyConfig {
                threshold: 3.0,
                timeout_bars: 10,
                ..StrategyConfig::default()
            };
            let trades = run_engine(&bars, &cfg, &SessionConfig::disabled(), None);
            for pair in trades.windows(2) {
                prop_assert!(
                    pair[1].timestamp > pair[0].exit_timestamp,
                    "trade windows overlap: {:?} then {:?}",
                    pair[0].exit_timestamp,
                    pair[1].timestamp
                );
            }
        }
    }
}

//! Walk-forward exit resolution for a single trade.

use crate::domain::{Bar, ExitReason, Trade, TradeDirection, TradeSetup};

/// Resolve `setup`'s exit by scanning bars strictly after `entry_idx`.
///
/// Within a single bar the stop is checked before the target, so a bar
/// whose range covers both resolves as SL. If neither triggers within
/// `timeout_bars` bars (when nonzero), the trade times out at that bar's
/// close; if the series ends first it times out at the final close.
///
/// Returns the resolved trade and the index of its exit bar.
pub fn resolve_exit(
    bars: &[Bar],
    entry_idx: usize,
    setup: TradeSetup,
    timeout_bars: usize,
) -> (Trade, usize) {
    for (step, bar) in bars[entry_idx + 1..].iter().enumerate() {
        let step = step + 1;
        let idx = entry_idx + step;
        match setup.direction {
            TradeDirection::Sell => {
                if bar.high >= setup.sl {
                    let sl = setup.sl;
                    return (setup.resolve(bar.timestamp, ExitReason::Sl, sl), idx);
                }
                if bar.low <= setup.tp {
                    let tp = setup.tp;
                    return (setup.resolve(bar.timestamp, ExitReason::Tp, tp), idx);
                }
            }
            TradeDirection::Buy => {
                if bar.low <= setup.sl {
                    let sl = setup.sl;
                    return (setup.resolve(bar.timestamp, ExitReason::Sl, sl), idx);
                }
                if bar.high >= setup.tp {
                    let tp = setup.tp;
                    return (setup.resolve(bar.timestamp, ExitReason::Tp, tp), idx);
                }
            }
        }
        if timeout_bars > 0 && step >= timeout_bars {
            let close = bar.close;
            return (setup.resolve(bar.timestamp, ExitReason::Timeout, close), idx);
        }
    }

    // Series exhausted without a trigger.
    let last = &bars[bars.len() - 1];
    let ts = last.timestamp;
    let close = last.close;
    (
        setup.resolve(ts, ExitReason::Timeout, close),
        bars.len() - 1,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate, NaiveDateTime};

    fn ts(i: usize) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 9, 2)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap()
            + Duration::minutes(i as i64)
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

    fn buy_setup() -> TradeSetup {
        TradeSetup {
            timestamp: ts(0),
            direction: TradeDirection::Buy,
            entry: 1.1050,
            sl: 1.1042,
            tp: 1.1060,
            rr: 1.2,
            sl_pips: 8.0,
        }
    }

    fn sell_setup() -> TradeSetup {
        TradeSetup {
            timestamp: ts(0),
            direction: TradeDirection::Sell,
            entry: 1.1050,
            sl: 1.1058,
            tp: 1.1040,
            rr: 1.2,
            sl_pips: 8.0,
        }
    }

    #[test]
    fn buy_take_profit() {
        let bars = vec![flat(0, 1.1050), flat(1, 1.1052), bar(2, 1.1052, 1.1061, 1.1050, 1.1058)];
        let (trade, idx) = resolve_exit(&bars, 0, buy_setup(), 300);
        assert_eq!(trade.exit_reason, ExitReason::Tp);
        assert_eq!(trade.exit_price, 1.1060);
        assert_eq!(trade.exit_timestamp, ts(2));
        assert_eq!(idx, 2);
    }

    #[test]
    fn buy_stop_loss() {
        let bars = vec![flat(0, 1.1050), bar(1, 1.1050, 1.1051, 1.1041, 1.1044)];
        let (trade, idx) = resolve_exit(&bars, 0, buy_setup(), 300);
        assert_eq!(trade.exit_reason, ExitReason::Sl);
        assert_eq!(trade.exit_price, 1.1042);
        assert_eq!(idx, 1);
    }

    #[test]
    fn stop_checked_before_target_on_the_same_bar() {
        // Bar range covers both the stop and the target: SL wins, both ways.
        let wide = bar(1, 1.1050, 1.1070, 1.1030, 1.1050);

        let bars = vec![flat(0, 1.1050), wide.clone()];
        let (trade, _) = resolve_exit(&bars, 0, buy_setup(), 300);
        assert_eq!(trade.exit_reason, ExitReason::Sl);

        let bars = vec![flat(0, 1.1050), wide];
        let (trade, _) = resolve_exit(&bars, 0, sell_setup(), 300);
        assert_eq!(trade.exit_reason, ExitReason::Sl);
    }

    #[test]
    fn sell_take_profit() {
        let bars = vec![flat(0, 1.1050), bar(1, 1.1050, 1.1052, 1.1039, 1.1041)];
        let (trade, _) = resolve_exit(&bars, 0, sell_setup(), 300);
        assert_eq!(trade.exit_reason, ExitReason::Tp);
        assert_eq!(trade.exit_price, 1.1040);
    }

    #[test]
    fn timeout_at_exact_bar_count() {
        let mut bars = vec![flat(0, 1.1050)];
        for i in 1..=10 {
            bars.push(flat(i, 1.1050));
        }
        let (trade, idx) = resolve_exit(&bars, 0, buy_setup(), 5);
        assert_eq!(trade.exit_reason, ExitReason::Timeout);
        // Exactly `timeout_bars` after entry, never later.
        assert_eq!(trade.exit_timestamp, ts(5));
        assert_eq!(trade.exit_price, 1.1050);
        assert_eq!(idx, 5);
    }

    #[test]
    fn series_exhaustion_times_out_at_last_close() {
        let bars = vec![flat(0, 1.1050), flat(1, 1.1051), flat(2, 1.1052)];
        let (trade, idx) = resolve_exit(&bars, 0, buy_setup(), 300);
        assert_eq!(trade.exit_reason, ExitReason::Timeout);
        assert_eq!(trade.exit_timestamp, ts(2));
        assert_eq!(trade.exit_price, 1.1052);
        assert_eq!(idx, 2);
    }

    #[test]
    fn zero_timeout_disables_bar_count_exit() {
        let mut bars = vec![flat(0, 1.1050)];
        for i in 1..=8 {
            bars.push(flat(i, 1.1050));
        }
        let (trade, idx) = resolve_exit(&bars, 0, buy_setup(), 0);
        assert_eq!(trade.exit_reason, ExitReason::Timeout);
        assert_eq!(idx, bars.len() - 1);
    }
}

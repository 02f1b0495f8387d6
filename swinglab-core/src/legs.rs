//! Leg segmentation — turns a bar series into directional price legs.
//!
//! High/low breakout logic with direction persistence: a leg stays open
//! until price pulls back from its running extreme by at least the
//! threshold, at which point the leg closes at the extreme and a new leg
//! of the opposite direction anchors at the current bar's close.
//!
//! The engine re-runs this over a trailing window on every bar advance;
//! segmentation is deliberately not incremental across the whole history.

use crate::domain::{Bar, Leg, LegDirection, PIP_FACTOR};

/// Segment `bars` into legs using a reversal threshold in points (pips).
///
/// Direction is undetermined until the close moves at least `threshold_points`
/// away from the first bar's close. The trailing, still-open leg is emitted
/// if it is non-trivial: either no leg has closed yet, or its anchor is not
/// the final bar of the series.
pub fn segment_legs(bars: &[Bar], threshold_points: f64) -> Vec<Leg> {
    if bars.is_empty() {
        return Vec::new();
    }

    let mut legs: Vec<Leg> = Vec::new();
    let mut direction: Option<LegDirection> = None;
    let mut start = bars[0].timestamp;
    let mut start_val = bars[0].close;
    let mut extreme = start_val;

    for bar in &bars[1..] {
        match direction {
            None => {
                // The extreme stays at the anchor close until the bar after
                // direction is determined.
                if (bar.close - start_val) * PIP_FACTOR >= threshold_points {
                    direction = Some(LegDirection::Up);
                } else if (start_val - bar.close) * PIP_FACTOR >= threshold_points {
                    direction = Some(LegDirection::Down);
                }
            }
            Some(LegDirection::Up) => extreme = extreme.max(bar.high),
            Some(LegDirection::Down) => extreme = extreme.min(bar.low),
        }

        match direction {
            Some(LegDirection::Up) => {
                let drawdown_pts = (extreme - bar.low) * PIP_FACTOR;
                if drawdown_pts >= threshold_points {
                    legs.push(Leg {
                        direction: LegDirection::Up,
                        start,
                        end: bar.timestamp,
                        start_value: start_val,
                        end_value: extreme,
                    });
                    start = bar.timestamp;
                    start_val = bar.close;
                    direction = Some(LegDirection::Down);
                    extreme = bar.low;
                }
            }
            Some(LegDirection::Down) => {
                let retrace_pts = (bar.high - extreme) * PIP_FACTOR;
                if retrace_pts >= threshold_points {
                    legs.push(Leg {
                        direction: LegDirection::Down,
                        start,
                        end: bar.timestamp,
                        start_value: start_val,
                        end_value: extreme,
                    });
                    start = bar.timestamp;
                    start_val = bar.close;
                    direction = Some(LegDirection::Up);
                    extreme = bar.high;
                }
            }
            None => {}
        }
    }

    // Emit the trailing open leg when it spans any ground, or when nothing
    // has closed yet but a direction was established.
    let last_ts = bars[bars.len() - 1].timestamp;
    if (direction.is_some() && legs.is_empty()) || last_ts != start {
        legs.push(Leg {
            direction: direction.unwrap_or(LegDirection::Up),
            start,
            end: last_ts,
            start_value: start_val,
            end_value: extreme,
        });
    }

    legs
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate, NaiveDateTime};
    use proptest::prelude::*;

    fn ts(i: usize) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 9, 2)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap()
            + Duration::minutes(i as i64)
    }

    /// Price at `p` pips above 1.1000.
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

    /// Flat bar: all four prices equal.
    fn flat(i: usize, p: f64) -> Bar {
        bar(i, p, p, p, p)
    }

    #[test]
    fn empty_series_yields_no_legs() {
        assert!(segment_legs(&[], 6.0).is_empty());
    }

    #[test]
    fn single_bar_yields_no_legs() {
        assert!(segment_legs(&[flat(0, px(0.0))], 6.0).is_empty());
    }

    #[test]
    fn flat_series_yields_no_directional_leg() {
        let bars: Vec<Bar> = (0..20).map(|i| flat(i, px(0.0))).collect();
        let legs = segment_legs(&bars, 6.0);
        // Direction never determined and nothing closed: only the trailing
        // anchor-to-end stub is emitted.
        assert_eq!(legs.len(), 1);
        assert_eq!(legs[0].start_value, legs[0].end_value);
    }

    #[test]
    fn up_move_below_threshold_stays_undetermined() {
        let mut bars = vec![flat(0, px(0.0))];
        for i in 1..6 {
            bars.push(flat(i, px(i as f64))); // +1 pip per bar, peaks at 5
        }
        let legs = segment_legs(&bars, 6.0);
        // Trailing stub only; no closed leg.
        assert_eq!(legs.len(), 1);
    }

    #[test]
    fn up_leg_closes_on_threshold_pullback() {
        let mut bars = vec![flat(0, px(0.0))];
        // Rise 10 pips.
        for i in 1..=10 {
            let p = px(i as f64);
            bars.push(bar(i, px(i as f64 - 1.0), p, px(i as f64 - 1.0), p));
        }
        // Pull back 7 pips from the extreme.
        bars.push(bar(11, px(10.0), px(10.0), px(3.0), px(4.0)));
        bars.push(flat(12, px(4.0)));

        let legs = segment_legs(&bars, 6.0);
        assert_eq!(legs.len(), 2);
        assert_eq!(legs[0].direction, LegDirection::Up);
        assert_eq!(legs[0].start_value, px(0.0));
        assert_eq!(legs[0].end_value, px(10.0));
        assert_eq!(legs[0].end, ts(11));
        // New leg anchored at the reversal bar's close.
        assert_eq!(legs[1].start, ts(11));
        assert_eq!(legs[1].start_value, px(4.0));
        assert_eq!(legs[1].direction, LegDirection::Down);
    }

    #[test]
    fn down_leg_closes_on_threshold_rally() {
        let mut bars = vec![flat(0, px(20.0))];
        for i in 1..=10 {
            let p = px(20.0 - i as f64);
            bars.push(bar(i, px(21.0 - i as f64), px(21.0 - i as f64), p, p));
        }
        bars.push(bar(11, px(10.0), px(17.0), px(10.0), px(16.0)));
        bars.push(flat(12, px(16.0)));

        let legs = segment_legs(&bars, 6.0);
        assert_eq!(legs.len(), 2);
        assert_eq!(legs[0].direction, LegDirection::Down);
        assert_eq!(legs[0].end_value, px(10.0));
        assert_eq!(legs[1].direction, LegDirection::Up);
    }

    #[test]
    fn legs_are_contiguous() {
        // Up, down, up again.
        let mut bars = vec![flat(0, px(0.0))];
        for i in 1..=10 {
            bars.push(flat(i, px(i as f64)));
        }
        bars.push(bar(11, px(10.0), px(10.0), px(3.0), px(4.0)));
        for i in 12..=14 {
            bars.push(flat(i, px(16.0 - i as f64)));
        }
        bars.push(bar(15, px(1.0), px(8.0), px(1.0), px(7.0)));
        bars.push(flat(16, px(7.0)));

        let legs = segment_legs(&bars, 6.0);
        assert!(legs.len() >= 3);
        for pair in legs.windows(2) {
            assert_eq!(pair[0].end, pair[1].start);
        }
    }

    proptest! {
        /// Structural invariants on arbitrary contiguous bar paths:
        /// legs are contiguous and alternate direction, and the first
        /// closed leg (the impulse seen from a fresh anchor) spans at
        /// least the threshold.
        #[test]
        fn segmentation_invariants(
            steps in prop::collection::vec(-3.0f64..3.0, 10..200),
            threshold in 2.0f64..12.0,
        ) {
            let mut bars = Vec::with_capacity(steps.len() + 1);
            let mut close = px(0.0);
            bars.push(flat(0, close));
            for (i, step) in steps.iter().enumerate() {
                let open = close;
                close += step / PIP_FACTOR;
                let high = open.max(close);
                let low = open.min(close);
                bars.push(bar(i + 1, open, high, low, close));
            }

            let legs = segment_legs(&bars, threshold);
            for pair in legs.windows(2) {
                prop_assert_eq!(pair[0].end, pair[1].start);
                prop_assert_ne!(pair[0].direction, pair[1].direction);
            }
            if legs.len() > 1 {
                prop_assert!(
                    legs[0].size_pips() >= threshold - 1e-6,
                    "first closed leg of {} pips under threshold {}",
                    legs[0].size_pips(),
                    threshold
                );
            }
        }
    }
}

//! Greedy signal-to-trade matching.
//!
//! Real signals and simulated trades are paired per direction: each
//! real signal, in time order, claims the nearest not-yet-used trade
//! within the tolerance window. Greedy by design — a signal earlier in
//! time gets first pick even if a later signal was closer.

use chrono::TimeDelta;
use serde::Serialize;

use swinglab_core::{Trade, TradeDirection, PIP_FACTOR};

use crate::signals::RealSignal;

/// One matched (real signal, simulated trade) pair.
#[derive(Debug, Clone, Serialize)]
pub struct MatchRecord {
    pub real_time: chrono::NaiveDateTime,
    pub direction: TradeDirection,
    pub real_entry: f64,
    pub bt_time: chrono::NaiveDateTime,
    pub bt_entry: f64,
    pub time_diff_min: f64,
    pub price_diff_pips: f64,
}

/// Outcome of matching one trade list against one signal list.
#[derive(Debug, Clone, Default)]
pub struct MatchReport {
    pub matches: Vec<MatchRecord>,
    pub unmatched_real: Vec<RealSignal>,
    pub unmatched_backtest: Vec<Trade>,
}

impl MatchReport {
    pub fn median_time_diff_min(&self) -> Option<f64> {
        median(self.matches.iter().map(|m| m.time_diff_min))
    }

    pub fn median_price_diff_pips(&self) -> Option<f64> {
        median(self.matches.iter().map(|m| m.price_diff_pips))
    }
}

/// Median of a finite sample; `None` when empty.
pub fn median(values: impl Iterator<Item = f64>) -> Option<f64> {
    let mut v: Vec<f64> = values.collect();
    if v.is_empty() {
        return None;
    }
    v.sort_by(|a, b| a.total_cmp(b));
    let mid = v.len() / 2;
    if v.len() % 2 == 1 {
        Some(v[mid])
    } else {
        Some((v[mid - 1] + v[mid]) / 2.0)
    }
}

/// Match `real` signals against `trades`, pairing within
/// `tolerance_minutes` of each other. Either side empty means no
/// matches and everything unmatched.
pub fn match_signals(real: &[RealSignal], trades: &[Trade], tolerance_minutes: i64) -> MatchReport {
    if real.is_empty() || trades.is_empty() {
        return MatchReport {
            matches: Vec::new(),
            unmatched_real: real.to_vec(),
            unmatched_backtest: trades.to_vec(),
        };
    }

    let tol = TimeDelta::minutes(tolerance_minutes);
    let mut bt_sorted: Vec<(usize, &Trade)> = trades.iter().enumerate().collect();
    bt_sorted.sort_by_key(|(_, t)| t.timestamp);

    let mut matches = Vec::new();
    let mut used_bt = vec![false; trades.len()];
    let mut used_real = vec![false; real.len()];

    for direction in [TradeDirection::Buy, TradeDirection::Sell] {
        let mut real_dir: Vec<(usize, &RealSignal)> = real
            .iter()
            .enumerate()
            .filter(|(_, s)| s.direction == direction)
            .collect();
        real_dir.sort_by_key(|(_, s)| s.dt_utc);

        for (ridx, signal) in real_dir {
            let mut candidates: Vec<(usize, &Trade, TimeDelta)> = bt_sorted
                .iter()
                .filter(|(_, t)| t.direction == direction)
                .filter(|(_, t)| {
                    t.timestamp >= signal.dt_utc - tol && t.timestamp <= signal.dt_utc + tol
                })
                .map(|&(i, t)| (i, t, (t.timestamp - signal.dt_utc).abs()))
                .collect();
            candidates.sort_by_key(|&(_, _, diff)| diff);

            let Some(&(bidx, trade, diff)) =
                candidates.iter().find(|(i, _, _)| !used_bt[*i])
            else {
                continue;
            };
            used_bt[bidx] = true;
            used_real[ridx] = true;
            matches.push(MatchRecord {
                real_time: signal.dt_utc,
                direction,
                real_entry: signal.entry,
                bt_time: trade.timestamp,
                bt_entry: trade.entry,
                time_diff_min: diff.num_seconds() as f64 / 60.0,
                price_diff_pips: (signal.entry - trade.entry).abs() * PIP_FACTOR,
            });
        }
    }

    matches.sort_by_key(|m| m.real_time);
    let unmatched_real = real
        .iter()
        .zip(&used_real)
        .filter(|(_, used)| !**used)
        .map(|(s, _)| s.clone())
        .collect();
    let unmatched_backtest = trades
        .iter()
        .zip(&used_bt)
        .filter(|(_, used)| !**used)
        .map(|(t, _)| t.clone())
        .collect();

    MatchReport {
        matches,
        unmatched_real,
        unmatched_backtest,
    }
}

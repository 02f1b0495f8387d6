//! R-based accounting over a resolved trade list.
//!
//! Fixed convention: +rr on TP, -1.0 on SL, 0.0 on TIMEOUT. Equity is the
//! running sum of R; monthly rollups group by the exit month.

use chrono::{Datelike, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::domain::{ExitReason, Trade, TradeDirection};

/// One row of the R-based equity curve, emitted per resolved trade.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EquityPoint {
    /// Exit timestamp of the trade that moved equity.
    pub timestamp: NaiveDateTime,
    pub equity_r: f64,
    pub last_trade_r: f64,
    pub exit_reason: ExitReason,
    pub direction: TradeDirection,
}

/// Monthly rollup keyed by `YYYY-MM` of the exit timestamp.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonthlyStats {
    pub month: String,
    pub trades: usize,
    pub wins: usize,
    pub losses: usize,
    pub timeouts: usize,
    /// Win rate in percent.
    pub win_rate: f64,
    pub net_r: f64,
}

/// Cumulative R equity curve in trade-resolution order.
pub fn equity_curve(trades: &[Trade]) -> Vec<EquityPoint> {
    let mut equity = 0.0;
    trades
        .iter()
        .map(|t| {
            let r = t.r_multiple();
            equity += r;
            EquityPoint {
                timestamp: t.exit_timestamp,
                equity_r: equity,
                last_trade_r: r,
                exit_reason: t.exit_reason,
                direction: t.direction,
            }
        })
        .collect()
}

/// Group trades by exit month. Months come out in calendar order.
pub fn monthly_stats(trades: &[Trade]) -> Vec<MonthlyStats> {
    let mut months: BTreeMap<String, MonthlyStats> = BTreeMap::new();
    for t in trades {
        let key = format!(
            "{:04}-{:02}",
            t.exit_timestamp.year(),
            t.exit_timestamp.month()
        );
        let entry = months.entry(key.clone()).or_insert_with(|| MonthlyStats {
            month: key,
            trades: 0,
            wins: 0,
            losses: 0,
            timeouts: 0,
            win_rate: 0.0,
            net_r: 0.0,
        });
        entry.trades += 1;
        entry.net_r += t.r_multiple();
        match t.exit_reason {
            ExitReason::Tp => entry.wins += 1,
            ExitReason::Sl => entry.losses += 1,
            ExitReason::Timeout => entry.timeouts += 1,
        }
    }
    let mut rows: Vec<MonthlyStats> = months.into_values().collect();
    for row in &mut rows {
        row.win_rate = row.wins as f64 / row.trades as f64 * 100.0;
    }
    rows
}

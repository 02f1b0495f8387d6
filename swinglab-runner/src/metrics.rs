//! Aggregate statistics over a resolved trade list.

use serde::Serialize;

use swinglab_core::{ExitReason, Trade, TradeDirection};

/// Headline backtest statistics. Win rates are percentages.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Summary {
    pub total_trades: usize,
    pub wins: usize,
    pub losses: usize,
    pub timeouts: usize,
    pub win_rate: f64,
    pub avg_r: f64,
    pub net_r: f64,
    pub buy_win_rate: f64,
    pub sell_win_rate: f64,
}

fn win_rate(trades: impl Iterator<Item = bool> + Clone) -> f64 {
    let total = trades.clone().count();
    if total == 0 {
        return 0.0;
    }
    let wins = trades.filter(|w| *w).count();
    wins as f64 / total as f64 * 100.0
}

/// Summarize a trade list. An empty list yields the zero summary.
pub fn summarize(trades: &[Trade]) -> Summary {
    if trades.is_empty() {
        return Summary::default();
    }
    let total = trades.len();
    let wins = trades
        .iter()
        .filter(|t| t.exit_reason == ExitReason::Tp)
        .count();
    let losses = trades
        .iter()
        .filter(|t| t.exit_reason == ExitReason::Sl)
        .count();
    let timeouts = trades
        .iter()
        .filter(|t| t.exit_reason == ExitReason::Timeout)
        .count();
    let net_r: f64 = trades.iter().map(|t| t.r_multiple()).sum();

    let direction_rate = |direction: TradeDirection| {
        win_rate(
            trades
                .iter()
                .filter(move |t| t.direction == direction)
                .map(|t| t.is_winner()),
        )
    };

    Summary {
        total_trades: total,
        wins,
        losses,
        timeouts,
        win_rate: wins as f64 / total as f64 * 100.0,
        avg_r: net_r / total as f64,
        net_r,
        buy_win_rate: direction_rate(TradeDirection::Buy),
        sell_win_rate: direction_rate(TradeDirection::Sell),
    }
}

//! Parameter grid search scored against real signal logs.
//!
//! The grid is materialized as an explicit cell list up front, then
//! evaluated in parallel. Each cell runs the engine with its config,
//! matches the trades against the (possibly time-shifted) real signals,
//! and scores the agreement. The best cell wins by: more matches, then
//! smaller median time difference, then fewer unmatched real signals;
//! remaining ties go to the lower cell index so results are
//! deterministic regardless of worker scheduling.

use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use rayon::prelude::*;
use serde::Serialize;

use swinglab_core::{Bar, SessionConfig, StrategyConfig};

use crate::matcher::{match_signals, MatchReport};
use crate::runner::config_fingerprint;
use crate::signals::{shift_signals, RealSignal};

/// Default matching tolerance, in minutes.
pub const DEFAULT_TOLERANCE_MINUTES: i64 = 30;

/// Default time offsets tried against the real signal timestamps, in
/// minutes. Covers logs recorded in UTC and in UTC+/-3.
pub const DEFAULT_TIME_OFFSETS: &[i64] = &[0, 180, -180];

/// Grid density presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GridMode {
    Wide,
    Fast,
    Micro,
}

impl FromStr for GridMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "wide" => Ok(GridMode::Wide),
            "fast" => Ok(GridMode::Fast),
            "micro" => Ok(GridMode::Micro),
            other => Err(format!("unknown grid mode '{other}' (wide|fast|micro)")),
        }
    }
}

/// Axes of the search grid.
#[derive(Debug, Clone)]
pub struct ParamGrid {
    pub thresholds: Vec<f64>,
    pub entry_tols: Vec<f64>,
    pub lookbacks: Vec<usize>,
    pub two_touches: Vec<bool>,
    pub min_sls: Vec<f64>,
    pub sell_only_opts: Vec<bool>,
    pub time_offsets: Vec<i64>,
}

impl ParamGrid {
    pub fn preset(mode: GridMode, time_offsets: Vec<i64>) -> Self {
        let (thresholds, entry_tols, lookbacks, min_sls) = match mode {
            GridMode::Wide => (
                vec![5.0, 6.0, 7.0, 8.0],
                vec![1.0, 1.5, 2.0, 3.0],
                vec![80, 100, 120, 160],
                vec![2.0, 3.0],
            ),
            GridMode::Fast => (
                vec![6.0, 7.0],
                vec![2.0, 3.0],
                vec![100, 140],
                vec![2.0],
            ),
            GridMode::Micro => (vec![6.0], vec![2.0, 3.0], vec![120], vec![2.0]),
        };
        Self {
            thresholds,
            entry_tols,
            lookbacks,
            two_touches: vec![false, true],
            min_sls,
            sell_only_opts: vec![false, true],
            time_offsets,
        }
    }

    pub fn len(&self) -> usize {
        self.time_offsets.len()
            * self.thresholds.len()
            * self.entry_tols.len()
            * self.lookbacks.len()
            * self.two_touches.len()
            * self.min_sls.len()
            * self.sell_only_opts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Materialize every cell. Offsets vary slowest, sell-only fastest,
    /// and indices follow that enumeration order.
    pub fn cells(&self) -> Vec<GridCell> {
        let mut cells = Vec::with_capacity(self.len());
        let mut index = 0;
        for &off in &self.time_offsets {
            for &th in &self.thresholds {
                for &tol in &self.entry_tols {
                    for &lb in &self.lookbacks {
                        for &tt in &self.two_touches {
                            for &msl in &self.min_sls {
                                for &so in &self.sell_only_opts {
                                    cells.push(GridCell {
                                        index,
                                        time_offset_min: off,
                                        config: StrategyConfig {
                                            threshold: th,
                                            entry_tolerance_pips: tol,
                                            lookback_bars: lb,
                                            two_touch_705: tt,
                                            min_sl_pips: msl,
                                            sell_only: so,
                                            ..StrategyConfig::default()
                                        },
                                    });
                                    index += 1;
                                }
                            }
                        }
                    }
                }
            }
        }
        cells
    }
}

/// One point of the search grid.
#[derive(Debug, Clone)]
pub struct GridCell {
    pub index: usize,
    pub time_offset_min: i64,
    pub config: StrategyConfig,
}

/// Agreement score for one evaluated cell.
#[derive(Debug, Clone, PartialEq)]
pub struct CellScore {
    pub matches: usize,
    pub unmatched_real: usize,
    pub unmatched_backtest: usize,
    pub median_time_diff_min: Option<f64>,
    pub median_price_diff_pips: Option<f64>,
}

impl CellScore {
    fn from_report(report: &MatchReport) -> Self {
        Self {
            matches: report.matches.len(),
            unmatched_real: report.unmatched_real.len(),
            unmatched_backtest: report.unmatched_backtest.len(),
            median_time_diff_min: report.median_time_diff_min(),
            median_price_diff_pips: report.median_price_diff_pips(),
        }
    }
}

/// Strict comparator: does `a` beat `b`?
pub fn is_better(a: &CellScore, b: &CellScore) -> bool {
    if a.matches != b.matches {
        return a.matches > b.matches;
    }
    let a_td = a.median_time_diff_min.unwrap_or(f64::INFINITY);
    let b_td = b.median_time_diff_min.unwrap_or(f64::INFINITY);
    if a_td != b_td {
        return a_td < b_td;
    }
    a.unmatched_real < b.unmatched_real
}

/// One leaderboard row, flattened for CSV/JSON export.
#[derive(Debug, Clone, Serialize)]
pub struct LeaderboardRow {
    pub idx: usize,
    pub fingerprint: String,
    pub time_offset_min: i64,
    pub threshold: f64,
    pub entry_tolerance_pips: f64,
    pub lookback_bars: usize,
    pub two_touch_705: bool,
    pub min_sl_pips: f64,
    pub sell_only: bool,
    pub matches: usize,
    pub unmatched_real: usize,
    pub unmatched_backtest: usize,
    pub median_time_diff_min: Option<f64>,
    pub median_price_diff_pips: Option<f64>,
}

/// The winning cell with everything needed to reproduce and inspect it.
#[derive(Debug, Clone)]
pub struct BestArtifacts {
    pub config: StrategyConfig,
    pub time_offset_min: i64,
    pub trades: Vec<swinglab_core::Trade>,
    pub report: MatchReport,
}

/// Result of a full grid search.
#[derive(Debug, Clone)]
pub struct TuningOutcome {
    pub grid_size: usize,
    pub evaluated: usize,
    /// Sorted best-first: matches desc, median time asc, unmatched asc.
    pub leaderboard: Vec<LeaderboardRow>,
    pub best: Option<LeaderboardRow>,
    pub best_artifacts: Option<BestArtifacts>,
}

/// Cooperative cancellation shared across grid workers.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

struct CellOutcome {
    cell: GridCell,
    score: CellScore,
    trades: Vec<swinglab_core::Trade>,
    report: MatchReport,
}

/// Evaluate the whole grid against `bars` and `real` signals.
///
/// When `early_stop` is set, the first cell to score any matches flips
/// the cancellation token; workers check it before starting each cell,
/// so already-running cells still finish and the best among everything
/// evaluated is returned.
pub fn run_grid_search(
    bars: &[Bar],
    real: &[RealSignal],
    session: &SessionConfig,
    grid: &ParamGrid,
    tolerance_minutes: i64,
    early_stop: bool,
) -> TuningOutcome {
    let cells = grid.cells();
    let grid_size = cells.len();
    let cancel = CancelToken::new();

    let mut outcomes: Vec<CellOutcome> = cells
        .into_par_iter()
        .filter_map(|cell| {
            if cancel.is_cancelled() {
                return None;
            }
            let shifted = shift_signals(real, cell.time_offset_min);
            let trades = swinglab_core::run_engine(bars, &cell.config, session, None);
            let report = match_signals(&shifted, &trades, tolerance_minutes);
            let score = CellScore::from_report(&report);
            if early_stop && score.matches > 0 {
                cancel.cancel();
            }
            Some(CellOutcome {
                cell,
                score,
                trades,
                report,
            })
        })
        .collect();
    outcomes.sort_by_key(|o| o.cell.index);

    let evaluated = outcomes.len();
    let best_pos = outcomes
        .iter()
        .enumerate()
        .fold(None::<usize>, |best, (pos, o)| match best {
            None => Some(pos),
            Some(b) if is_better(&o.score, &outcomes[b].score) => Some(pos),
            Some(b) => Some(b),
        });

    let row_for = |o: &CellOutcome| LeaderboardRow {
        idx: o.cell.index,
        fingerprint: config_fingerprint(&o.cell.config, session),
        time_offset_min: o.cell.time_offset_min,
        threshold: o.cell.config.threshold,
        entry_tolerance_pips: o.cell.config.entry_tolerance_pips,
        lookback_bars: o.cell.config.lookback_bars,
        two_touch_705: o.cell.config.two_touch_705,
        min_sl_pips: o.cell.config.min_sl_pips,
        sell_only: o.cell.config.sell_only,
        matches: o.score.matches,
        unmatched_real: o.score.unmatched_real,
        unmatched_backtest: o.score.unmatched_backtest,
        median_time_diff_min: o.score.median_time_diff_min,
        median_price_diff_pips: o.score.median_price_diff_pips,
    };

    let best = best_pos.map(|pos| row_for(&outcomes[pos]));
    let best_artifacts = best_pos.map(|pos| {
        let o = &outcomes[pos];
        BestArtifacts {
            config: o.cell.config.clone(),
            time_offset_min: o.cell.time_offset_min,
            trades: o.trades.clone(),
            report: o.report.clone(),
        }
    });

    let mut leaderboard: Vec<LeaderboardRow> = outcomes.iter().map(row_for).collect();
    leaderboard.sort_by(|a, b| {
        b.matches
            .cmp(&a.matches)
            .then_with(|| {
                a.median_time_diff_min
                    .unwrap_or(f64::INFINITY)
                    .total_cmp(&b.median_time_diff_min.unwrap_or(f64::INFINITY))
            })
            .then_with(|| a.unmatched_real.cmp(&b.unmatched_real))
            .then_with(|| a.idx.cmp(&b.idx))
    });

    TuningOutcome {
        grid_size,
        evaluated,
        leaderboard,
        best,
        best_artifacts,
    }
}

/// Parse a comma-separated offset list like `0,180,-180`. Falls back to
/// `[0]` when nothing parses.
pub fn parse_time_offsets(s: &str) -> Vec<i64> {
    let offsets: Vec<i64> = s
        .split(',')
        .filter_map(|x| x.trim().parse::<i64>().ok())
        .collect();
    if offsets.is_empty() {
        vec![0]
    } else {
        offsets
    }
}

//! Artifact export — JSON, CSV, and Markdown outputs.
//!
//! A backtest run writes `trades.csv`, `summary.json`, `equity.csv`,
//! `monthly_stats.csv`, and `diagnostics.md` into its output directory.
//! A tuning run writes `leaderboard.csv`, `leaderboard.json`,
//! `tuning_summary.json`, and a `best/` bundle with the winning config
//! and its trades and match breakdown.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde_json::json;

use swinglab_core::{EquityPoint, MonthlyStats, Trade};

use crate::matcher::{MatchRecord, MatchReport};
use crate::runner::BacktestResult;
use crate::signals::RealSignal;
use crate::tuning::{LeaderboardRow, TuningOutcome};

// ─── CSV export ─────────────────────────────────────────────────────

/// Columns: timestamp, direction, entry, sl, tp, rr, sl_pips,
/// exit_timestamp, exit_reason, exit_price.
pub fn export_trades_csv(trades: &[Trade]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record([
        "timestamp",
        "direction",
        "entry",
        "sl",
        "tp",
        "rr",
        "sl_pips",
        "exit_timestamp",
        "exit_reason",
        "exit_price",
    ])?;
    for t in trades {
        wtr.write_record([
            &t.timestamp.to_string(),
            t.direction.as_str(),
            &format!("{:.5}", t.entry),
            &format!("{:.5}", t.sl),
            &format!("{:.5}", t.tp),
            &format!("{:.2}", t.rr),
            &format!("{:.1}", t.sl_pips),
            &t.exit_timestamp.to_string(),
            t.exit_reason.as_str(),
            &format!("{:.5}", t.exit_price),
        ])?;
    }
    finish(wtr)
}

pub fn export_equity_csv(equity: &[EquityPoint]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record([
        "timestamp",
        "equity_r",
        "last_trade_r",
        "exit_reason",
        "direction",
    ])?;
    for p in equity {
        wtr.write_record([
            &p.timestamp.to_string(),
            &format!("{:.2}", p.equity_r),
            &format!("{:.2}", p.last_trade_r),
            p.exit_reason.as_str(),
            p.direction.as_str(),
        ])?;
    }
    finish(wtr)
}

pub fn export_monthly_csv(monthly: &[MonthlyStats]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record([
        "month", "trades", "wins", "losses", "timeouts", "win_rate", "net_r",
    ])?;
    for m in monthly {
        wtr.write_record([
            &m.month,
            &m.trades.to_string(),
            &m.wins.to_string(),
            &m.losses.to_string(),
            &m.timeouts.to_string(),
            &format!("{:.1}", m.win_rate),
            &format!("{:.2}", m.net_r),
        ])?;
    }
    finish(wtr)
}

pub fn export_matches_csv(matches: &[MatchRecord]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record([
        "real_time",
        "real_direction",
        "real_entry",
        "bt_time",
        "bt_entry",
        "time_diff_min",
        "price_diff_pips",
    ])?;
    for m in matches {
        wtr.write_record([
            &m.real_time.to_string(),
            m.direction.as_str(),
            &format!("{:.5}", m.real_entry),
            &m.bt_time.to_string(),
            &format!("{:.5}", m.bt_entry),
            &format!("{:.1}", m.time_diff_min),
            &format!("{:.1}", m.price_diff_pips),
        ])?;
    }
    finish(wtr)
}

pub fn export_signals_csv(signals: &[RealSignal]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(["dt_utc", "direction", "entry", "sl", "tp"])?;
    for s in signals {
        wtr.write_record([
            &s.dt_utc.to_string(),
            s.direction.as_str(),
            &format!("{:.5}", s.entry),
            &format!("{:.5}", s.sl),
            &format!("{:.5}", s.tp),
        ])?;
    }
    finish(wtr)
}

pub fn export_leaderboard_csv(rows: &[LeaderboardRow]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    for row in rows {
        wtr.serialize(row)?;
    }
    finish_serialized(wtr, rows.is_empty())
}

fn finish(wtr: csv::Writer<Vec<u8>>) -> Result<String> {
    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

fn finish_serialized(wtr: csv::Writer<Vec<u8>>, empty: bool) -> Result<String> {
    if empty {
        return Ok(String::new());
    }
    finish(wtr)
}

// ─── Markdown diagnostics ───────────────────────────────────────────

/// Human-readable single-run report.
pub fn generate_diagnostics(result: &BacktestResult, input: &str) -> String {
    let s = &result.summary;
    let mut md = String::with_capacity(1024);
    md.push_str("# Backtest Diagnostics\n\n");
    md.push_str(&format!("Input: {input}\n\n"));
    md.push_str(&format!("Config fingerprint: `{}`\n", result.config_fingerprint));
    md.push_str(&format!("Bars: {}\n\n", result.bar_count));
    md.push_str("| Metric | Value |\n");
    md.push_str("| --- | ---: |\n");
    md.push_str(&format!("| Total trades | {} |\n", s.total_trades));
    md.push_str(&format!("| Wins | {} |\n", s.wins));
    md.push_str(&format!("| Losses | {} |\n", s.losses));
    md.push_str(&format!("| Timeouts | {} |\n", s.timeouts));
    md.push_str(&format!("| Win rate | {:.1}% |\n", s.win_rate));
    md.push_str(&format!("| Avg R | {:.3} |\n", s.avg_r));
    md.push_str(&format!("| Net R | {:.2} |\n", s.net_r));
    md.push_str(&format!("| Buy win rate | {:.1}% |\n", s.buy_win_rate));
    md.push_str(&format!("| Sell win rate | {:.1}% |\n", s.sell_win_rate));
    md.push('\n');
    md
}

// ─── Artifact bundles ───────────────────────────────────────────────

/// Write the full artifact set for one backtest run into `output_dir`.
pub fn save_backtest_artifacts(
    result: &BacktestResult,
    input: &str,
    output_dir: &Path,
) -> Result<PathBuf> {
    std::fs::create_dir_all(output_dir)
        .with_context(|| format!("failed to create output dir: {}", output_dir.display()))?;

    write(output_dir, "trades.csv", &export_trades_csv(&result.trades)?)?;
    write(
        output_dir,
        "summary.json",
        &serde_json::to_string_pretty(&result.summary)?,
    )?;
    write(output_dir, "equity.csv", &export_equity_csv(&result.equity)?)?;
    write(
        output_dir,
        "monthly_stats.csv",
        &export_monthly_csv(&result.monthly)?,
    )?;
    write(
        output_dir,
        "diagnostics.md",
        &generate_diagnostics(result, input),
    )?;
    Ok(output_dir.to_path_buf())
}

/// Write leaderboard, summary, and the winning cell's bundle.
pub fn save_tuning_artifacts(
    outcome: &TuningOutcome,
    tolerance_minutes: i64,
    output_dir: &Path,
) -> Result<PathBuf> {
    std::fs::create_dir_all(output_dir)
        .with_context(|| format!("failed to create output dir: {}", output_dir.display()))?;

    write(
        output_dir,
        "leaderboard.csv",
        &export_leaderboard_csv(&outcome.leaderboard)?,
    )?;
    write(
        output_dir,
        "leaderboard.json",
        &serde_json::to_string_pretty(&outcome.leaderboard)?,
    )?;

    let top: Vec<&LeaderboardRow> = outcome.leaderboard.iter().take(10).collect();
    let summary = json!({
        "tolerance_minutes": tolerance_minutes,
        "grid_size": outcome.grid_size,
        "evaluated": outcome.evaluated,
        "best": outcome.best,
        "leaderboard_top": top,
    });
    write(
        output_dir,
        "tuning_summary.json",
        &serde_json::to_string_pretty(&summary)?,
    )?;

    if let Some(best) = &outcome.best_artifacts {
        let best_dir = output_dir.join("best");
        std::fs::create_dir_all(&best_dir)
            .with_context(|| format!("failed to create {}", best_dir.display()))?;
        let config = json!({
            "threshold": best.config.threshold,
            "entry_tolerance_pips": best.config.entry_tolerance_pips,
            "lookback_bars": best.config.lookback_bars,
            "two_touch_705": best.config.two_touch_705,
            "min_sl_pips": best.config.min_sl_pips,
            "sell_only": best.config.sell_only,
            "time_offset_min": best.time_offset_min,
        });
        write(
            &best_dir,
            "best_config.json",
            &serde_json::to_string_pretty(&config)?,
        )?;
        write(&best_dir, "trades.csv", &export_trades_csv(&best.trades)?)?;
        save_match_report(&best.report, &best_dir)?;
    }
    Ok(output_dir.to_path_buf())
}

/// Write `matches.csv`, `unmatched_real.csv`, `unmatched_backtest.csv`.
pub fn save_match_report(report: &MatchReport, output_dir: &Path) -> Result<()> {
    write(
        output_dir,
        "matches.csv",
        &export_matches_csv(&report.matches)?,
    )?;
    write(
        output_dir,
        "unmatched_real.csv",
        &export_signals_csv(&report.unmatched_real)?,
    )?;
    write(
        output_dir,
        "unmatched_backtest.csv",
        &export_trades_csv(&report.unmatched_backtest)?,
    )?;
    Ok(())
}

fn write(dir: &Path, name: &str, content: &str) -> Result<()> {
    let path = dir.join(name);
    std::fs::write(&path, content).with_context(|| format!("failed to write {}", path.display()))
}

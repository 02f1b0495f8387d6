//! SwingLab CLI — run and tune commands.
//!
//! Commands:
//! - `run` — execute a single backtest over a bar CSV and save artifacts
//! - `tune` — grid-search strategy parameters against real signal logs

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use chrono::NaiveDateTime;
use clap::{Parser, Subcommand};

use swinglab_runner::{
    load_bars_csv, load_signals, parse_time_offsets, run_backtest, run_grid_search,
    save_backtest_artifacts, save_tuning_artifacts, BacktestResult, GridMode, ParamGrid,
    RunConfig, TuningOutcome,
};

#[derive(Parser)]
#[command(
    name = "swinglab",
    about = "SwingLab CLI — swing/fib backtesting engine"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Execute a single backtest over a bar CSV.
    Run {
        /// Path to a CSV with timestamp,open,high,low,close[,volume].
        #[arg(long)]
        csv: PathBuf,

        /// Path to a TOML run config ([strategy] and [session] tables).
        #[arg(long)]
        config: Option<PathBuf>,

        /// Skip entries on bullish swings.
        #[arg(long, default_value_t = false)]
        sell_only: bool,

        /// Override the reward-to-risk target (e.g. 1.2, 1.5, 2.0).
        #[arg(long)]
        win_ratio: Option<f64>,

        /// Disable the session time-of-day filter.
        #[arg(long, default_value_t = false)]
        no_session: bool,

        /// Output directory for artifacts.
        #[arg(long, default_value = "results")]
        out: PathBuf,
    },
    /// Grid-search parameters to maximize agreement with real signal logs.
    Tune {
        /// Path to a CSV with timestamp,open,high,low,close[,volume].
        #[arg(long)]
        csv: PathBuf,

        /// Directory holding per-day signal logs
        /// ({SYMBOL}_signals_{YYYY-MM-DD}.csv).
        #[arg(long)]
        signals_dir: PathBuf,

        /// Symbol prefix of the signal log files.
        #[arg(long, default_value = "EURUSD")]
        symbol: String,

        /// Start of the signal range (ISO, e.g. 2025-09-02T00:00:00).
        /// Defaults to the first bar timestamp.
        #[arg(long)]
        start: Option<String>,

        /// End of the signal range (ISO). Defaults to the last bar timestamp.
        #[arg(long)]
        end: Option<String>,

        /// Matching tolerance in minutes.
        #[arg(long, default_value_t = 30)]
        tolerance_minutes: i64,

        /// Grid density: wide, fast, or micro.
        #[arg(long, default_value = "fast")]
        mode: String,

        /// Stop scheduling new cells once any cell scores a match.
        #[arg(long, default_value_t = false)]
        early_stop: bool,

        /// Comma-separated minute offsets applied to the real signal
        /// timestamps before matching.
        #[arg(long, default_value = "0,180,-180")]
        time_offsets: String,

        /// Path to a TOML run config (used for the [session] table).
        #[arg(long)]
        config: Option<PathBuf>,

        /// Output directory for artifacts.
        #[arg(long, default_value = "results/tuning")]
        out: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Run {
            csv,
            config,
            sell_only,
            win_ratio,
            no_session,
            out,
        } => run_cmd(csv, config, sell_only, win_ratio, no_session, out),
        Commands::Tune {
            csv,
            signals_dir,
            symbol,
            start,
            end,
            tolerance_minutes,
            mode,
            early_stop,
            time_offsets,
            config,
            out,
        } => tune_cmd(
            csv,
            signals_dir,
            symbol,
            start,
            end,
            tolerance_minutes,
            mode,
            early_stop,
            time_offsets,
            config,
            out,
        ),
    }
}

fn load_run_config(path: Option<&PathBuf>) -> Result<RunConfig> {
    match path {
        Some(p) => RunConfig::from_file(p)
            .with_context(|| format!("loading run config {}", p.display())),
        None => Ok(RunConfig::default()),
    }
}

fn run_cmd(
    csv: PathBuf,
    config: Option<PathBuf>,
    sell_only: bool,
    win_ratio: Option<f64>,
    no_session: bool,
    out: PathBuf,
) -> Result<()> {
    let mut cfg = load_run_config(config.as_ref())?;
    if sell_only {
        cfg.strategy.sell_only = true;
    }
    if let Some(rr) = win_ratio {
        cfg.strategy.win_ratio = rr;
    }
    if no_session {
        cfg.session.enabled = false;
    }

    let bars =
        load_bars_csv(&csv).with_context(|| format!("loading bars from {}", csv.display()))?;
    let result = run_backtest(&bars, &cfg.strategy, &cfg.session, None);
    print_summary(&result);

    let dir = save_backtest_artifacts(&result, &csv.display().to_string(), &out)?;
    println!("Artifacts saved to: {}", dir.display());
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn tune_cmd(
    csv: PathBuf,
    signals_dir: PathBuf,
    symbol: String,
    start: Option<String>,
    end: Option<String>,
    tolerance_minutes: i64,
    mode: String,
    early_stop: bool,
    time_offsets: String,
    config: Option<PathBuf>,
    out: PathBuf,
) -> Result<()> {
    let cfg = load_run_config(config.as_ref())?;
    let mode: GridMode = mode.parse().map_err(anyhow::Error::msg)?;
    let offsets = parse_time_offsets(&time_offsets);

    let bars =
        load_bars_csv(&csv).with_context(|| format!("loading bars from {}", csv.display()))?;
    let start = parse_or_bar_edge(start.as_deref(), bars.first().map(|b| b.timestamp))?;
    let end = parse_or_bar_edge(end.as_deref(), bars.last().map(|b| b.timestamp))?;
    let signals = load_signals(&signals_dir, &symbol, start, end)
        .with_context(|| format!("loading signals from {}", signals_dir.display()))?;
    if signals.is_empty() {
        eprintln!(
            "Warning: no signals found for {symbol} in {} between {start} and {end}",
            signals_dir.display()
        );
    }

    let grid = ParamGrid::preset(mode, offsets);
    println!(
        "Evaluating {} grid cells against {} signals...",
        grid.len(),
        signals.len()
    );
    let outcome = run_grid_search(
        &bars,
        &signals,
        &cfg.session,
        &grid,
        tolerance_minutes,
        early_stop,
    );
    print_tuning(&outcome);

    let dir = save_tuning_artifacts(&outcome, tolerance_minutes, &out)?;
    println!("Artifacts saved to: {}", dir.display());
    Ok(())
}

fn parse_or_bar_edge(s: Option<&str>, fallback: Option<NaiveDateTime>) -> Result<NaiveDateTime> {
    if let Some(s) = s {
        for fmt in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"] {
            if let Ok(ts) = NaiveDateTime::parse_from_str(s, fmt) {
                return Ok(ts);
            }
        }
        if let Ok(d) = chrono::NaiveDate::parse_from_str(s, "%Y-%m-%d") {
            return Ok(d.and_hms_opt(0, 0, 0).expect("valid time"));
        }
        bail!("unparseable datetime '{s}'");
    }
    fallback.context("no bars loaded and no explicit range given")
}

fn print_summary(result: &BacktestResult) {
    let s = &result.summary;
    println!();
    println!("=== Backtest Result ===");
    println!("Bars:           {}", result.bar_count);
    println!("Fingerprint:    {}", result.config_fingerprint);
    println!("Trades:         {}", s.total_trades);
    println!(
        "W/L/T:          {}/{}/{}",
        s.wins, s.losses, s.timeouts
    );
    println!("Win Rate:       {:.1}%", s.win_rate);
    println!("Net R:          {:.2}", s.net_r);
    println!("Avg R:          {:.3}", s.avg_r);
    println!("Buy Win Rate:   {:.1}%", s.buy_win_rate);
    println!("Sell Win Rate:  {:.1}%", s.sell_win_rate);
    println!();
}

fn print_tuning(outcome: &TuningOutcome) {
    println!();
    println!("=== Tuning Result ===");
    println!(
        "Cells:          {} evaluated of {}",
        outcome.evaluated, outcome.grid_size
    );
    match &outcome.best {
        Some(best) => {
            println!("Best cell:      #{} ({})", best.idx, best.fingerprint);
            println!(
                "  threshold={} entry_tol={} lookback={} two_touch={} min_sl={} sell_only={} offset={}m",
                best.threshold,
                best.entry_tolerance_pips,
                best.lookback_bars,
                best.two_touch_705,
                best.min_sl_pips,
                best.sell_only,
                best.time_offset_min,
            );
            println!(
                "Matches:        {} ({} real / {} backtest unmatched)",
                best.matches, best.unmatched_real, best.unmatched_backtest
            );
            if let Some(td) = best.median_time_diff_min {
                println!("Median dt:      {td:.1} min");
            }
            if let Some(pd) = best.median_price_diff_pips {
                println!("Median dpx:     {pd:.1} pips");
            }
        }
        None => println!("No cells evaluated."),
    }
    println!();
}

//! Reference signal logs.
//!
//! A live trading bot records one CSV per day, named
//! `{SYMBOL}_signals_{YYYY-MM-DD}.csv`, with columns
//! `dt_utc,direction,entry,sl,tp`. This module loads those logs over a
//! date range so the matcher can compare them against simulated trades.

use std::fs;
use std::path::Path;

use chrono::{Days, NaiveDateTime, TimeDelta};
use thiserror::Error;

use swinglab_core::TradeDirection;

/// One entry from a live signal log.
#[derive(Debug, Clone, PartialEq)]
pub struct RealSignal {
    pub dt_utc: NaiveDateTime,
    pub direction: TradeDirection,
    pub entry: f64,
    pub sl: f64,
    pub tp: f64,
}

/// Errors from the signal loading layer.
#[derive(Debug, Error)]
pub enum SignalError {
    #[error("io error reading {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("csv parse error in {path}: {source}")]
    Csv {
        path: String,
        #[source]
        source: csv::Error,
    },

    #[error("missing required columns in {path} (need dt_utc,direction,entry,sl,tp)")]
    MissingColumns { path: String },
}

const TIMESTAMP_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

fn parse_timestamp(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    for fmt in TIMESTAMP_FORMATS {
        if let Ok(ts) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(ts);
        }
    }
    None
}

fn parse_direction(s: &str) -> Option<TradeDirection> {
    match s.trim().to_ascii_uppercase().as_str() {
        "BUY" => Some(TradeDirection::Buy),
        "SELL" => Some(TradeDirection::Sell),
        _ => None,
    }
}

/// Load a single signal log file.
pub fn load_signal_file(path: impl AsRef<Path>) -> Result<Vec<RealSignal>, SignalError> {
    let path = path.as_ref();
    let display = path.display().to_string();
    let raw = fs::read_to_string(path).map_err(|source| SignalError::Io {
        path: display.clone(),
        source,
    })?;

    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(raw.as_bytes());

    let headers = reader
        .headers()
        .map_err(|source| SignalError::Csv {
            path: display.clone(),
            source,
        })?
        .clone();
    let find = |name: &str| {
        headers
            .iter()
            .position(|h| h.trim().eq_ignore_ascii_case(name))
    };
    let required = ["dt_utc", "direction", "entry", "sl", "tp"];
    let mut cols = [0usize; 5];
    for (slot, name) in cols.iter_mut().zip(required) {
        *slot = find(name).ok_or_else(|| SignalError::MissingColumns {
            path: display.clone(),
        })?;
    }

    let mut signals = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|source| SignalError::Csv {
            path: display.clone(),
            source,
        })?;
        let field = |i: usize| record.get(i).unwrap_or("");
        let Some(dt_utc) = parse_timestamp(field(cols[0])) else {
            continue;
        };
        let Some(direction) = parse_direction(field(cols[1])) else {
            continue;
        };
        let parse_f64 = |i: usize| field(i).trim().parse::<f64>().ok();
        let (Some(entry), Some(sl), Some(tp)) =
            (parse_f64(cols[2]), parse_f64(cols[3]), parse_f64(cols[4]))
        else {
            continue;
        };
        signals.push(RealSignal {
            dt_utc,
            direction,
            entry,
            sl,
            tp,
        });
    }
    Ok(signals)
}

/// Load every per-day signal log for `symbol` between `start` and `end`
/// (inclusive, by calendar date). Days with no file are skipped.
pub fn load_signals(
    signals_dir: impl AsRef<Path>,
    symbol: &str,
    start: NaiveDateTime,
    end: NaiveDateTime,
) -> Result<Vec<RealSignal>, SignalError> {
    let dir = signals_dir.as_ref();
    let mut signals = Vec::new();
    let mut day = start.date();
    while day <= end.date() {
        let path = dir.join(format!("{symbol}_signals_{day}.csv"));
        if path.exists() {
            signals.extend(load_signal_file(&path)?);
        }
        day = day.checked_add_days(Days::new(1)).expect("date overflow");
    }
    Ok(signals)
}

/// Shift every signal timestamp by `offset_min` minutes. The live logs
/// and the bar feed do not always agree on timezone; the tuner tries
/// several offsets and keeps whichever matches best.
pub fn shift_signals(signals: &[RealSignal], offset_min: i64) -> Vec<RealSignal> {
    if offset_min == 0 {
        return signals.to_vec();
    }
    let delta = TimeDelta::minutes(offset_min);
    signals
        .iter()
        .map(|s| RealSignal {
            dt_utc: s.dt_utc + delta,
            ..s.clone()
        })
        .collect()
}

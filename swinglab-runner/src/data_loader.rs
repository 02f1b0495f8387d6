//! CSV bar loading with light format inference.
//!
//! Accepts comma- or tab-delimited files, with or without a header row.
//! Headerless files are assumed to carry columns in the order
//! `timestamp,open,high,low,close[,volume,...]`; extra columns are
//! ignored. Rows whose timestamp fails to parse are dropped, and the
//! output is sorted by timestamp.

use std::fs;
use std::path::Path;

use chrono::NaiveDateTime;
use thiserror::Error;

use swinglab_core::Bar;

/// Errors from the bar loading layer.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("CSV not found: {0}")]
    NotFound(String),

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

    #[error("missing required columns in {path} (need timestamp,open,high,low,close)")]
    MissingColumns { path: String },

    #[error("no parseable bars in {path}")]
    Empty { path: String },
}

/// Timestamp formats accepted by the loader, tried in order.
const TIMESTAMP_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y.%m.%d %H:%M:%S",
    "%Y.%m.%d %H:%M",
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

/// Load a bar series from `path`.
pub fn load_bars_csv(path: impl AsRef<Path>) -> Result<Vec<Bar>, LoadError> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(LoadError::NotFound(path.display().to_string()));
    }
    let display = path.display().to_string();
    let raw = fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: display.clone(),
        source,
    })?;

    let delimiter = sniff_delimiter(&raw);
    let has_headers = sniff_headers(&raw, delimiter);

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .from_reader(raw.as_bytes());

    // Column positions: named when a header exists, positional otherwise.
    let mut columns = [0usize, 1, 2, 3, 4];
    let mut volume_col: Option<usize> = Some(5);
    if has_headers {
        let header = reader
            .records()
            .next()
            .ok_or_else(|| LoadError::Empty {
                path: display.clone(),
            })?
            .map_err(|source| LoadError::Csv {
                path: display.clone(),
                source,
            })?;
        let find = |name: &str| {
            header
                .iter()
                .position(|h| h.trim().eq_ignore_ascii_case(name))
        };
        let required = ["timestamp", "open", "high", "low", "close"];
        for (slot, name) in columns.iter_mut().zip(required) {
            *slot = find(name).ok_or_else(|| LoadError::MissingColumns {
                path: display.clone(),
            })?;
        }
        volume_col = find("volume");
    }

    let mut bars = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|source| LoadError::Csv {
            path: display.clone(),
            source,
        })?;
        let field = |i: usize| record.get(i).unwrap_or("");
        let Some(timestamp) = parse_timestamp(field(columns[0])) else {
            // Unparseable timestamp: drop the row (stray headers, blanks).
            continue;
        };
        let parse_f64 = |i: usize| field(i).trim().parse::<f64>().ok();
        let (Some(open), Some(high), Some(low), Some(close)) = (
            parse_f64(columns[1]),
            parse_f64(columns[2]),
            parse_f64(columns[3]),
            parse_f64(columns[4]),
        ) else {
            continue;
        };
        let volume = volume_col.and_then(parse_f64);
        bars.push(Bar {
            timestamp,
            open,
            high,
            low,
            close,
            volume,
        });
    }

    if bars.is_empty() {
        return Err(LoadError::Empty { path: display });
    }
    bars.sort_by_key(|b| b.timestamp);
    Ok(bars)
}

fn sniff_delimiter(raw: &str) -> u8 {
    let first_line = raw.lines().next().unwrap_or("");
    if first_line.contains('\t') {
        b'\t'
    } else {
        b','
    }
}

fn sniff_headers(raw: &str, delimiter: u8) -> bool {
    let first_line = raw.lines().next().unwrap_or("");
    first_line
        .split(delimiter as char)
        .any(|f| f.trim().eq_ignore_ascii_case("timestamp"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_file(content: &str) -> NamedTempFile {
        let mut f = NamedTempFile::new().unwrap();
        f.write_all(content.as_bytes()).unwrap();
        f
    }

    #[test]
    fn loads_headered_csv() {
        let f = write_file(
            "timestamp,open,high,low,close,volume\n\
             2025-09-02 09:00:00,1.1000,1.1005,1.0995,1.1002,120\n\
             2025-09-02 09:01:00,1.1002,1.1008,1.1001,1.1006,98\n",
        );
        let bars = load_bars_csv(f.path()).unwrap();
        assert_eq!(bars.len(), 2);
        assert_eq!(bars[0].close, 1.1002);
        assert_eq!(bars[1].volume, Some(98.0));
    }

    #[test]
    fn loads_headerless_tab_separated() {
        let f = write_file(
            "2025-09-02 09:00:00\t1.1000\t1.1005\t1.0995\t1.1002\t120\n\
             2025-09-02 09:01:00\t1.1002\t1.1008\t1.1001\t1.1006\t98\n",
        );
        let bars = load_bars_csv(f.path()).unwrap();
        assert_eq!(bars.len(), 2);
        assert_eq!(bars[0].open, 1.1000);
    }

    #[test]
    fn sorts_by_timestamp_and_drops_bad_rows() {
        let f = write_file(
            "timestamp,open,high,low,close\n\
             2025-09-02 09:05:00,1.1,1.2,1.0,1.1\n\
             not-a-time,1.1,1.2,1.0,1.1\n\
             2025-09-02 09:01:00,1.1,1.2,1.0,1.1\n",
        );
        let bars = load_bars_csv(f.path()).unwrap();
        assert_eq!(bars.len(), 2);
        assert!(bars[0].timestamp < bars[1].timestamp);
    }

    #[test]
    fn shuffled_header_columns() {
        let f = write_file(
            "close,timestamp,open,low,high\n\
             1.1002,2025-09-02 09:00:00,1.1000,1.0995,1.1005\n",
        );
        let bars = load_bars_csv(f.path()).unwrap();
        assert_eq!(bars[0].close, 1.1002);
        assert_eq!(bars[0].high, 1.1005);
        assert_eq!(bars[0].volume, None);
    }

    #[test]
    fn missing_columns_is_an_error() {
        let f = write_file("timestamp,open\n2025-09-02 09:00:00,1.1\n");
        assert!(matches!(
            load_bars_csv(f.path()),
            Err(LoadError::MissingColumns { .. })
        ));
    }

    #[test]
    fn missing_file_is_an_error() {
        assert!(matches!(
            load_bars_csv("/definitely/not/here.csv"),
            Err(LoadError::NotFound(_))
        ));
    }

    #[test]
    fn empty_file_is_an_error() {
        let f = write_file("");
        assert!(matches!(load_bars_csv(f.path()), Err(LoadError::Empty { .. })));
    }

    #[test]
    fn alternate_timestamp_formats() {
        let f = write_file(
            "timestamp,open,high,low,close\n\
             2025.09.02 09:00,1.1,1.2,1.0,1.1\n\
             2025-09-02T09:01:00,1.1,1.2,1.0,1.1\n",
        );
        let bars = load_bars_csv(f.path()).unwrap();
        assert_eq!(bars.len(), 2);
    }
}

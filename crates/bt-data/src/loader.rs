//! CSV bar ingestion.
//!
//! Format: one header row (ignored) followed by rows of at least seven
//! columns: date `YYYY-MM-DD`, open, high, low, close (raw, ignored),
//! adjusted close (used as `close`), volume. Parse failures fail the whole
//! load and report the offending row index, 1-based and counting the
//! header.

use std::fmt;
use std::fs;
use std::path::Path;

use bt_types::Bar;
use chrono::{NaiveDate, TimeZone, Utc};

const MIN_COLUMNS: usize = 7;

#[derive(Debug)]
pub enum LoadError {
    Io(std::io::Error),
    EmptyInput,
    NoRows,
    BadRow { line: usize, reason: String },
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadError::Io(e) => write!(f, "io error reading bar csv: {e}"),
            LoadError::EmptyInput => write!(f, "bar csv has no rows"),
            LoadError::NoRows => write!(f, "bar csv has a header row but no data rows"),
            LoadError::BadRow { line, reason } => {
                write!(f, "bar csv row {line}: {reason}")
            }
        }
    }
}

impl std::error::Error for LoadError {}

impl From<std::io::Error> for LoadError {
    fn from(e: std::io::Error) -> Self {
        LoadError::Io(e)
    }
}

pub fn load_bars_csv(path: impl AsRef<Path>) -> Result<Vec<Bar>, LoadError> {
    let contents = fs::read_to_string(path)?;
    parse_bars_csv(&contents)
}

pub fn parse_bars_csv(contents: &str) -> Result<Vec<Bar>, LoadError> {
    let mut lines = contents.lines();
    lines.next().ok_or(LoadError::EmptyInput)?;

    let mut bars = Vec::new();
    for (offset, raw_line) in lines.enumerate() {
        let line_no = offset + 2; // 1-based, header was line 1
        let line = raw_line.trim();
        if line.is_empty() {
            continue;
        }
        bars.push(parse_row(line, line_no)?);
    }

    if bars.is_empty() {
        return Err(LoadError::NoRows);
    }
    Ok(bars)
}

fn parse_row(line: &str, line_no: usize) -> Result<Bar, LoadError> {
    let cols: Vec<&str> = line.split(',').collect();
    if cols.len() < MIN_COLUMNS {
        return Err(LoadError::BadRow {
            line: line_no,
            reason: format!("expected at least {MIN_COLUMNS} columns, got {}", cols.len()),
        });
    }

    let date = NaiveDate::parse_from_str(cols[0].trim(), "%Y-%m-%d").map_err(|e| {
        LoadError::BadRow {
            line: line_no,
            reason: format!("bad date {:?}: {e}", cols[0]),
        }
    })?;
    let timestamp = Utc
        .from_utc_datetime(&date.and_hms_opt(0, 0, 0).expect("midnight is always valid"));

    let open = parse_f64(cols[1], line_no, "open")?;
    let high = parse_f64(cols[2], line_no, "high")?;
    let low = parse_f64(cols[3], line_no, "low")?;
    // cols[4] (raw close) is ignored per the bar schema; adjusted close
    // (cols[5]) is the canonical close consumed by the engine.
    let close = parse_f64(cols[5], line_no, "adjusted close")?;
    let volume = cols[6]
        .trim()
        .parse::<u64>()
        .map_err(|e| LoadError::BadRow {
            line: line_no,
            reason: format!("bad volume {:?}: {e}", cols[6]),
        })?;

    Ok(Bar {
        timestamp,
        open,
        high,
        low,
        close,
        volume,
    })
}

fn parse_f64(raw: &str, line_no: usize, field: &str) -> Result<f64, LoadError> {
    raw.trim().parse::<f64>().map_err(|e| LoadError::BadRow {
        line: line_no,
        reason: format!("bad {field} {:?}: {e}", raw),
    })
}

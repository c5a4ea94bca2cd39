//! Append-only event log: one JSON Lines record per dispatched event, in
//! dispatch order, for offline replay/audit. The engine never reads this
//! log back; a write failure is best-effort (logged, never propagated).

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use bt_types::Event;
use serde_json::Value;

pub struct EventLogWriter {
    path: PathBuf,
}

impl EventLogWriter {
    /// Opens the log for appending, creating parent directories as needed.
    /// Acquired at engine start and implicitly released when this value is
    /// dropped at the end of the outer loop, on every exit path.
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("create_dir_all {:?}", parent))?;
            }
        }
        Ok(Self { path })
    }

    pub fn append(&self, event: &Event) -> Result<()> {
        let raw = serde_json::to_value(event).context("serialize event for audit log")?;
        let sorted = sort_keys(&raw);
        let line = serde_json::to_string(&sorted).context("stringify audit event")?;

        let mut f = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .with_context(|| format!("open event log {:?}", self.path))?;
        f.write_all(line.as_bytes()).context("write event log line")?;
        f.write_all(b"\n").context("write event log newline")?;
        Ok(())
    }
}

/// Sorts object keys recursively so that byte-identical inputs always
/// produce byte-identical lines, independent of struct field declaration
/// order or serde's hash-map iteration.
fn sort_keys(v: &Value) -> Value {
    match v {
        Value::Object(map) => {
            let mut keys: Vec<_> = map.keys().cloned().collect();
            keys.sort();
            let mut new = serde_json::Map::new();
            for k in keys {
                new.insert(k.clone(), sort_keys(&map[&k]));
            }
            Value::Object(new)
        }
        Value::Array(arr) => Value::Array(arr.iter().map(sort_keys).collect()),
        _ => v.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bt_types::{now_truncated, MarketEvent, TraceId};
    use std::fs;

    #[test]
    fn append_writes_one_line_per_event_in_order() {
        let dir = std::env::temp_dir().join(format!("bt-audit-test-{}", std::process::id()));
        let log_path = dir.join("events.jsonl");
        let writer = EventLogWriter::new(&log_path).unwrap();

        for symbol in ["AAPL", "MSFT"] {
            let event = Event::Market(MarketEvent {
                trace_id: TraceId::new(),
                timestamp: now_truncated(),
                symbol: symbol.into(),
                close: 1.0,
            });
            writer.append(&event).unwrap();
        }

        let contents = fs::read_to_string(&log_path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("AAPL"));
        assert!(lines[1].contains("MSFT"));

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn same_event_serializes_identically_across_writes() {
        let dir = std::env::temp_dir().join(format!("bt-audit-test-det-{}", std::process::id()));
        let log_path = dir.join("events.jsonl");
        let writer = EventLogWriter::new(&log_path).unwrap();

        let trace_id = TraceId::new();
        let timestamp = now_truncated();
        let event = Event::Market(MarketEvent {
            trace_id,
            timestamp,
            symbol: "AAPL".into(),
            close: 110.0,
        });
        writer.append(&event).unwrap();
        writer.append(&event).unwrap();

        let contents = fs::read_to_string(&log_path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines[0], lines[1]);

        let _ = fs::remove_dir_all(&dir);
    }
}

//! Columnar bar storage and the Data Handler contract.
//!
//! Bars are loaded once from CSV into immutable parallel arrays (see
//! [`loader`]); the rolling [`SymbolData`] view built during replay shares
//! that layout and grows by one bar per tick, which keeps indicator
//! computation over the closes series cheap.

pub mod loader;

use std::collections::BTreeMap;

use bt_queue::EventQueue;
use bt_types::{Bar, Event, MarketEvent, TraceId};

/// Parallel-array view of one symbol's bars, plus an opt-in named-indicator
/// cache. All arrays (except indicators) always have identical length.
#[derive(Debug, Default, Clone)]
pub struct SymbolData {
    pub symbol: String,
    pub timestamps: Vec<chrono::DateTime<chrono::Utc>>,
    pub open: Vec<f64>,
    pub high: Vec<f64>,
    pub low: Vec<f64>,
    pub close: Vec<f64>,
    pub volume: Vec<u64>,
    indicators: BTreeMap<String, Vec<f64>>,
}

impl SymbolData {
    pub fn new(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            ..Default::default()
        }
    }

    pub fn len(&self) -> usize {
        self.close.len()
    }

    pub fn is_empty(&self) -> bool {
        self.close.is_empty()
    }

    pub fn push_bar(&mut self, bar: &Bar) {
        self.timestamps.push(bar.timestamp);
        self.open.push(bar.open);
        self.high.push(bar.high);
        self.low.push(bar.low);
        self.close.push(bar.close);
        self.volume.push(bar.volume);
    }

    pub fn closes(&self) -> &[f64] {
        &self.close
    }

    /// Opt-in memoization for strategies that recompute the same indicator
    /// series repeatedly. Not read by the portfolio or engine.
    pub fn cache_indicator(&mut self, name: &str, values: Vec<f64>) {
        debug_assert!(values.len() <= self.len());
        self.indicators.insert(name.to_string(), values);
    }

    pub fn indicator(&self, name: &str) -> Option<&[f64]> {
        self.indicators.get(name).map(|v| v.as_slice())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataHandlerError {
    /// `update` was called after `should_continue` had already gone false.
    Exhausted,
}

impl std::fmt::Display for DataHandlerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DataHandlerError::Exhausted => {
                write!(f, "update called with no unconsumed bars remaining")
            }
        }
    }
}

impl std::error::Error for DataHandlerError {}

/// Yields bars one at a time and enqueues exactly one Market event per
/// `update`. Implementations own the full historic bar set; `latest`
/// exposes only what has been seen so far.
pub trait DataHandler {
    fn should_continue(&self) -> bool;
    fn update(&mut self, queue: &mut EventQueue) -> Result<(), DataHandlerError>;
    /// Read-only view of bars seen so far and the zero-based index of the
    /// most recent bar. Before the first `update`, the index is -1.
    fn latest(&self) -> (&SymbolData, i64);
}

/// A `DataHandler` backed by a fully materialised, immutable bar vector
/// loaded once at startup (see [`loader::load_bars_csv`]).
pub struct HistoricalDataHandler {
    symbol: String,
    bars: Vec<Bar>,
    cursor: usize,
    view: SymbolData,
}

impl HistoricalDataHandler {
    pub fn new(symbol: impl Into<String>, bars: Vec<Bar>) -> Self {
        let symbol = symbol.into();
        Self {
            view: SymbolData::new(symbol.clone()),
            symbol,
            bars,
            cursor: 0,
        }
    }
}

impl DataHandler for HistoricalDataHandler {
    fn should_continue(&self) -> bool {
        self.cursor < self.bars.len()
    }

    fn update(&mut self, queue: &mut EventQueue) -> Result<(), DataHandlerError> {
        if !self.should_continue() {
            return Err(DataHandlerError::Exhausted);
        }
        let bar_index = self.cursor as u64;
        let bar = self.bars[self.cursor];
        self.cursor += 1;
        self.view.push_bar(&bar);

        queue.push(Event::Market(MarketEvent {
            trace_id: TraceId::derive(&self.symbol, bar_index, bar.timestamp),
            timestamp: bar.timestamp,
            symbol: self.symbol.clone(),
            close: bar.close,
        }));
        Ok(())
    }

    fn latest(&self) -> (&SymbolData, i64) {
        (&self.view, self.view.len() as i64 - 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn bar(day: u32, close: f64) -> Bar {
        Bar {
            timestamp: Utc.with_ymd_and_hms(2024, 1, day, 0, 0, 0).unwrap(),
            open: close,
            high: close,
            low: close,
            close,
            volume: 1,
        }
    }

    #[test]
    fn should_continue_false_exactly_when_cursor_exhausted() {
        let mut handler = HistoricalDataHandler::new("AAPL", vec![bar(1, 100.0), bar(2, 110.0)]);
        let mut q = EventQueue::new();
        assert!(handler.should_continue());
        handler.update(&mut q).unwrap();
        assert!(handler.should_continue());
        handler.update(&mut q).unwrap();
        assert!(!handler.should_continue());
        assert_eq!(handler.update(&mut q), Err(DataHandlerError::Exhausted));
    }

    #[test]
    fn latest_index_starts_at_minus_one_and_grows_per_tick() {
        let mut handler = HistoricalDataHandler::new("AAPL", vec![bar(1, 100.0), bar(2, 110.0)]);
        let mut q = EventQueue::new();
        assert_eq!(handler.latest().1, -1);
        handler.update(&mut q).unwrap();
        assert_eq!(handler.latest().1, 0);
        handler.update(&mut q).unwrap();
        assert_eq!(handler.latest().1, 1);
    }

    #[test]
    fn update_enqueues_exactly_one_market_event() {
        let mut handler = HistoricalDataHandler::new("AAPL", vec![bar(1, 100.0)]);
        let mut q = EventQueue::new();
        handler.update(&mut q).unwrap();
        assert_eq!(q.len(), 1);
        let event = q.pop().unwrap();
        match event {
            Event::Market(m) => assert_eq!(m.close, 100.0),
            _ => panic!("expected Market"),
        }
    }
}

//! Strategy contract and the reference RSI(2) implementation.
//!
//! A strategy inspects the latest [`SymbolData`] view, computes its
//! indicators over the closes series, and — if it has something to say —
//! enqueues exactly one Signal carrying the Market's `TraceId`.

use bt_data::SymbolData;
use bt_queue::EventQueue;
use bt_types::{Decision, Event, MarketEvent, SignalEvent, SignalPairs};

#[derive(Debug)]
pub enum StrategyError {
    /// The indicator rejected its construction parameters (e.g. a zero
    /// period). This is a configuration fault, not a market condition.
    IndicatorUnavailable(String),
}

impl std::fmt::Display for StrategyError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StrategyError::IndicatorUnavailable(msg) => {
                write!(f, "strategy indicator unavailable: {msg}")
            }
        }
    }
}

impl std::error::Error for StrategyError {}

pub trait Strategy {
    /// Consumes one Market tick. `data`/`latest_bar_index` are the Data
    /// Handler's current view as of this tick. Enqueues at most one Signal.
    fn on_market(
        &mut self,
        market: &MarketEvent,
        data: &SymbolData,
        latest_bar_index: i64,
        queue: &mut EventQueue,
    ) -> Result<(), StrategyError>;
}

/// RSI(2) with 40/60 thresholds: RSI below 40 advises Long and CloseShort
/// at strength 1.0; above 60 advises Short and CloseLong at strength 1.0.
/// Refuses to emit until `latest_bar_index >= period`.
pub struct RsiStrategy {
    period: usize,
    rsi: ta::indicators::RelativeStrengthIndex,
}

impl RsiStrategy {
    pub fn new(period: usize) -> Result<Self, StrategyError> {
        let rsi = ta::indicators::RelativeStrengthIndex::new(period)
            .map_err(|e| StrategyError::IndicatorUnavailable(e.to_string()))?;
        Ok(Self { period, rsi })
    }
}

impl Strategy for RsiStrategy {
    fn on_market(
        &mut self,
        market: &MarketEvent,
        _data: &SymbolData,
        latest_bar_index: i64,
        queue: &mut EventQueue,
    ) -> Result<(), StrategyError> {
        use ta::Next;

        let rsi_value = self.rsi.next(market.close);

        if latest_bar_index < self.period as i64 {
            return Ok(());
        }

        let mut signals: SignalPairs = SignalPairs::new();
        if rsi_value < 40.0 {
            signals.insert(Decision::Long, 1.0);
            signals.insert(Decision::CloseShort, 1.0);
        } else if rsi_value > 60.0 {
            signals.insert(Decision::Short, 1.0);
            signals.insert(Decision::CloseLong, 1.0);
        }

        if signals.is_empty() {
            return Ok(());
        }

        queue.push(Event::Signal(SignalEvent {
            trace_id: market.trace_id,
            timestamp: market.timestamp,
            symbol: market.symbol.clone(),
            signals,
        }));
        Ok(())
    }
}

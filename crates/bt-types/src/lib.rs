//! Shared event and domain types for the backtester.
//!
//! Every event carries a [`TraceId`], the correlation id that threads a
//! causal chain (Market -> Signal -> Order -> Fill) through the engine's
//! single FIFO queue. Components never invent a new id mid-chain; they copy
//! the one they received.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

/// Correlation id shared by every event derived from one Market tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TraceId(pub Uuid);

impl TraceId {
    /// Mints an id from OS randomness. Only ever used where no replay
    /// coordinate exists to derive one from (fixtures, standalone
    /// tooling) — the engine's own Market origination uses [`TraceId::derive`]
    /// instead, since a random id would make two runs over the same bars
    /// produce different event logs.
    pub fn new() -> Self {
        TraceId(Uuid::new_v4())
    }

    /// Derives the trace id that originates a new causal chain from the
    /// replay coordinates of the Market event that starts it — symbol,
    /// bar index, and bar timestamp — instead of OS randomness, so two
    /// runs over identical bars mint identical ids and produce
    /// byte-identical event logs.
    pub fn derive(symbol: &str, bar_index: u64, bar_timestamp: DateTime<Utc>) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(symbol.as_bytes());
        hasher.update(bar_index.to_be_bytes());
        hasher.update(bar_timestamp.timestamp().to_be_bytes());
        hasher.update(bar_timestamp.timestamp_subsec_nanos().to_be_bytes());
        let digest = hasher.finalize();
        let mut bytes = [0u8; 16];
        bytes.copy_from_slice(&digest[..16]);
        TraceId(Uuid::from_bytes(bytes))
    }
}

impl Default for TraceId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TraceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Returns the current instant with sub-second precision dropped, so two
/// events issued within the same handler carry comparable, stable
/// timestamps rather than racing nanosecond jitter.
pub fn now_truncated() -> DateTime<Utc> {
    let now = Utc::now();
    Utc.timestamp_opt(now.timestamp(), 0).single().unwrap_or(now)
}

/// One OHLCV observation at a single timeframe step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bar {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
}

/// A trading decision. `Nothing` is a sentinel used during signal
/// decomposition and is never attached to an emitted Signal, Order, or Fill.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Decision {
    Long,
    CloseLong,
    Short,
    CloseShort,
    Nothing,
}

impl Decision {
    pub fn is_entry(self) -> bool {
        matches!(self, Decision::Long | Decision::Short)
    }

    pub fn is_exit(self) -> bool {
        matches!(self, Decision::CloseLong | Decision::CloseShort)
    }
}

/// The side a position is held on; derived from (decision, sign of
/// quantity) at entry and validated on every subsequent mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    Long,
    Short,
}

/// Mapping from decision to advisory strength in [0, 1]. A `BTreeMap` keeps
/// iteration order deterministic across runs, which the replay-determinism
/// property depends on.
pub type SignalPairs = BTreeMap<Decision, f64>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderType {
    Market,
    Limit,
}

/// Fixed-key fee decomposition. `total()` is always the sum of the three
/// named components; there is no open-ended fee bag.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Fees {
    pub exchange: f64,
    pub slippage: f64,
    pub network: f64,
}

impl Fees {
    pub fn total(&self) -> f64 {
        self.exchange + self.slippage + self.network
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketEvent {
    pub trace_id: TraceId,
    pub timestamp: DateTime<Utc>,
    pub symbol: String,
    pub close: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignalEvent {
    pub trace_id: TraceId,
    pub timestamp: DateTime<Utc>,
    pub symbol: String,
    pub signals: SignalPairs,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderEvent {
    pub trace_id: TraceId,
    pub timestamp: DateTime<Utc>,
    pub symbol: String,
    pub order_type: OrderType,
    pub decision: Decision,
    /// Signed; sign is determined by `decision`.
    pub quantity: f64,
    /// Bar close at order construction time. A live adapter would leave
    /// this unset and substitute the filled price at the execution layer.
    pub close_reference_price: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FillEvent {
    pub trace_id: TraceId,
    pub timestamp: DateTime<Utc>,
    pub symbol: String,
    pub exchange: String,
    pub decision: Decision,
    pub quantity: f64,
    /// |quantity| * fill price, excluding fees.
    pub gross_fill_value: f64,
    pub exchange_fee: f64,
    pub slippage_fee: f64,
    pub network_fee: f64,
}

impl FillEvent {
    pub fn fees(&self) -> Fees {
        Fees {
            exchange: self.exchange_fee,
            slippage: self.slippage_fee,
            network: self.network_fee,
        }
    }
}

/// The tagged sum dispatched by the engine driver. Variants are matched on
/// by tag, never downcast; the driver routes each to exactly one handler.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event_type")]
pub enum Event {
    Market(MarketEvent),
    Signal(SignalEvent),
    Order(OrderEvent),
    Fill(FillEvent),
}

impl Event {
    pub fn trace_id(&self) -> TraceId {
        match self {
            Event::Market(e) => e.trace_id,
            Event::Signal(e) => e.trace_id,
            Event::Order(e) => e.trace_id,
            Event::Fill(e) => e.trace_id,
        }
    }

    pub fn symbol(&self) -> &str {
        match self {
            Event::Market(e) => &e.symbol,
            Event::Signal(e) => &e.symbol,
            Event::Order(e) => &e.symbol,
            Event::Fill(e) => &e.symbol,
        }
    }
}

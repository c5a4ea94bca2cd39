//! The portfolio accounting core: position lifecycle, signal decomposition,
//! sizing, risk refinement, and the cash/value invariants that must hold
//! after every event.

mod accounting;
mod sizer;
mod types;

pub use accounting::decompose;
pub use sizer::{DefaultSizer, Sizer};
pub use types::{PortfolioError, Position};

use std::collections::BTreeMap;

use bt_queue::EventQueue;
use bt_types::{Event, FillEvent, MarketEvent, OrderEvent, OrderType, SignalEvent};
use bt_risk::{RiskAction, RiskEngine, RiskError};

#[derive(Debug)]
pub enum PortfolioHandlerError {
    Portfolio(PortfolioError),
    Risk(RiskError),
}

impl std::fmt::Display for PortfolioHandlerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PortfolioHandlerError::Portfolio(e) => write!(f, "{e}"),
            PortfolioHandlerError::Risk(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for PortfolioHandlerError {}

impl From<PortfolioError> for PortfolioHandlerError {
    fn from(e: PortfolioError) -> Self {
        PortfolioHandlerError::Portfolio(e)
    }
}

impl From<RiskError> for PortfolioHandlerError {
    fn from(e: RiskError) -> Self {
        PortfolioHandlerError::Risk(e)
    }
}

/// Readback snapshot for reporting.
#[derive(Debug, Clone)]
pub struct PortfolioSnapshot {
    pub initial_cash: f64,
    pub current_cash: f64,
    pub current_value: f64,
    pub historic_positions: BTreeMap<String, Vec<Position>>,
}

pub struct Portfolio<S: Sizer, R: RiskEngine> {
    initial_cash: f64,
    current_cash: f64,
    current_value: f64,
    last_close: BTreeMap<String, f64>,
    open_positions: BTreeMap<String, Position>,
    historic_positions: BTreeMap<String, Vec<Position>>,
    orders_emitted: Vec<OrderEvent>,
    fills_accepted: Vec<FillEvent>,
    sizer: S,
    risk: R,
}

impl<S: Sizer, R: RiskEngine> Portfolio<S, R> {
    pub fn new(initial_cash: f64, sizer: S, risk: R) -> Self {
        Self {
            initial_cash,
            current_cash: initial_cash,
            current_value: initial_cash,
            last_close: BTreeMap::new(),
            open_positions: BTreeMap::new(),
            historic_positions: BTreeMap::new(),
            orders_emitted: Vec::new(),
            fills_accepted: Vec::new(),
            sizer,
            risk,
        }
    }

    pub fn snapshot(&self) -> PortfolioSnapshot {
        PortfolioSnapshot {
            initial_cash: self.initial_cash,
            current_cash: self.current_cash,
            current_value: self.current_value,
            historic_positions: self.historic_positions.clone(),
        }
    }

    pub fn orders_emitted(&self) -> &[OrderEvent] {
        &self.orders_emitted
    }

    pub fn fills_accepted(&self) -> &[FillEvent] {
        &self.fills_accepted
    }

    pub fn on_market(&mut self, market: &MarketEvent) -> Result<(), PortfolioHandlerError> {
        self.last_close.insert(market.symbol.clone(), market.close);

        let open_market_value = if let Some(position) = self.open_positions.get_mut(&market.symbol) {
            position.update(market)?;
            position.current_market_value
        } else {
            0.0
        };
        self.current_value = self.current_cash + open_market_value;
        Ok(())
    }

    pub fn on_signal(
        &mut self,
        signal: &SignalEvent,
        queue: &mut EventQueue,
    ) -> Result<(), PortfolioHandlerError> {
        let open_position = self.open_positions.get(&signal.symbol);

        if open_position.is_none() && self.current_cash == 0.0 {
            return Ok(());
        }

        let decision = decompose(&signal.signals, open_position);
        if decision == bt_types::Decision::Nothing {
            return Ok(());
        }
        let strength = signal.signals.get(&decision).copied().unwrap_or(0.0);

        let latest_close = *self
            .last_close
            .get(&signal.symbol)
            .expect("on_signal requires a prior on_market for the symbol");

        let mut order = OrderEvent {
            trace_id: signal.trace_id,
            timestamp: signal.timestamp,
            symbol: signal.symbol.clone(),
            order_type: OrderType::Market,
            decision,
            quantity: 0.0,
            close_reference_price: latest_close,
        };
        order.quantity = self
            .sizer
            .size(decision, strength, open_position, latest_close);

        if self.risk.evaluate(&mut order)? == RiskAction::Cancel {
            return Ok(());
        }

        self.orders_emitted.push(order.clone());
        queue.push(Event::Order(order));
        Ok(())
    }

    pub fn on_fill(&mut self, fill: &FillEvent) -> Result<(), PortfolioHandlerError> {
        let latest_close = *self
            .last_close
            .get(&fill.symbol)
            .expect("on_fill requires a prior on_market for the symbol");

        let mut fill = fill.clone();
        fill.gross_fill_value = fill.quantity.abs() * latest_close;

        if let Some(mut position) = self.open_positions.remove(&fill.symbol) {
            let result_pnl = position.exit(&fill)?;
            self.current_cash += position.entry_gross_fill_value + result_pnl;
            self.current_value = self.current_cash;
            self.historic_positions
                .entry(fill.symbol.clone())
                .or_default()
                .push(position);
        } else {
            let position = Position::enter(&fill)?;
            self.current_cash -= position.entry_gross_fill_value + position.entry_total_fees;
            self.current_value = self.current_cash + position.entry_gross_fill_value;
            self.open_positions.insert(fill.symbol.clone(), position);
        }

        self.fills_accepted.push(fill);
        Ok(())
    }
}

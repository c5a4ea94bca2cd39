//! Simulated backtest execution: consumes an Order, produces a Fill.
//!
//! A live adapter substitutes this component only — the rest of the engine
//! is unaware of whether a Fill was simulated or came off a real exchange.

use bt_queue::EventQueue;
use bt_types::{Event, FillEvent, OrderEvent};

/// Pluggable fee hooks; all default to zero per the Non-goal that fee
/// models beyond pass-through stay out of this core.
pub trait FeeModel {
    fn exchange_fee(&self, order: &OrderEvent) -> f64;
    fn slippage_fee(&self, order: &OrderEvent) -> f64;
    fn network_fee(&self, order: &OrderEvent) -> f64;
}

#[derive(Debug, Default)]
pub struct ZeroFees;

impl FeeModel for ZeroFees {
    fn exchange_fee(&self, _order: &OrderEvent) -> f64 {
        0.0
    }
    fn slippage_fee(&self, _order: &OrderEvent) -> f64 {
        0.0
    }
    fn network_fee(&self, _order: &OrderEvent) -> f64 {
        0.0
    }
}

/// Fixed per-fill fee amounts, useful for exercising fee propagation
/// without writing a bespoke `FeeModel`.
pub struct FixedFees {
    pub exchange: f64,
    pub slippage: f64,
    pub network: f64,
}

impl FeeModel for FixedFees {
    fn exchange_fee(&self, _order: &OrderEvent) -> f64 {
        self.exchange
    }
    fn slippage_fee(&self, _order: &OrderEvent) -> f64 {
        self.slippage
    }
    fn network_fee(&self, _order: &OrderEvent) -> f64 {
        self.network
    }
}

pub trait ExecutionHandler {
    fn on_order(&mut self, order: &OrderEvent, queue: &mut EventQueue);
}

pub struct SimulatedExecution<F: FeeModel> {
    exchange: String,
    fees: F,
}

impl<F: FeeModel> SimulatedExecution<F> {
    pub fn new(exchange: impl Into<String>, fees: F) -> Self {
        Self {
            exchange: exchange.into(),
            fees,
        }
    }
}

impl<F: FeeModel> ExecutionHandler for SimulatedExecution<F> {
    fn on_order(&mut self, order: &OrderEvent, queue: &mut EventQueue) {
        let fill = FillEvent {
            trace_id: order.trace_id,
            timestamp: order.timestamp,
            symbol: order.symbol.clone(),
            exchange: self.exchange.clone(),
            decision: order.decision,
            quantity: order.quantity,
            gross_fill_value: order.quantity.abs() * order.close_reference_price,
            exchange_fee: self.fees.exchange_fee(order),
            slippage_fee: self.fees.slippage_fee(order),
            network_fee: self.fees.network_fee(order),
        };
        queue.push(Event::Fill(fill));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bt_types::{Decision, OrderType, TraceId};

    fn order(quantity: f64) -> OrderEvent {
        OrderEvent {
            trace_id: TraceId::new(),
            timestamp: bt_types::now_truncated(),
            symbol: "AAPL".into(),
            order_type: OrderType::Market,
            decision: Decision::Long,
            quantity,
            close_reference_price: 110.0,
        }
    }

    #[test]
    fn gross_fill_value_uses_abs_quantity_times_reference_price() {
        let mut exec = SimulatedExecution::new("SIM", ZeroFees);
        let mut q = EventQueue::new();
        exec.on_order(&order(9.0), &mut q);
        match q.pop().unwrap() {
            Event::Fill(f) => assert_eq!(f.gross_fill_value, 990.0),
            _ => panic!("expected Fill"),
        }
    }

    #[test]
    fn fee_hooks_default_to_zero() {
        let mut exec = SimulatedExecution::new("SIM", ZeroFees);
        let mut q = EventQueue::new();
        exec.on_order(&order(9.0), &mut q);
        match q.pop().unwrap() {
            Event::Fill(f) => {
                assert_eq!(f.exchange_fee, 0.0);
                assert_eq!(f.slippage_fee, 0.0);
                assert_eq!(f.network_fee, 0.0);
            }
            _ => panic!("expected Fill"),
        }
    }

    #[test]
    fn fixed_fee_model_propagates_configured_amounts() {
        let mut exec = SimulatedExecution::new(
            "SIM",
            FixedFees { exchange: 5.0, slippage: 2.0, network: 1.0 },
        );
        let mut q = EventQueue::new();
        exec.on_order(&order(9.0), &mut q);
        match q.pop().unwrap() {
            Event::Fill(f) => assert_eq!(f.fees().total(), 8.0),
            _ => panic!("expected Fill"),
        }
    }
}

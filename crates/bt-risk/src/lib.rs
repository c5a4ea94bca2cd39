//! Risk refinement of orders built by the portfolio's sizing step.
//!
//! The contract is deliberately thin: `evaluate` may rewrite an order in
//! place (e.g. pin its order type) or cancel it outright. This is the seam
//! a production system would grow daily-loss limits, drawdown halts, and
//! pattern-day-trader gating behind, without touching the portfolio or the
//! engine driver.

use bt_types::{OrderType, OrderEvent};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RiskAction {
    Allow,
    Cancel,
}

#[derive(Debug)]
pub enum RiskError {
    /// A hook rejected an order it cannot make sense of (e.g. zero qty).
    Invalid(String),
}

impl std::fmt::Display for RiskError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RiskError::Invalid(msg) => write!(f, "risk evaluation rejected order: {msg}"),
        }
    }
}

impl std::error::Error for RiskError {}

pub trait RiskEngine {
    /// May mutate `order` in place (refine) and returns whether it should
    /// still be emitted.
    fn evaluate(&mut self, order: &mut OrderEvent) -> Result<RiskAction, RiskError>;
}

/// The reference risk engine: performs no position-level checks and pins
/// every order to `OrderType::Market`.
#[derive(Debug, Default)]
pub struct MarketOrderRisk;

impl RiskEngine for MarketOrderRisk {
    fn evaluate(&mut self, order: &mut OrderEvent) -> Result<RiskAction, RiskError> {
        order.order_type = OrderType::Market;
        Ok(RiskAction::Allow)
    }
}

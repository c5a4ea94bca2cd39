use bt_types::{Decision, Direction, Fees, FillEvent, MarketEvent, TraceId};

#[derive(Debug)]
pub enum PortfolioError {
    /// A fill's (decision, quantity sign) pair cannot be reconciled with a
    /// direction — either at entry or against an already-open position.
    InconsistentDirection { decision: Decision, quantity: f64 },
}

impl std::fmt::Display for PortfolioError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PortfolioError::InconsistentDirection { decision, quantity } => write!(
                f,
                "fill decision {decision:?} inconsistent with quantity {quantity}"
            ),
        }
    }
}

impl std::error::Error for PortfolioError {}

/// One symbol's open or closed position. At most one is open per symbol at
/// a time; once exited it is appended to history and never mutated again.
#[derive(Debug, Clone)]
pub struct Position {
    pub last_update_trace_id: TraceId,
    pub last_update_timestamp: chrono::DateTime<chrono::Utc>,
    pub symbol: String,
    pub direction: Direction,
    pub quantity: f64,

    pub entry_fees: Fees,
    pub entry_total_fees: f64,
    pub entry_avg_price_gross: f64,
    pub entry_gross_fill_value: f64,

    pub exit_fees: Fees,
    pub exit_total_fees: f64,
    pub exit_avg_price_gross: f64,
    pub exit_gross_fill_value: f64,

    pub current_price: f64,
    pub current_market_value: f64,

    pub unrealized_pnl: f64,
    pub realized_pnl: f64,
}

impl Position {
    /// A position is open exactly while its exit gross fill value is zero.
    pub fn is_open(&self) -> bool {
        self.exit_gross_fill_value == 0.0
    }

    /// Opens a position from an entry fill. `fill.decision` must be `Long`
    /// or `Short` and its sign must agree with the direction it names.
    pub fn enter(fill: &FillEvent) -> Result<Position, PortfolioError> {
        let direction = match (fill.decision, fill.quantity) {
            (Decision::Long, q) if q > 0.0 => Direction::Long,
            (Decision::Short, q) if q < 0.0 => Direction::Short,
            (decision, quantity) => {
                return Err(PortfolioError::InconsistentDirection { decision, quantity })
            }
        };

        let quantity = fill.quantity;
        let entry_fees = fill.fees();
        let entry_total_fees = entry_fees.total();
        let entry_avg_price_gross = fill.gross_fill_value / quantity.abs();
        let entry_gross_fill_value = quantity.abs() * entry_avg_price_gross;

        Ok(Position {
            last_update_trace_id: fill.trace_id,
            last_update_timestamp: fill.timestamp,
            symbol: fill.symbol.clone(),
            direction,
            quantity,
            entry_fees,
            entry_total_fees,
            entry_avg_price_gross,
            entry_gross_fill_value,
            exit_fees: Fees::default(),
            exit_total_fees: 0.0,
            exit_avg_price_gross: 0.0,
            exit_gross_fill_value: 0.0,
            current_price: entry_avg_price_gross,
            current_market_value: entry_gross_fill_value,
            unrealized_pnl: 0.0,
            realized_pnl: 0.0,
        })
    }

    /// Marks the position to the latest Market close and recomputes
    /// unrealised P&L, approximating the still-unknown exit fees with a
    /// second charge of the entry fees.
    pub fn update(&mut self, market: &MarketEvent) -> Result<(), PortfolioError> {
        self.last_update_timestamp = market.timestamp;
        self.current_price = market.close;
        self.current_market_value = self.quantity.abs() * market.close;

        self.unrealized_pnl = match self.direction {
            Direction::Long => {
                (self.current_market_value - self.entry_gross_fill_value) - 2.0 * self.entry_total_fees
            }
            Direction::Short => {
                (self.entry_gross_fill_value - self.current_market_value) - 2.0 * self.entry_total_fees
            }
        };
        Ok(())
    }

    /// Closes the position against an exit fill. `fill.decision` must be
    /// the `Close*` counterpart of the position's direction. Returns the
    /// realised P&L of the trade.
    pub fn exit(&mut self, fill: &FillEvent) -> Result<f64, PortfolioError> {
        let expected = match self.direction {
            Direction::Long => Decision::CloseLong,
            Direction::Short => Decision::CloseShort,
        };
        if fill.decision != expected {
            return Err(PortfolioError::InconsistentDirection {
                decision: fill.decision,
                quantity: fill.quantity,
            });
        }

        self.last_update_trace_id = fill.trace_id;
        self.last_update_timestamp = fill.timestamp;

        self.exit_fees = fill.fees();
        self.exit_total_fees = self.exit_fees.total();
        self.exit_avg_price_gross = fill.gross_fill_value / fill.quantity.abs();
        self.exit_gross_fill_value = fill.quantity.abs() * self.exit_avg_price_gross;

        self.realized_pnl = match self.direction {
            Direction::Long => {
                (self.exit_gross_fill_value - self.entry_gross_fill_value)
                    - (self.entry_total_fees + self.exit_total_fees)
            }
            Direction::Short => {
                (self.entry_gross_fill_value - self.exit_gross_fill_value)
                    - (self.entry_total_fees + self.exit_total_fees)
            }
        };
        Ok(self.realized_pnl)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bt_types::now_truncated;

    fn entry_fill(decision: Decision, quantity: f64, gross: f64) -> FillEvent {
        FillEvent {
            trace_id: TraceId::new(),
            timestamp: now_truncated(),
            symbol: "AAPL".into(),
            exchange: "SIM".into(),
            decision,
            quantity,
            gross_fill_value: gross,
            exchange_fee: 0.0,
            slippage_fee: 0.0,
            network_fee: 0.0,
        }
    }

    #[test]
    fn long_round_trip_matches_zero_fee_pnl_law() {
        let mut pos = Position::enter(&entry_fill(Decision::Long, 9.0, 990.0)).unwrap();
        assert!(pos.is_open());

        let exit = entry_fill(Decision::CloseLong, -9.0, 1080.0);
        let pnl = pos.exit(&exit).unwrap();
        assert_eq!(pnl, 90.0);
        assert!(!pos.is_open());
    }

    #[test]
    fn short_round_trip_matches_zero_fee_pnl_law() {
        let mut pos = Position::enter(&entry_fill(Decision::Short, -9.0, 990.0)).unwrap();
        let exit = entry_fill(Decision::CloseShort, 9.0, 1080.0);
        let pnl = pos.exit(&exit).unwrap();
        assert_eq!(pnl, -90.0);
    }

    #[test]
    fn inconsistent_entry_direction_is_a_fault() {
        let err = Position::enter(&entry_fill(Decision::Long, -9.0, 990.0));
        assert!(err.is_err());
    }

    #[test]
    fn exit_with_wrong_decision_is_a_fault() {
        let mut pos = Position::enter(&entry_fill(Decision::Long, 9.0, 990.0)).unwrap();
        let bad_exit = entry_fill(Decision::CloseShort, -9.0, 1080.0);
        assert!(pos.exit(&bad_exit).is_err());
    }
}

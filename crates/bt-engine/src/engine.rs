use bt_data::{DataHandler, DataHandlerError};
use bt_execution::ExecutionHandler;
use bt_portfolio::{Portfolio, PortfolioHandlerError, PortfolioSnapshot, Sizer};
use bt_queue::EventQueue;
use bt_risk::RiskEngine;
use bt_strategy::{Strategy, StrategyError};
use bt_types::Event;

#[derive(Debug)]
pub enum EngineError {
    Data(DataHandlerError),
    Strategy(StrategyError),
    Portfolio(PortfolioHandlerError),
}

impl std::fmt::Display for EngineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EngineError::Data(e) => write!(f, "data handler fault: {e}"),
            EngineError::Strategy(e) => write!(f, "strategy fault: {e}"),
            EngineError::Portfolio(e) => write!(f, "portfolio fault: {e}"),
        }
    }
}

impl std::error::Error for EngineError {}

impl From<DataHandlerError> for EngineError {
    fn from(e: DataHandlerError) -> Self {
        EngineError::Data(e)
    }
}

impl From<StrategyError> for EngineError {
    fn from(e: StrategyError) -> Self {
        EngineError::Strategy(e)
    }
}

impl From<PortfolioHandlerError> for EngineError {
    fn from(e: PortfolioHandlerError) -> Self {
        EngineError::Portfolio(e)
    }
}

pub struct BacktestReport {
    pub snapshot: PortfolioSnapshot,
    pub ticks_processed: u64,
}

pub struct Engine<D, St, S, R, Ex>
where
    D: DataHandler,
    St: Strategy,
    S: Sizer,
    R: RiskEngine,
    Ex: ExecutionHandler,
{
    data: D,
    strategy: St,
    portfolio: Portfolio<S, R>,
    execution: Ex,
    queue: EventQueue,
    event_log: Option<bt_audit::EventLogWriter>,
}

impl<D, St, S, R, Ex> Engine<D, St, S, R, Ex>
where
    D: DataHandler,
    St: Strategy,
    S: Sizer,
    R: RiskEngine,
    Ex: ExecutionHandler,
{
    pub fn new(
        data: D,
        strategy: St,
        portfolio: Portfolio<S, R>,
        execution: Ex,
        event_log: Option<bt_audit::EventLogWriter>,
    ) -> Self {
        Self {
            data,
            strategy,
            portfolio,
            execution,
            queue: EventQueue::new(),
            event_log,
        }
    }

    /// Runs the outer tick / inner drain loop to completion. Aborts and
    /// returns the failure on the first propagated fault; the event log
    /// written up to that point is preserved.
    pub fn run(&mut self) -> Result<BacktestReport, EngineError> {
        let mut ticks_processed = 0u64;

        while self.data.should_continue() {
            self.data.update(&mut self.queue)?;
            ticks_processed += 1;
            tracing::info!(ticks_processed, "tick");
            if let Err(e) = self.drain() {
                tracing::error!(error = %e, ticks_processed, "aborting run on propagated fault");
                return Err(e);
            }
        }

        Ok(BacktestReport {
            snapshot: self.portfolio.snapshot(),
            ticks_processed,
        })
    }

    fn drain(&mut self) -> Result<(), EngineError> {
        while let Some(event) = self.queue.pop() {
            self.log_best_effort(&event);
            tracing::debug!(event = event_kind(&event), symbol = event.symbol(), "dispatch");
            self.dispatch(event)?;
        }
        Ok(())
    }

    fn dispatch(&mut self, event: Event) -> Result<(), EngineError> {
        match event {
            Event::Market(market) => {
                let (data, latest_bar_index) = self.data.latest();
                self.strategy
                    .on_market(&market, data, latest_bar_index, &mut self.queue)?;
                self.portfolio.on_market(&market)?;
            }
            Event::Signal(signal) => {
                self.portfolio.on_signal(&signal, &mut self.queue)?;
            }
            Event::Order(order) => {
                self.execution.on_order(&order, &mut self.queue);
            }
            Event::Fill(fill) => {
                self.portfolio.on_fill(&fill)?;
            }
        }
        Ok(())
    }

    fn log_best_effort(&self, event: &Event) {
        if let Some(log) = &self.event_log {
            if let Err(e) = log.append(event) {
                tracing::warn!(error = %e, "event log write failed, continuing");
            }
        }
    }
}

fn event_kind(event: &Event) -> &'static str {
    match event {
        Event::Market(_) => "market",
        Event::Signal(_) => "signal",
        Event::Order(_) => "order",
        Event::Fill(_) => "fill",
    }
}

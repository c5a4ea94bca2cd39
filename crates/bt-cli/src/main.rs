use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use bt_config::FleetConfig;
use bt_data::{loader, HistoricalDataHandler};
use bt_engine::Engine;
use bt_execution::{SimulatedExecution, ZeroFees};
use bt_portfolio::{DefaultSizer, Portfolio};
use bt_risk::MarketOrderRisk;
use bt_strategy::RsiStrategy;

#[derive(Parser)]
#[command(name = "bt")]
#[command(about = "Event-driven backtester", long_about = None)]
struct Cli {
    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Runs one backtest per fleet ticker against a directory of
    /// `<SYMBOL>.csv` bar files.
    Backtest {
        /// Directory containing one `<SYMBOL>.csv` file per ticker.
        #[arg(long)]
        bars_dir: String,

        /// Optional append-only event log path (one file per run).
        #[arg(long)]
        event_log: Option<String>,

        /// RSI period for the reference strategy.
        #[arg(long, default_value_t = 2)]
        rsi_period: usize,
    },
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    match cli.cmd {
        Commands::Backtest { bars_dir, event_log, rsi_period } => {
            run_backtest(&bars_dir, event_log.as_deref(), rsi_period)
        }
    }
}

fn run_backtest(bars_dir: &str, event_log: Option<&str>, rsi_period: usize) -> Result<()> {
    let fleet = FleetConfig::from_env().context("loading fleet config")?;

    for trader in fleet.per_trader_configs() {
        let csv_path = format!("{bars_dir}/{}.csv", trader.symbol);
        let bars = loader::load_bars_csv(&csv_path)
            .with_context(|| format!("loading bars for {}", trader.symbol))?;

        let data = HistoricalDataHandler::new(&trader.symbol, bars);
        let strategy = RsiStrategy::new(rsi_period).context("constructing reference strategy")?;
        let portfolio = Portfolio::new(
            trader.starting_cash,
            DefaultSizer { default_order_value: trader.default_order_value },
            MarketOrderRisk,
        );
        let execution = SimulatedExecution::new(trader.exchange.clone(), ZeroFees);

        let writer = match event_log {
            Some(dir) => Some(
                bt_audit::EventLogWriter::new(format!("{dir}/{}.jsonl", trader.symbol))
                    .context("opening event log")?,
            ),
            None => None,
        };

        let mut engine = Engine::new(data, strategy, portfolio, execution, writer);
        let report = engine.run().map_err(|e| anyhow::anyhow!("{e}"))?;

        let snap = &report.snapshot;
        println!(
            "symbol={} ticks={} initial_cash={:.2} current_cash={:.2} current_value={:.2} closed_positions={}",
            trader.symbol,
            report.ticks_processed,
            snap.initial_cash,
            snap.current_cash,
            snap.current_value,
            snap.historic_positions.get(&trader.symbol).map(|v| v.len()).unwrap_or(0),
        );
    }

    Ok(())
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .init();
}

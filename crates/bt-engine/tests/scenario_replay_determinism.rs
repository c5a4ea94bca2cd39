use bt_audit::EventLogWriter;
use bt_data::HistoricalDataHandler;
use bt_engine::Engine;
use bt_execution::{SimulatedExecution, ZeroFees};
use bt_portfolio::{DefaultSizer, Portfolio};
use bt_risk::MarketOrderRisk;
use bt_strategy::RsiStrategy;
use bt_types::Bar;
use chrono::{TimeZone, Utc};
use std::fs;

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

fn bar_series() -> Vec<Bar> {
    vec![
        bar(1, 100.0),
        bar(2, 90.0),
        bar(3, 80.0),
        bar(4, 70.0),
        bar(5, 120.0),
        bar(6, 130.0),
        bar(7, 60.0),
    ]
}

fn run_once(log_path: &str) -> bt_engine::BacktestReport {
    let data = HistoricalDataHandler::new("AAPL", bar_series());
    let strategy = RsiStrategy::new(2).unwrap();
    let portfolio = Portfolio::new(
        10_000.0,
        DefaultSizer { default_order_value: 1_000.0 },
        MarketOrderRisk,
    );
    let execution = SimulatedExecution::new("SIM", ZeroFees);
    let writer = EventLogWriter::new(log_path).unwrap();
    let mut engine = Engine::new(data, strategy, portfolio, execution, Some(writer));
    engine.run().unwrap()
}

// S6: two runs over identical bars with identical config produce
// byte-identical event logs and identical snapshot tuples.
#[test]
fn two_runs_over_identical_input_produce_byte_identical_logs() {
    let dir = std::env::temp_dir().join(format!(
        "bt-determinism-test-{}",
        std::process::id()
    ));
    fs::create_dir_all(&dir).unwrap();
    let log_a = dir.join("a.jsonl");
    let log_b = dir.join("b.jsonl");

    let report_a = run_once(log_a.to_str().unwrap());
    let report_b = run_once(log_b.to_str().unwrap());

    assert_eq!(report_a.ticks_processed, report_b.ticks_processed);
    assert_eq!(
        report_a.snapshot.current_cash,
        report_b.snapshot.current_cash
    );
    assert_eq!(
        report_a.snapshot.current_value,
        report_b.snapshot.current_value
    );
    assert_eq!(
        report_a.snapshot.historic_positions.len(),
        report_b.snapshot.historic_positions.len()
    );

    let contents_a = fs::read_to_string(&log_a).unwrap();
    let contents_b = fs::read_to_string(&log_b).unwrap();
    assert!(!contents_a.is_empty());
    assert_eq!(contents_a, contents_b);

    fs::remove_dir_all(&dir).ok();
}

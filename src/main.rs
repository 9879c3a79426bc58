mod engine;
mod models;
mod service;
mod storage;
mod types;

use std::io::{stderr, stdout};
use std::process::exit;
use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;
use tracing::info;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, Layer};

use crate::engine::{CommandEngine, Outcome};
use crate::service::HierarchyService;
use crate::storage::TransactionStorage;

#[tokio::main]
async fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        eprintln!("Usage: transaction-hierarchy [commands].csv [log_level:optional] > [results].csv");
        eprintln!("Available log levels: error, warn, info, debug, trace (default: error)");
        exit(1);
    }

    let path = &args[1];
    let log_level = args.get(2)
        .map(|s| parse_log_level(s)).unwrap_or(LevelFilter::ERROR);

    setup_logging(log_level);

    let storage = Arc::new(TransactionStorage::new());
    let service = Arc::new(HierarchyService::new(storage));
    let engine = CommandEngine::new(service.clone());

    let timer = Instant::now();
    let outcomes = engine.run(path).await?;
    let duration = timer.elapsed();

    info!("Processed commands in: {duration:?}, {} transactions stored", service.transactions().len());

    write_results_to_stdout(&outcomes)?;

    Ok(())
}

fn parse_log_level(level: &str) -> LevelFilter {
    match level.to_lowercase().as_str() {
        "trace" => LevelFilter::TRACE,
        "debug" => LevelFilter::DEBUG,
        "info" => LevelFilter::INFO,
        "warn" => LevelFilter::WARN,
        "error" => LevelFilter::ERROR,
        _ => {
            eprintln!("Invalid log level '{}', defaulting to 'error'", level);
            LevelFilter::ERROR
        }
    }
}

fn setup_logging(level: LevelFilter) {
    //NOTE: Results go to stdout, so logging has to stay on stderr
    let terminal_log = fmt::layer()
        .with_target(false)
        .with_writer(stderr)
        .with_filter(level);

    tracing_subscriber::registry()
        .with(terminal_log)
        .init();
}

fn write_results_to_stdout(outcomes: &[Outcome]) -> Result<()> {
    let mut writer = csv::Writer::from_writer(stdout().lock());

    for outcome in outcomes {
        writer.serialize(outcome)?;
    }

    writer.flush()?;

    Ok(())
}

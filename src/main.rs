use std::{fs::File, io};

use clap::Parser;
use tracing_subscriber::EnvFilter;

use accounter::{Accounts, Config, CsvReader, Engine, TracingDlq};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // stdout carries the balances, logs go to stderr
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let config = Config::parse();
    let file = File::open(&config.input)?;

    let ingestion = CsvReader::new(file);
    let mut engine = Engine::new(ingestion, Accounts::new(), TracingDlq::new());

    engine.process().await?;
    engine.flush(io::stdout().lock())?;

    Ok(())
}

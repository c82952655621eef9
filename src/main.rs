// src/main.rs
use crate::config::{AppConfig, LoggingConfig};
use crate::connectors::yahoo::YahooChartClient;
use crate::core::desk::TradingDesk;
use crate::storage::JsonAccountStore;
use crate::tui::{session, Console};
use crate::universe::SymbolUniverse;
use anyhow::Context;
use dotenvy::dotenv;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

mod config;
mod connectors;
mod core;
mod storage;
mod tui;
mod types;
mod universe;
mod utils;

/// Logs go to a daily rolling file so they never interleave with the REPL.
/// `RUST_LOG` takes precedence over `logging.level`.
fn init_logging(cfg: &LoggingConfig) -> anyhow::Result<WorkerGuard> {
    std::fs::create_dir_all(&cfg.dir)
        .with_context(|| format!("Failed to create log dir {}", cfg.dir.display()))?;

    let file_appender = tracing_appender::rolling::daily(&cfg.dir, &cfg.file_prefix);
    let (writer, guard) = tracing_appender::non_blocking(file_appender);

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&cfg.level))
        .context("Invalid log level")?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .init();

    Ok(guard)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    // 1. Load Configuration
    let config = AppConfig::new().context("Failed to load configuration")?;
    let _log_guard = init_logging(&config.logging)?;

    // 2. Initialize Components
    let universe = match &config.universe.path {
        Some(path) => SymbolUniverse::load(path)?,
        None => SymbolUniverse::open(),
    };
    if universe.is_restricted() && universe.is_empty() {
        anyhow::bail!("Symbol list is empty, nothing would be tradable");
    }
    let quotes = YahooChartClient::new(&config.market)?;
    let store = JsonAccountStore::new(config.store.path.clone());

    info!(
        store = %store.path().display(),
        market = %config.market.base_url,
        restricted_universe = universe.is_restricted(),
        symbols = universe.len(),
        "startup config"
    );

    // 3. Login
    let mut console = Console::new();
    let Some(account) = session::login(&mut console, &store).await? else {
        println!("Goodbye!");
        return Ok(());
    };

    // 4. Run Session
    let mut desk = TradingDesk::new(account, quotes, store, universe);
    if let Err(e) = session::run(&mut console, &mut desk).await {
        tracing::error!("Fatal session error: {:#}", e);
        eprintln!("Fatal Session Error: {:#}", e);
        return Err(e);
    }

    Ok(())
}

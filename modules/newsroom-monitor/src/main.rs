use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use tokio::sync::watch;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use newsroom_common::{FileConfig, Secrets};
use newsroom_pipeline::CycleRunner;
use newsroom_store::SqliteStore;

mod feeds;
mod telegram;

use feeds::FeedFetcher;
use telegram::TelegramChannel;

#[derive(Parser, Debug)]
#[command(name = "newsroom-monitor", about = "UK news novelty monitor")]
struct Cli {
    /// Path to the TOML config file. Defaults apply when absent.
    #[arg(long, short)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("newsroom=info".parse()?))
        .init();

    info!("Newsroom monitor starting...");

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => FileConfig::load(path)?,
        None => FileConfig::default(),
    };
    let secrets = Secrets::from_env()?;

    let store = SqliteStore::connect(&config.service.db_path).await?;
    info!(db_path = config.service.db_path.as_str(), "Store ready");

    let fetcher = FeedFetcher::new(config.service.feeds.clone())?;
    let channel = TelegramChannel::new(&secrets.telegram_bot_token)?;

    let poll_interval = Duration::from_secs(config.service.poll_seconds);
    let runner = CycleRunner::new(
        config,
        Arc::new(store),
        Arc::new(fetcher),
        Arc::new(channel),
    );

    // Registered once at startup and latched, so a signal arriving while a
    // cycle is in flight is observed as soon as the cycle ends.
    let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        let _ = tokio::signal::ctrl_c().await;
        let _ = shutdown_tx.send(true);
    });

    loop {
        // A failed cycle is logged, not fatal; the next tick starts clean.
        if let Err(e) = runner.run_cycle().await {
            error!(error = %e, "Cycle failed");
        }

        if !wait_or_shutdown(&mut shutdown_rx, poll_interval).await {
            info!("Shutdown signal received, stopping");
            break;
        }
    }

    Ok(())
}

/// Wait out the poll interval. Returns false when shutdown has been
/// requested, including a request that arrived during the previous cycle.
async fn wait_or_shutdown(shutdown: &mut watch::Receiver<bool>, interval: Duration) -> bool {
    if *shutdown.borrow() {
        return false;
    }
    tokio::select! {
        _ = shutdown.changed() => false,
        _ = tokio::time::sleep(interval) => true,
    }
}

//! # fr-runner
//!
//! Entry point for the Bybit fill relay.
//!
//! Reads configuration from the environment, connects to the private
//! execution stream, and relays every new fill to Telegram until Ctrl+C.
//!
//! # Usage
//!
//! ```bash
//! BYBIT_API_KEY=... BYBIT_API_SECRET=... TELEGRAM_BOT_TOKEN=... TELEGRAM_CHAT_ID=... \
//!     fr-runner --log-dir ./logs
//! ```

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use fr_bybit::{BybitEndpoints, BybitRest, stream};
use fr_core::config::RelayConfig;
use fr_core::logging::{LogOptions, init_logging};
use fr_relay::{EnrichmentClient, EnrichmentConfig, ExecutionProcessor, TelegramNotifier};
use tokio::sync::{mpsc, watch};
use tracing::{error, info};

/// Pushes buffered between the stream callback and the processor.
const EXECUTION_CHANNEL_CAPACITY: usize = 256;

/// Bybit execution → Telegram relay.
#[derive(Parser)]
#[command(name = "fr-runner", about = "Bybit execution to Telegram relay")]
struct Cli {
    /// Log level (trace, debug, info, warn, error). Overrides LOG_LEVEL.
    #[arg(short, long)]
    log_level: Option<String>,

    /// Optional log directory for file output.
    #[arg(long)]
    log_dir: Option<String>,

    /// Write the log file as JSON lines.
    #[arg(long)]
    log_json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // 1. Load and validate configuration; any missing credential is fatal
    let config = RelayConfig::from_env().context("loading configuration")?;

    // 2. Initialize logging
    let level = cli.log_level.as_deref().unwrap_or(&config.log_level);
    init_logging(&LogOptions {
        level,
        dir: cli.log_dir.as_deref(),
        file_prefix: "fr-runner",
        json: cli.log_json,
    });

    info!(
        "fr-runner starting: testnet={}, utc_offset={}, duplicate_policy={:?}",
        config.exchange.testnet, config.utc_offset_hours, config.duplicate_policy
    );

    // 3. Build collaborators
    let endpoints = BybitEndpoints::for_network(config.exchange.testnet);
    let rest = Arc::new(BybitRest::new(&config.exchange, endpoints.clone())?);
    let enrichment = EnrichmentClient::new(
        rest,
        EnrichmentConfig {
            order_cache: config.order_cache,
            position_cache: config.position_cache,
            testnet: config.exchange.testnet,
        },
    );
    let notifier = Arc::new(TelegramNotifier::new(&config.telegram)?);
    let processor = ExecutionProcessor::new(
        enrichment,
        notifier,
        config.exec_id_cache_max,
        config.duplicate_policy,
        config.utc_offset_hours,
    );

    // 4. Start the processor, then the stream feeding it
    let (tx, rx) = mpsc::channel(EXECUTION_CHANNEL_CAPACITY);
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let processor_task = tokio::spawn(processor.run(rx, shutdown_rx));
    let mut ws = stream::spawn_execution_stream(&config.exchange, &config.ws, &endpoints, tx);

    info!("relay running on {}, press Ctrl+C to stop", endpoints.private_ws_url);

    // 5. Wait for shutdown signal
    tokio::signal::ctrl_c().await?;
    info!("shutdown signal received");

    // 6. Stop intake first, then let the processor finish its batch
    ws.stop().await;
    let _ = shutdown_tx.send(true);
    match processor_task.await {
        Ok(dropped) => info!("processor drained ({dropped} queued push(es) skipped)"),
        Err(e) => error!("processor task failed: {e}"),
    }

    info!("fr-runner stopped");
    Ok(())
}

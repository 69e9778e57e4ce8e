mod config;
mod cosmos;
mod logging;
mod poller;
mod rpc;
#[cfg(test)]
mod testing;
mod tui;

use anyhow::{Context, Result};
use clap::Parser;
use config::Config;
use cosmos::ValidatorRegistry;
use poller::{Poller, RefreshPolicy, RegistryMaintainer};
use rpc::{Endpoint, NodeRpc, RpcClient};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// CometBFT Vote Monitor - live prevote/precommit dashboard for a validator set
#[derive(Parser, Debug)]
#[command(name = "cvm")]
#[command(version)]
#[command(about = "Live consensus vote dashboard for CometBFT chains")]
struct Args {
    /// Node RPC to watch round state on (e.g. tcp://localhost:26657, https://rpc.example.com)
    chain_rpc: String,

    /// Node RPC used to build the validator registry (defaults to CHAIN_RPC)
    provider_rpc: Option<String>,

    /// Poll with the fast interval
    #[arg(long)]
    fast: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Path to config file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Write logs to this file instead of stderr
    #[arg(long)]
    log_file: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let (config, config_source) = Config::load(args.config.as_deref())?;

    let log_file = args
        .log_file
        .clone()
        .or_else(|| config.log.file.as_ref().map(PathBuf::from));
    logging::init(args.verbose, config.log.level.as_deref(), log_file.as_deref())?;

    match config_source {
        Some(path) => info!("Loaded config from {}", path.display()),
        None => info!("No config file found, using defaults"),
    }

    let chain = Endpoint::resolve(&args.chain_rpc)?;
    let provider = match args.provider_rpc.as_deref() {
        Some(addr) => Endpoint::resolve(addr)?,
        None => chain.clone(),
    };
    info!("Chain RPC: {}", chain);
    debug!("Chain websocket RPC: {}", chain.websocket_url());
    info!("Registry provider RPC: {}", provider);

    let chain_rpc: Arc<dyn NodeRpc> = Arc::new(RpcClient::with_timeout(chain, config.rpc.timeout_ms));
    let provider_rpc: Arc<dyn NodeRpc> =
        Arc::new(RpcClient::with_timeout(provider, config.rpc.timeout_ms));

    let network = cosmos::network_name(chain_rpc.as_ref())
        .await
        .context("Failed to resolve network name")?;
    info!("Network: {}", network);

    let options = config.registry_options();
    let registry = ValidatorRegistry::build(provider_rpc.as_ref(), options)
        .await
        .context("Failed to build validator registry")?;
    info!("Loaded {} validators", registry.len());

    // Capacity 1: the poller waits for the dashboard to take each update.
    let (updates_tx, updates_rx) = mpsc::channel(1);
    let (refresh_tx, refresh_rx) = mpsc::channel(1);

    let maintainer = RegistryMaintainer::new(provider_rpc, registry.clone(), options, refresh_rx);
    tokio::spawn(maintainer.run());

    let poller = Poller::new(
        chain_rpc,
        registry,
        config.poll.interval(args.fast),
        RefreshPolicy::new(config.poll.bootstrap_height, config.poll.refresh_every_blocks),
        updates_tx,
        refresh_tx,
    );
    let poller = tokio::spawn(poller.run());

    let theme = tui::Theme::from_name(&config.view.theme).unwrap_or_default();
    let res = tui::run(
        network,
        theme,
        Duration::from_millis(config.view.frame_interval_ms),
        updates_rx,
    )
    .await;

    // Stop the poller without waiting out its interval
    poller.abort();
    if let Err(e) = poller.await {
        if !e.is_cancelled() {
            warn!("Poller task failed: {}", e);
        }
    }

    res
}

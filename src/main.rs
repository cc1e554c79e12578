/// GHO Bridge - Main entry point
///
/// CLI for quoting and submitting cross-chain GHO transfers through the
/// CCIP router.

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use ethers::middleware::SignerMiddleware;
use ethers::providers::{Http, Provider};
use ethers::signers::{LocalWallet, Signer};
use ethers::types::Address;
use ethers::utils::format_units;
use tracing::info;
use tracing_subscriber::EnvFilter;

use gho_bridge::config::{BridgeConfig, CONFIG};
use gho_bridge::contracts::{CcipRouter, Erc20Token, TokenPoolContract};
use gho_bridge::lanes;
use gho_bridge::orchestrator::{BridgeActionState, BridgeOrchestrator};
use gho_bridge::types::Chain;

/// Command line arguments
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Config file path
    #[arg(short, long, default_value = "config/bridge.yaml")]
    config: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

/// Subcommands
#[derive(Subcommand)]
enum Commands {
    /// Print the configured bridge lanes
    Lanes,

    /// Quote the fee for a transfer without sending anything
    Quote {
        /// Source chain (ethereum, arbitrum, base)
        #[arg(long)]
        from: String,
        /// Destination chain
        #[arg(long)]
        to: String,
        /// Amount of GHO, human units
        #[arg(long)]
        amount: String,
        /// Receiver address on the destination chain
        #[arg(long)]
        receiver: String,
    },

    /// Show the bridgeable capacity of a lane
    Capacity {
        /// Source chain
        #[arg(long)]
        from: String,
        /// Destination chain
        #[arg(long)]
        to: String,
    },

    /// Quote, approve if needed, and submit a transfer
    Send {
        /// Source chain
        #[arg(long)]
        from: String,
        /// Destination chain
        #[arg(long)]
        to: String,
        /// Amount of GHO, human units
        #[arg(long)]
        amount: String,
        /// Receiver address on the destination chain
        #[arg(long)]
        receiver: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(cli.log_level.clone())),
        )
        .init();

    if let Ok(loaded) = BridgeConfig::load_from_file(&cli.config) {
        *CONFIG.write().await = loaded;
    } else {
        let mut config = BridgeConfig::default();
        config.apply_env_overrides();
        *CONFIG.write().await = config;
    }

    match cli.command {
        Commands::Lanes => print_lanes(),
        Commands::Quote {
            from,
            to,
            amount,
            receiver,
        } => quote(&from, &to, &amount, &receiver).await?,
        Commands::Capacity { from, to } => capacity(&from, &to).await?,
        Commands::Send {
            from,
            to,
            amount,
            receiver,
        } => send(&from, &to, &amount, &receiver).await?,
    }

    Ok(())
}

fn print_lanes() {
    for chain in lanes::supported_source_chains() {
        let lane = lanes::config_for(chain).expect("configured chain");
        let pool_kind = if lane.lock_release_token_pool.is_some() {
            "lock/release"
        } else {
            "burn/mint"
        };
        println!(
            "{:<10} selector={:<22} router={:#x} pool={:#x} ({})",
            chain.to_string(),
            lane.chain_selector,
            lane.router,
            lane.token_pool(),
            pool_kind
        );
    }
}

fn parse_chain(s: &str) -> Result<Chain> {
    Chain::from_str(s).map_err(|e| anyhow::anyhow!(e))
}

async fn build_orchestrator(
    source: Chain,
    destination: Chain,
) -> Result<(BridgeOrchestrator, Address)> {
    let config = CONFIG.read().await.clone();
    let lane = lanes::config_for(source)?;

    let provider = Provider::<Http>::try_from(config.rpc_url(source)?)
        .context("could not instantiate HTTP provider")?;
    let wallet = LocalWallet::from_str(&config.private_key()?)
        .context("invalid private key")?
        .with_chain_id(source.chain_id());
    let sender = wallet.address();
    let client = Arc::new(SignerMiddleware::new(provider, wallet));

    let router = Arc::new(CcipRouter::new(lane.router, client.clone())?);
    let token = Arc::new(Erc20Token::new(lane.token, client.clone())?);
    let pool = Arc::new(TokenPoolContract::new(lane.token_pool(), client)?);

    let orchestrator = BridgeOrchestrator::new(
        source,
        destination,
        sender,
        router,
        token,
        Some(pool),
        Duration::from_millis(config.general.quote_debounce_ms),
    )?;
    Ok((orchestrator, sender))
}

async fn quote(from: &str, to: &str, amount: &str, receiver: &str) -> Result<()> {
    let source = parse_chain(from)?;
    let destination = parse_chain(to)?;
    let (orchestrator, _) = build_orchestrator(source, destination).await?;

    let state = orchestrator.input_changed(amount, receiver).await;
    match state {
        BridgeActionState::AwaitingApproval | BridgeActionState::ReadyToSubmit => {
            let fee = orchestrator
                .fee_estimate()
                .await
                .context("quote completed without a fee")?;
            println!(
                "fee: {} {} ({} wei)",
                fee.fee_formatted, fee.fee_token, fee.fee_raw
            );
            if state == BridgeActionState::AwaitingApproval {
                println!("note: sending would first require a router approval");
            }
        }
        other => bail!("quote did not complete: {}", other),
    }
    Ok(())
}

async fn capacity(from: &str, to: &str) -> Result<()> {
    let source = parse_chain(from)?;
    let destination = parse_chain(to)?;
    let (orchestrator, _) = build_orchestrator(source, destination).await?;

    match orchestrator.available_capacity().await? {
        Some(available) => {
            println!(
                "bridgeable now: {} GHO",
                format_units(available, 18).unwrap_or_else(|_| available.to_string())
            );
        }
        None => println!("no token pool wired for this lane"),
    }
    Ok(())
}

async fn send(from: &str, to: &str, amount: &str, receiver: &str) -> Result<()> {
    let source = parse_chain(from)?;
    let destination = parse_chain(to)?;
    let (orchestrator, sender) = build_orchestrator(source, destination).await?;
    info!(%source, %destination, %amount, sender = %format!("{:#x}", sender), "starting bridge flow");

    let mut state = orchestrator.input_changed(amount, receiver).await;

    if state == BridgeActionState::AwaitingApproval {
        info!("allowance insufficient, submitting approval");
        state = orchestrator.confirm_approval().await?;
    }

    match state {
        BridgeActionState::ReadyToSubmit => {
            let tx = orchestrator.confirm_send().await?;
            println!("bridge send confirmed: {}", tx.tx_hash);
            Ok(())
        }
        other => bail!("bridge flow stopped in state {}", other),
    }
}

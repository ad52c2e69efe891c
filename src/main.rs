mod api;
mod config;
mod dashboard;
mod price;

use std::io::Write as _;
use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

use crate::api::{NodeClient, MAX_BLOCKS, MIN_BLOCKS};
use crate::price::PriceClient;

#[derive(Copy, Clone, Debug, ValueEnum)]
pub enum Network { Mainnet, Sepolia }
impl Network {
    pub fn subdomain(&self) -> &'static str {
        match self { Network::Mainnet => "mainnet", Network::Sepolia => "sepolia" }
    }
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Ethereum on-chain analytics - headless", long_about = None)]
struct Cli {
    /// Infura project ID (node-provider credential)
    #[arg(long, env = "INFURA_PROJECT_ID")]
    project_id: Option<String>,

    /// Network (mainnet or sepolia)
    #[arg(long, env = "NETWORK", value_enum, default_value_t = Network::Mainnet)]
    network: Network,

    /// Number of recent blocks to analyze
    #[arg(long, env = "NUM_BLOCKS", default_value_t = 50,
          value_parser = clap::value_parser!(u64).range(MIN_BLOCKS..=MAX_BLOCKS))]
    blocks: u64,

    /// Local secrets file (TOML) with an [infura] project_id entry
    #[arg(long, env = "SECRETS_FILE", default_value = "secrets.toml")]
    secrets: PathBuf,

    /// Skip the local secrets file (managed hosting environments)
    #[arg(long, env = "SKIP_SECRETS_FILE", default_value_t = false)]
    skip_secrets: bool,

    /// Log level (error|warn|info|debug|trace)
    #[arg(long, env = "RUST_LOG", default_value = "info")]
    log: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Interactive dashboard: refresh on demand
    Dash,
    /// Run one refresh cycle and exit
    Refresh,
    /// Print the current chain head block number
    Head,
    /// Fetch the current ETH/USD price and print it
    Price,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let log = cli.log.clone(); // avoid moving cli
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(log))
        .init();

    match cli.command {
        Commands::Dash => cmd_dash(cli).await?,
        Commands::Refresh => cmd_refresh(cli).await?,
        Commands::Head => cmd_head(cli).await?,
        Commands::Price => cmd_price().await?,
    }

    Ok(())
}

/// Resolve the credential once and build the injected node handle.
fn node_client(cli: &Cli) -> anyhow::Result<NodeClient> {
    let project_id =
        config::resolve_credential(cli.project_id.as_deref(), &cli.secrets, cli.skip_secrets)?;
    NodeClient::new(cli.network, &project_id)
}

/// One refresh cycle: blocks, then price, then render. Sequential; any
/// failure aborts the cycle with no partial output.
async fn run_refresh(node: &NodeClient, price: &PriceClient, count: u64) -> anyhow::Result<()> {
    tracing::info!(blocks = count, "fetching on-chain data");
    let blocks = node.latest_blocks(count).await.context("block fetch failed")?;
    let quote = price.eth_usd().await.context("price fetch failed")?;
    print!("{}", dashboard::render_refresh(&blocks, &quote));
    Ok(())
}

async fn cmd_refresh(cli: Cli) -> anyhow::Result<()> {
    let node = node_client(&cli)?;
    let price = PriceClient::new()?;
    run_refresh(&node, &price, cli.blocks).await
}

async fn cmd_dash(cli: Cli) -> anyhow::Result<()> {
    let node = node_client(&cli)?;
    let price = PriceClient::new()?;

    println!("=== Ethereum On-Chain Analytics ===");
    println!("Analyzing the {} most recent blocks on {:?}.", cli.blocks, cli.network);
    println!("Enter or 'r' refreshes, 'q' quits.");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("> ");
        std::io::stdout().flush()?;
        let Some(line) = lines.next_line().await? else { break };
        match line.trim() {
            "q" | "quit" => break,
            "" | "r" | "refresh" => {
                if let Err(e) = run_refresh(&node, &price, cli.blocks).await {
                    tracing::error!("refresh failed: {e:#}");
                }
            }
            other => println!("unknown command {other:?} (Enter refreshes, q quits)"),
        }
    }
    Ok(())
}

async fn cmd_head(cli: Cli) -> anyhow::Result<()> {
    let node = node_client(&cli)?;
    println!("{}", node.chain_head().await?);
    Ok(())
}

async fn cmd_price() -> anyhow::Result<()> {
    let quote = PriceClient::new()?.eth_usd().await?;
    println!("{}", serde_json::to_string_pretty(&quote)?);
    Ok(())
}

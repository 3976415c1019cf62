//! Command Line Interface for the SOL transfer engine.
use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use dotenv::dotenv;
use rust_decimal::Decimal;
use solpay_api::{ApiServer, AppState, ServerConfig};
use solpay_domain::Address;
use solpay_execution::config::EngineConfig;
use solpay_execution::engine::TransferEngine;
use solpay_execution::provider::{KeypairProvider, ProviderBridge};
use solpay_protocols::rpc::SolanaConnector;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use zeroize::Zeroizing;

/// Base58 keypair secret used to sign transfers.
const ENV_SIGNER_SECRET: &str = "SOLPAY_SIGNER_SECRET";

#[derive(Parser)]
#[command(name = "solpay")]
#[command(about = "Resilient SOL transfer submission", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Send SOL from the configured signer
    Send {
        /// Recipient address
        #[arg(long)]
        to: String,

        /// Amount in SOL (e.g., 0.01)
        #[arg(long)]
        amount: Decimal,
    },
    /// Show an account balance
    Balance {
        /// Account address (defaults to the treasury, then the signer)
        #[arg(long)]
        address: Option<String>,
    },
    /// Check every configured RPC endpoint
    Probe,
    /// Run the HTTP API
    Serve {
        /// Listen address (overrides SOLPAY_BIND_ADDR)
        #[arg(long)]
        bind: Option<SocketAddr>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let config = EngineConfig::from_env().context("loading engine configuration")?;
    let bridge = Arc::new(ProviderBridge::new());
    let signer = install_signer(&bridge, &config).await?;
    let engine = Arc::new(
        TransferEngine::new(config, Arc::new(SolanaConnector::default()), bridge)
            .context("building transfer engine")?,
    );

    match cli.command {
        Commands::Send { to, amount } => {
            if signer.is_none() {
                bail!("{ENV_SIGNER_SECRET} must be set in .env or environment to send");
            }

            println!("📤 Sending {amount} SOL to {to}...");
            match engine.submit_transfer(&to, amount).await {
                Ok(receipt) => {
                    println!("Signature: {}", receipt.signature);
                    println!("Endpoint:  {}", receipt.endpoint);
                    if receipt.confirmed {
                        println!("✅ Confirmed");
                    } else if let Some(warning) = &receipt.warning {
                        println!("⚠️  {warning}");
                    }
                }
                Err(err) => {
                    eprintln!("❌ {}", err.user_message());
                    return Err(err.into());
                }
            }
        }
        Commands::Balance { address } => {
            let address = match address {
                Some(raw) => Address::validate(&raw)?,
                None => engine
                    .config()
                    .treasury
                    .or(signer)
                    .context("no --address given and no treasury or signer configured")?,
            };

            let lamports = engine.balance(&address).await?;
            println!(
                "{address}: {} SOL ({lamports} lamports)",
                lamports.to_major(engine.unit_scale()).normalize()
            );
        }
        Commands::Probe => {
            println!("🔍 Probing {} endpoints...", engine.config().endpoints.len());
            println!("{:<45} | {:<10} | {}", "Endpoint", "Latency", "Result");
            println!("{}", "-".repeat(90));

            for report in engine.probe().await {
                let result = match &report.outcome {
                    Ok(lease) => format!(
                        "ok, blockhash {} valid until {}",
                        lease.blockhash, lease.last_valid_block_height
                    ),
                    Err(failure) => format!("{}: {}", failure.reason, failure.detail),
                };
                println!(
                    "{:<45} | {:<10} | {}",
                    report.endpoint.url,
                    format!("{}ms", report.latency.as_millis()),
                    result
                );
            }
        }
        Commands::Serve { bind } => {
            let mut server_config =
                ServerConfig::from_env().context("loading server configuration")?;
            if let Some(bind) = bind {
                server_config.bind_addr = bind;
            }

            println!("🚀 Serving on {}", server_config.bind_addr);
            ApiServer::new(server_config, AppState::new(engine))
                .run()
                .await?;
        }
    }

    Ok(())
}

/// Installs and connects the keypair signer when a secret is configured.
async fn install_signer(
    bridge: &ProviderBridge,
    config: &EngineConfig,
) -> Result<Option<Address>> {
    let Ok(secret) = std::env::var(ENV_SIGNER_SECRET).map(Zeroizing::new) else {
        return Ok(None);
    };
    let rpc_urls = config.signer_rpc_urls();
    if rpc_urls.is_empty() {
        bail!("no RPC endpoint configured for the signer");
    }

    let provider = KeypairProvider::from_base58(&secret, rpc_urls, config.commitment)
        .with_context(|| format!("loading {ENV_SIGNER_SECRET}"))?;
    bridge.install(Arc::new(provider));
    let address = bridge.connect().await?;
    Ok(Some(address))
}

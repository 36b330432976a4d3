//! Sigil CLI
//!
//! Command-line interface for running and operating Sigil nodes.

use clap::{Parser, Subcommand};
use sigil_chain::DisburserKey;
use sigil_core::EpochDay;
use sigil_node::{NodeConfig, SigilNode};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "sigil")]
#[command(author = "Sigil Labs")]
#[command(version = "0.1.0")]
#[command(about = "Sigil - daily check-in and reward settlement node", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Start a Sigil node
    Node {
        /// Configuration file path
        #[arg(short, long, default_value = "sigil.toml")]
        config: PathBuf,
    },

    /// Generate a disburser keypair
    Keygen,

    /// Ask a running node to settle yesterday's claim
    Settle {
        /// Node API base URL
        #[arg(short, long, default_value = "http://127.0.0.1:8787")]
        url: String,

        /// Cron bearer secret
        #[arg(short, long, env = "SIGIL_CRON_SECRET")]
        secret: Option<String>,
    },

    /// Query pending rewards for a wallet
    Rewards {
        /// Wallet address (base58)
        wallet: String,

        /// Node API base URL
        #[arg(short, long, default_value = "http://127.0.0.1:8787")]
        url: String,
    },

    /// Version information
    Version,
}

fn init_logging(verbose: bool) {
    let env_filter = if verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_thread_ids(false)
                .with_file(false),
        )
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Node { config } => {
            let node_config = if config.exists() {
                NodeConfig::load(&config)?
            } else {
                tracing::info!("Config not found at {:?}, using defaults", config);
                NodeConfig::default()
            };

            let node = SigilNode::new(node_config);
            node.run().await?;
        }

        Commands::Keygen => {
            tracing::info!("Generating disburser keypair...");

            let key = DisburserKey::generate();

            println!("Keypair generated successfully!");
            println!("Wallet address: {}", key.wallet());
            println!("Secret key (base58): {}", key.to_base58());
            println!("");
            println!("Export it before starting the node:");
            println!("  export SIGIL_DISBURSER_KEY={}", key.to_base58());
        }

        Commands::Settle { url, secret } => {
            tracing::info!("Requesting settlement of day {}", EpochDay::today().prev());

            let client = reqwest::Client::new();
            let mut request = client.post(format!("{}/cron/settle-day", url));
            if let Some(secret) = &secret {
                request = request.bearer_auth(secret);
            }

            let response = request.send().await?;
            let status = response.status();
            let body: serde_json::Value = response.json().await?;

            if !status.is_success() {
                anyhow::bail!("settle failed ({}): {}", status, body);
            }
            println!("{}", serde_json::to_string_pretty(&body)?);
        }

        Commands::Rewards { wallet, url } => {
            let client = reqwest::Client::new();
            let response = client
                .get(format!("{}/rewards", url))
                .query(&[("wallet", wallet.as_str())])
                .send()
                .await?;
            let status = response.status();
            let body: serde_json::Value = response.json().await?;

            if !status.is_success() {
                anyhow::bail!("rewards query failed ({}): {}", status, body);
            }
            println!("{}", serde_json::to_string_pretty(&body)?);
        }

        Commands::Version => {
            println!("Sigil v{}", env!("CARGO_PKG_VERSION"));
            println!("");
            println!("Components:");
            println!("  - Daily check-in registrar (signed ed25519 messages)");
            println!("  - Day claim registry and settlement");
            println!("  - Weighted reward calculator");
            println!("  - Payout executor with confirmation polling");
        }
    }

    Ok(())
}

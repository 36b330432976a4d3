//! Node orchestration
//!
//! Wires the ledger, chain client and settlement services into the shared
//! [`AppContext`], starts the API and metrics servers, and runs until a
//! shutdown signal arrives.

use crate::api::{ApiServer, AppContext};
use crate::config::NodeConfig;
use crate::metrics::{AppMetrics, MetricsServer};
use crate::notify::{DayNotifier, LogBroadcaster};
use parking_lot::RwLock;
use sigil_chain::{ChainClient, DisburserKey, RpcChainClient};
use sigil_core::{EpochDay, WalletId};
use sigil_ledger::{LedgerStore, MemoryLedger};
use sigil_settlement::{CheckInRegistrar, DayRegistry, PayoutExecutor, RewardCalculator};
use std::sync::Arc;
use tokio::signal;

/// Node state
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NodeState {
    /// Node is starting up
    Starting,
    /// Node is serving requests
    Running,
    /// Node is shutting down
    Stopping,
    /// Node has stopped
    Stopped,
}

/// Sigil node
pub struct SigilNode {
    config: NodeConfig,
    state: Arc<RwLock<NodeState>>,
}

impl SigilNode {
    /// Create a new node
    pub fn new(config: NodeConfig) -> Self {
        Self {
            config,
            state: Arc::new(RwLock::new(NodeState::Starting)),
        }
    }

    /// Get current state
    pub fn state(&self) -> NodeState {
        self.state.read().clone()
    }

    /// Run the node
    pub async fn run(&self) -> anyhow::Result<()> {
        tracing::info!("Starting Sigil node...");
        *self.state.write() = NodeState::Starting;

        let disburser = match self.config.chain.resolve_disburser_key() {
            Some(encoded) => DisburserKey::from_base58(&encoded)?,
            None => anyhow::bail!(
                "no disburser key configured; set SIGIL_DISBURSER_KEY or chain.disburser_key"
            ),
        };
        let disburser_wallet = disburser.wallet();

        let store: Arc<dyn LedgerStore> = Arc::new(MemoryLedger::new());
        let chain: Arc<dyn ChainClient> = Arc::new(RpcChainClient::new(
            self.config.chain.rpc_url.clone(),
            disburser,
        ));

        let metrics = AppMetrics::new()?;
        let ctx = Arc::new(AppContext {
            registrar: CheckInRegistrar::new(Arc::clone(&store), Arc::clone(&chain)),
            registry: DayRegistry::new(Arc::clone(&store), Arc::clone(&chain)),
            executor: PayoutExecutor::new(Arc::clone(&store), Arc::clone(&chain)),
            calculator: RewardCalculator::new(Arc::clone(&store)),
            notifier: DayNotifier::new(
                Arc::clone(&store),
                Arc::new(LogBroadcaster),
                self.config.node.domain.clone(),
            ),
            store: Arc::clone(&store),
            cron_secret: self.config.cron.resolve_secret(),
            metrics: metrics.clone(),
        });

        // Start API server
        let api_handle = if self.config.api.enabled {
            let server = ApiServer::new(&self.config.api, Arc::clone(&ctx));
            Some(tokio::spawn(async move {
                if let Err(e) = server.run().await {
                    tracing::error!("API server error: {}", e);
                }
            }))
        } else {
            None
        };

        // Start metrics server
        let metrics_handle = if self.config.metrics.enabled {
            let server = MetricsServer::new(&self.config.metrics, &metrics);
            Some(tokio::spawn(async move {
                if let Err(e) = server.run().await {
                    tracing::error!("Metrics server error: {}", e);
                }
            }))
        } else {
            None
        };

        *self.state.write() = NodeState::Running;
        self.print_startup_banner(&disburser_wallet);

        // Wait for shutdown signal
        self.wait_for_shutdown().await;

        *self.state.write() = NodeState::Stopping;
        tracing::info!("Shutting down...");

        if let Some(handle) = api_handle {
            handle.abort();
        }
        if let Some(handle) = metrics_handle {
            handle.abort();
        }

        *self.state.write() = NodeState::Stopped;
        tracing::info!("Node stopped");

        Ok(())
    }

    /// Print startup banner with node information
    fn print_startup_banner(&self, disburser: &WalletId) {
        tracing::info!("╔══════════════════════════════════════════════════════════════╗");
        tracing::info!("║                    SIGIL NODE IS RUNNING                     ║");
        tracing::info!("╚══════════════════════════════════════════════════════════════╝");
        tracing::info!("");
        tracing::info!("Node: {}", self.config.node.name);
        tracing::info!("Domain: {}", self.config.node.domain);
        tracing::info!("Epoch day: {}", EpochDay::today());
        tracing::info!("Disburser wallet: {}", disburser);
        tracing::info!("Chain RPC: {}", self.config.chain.rpc_url);

        if self.config.api.enabled {
            tracing::info!("HTTP API: http://{}", self.config.api.address);
        }
        if self.config.metrics.enabled {
            tracing::info!("Metrics: http://{}/metrics", self.config.metrics.address);
        }
        if self.config.cron.resolve_secret().is_none() {
            tracing::warn!("Cron surface is open (no cron secret configured)");
        }

        tracing::info!("");
        tracing::info!("Press Ctrl+C to stop the node");
    }

    /// Wait for shutdown signal
    async fn wait_for_shutdown(&self) {
        let ctrl_c = async {
            signal::ctrl_c()
                .await
                .expect("Failed to install Ctrl+C handler");
        };

        #[cfg(unix)]
        let terminate = async {
            signal::unix::signal(signal::unix::SignalKind::terminate())
                .expect("Failed to install signal handler")
                .recv()
                .await;
        };

        #[cfg(not(unix))]
        let terminate = std::future::pending::<()>();

        tokio::select! {
            _ = ctrl_c => {},
            _ = terminate => {},
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_node_creation() {
        let node = SigilNode::new(NodeConfig::default());
        assert_eq!(node.state(), NodeState::Starting);
    }
}

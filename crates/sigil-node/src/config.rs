//! Node configuration types

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Complete node configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct NodeConfig {
    /// Node identity settings
    #[serde(default)]
    pub node: NodeSettings,

    /// HTTP API settings
    #[serde(default)]
    pub api: ApiSettings,

    /// Chain RPC settings
    #[serde(default)]
    pub chain: ChainSettings,

    /// Cron endpoint authorization
    #[serde(default)]
    pub cron: CronSettings,

    /// Metrics configuration
    #[serde(default)]
    pub metrics: MetricsSettings,
}

impl NodeConfig {
    /// Load configuration from a TOML file.
    ///
    /// Missing sections and fields fall back to their defaults, so a
    /// minimal file only has to name what it overrides.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config = toml::from_str(&content)?;
        Ok(config)
    }
}

/// Basic node settings
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NodeSettings {
    /// Node name
    #[serde(default = "default_node_name")]
    pub name: String,

    /// Public domain the notifier points readers at
    #[serde(default = "default_domain")]
    pub domain: String,
}

fn default_node_name() -> String {
    "sigil-node".to_string()
}

fn default_domain() -> String {
    "sigil.bond".to_string()
}

impl Default for NodeSettings {
    fn default() -> Self {
        Self {
            name: default_node_name(),
            domain: default_domain(),
        }
    }
}

/// HTTP API settings
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ApiSettings {
    /// Enable the API server
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Listen address
    #[serde(default = "default_api_address")]
    pub address: String,

    /// Enable CORS headers
    #[serde(default = "default_true")]
    pub cors_enabled: bool,

    /// Requests per second per IP
    #[serde(default = "default_requests_per_second")]
    pub requests_per_second: u32,

    /// Burst allowance on top of the per-second rate
    #[serde(default = "default_burst")]
    pub burst: u32,
}

fn default_true() -> bool {
    true
}

fn default_api_address() -> String {
    "127.0.0.1:8787".to_string()
}

fn default_requests_per_second() -> u32 {
    10
}

fn default_burst() -> u32 {
    20
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            address: default_api_address(),
            cors_enabled: true,
            requests_per_second: default_requests_per_second(),
            burst: default_burst(),
        }
    }
}

/// Chain RPC settings
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ChainSettings {
    /// JSON-RPC endpoint
    #[serde(default = "default_rpc_url")]
    pub rpc_url: String,

    /// Base58 disburser secret key; the SIGIL_DISBURSER_KEY environment
    /// variable overrides this so the key can stay out of config files
    pub disburser_key: Option<String>,
}

fn default_rpc_url() -> String {
    "https://api.mainnet-beta.solana.com".to_string()
}

impl Default for ChainSettings {
    fn default() -> Self {
        Self {
            rpc_url: default_rpc_url(),
            disburser_key: None,
        }
    }
}

impl ChainSettings {
    /// Resolve the disburser key, preferring the environment
    pub fn resolve_disburser_key(&self) -> Option<String> {
        std::env::var("SIGIL_DISBURSER_KEY")
            .ok()
            .filter(|key| !key.is_empty())
            .or_else(|| self.disburser_key.clone())
    }
}

/// Cron endpoint authorization
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct CronSettings {
    /// Bearer secret for /cron routes; unset leaves them open, which is
    /// only acceptable behind a trusted proxy
    pub secret: Option<String>,
}

impl CronSettings {
    /// Resolve the cron secret, preferring the environment
    pub fn resolve_secret(&self) -> Option<String> {
        std::env::var("SIGIL_CRON_SECRET")
            .ok()
            .filter(|secret| !secret.is_empty())
            .or_else(|| self.secret.clone())
    }
}

/// Metrics configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MetricsSettings {
    /// Enable the metrics server
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Metrics address
    #[serde(default = "default_metrics_address")]
    pub address: String,
}

fn default_metrics_address() -> String {
    "127.0.0.1:9615".to_string()
}

impl Default for MetricsSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            address: default_metrics_address(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults() {
        let config = NodeConfig::default();
        assert_eq!(config.node.name, "sigil-node");
        assert_eq!(config.node.domain, "sigil.bond");
        assert!(config.api.enabled);
        assert_eq!(config.api.address, "127.0.0.1:8787");
        assert_eq!(config.api.requests_per_second, 10);
        assert!(config.cron.secret.is_none());
        assert!(config.metrics.enabled);
    }

    #[test]
    fn test_load_partial_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[api]
address = "0.0.0.0:8080"

[chain]
rpc_url = "https://api.devnet.solana.com"
"#
        )
        .unwrap();

        let config = NodeConfig::load(file.path()).unwrap();
        assert_eq!(config.api.address, "0.0.0.0:8080");
        // untouched fields keep their defaults
        assert!(config.api.cors_enabled);
        assert_eq!(config.chain.rpc_url, "https://api.devnet.solana.com");
        assert_eq!(config.node.name, "sigil-node");
    }

    #[test]
    fn test_load_rejects_malformed_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "api = \"not a table\"").unwrap();
        assert!(NodeConfig::load(file.path()).is_err());
    }

    #[test]
    fn test_config_round_trips_through_toml() {
        let config = NodeConfig::default();
        let encoded = toml::to_string(&config).unwrap();
        let decoded: NodeConfig = toml::from_str(&encoded).unwrap();
        assert_eq!(decoded.api.address, config.api.address);
        assert_eq!(decoded.chain.rpc_url, config.chain.rpc_url);
    }
}

use serde::Deserialize;
use solana_sdk::commitment_config::CommitmentConfig;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

const HELIUS_MAINNET_URL: &str = "https://mainnet.helius-rpc.com/?api-key=";

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub solana: SolanaConfig,
    pub retry: RetryConfig,
    pub discovery: DiscoveryConfig,
    pub storage: StorageConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct SolanaConfig {
    pub rpc_url: Option<String>,
    pub api_key: Option<String>,
    pub commitment: String,
    pub request_timeout_secs: u64,
}

impl Default for SolanaConfig {
    fn default() -> Self {
        Self {
            rpc_url: None,
            api_key: None,
            commitment: "confirmed".to_string(),
            request_timeout_secs: 30,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            delay_ms: 1000,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct DiscoveryConfig {
    pub page_limit: usize,
    pub max_pages: usize,
    pub verify_batch_size: usize,
    pub balance_batch_size: usize,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            page_limit: 1000,
            max_pages: 100_000,
            verify_batch_size: 50,
            balance_batch_size: 100,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct StorageConfig {
    pub snapshot_dir: PathBuf,
    pub database_path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            snapshot_dir: PathBuf::from("./files"),
            database_path: "holders.db".to_string(),
        }
    }
}

impl Config {
    /// Load `<path>.toml` (if present), then `HOLDERS__*` environment overrides.
    pub fn load_from(path: &str) -> anyhow::Result<Self> {
        dotenv::dotenv().ok();

        let config = config::Config::builder()
            .add_source(config::File::with_name(path).required(false))
            .add_source(config::Environment::with_prefix("HOLDERS").separator("__"))
            .build()?;

        Ok(config.try_deserialize()?)
    }

    /// Resolve the RPC endpoint: an explicit URL wins, otherwise a Helius URL built from the key.
    pub fn rpc_endpoint(&self) -> anyhow::Result<String> {
        if let Some(url) = self.solana.rpc_url.as_deref().filter(|u| !u.trim().is_empty()) {
            return Ok(url.to_string());
        }

        match self.solana.api_key.as_deref().filter(|k| !k.trim().is_empty()) {
            Some(key) => Ok(format!("{}{}", HELIUS_MAINNET_URL, key)),
            None => Err(anyhow::anyhow!(
                "Neither solana.rpc_url nor solana.api_key is configured"
            )),
        }
    }

    pub fn commitment_config(&self) -> CommitmentConfig {
        CommitmentConfig::from_str(&self.solana.commitment)
            .unwrap_or_else(|_| CommitmentConfig::confirmed())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.solana.request_timeout_secs)
    }
}

use std::time::Duration;

use serde::Deserialize;
use stader_basic_types::L1ChainId;

/// By default, a single JSON-RPC request is allowed to take 30 seconds.
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 30_000;

/// Configuration for the execution layer clients.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct EthClientConfig {
    /// Numeric identifier of the L1 network (e.g. `1` for mainnet).
    pub chain_id: u64,
    /// Address of the execution client API.
    pub web3_url: String,
    /// Address of an archive execution client, used for historical reads the primary client
    /// has already pruned.
    #[serde(default)]
    pub archive_web3_url: Option<String>,
    #[serde(default = "EthClientConfig::default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

impl EthClientConfig {
    fn default_request_timeout_ms() -> u64 {
        DEFAULT_REQUEST_TIMEOUT_MS
    }

    pub fn chain_id(&self) -> L1ChainId {
        L1ChainId(self.chain_id)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

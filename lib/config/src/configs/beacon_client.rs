use std::time::Duration;

use serde::Deserialize;

pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 30_000;

/// Configuration for the consensus layer (beacon node) client.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct BeaconClientConfig {
    /// Base URL of the beacon node REST API.
    pub url: String,
    #[serde(default = "BeaconClientConfig::default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

impl BeaconClientConfig {
    fn default_request_timeout_ms() -> u64 {
        DEFAULT_REQUEST_TIMEOUT_MS
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

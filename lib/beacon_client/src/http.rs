use async_trait::async_trait;
use serde::de::DeserializeOwned;
use stader_basic_types::Epoch;
use stader_config::BeaconClientConfig;
use url::Url;

use crate::{
    types::{
        BeaconClientError, Envelope, Eth2Config, FinalityCheckpointsResponse, GenesisResponse,
        SpecResponse,
    },
    BeaconInterface,
};

const GENESIS_PATH: &str = "eth/v1/beacon/genesis";
const SPEC_PATH: &str = "eth/v1/config/spec";
const FINALITY_CHECKPOINTS_PATH: &str = "eth/v1/beacon/states/head/finality_checkpoints";

/// Beacon node client talking to the standard REST API over HTTP.
#[derive(Debug, Clone)]
pub struct HttpBeaconClient {
    base_url: Url,
    client: reqwest::Client,
}

impl HttpBeaconClient {
    pub fn new(base_url: &str, client: reqwest::Client) -> Result<Self, BeaconClientError> {
        let mut base_url = Url::parse(base_url)?;
        // Relative paths are resolved against the last path segment unless it ends with a slash.
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        Ok(Self { base_url, client })
    }

    pub fn from_config(config: &BeaconClientConfig) -> Result<Self, BeaconClientError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(BeaconClientError::Client)?;
        Self::new(&config.url, client)
    }

    async fn get<T: DeserializeOwned>(&self, path: &'static str) -> Result<T, BeaconClientError> {
        let url = self.base_url.join(path)?;
        tracing::trace!("Requesting {url}");
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|source| BeaconClientError::Request { path, source })?;

        let status = response.status();
        if !status.is_success() {
            return Err(BeaconClientError::Status {
                path,
                status,
                body: response.text().await.unwrap_or_default(),
            });
        }
        let envelope = response
            .json::<Envelope<T>>()
            .await
            .map_err(|source| BeaconClientError::Request { path, source })?;
        Ok(envelope.data)
    }
}

#[async_trait]
impl BeaconInterface for HttpBeaconClient {
    async fn eth2_config(&self) -> Result<Eth2Config, BeaconClientError> {
        let genesis: GenesisResponse = self.get(GENESIS_PATH).await?;
        let spec: SpecResponse = self.get(SPEC_PATH).await?;
        Eth2Config::new(
            genesis.genesis_time,
            spec.seconds_per_slot,
            spec.slots_per_epoch,
        )
    }

    async fn finalized_epoch(&self) -> Result<Epoch, BeaconClientError> {
        let checkpoints: FinalityCheckpointsResponse =
            self.get(FINALITY_CHECKPOINTS_PATH).await?;
        Ok(Epoch(checkpoints.finalized.epoch))
    }
}

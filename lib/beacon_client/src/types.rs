use std::str::FromStr;

use serde::{de, Deserialize, Deserializer};
use stader_basic_types::{Epoch, Slot};

/// Errors returned by the beacon node client.
#[derive(Debug, thiserror::Error)]
pub enum BeaconClientError {
    #[error("failed building HTTP client: {0}")]
    Client(#[source] reqwest::Error),
    #[error("invalid beacon node URL: {0}")]
    Url(#[from] url::ParseError),
    #[error("request to {path} failed: {source}")]
    Request {
        path: &'static str,
        #[source]
        source: reqwest::Error,
    },
    #[error("request to {path} returned HTTP {status}: {body}")]
    Status {
        path: &'static str,
        status: reqwest::StatusCode,
        body: String,
    },
    #[error("invalid beacon chain parameters: {0}")]
    InvalidConfig(&'static str),
}

/// Beacon chain parameters used to translate execution block timestamps into slots and epochs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Eth2Config {
    /// Unix timestamp of the beacon chain genesis.
    pub genesis_time: u64,
    pub seconds_per_slot: u64,
    pub slots_per_epoch: u64,
}

impl Eth2Config {
    pub fn new(
        genesis_time: u64,
        seconds_per_slot: u64,
        slots_per_epoch: u64,
    ) -> Result<Self, BeaconClientError> {
        if seconds_per_slot == 0 {
            return Err(BeaconClientError::InvalidConfig("SECONDS_PER_SLOT is zero"));
        }
        if slots_per_epoch == 0 {
            return Err(BeaconClientError::InvalidConfig("SLOTS_PER_EPOCH is zero"));
        }
        Ok(Self {
            genesis_time,
            seconds_per_slot,
            slots_per_epoch,
        })
    }

    /// Slot containing the provided timestamp. Timestamps before genesis map to slot 0.
    pub fn slot_at(&self, timestamp: u64) -> Slot {
        Slot(timestamp.saturating_sub(self.genesis_time) / self.seconds_per_slot)
    }

    pub fn epoch_at_slot(&self, slot: Slot) -> Epoch {
        Epoch(slot.0 / self.slots_per_epoch)
    }

    /// Epoch containing the provided timestamp.
    pub fn epoch_at(&self, timestamp: u64) -> Epoch {
        self.epoch_at_slot(self.slot_at(timestamp))
    }
}

/// Beacon API wraps every payload into a `data` field.
#[derive(Debug, Deserialize)]
pub(crate) struct Envelope<T> {
    pub data: T,
}

#[derive(Debug, Deserialize)]
pub(crate) struct GenesisResponse {
    #[serde(deserialize_with = "quoted_u64")]
    pub genesis_time: u64,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SpecResponse {
    #[serde(rename = "SECONDS_PER_SLOT", deserialize_with = "quoted_u64")]
    pub seconds_per_slot: u64,
    #[serde(rename = "SLOTS_PER_EPOCH", deserialize_with = "quoted_u64")]
    pub slots_per_epoch: u64,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Checkpoint {
    #[serde(deserialize_with = "quoted_u64")]
    pub epoch: u64,
}

#[derive(Debug, Deserialize)]
pub(crate) struct FinalityCheckpointsResponse {
    pub finalized: Checkpoint,
}

/// Numbers in the beacon API are encoded as decimal strings.
fn quoted_u64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
    let raw = String::deserialize(deserializer)?;
    u64::from_str(&raw).map_err(de::Error::custom)
}

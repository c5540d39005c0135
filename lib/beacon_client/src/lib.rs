//! Minimal client for the standard beacon node REST API.

use std::{fmt, sync::Arc};

use async_trait::async_trait;
use stader_basic_types::Epoch;

pub use crate::{
    http::HttpBeaconClient,
    mock::MockBeaconClient,
    types::{BeaconClientError, Eth2Config},
};

mod http;
mod mock;
mod types;

/// Read-only view of the consensus layer needed by the watchtower.
#[async_trait]
pub trait BeaconInterface: fmt::Debug + Send + Sync {
    /// Returns the chain parameters needed to map execution timestamps onto epochs.
    async fn eth2_config(&self) -> Result<Eth2Config, BeaconClientError>;

    /// Returns the latest finalized epoch, as seen from the head state.
    async fn finalized_epoch(&self) -> Result<Epoch, BeaconClientError>;
}

#[async_trait]
impl<T: BeaconInterface + ?Sized> BeaconInterface for Arc<T> {
    async fn eth2_config(&self) -> Result<Eth2Config, BeaconClientError> {
        (**self).eth2_config().await
    }

    async fn finalized_epoch(&self) -> Result<Epoch, BeaconClientError> {
        (**self).finalized_epoch().await
    }
}

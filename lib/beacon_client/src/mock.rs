use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};

use async_trait::async_trait;
use stader_basic_types::Epoch;

use crate::{BeaconClientError, BeaconInterface, Eth2Config};

/// In-memory beacon node with a settable finalized epoch.
#[derive(Debug, Clone)]
pub struct MockBeaconClient {
    config: Eth2Config,
    finalized_epoch: Arc<AtomicU64>,
}

impl MockBeaconClient {
    pub fn new(config: Eth2Config) -> Self {
        Self {
            config,
            finalized_epoch: Arc::default(),
        }
    }

    pub fn set_finalized_epoch(&self, epoch: Epoch) {
        self.finalized_epoch.store(epoch.0, Ordering::SeqCst);
    }
}

#[async_trait]
impl BeaconInterface for MockBeaconClient {
    async fn eth2_config(&self) -> Result<Eth2Config, BeaconClientError> {
        Ok(self.config)
    }

    async fn finalized_epoch(&self) -> Result<Epoch, BeaconClientError> {
        Ok(Epoch(self.finalized_epoch.load(Ordering::SeqCst)))
    }
}

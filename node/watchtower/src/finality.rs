//! Mapping execution blocks onto consensus epochs and checking their finality.

use stader_basic_types::Epoch;
use stader_beacon_client::Eth2Config;

/// Whether data for an execution block may be reported yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reportability {
    /// The epoch containing the block is finalized.
    Reportable { epoch: Epoch },
    /// The epoch containing the block is not finalized yet; the report must wait.
    Pending {
        epoch: Epoch,
        finalized_epoch: Epoch,
    },
}

impl Reportability {
    pub fn is_reportable(&self) -> bool {
        matches!(self, Self::Reportable { .. })
    }
}

/// Decides whether an execution block is old enough to be reported.
#[derive(Debug, Clone, Copy)]
pub struct FinalityGate {
    config: Eth2Config,
}

impl FinalityGate {
    pub fn new(config: Eth2Config) -> Self {
        Self { config }
    }

    pub fn check(&self, block_timestamp: u64, finalized_epoch: Epoch) -> Reportability {
        let epoch = self.config.epoch_at(block_timestamp);
        if epoch > finalized_epoch {
            Reportability::Pending {
                epoch,
                finalized_epoch,
            }
        } else {
            Reportability::Reportable { epoch }
        }
    }
}

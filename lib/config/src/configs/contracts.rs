use serde::Deserialize;
use stader_basic_types::Address;

/// Addresses of the contracts that cannot be resolved through the storage contract.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct ContractsConfig {
    /// Storage contract; every other protocol contract is resolved through it.
    pub storage_addr: Address,
    /// Price oracle queried for the RPL/ETH rate.
    pub price_oracle_addr: Address,
    /// Messenger relaying the RPL rate to Optimism. The relay is skipped if unset.
    #[serde(default)]
    pub optimism_messenger_addr: Option<Address>,
}

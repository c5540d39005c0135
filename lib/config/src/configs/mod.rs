// Public re-exports
pub use self::{
    beacon_client::BeaconClientConfig, contracts::ContractsConfig, eth_client::EthClientConfig,
    gas::GasConfig, observability::ObservabilityConfig, wallets::WalletConfig,
    watchtower::WatchtowerConfig,
};

pub mod beacon_client;
pub mod contracts;
pub mod eth_client;
pub mod gas;
pub mod observability;
pub mod wallets;
pub mod watchtower;

//! Typed queries against the protocol contracts.
//!
//! All queries go through a [`ProtocolContext`], which owns the execution client and resolves
//! contract addresses through the storage contract. Queries accepting a block number are pinned
//! to the state at that block; `None` means the latest block.

use stader_contracts::ContractName;
use stader_eth_client::ContractCallError;

pub use crate::context::ProtocolContext;

mod context;
pub mod messenger;
pub mod minipool;
pub mod network;
pub mod node;
pub mod oracle;
pub mod settings;
pub mod storage;
#[cfg(any(test, feature = "test-utils"))]
pub mod testonly;
pub mod trusted_node;

/// Errors produced by protocol queries.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("contract `{}` is not registered in the storage contract", .0.registry_name())]
    MissingContract(ContractName),
    #[error(transparent)]
    Call(#[from] ContractCallError),
}

impl ProtocolError {
    /// Returns `true` if the error originates from the JSON-RPC transport or the node
    /// (as opposed to a malformed call or response).
    pub fn is_gateway_error(&self) -> bool {
        matches!(self, Self::Call(ContractCallError::EthereumGateway(_)))
    }
}

//! Reads from the protocol storage contract: a key/value store addressed by `bytes32` keys.

use stader_basic_types::{keccak256, Address, L1BlockNumber, H256};
use stader_contracts::{storage_contract, ContractName};

use crate::{ProtocolContext, ProtocolError};

/// Storage key under which the address of a protocol contract is registered.
pub fn contract_address_key(name: ContractName) -> H256 {
    let registry_name = name.registry_name().as_bytes();
    let mut preimage = Vec::with_capacity(16 + registry_name.len());
    preimage.extend_from_slice(b"contract.address");
    preimage.extend_from_slice(registry_name);
    H256(keccak256(&preimage))
}

pub async fn get_bool(
    context: &ProtocolContext,
    key: H256,
    block: Option<L1BlockNumber>,
) -> Result<bool, ProtocolError> {
    let storage = context.storage_address();
    context
        .call_at(storage, storage_contract(), "getBool", key, block)
        .await
}

pub async fn get_address(
    context: &ProtocolContext,
    key: H256,
    block: Option<L1BlockNumber>,
) -> Result<Address, ProtocolError> {
    let storage = context.storage_address();
    context
        .call_at(storage, storage_contract(), "getAddress", key, block)
        .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contract_address_keys_are_distinct() {
        let prices = contract_address_key(ContractName::NetworkPrices);
        let balances = contract_address_key(ContractName::NetworkBalances);
        assert_ne!(prices, balances);
        assert_eq!(
            prices,
            H256(keccak256(b"contract.addressrocketNetworkPrices"))
        );
    }
}

use std::{
    collections::HashMap,
    sync::{Arc, RwLock},
};

use stader_basic_types::{
    abi::{Detokenize, Tokenize},
    ethabi::Contract,
    Address, L1BlockNumber,
};
use stader_contracts::ContractName;
use stader_eth_client::{CallFunctionArgs, ContractCall, EthInterface};

use crate::{storage, ProtocolError};

/// Session-wide handle to the protocol contracts.
///
/// Contract addresses are resolved lazily through the storage contract and cached for
/// the lifetime of the context (and all contexts derived from it via [`Self::for_client()`]).
#[derive(Debug)]
pub struct ProtocolContext {
    client: Box<dyn EthInterface>,
    storage_address: Address,
    addresses: Arc<RwLock<HashMap<ContractName, Address>>>,
}

impl ProtocolContext {
    pub fn new(client: Box<dyn EthInterface>, storage_address: Address) -> Self {
        Self {
            client,
            storage_address,
            addresses: Arc::default(),
        }
    }

    /// Creates a context backed by another execution client (e.g., an archive node),
    /// sharing the address cache with this one.
    pub fn for_client(&self, client: Box<dyn EthInterface>) -> Self {
        Self {
            client,
            storage_address: self.storage_address,
            addresses: self.addresses.clone(),
        }
    }

    pub fn client(&self) -> &dyn EthInterface {
        self.client.as_ref()
    }

    pub fn storage_address(&self) -> Address {
        self.storage_address
    }

    /// Returns the current address of a protocol contract.
    pub async fn contract_address(&self, name: ContractName) -> Result<Address, ProtocolError> {
        let cached = self
            .addresses
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(&name)
            .copied();
        if let Some(address) = cached {
            return Ok(address);
        }

        let key = storage::contract_address_key(name);
        let address = storage::get_address(self, key, None).await?;
        if address.is_zero() {
            return Err(ProtocolError::MissingContract(name));
        }
        tracing::debug!("Resolved contract `{}` to {address:?}", name.registry_name());
        self.addresses
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(name, address);
        Ok(address)
    }

    /// Prepares a call to a registered protocol contract.
    pub async fn contract_call(
        &self,
        name: ContractName,
        abi: &Contract,
        function: &str,
        params: impl Tokenize,
    ) -> Result<ContractCall, ProtocolError> {
        let address = self.contract_address(name).await?;
        Ok(CallFunctionArgs::new(function, params).for_contract(address, abi))
    }

    /// Calls a view function on a registered protocol contract.
    pub(crate) async fn call<R: Detokenize>(
        &self,
        name: ContractName,
        abi: &Contract,
        function: &str,
        params: impl Tokenize,
        block: Option<L1BlockNumber>,
    ) -> Result<R, ProtocolError> {
        let address = self.contract_address(name).await?;
        self.call_at(address, abi, function, params, block).await
    }

    /// Calls a view function on a contract with a known address.
    pub(crate) async fn call_at<R: Detokenize>(
        &self,
        address: Address,
        abi: &Contract,
        function: &str,
        params: impl Tokenize,
        block: Option<L1BlockNumber>,
    ) -> Result<R, ProtocolError> {
        let mut args = CallFunctionArgs::new(function, params);
        if let Some(block) = block {
            args = args.with_block(block);
        }
        Ok(args.for_contract(address, abi).call(self.client()).await?)
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use stader_basic_types::{abi::Tokenizable, U256};
    use stader_contracts::network_prices_contract;

    use super::*;
    use crate::testonly::{MockChain, STORAGE_ADDRESS};

    #[tokio::test]
    async fn contract_addresses_are_resolved_once() {
        let prices_address = Address::repeat_byte(0x42);
        let chain = MockChain::new()
            .with_contract(ContractName::NetworkPrices, prices_address)
            .with_view(prices_address, network_prices_contract(), "getPricesBlock", |_, _| {
                U256::from(7).into_token()
            });
        let context = ProtocolContext::new(Box::new(chain.client()), STORAGE_ADDRESS);

        for _ in 0..3 {
            let address = context
                .contract_address(ContractName::NetworkPrices)
                .await
                .unwrap();
            assert_eq!(address, prices_address);
        }
        assert_eq!(chain.call_count(STORAGE_ADDRESS), 1);

        let derived = context.for_client(Box::new(chain.client()));
        let block: u64 = derived
            .call(
                ContractName::NetworkPrices,
                network_prices_contract(),
                "getPricesBlock",
                (),
                None,
            )
            .await
            .unwrap();
        assert_eq!(block, 7);
        assert_eq!(chain.call_count(STORAGE_ADDRESS), 1);
    }

    #[tokio::test]
    async fn unregistered_contract_is_an_error() {
        let chain = MockChain::new();
        let context = ProtocolContext::new(Box::new(chain.client()), STORAGE_ADDRESS);
        let err = context
            .contract_address(ContractName::NodeStaking)
            .await
            .unwrap_err();
        assert_matches!(err, ProtocolError::MissingContract(ContractName::NodeStaking));
        assert!(err.to_string().contains("rocketNodeStaking"));
    }
}

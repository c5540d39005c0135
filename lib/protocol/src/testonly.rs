//! In-memory protocol deployment for tests.

use std::{
    collections::HashMap,
    fmt,
    sync::{Arc, RwLock},
};

use stader_basic_types::{
    abi::Tokenizable,
    ethabi::{Contract, Function, Token},
    Address, BlockId, CallRequest, H256,
};
use stader_contracts::{storage_contract, ContractName};
use stader_eth_client::{clients::MockEthereum, EnrichedClientError};

use crate::storage::contract_address_key;

/// Address of the storage contract in [`MockChain`].
pub const STORAGE_ADDRESS: Address = Address::repeat_byte(0x5a);

type ViewHandler =
    dyn Fn(&[Token], BlockId) -> Result<Token, EnrichedClientError> + Send + Sync;

/// Recorded `eth_call`.
#[derive(Debug, Clone, PartialEq)]
pub struct MockCall {
    pub address: Address,
    pub function: String,
    pub block: BlockId,
}

#[derive(Default)]
struct MockChainState {
    bools: HashMap<H256, bool>,
    addresses: HashMap<H256, Address>,
    views: HashMap<(Address, [u8; 4]), (Function, Arc<ViewHandler>)>,
    calls: Vec<MockCall>,
}

impl fmt::Debug for MockChainState {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("MockChainState")
            .field("bools", &self.bools)
            .field("addresses", &self.addresses)
            .field("calls", &self.calls)
            .finish_non_exhaustive()
    }
}

/// Protocol contracts with scripted view functions. The storage contract is emulated
/// by key/value maps; other contracts are served by the registered handlers.
#[derive(Debug, Clone, Default)]
pub struct MockChain {
    state: Arc<RwLock<MockChainState>>,
}

impl MockChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a protocol contract in the storage contract.
    pub fn with_contract(self, name: ContractName, address: Address) -> Self {
        let key = contract_address_key(name);
        self.state.write().unwrap().addresses.insert(key, address);
        self
    }

    pub fn with_storage_bool(self, key: H256, value: bool) -> Self {
        self.set_storage_bool(key, value);
        self
    }

    pub fn with_view<F>(self, address: Address, abi: &Contract, function: &str, handler: F) -> Self
    where
        F: Fn(&[Token], BlockId) -> Token + Send + Sync + 'static,
    {
        self.with_fallible_view(address, abi, function, move |args, block| {
            Ok(handler(args, block))
        })
    }

    pub fn with_fallible_view<F>(
        self,
        address: Address,
        abi: &Contract,
        function: &str,
        handler: F,
    ) -> Self
    where
        F: Fn(&[Token], BlockId) -> Result<Token, EnrichedClientError> + Send + Sync + 'static,
    {
        let function = abi
            .function(function)
            .unwrap_or_else(|err| panic!("unknown function `{function}`: {err}"))
            .clone();
        let selector = function.short_signature();
        self.state
            .write()
            .unwrap()
            .views
            .insert((address, selector), (function, Arc::new(handler)));
        self
    }

    pub fn set_storage_bool(&self, key: H256, value: bool) {
        self.state.write().unwrap().bools.insert(key, value);
    }

    /// Returns all calls made so far, in the order they were made.
    pub fn calls(&self) -> Vec<MockCall> {
        self.state.read().unwrap().calls.clone()
    }

    pub fn call_count(&self, address: Address) -> usize {
        let state = self.state.read().unwrap();
        state.calls.iter().filter(|call| call.address == address).count()
    }

    /// Returns a mock execution client serving calls from this chain.
    pub fn client(&self) -> MockEthereum {
        self.install(MockEthereum::default())
    }

    /// Makes the provided mock client serve calls from this chain.
    pub fn install(&self, client: MockEthereum) -> MockEthereum {
        let this = self.clone();
        client.with_fallible_call_handler(move |request, block| this.handle_call(request, block))
    }

    fn handle_call(&self, request: &CallRequest, block: BlockId) -> Result<Token, EnrichedClientError> {
        let address = request.to.expect("call without recipient");
        let data = &request.data.as_ref().expect("call without data").0;
        let selector: [u8; 4] = data[..4].try_into().expect("call data is too short");

        if address == STORAGE_ADDRESS {
            return Ok(self.handle_storage_call(selector, &data[4..], block));
        }

        let (function, handler) = {
            let state = self.state.read().unwrap();
            let (function, handler) = state.views.get(&(address, selector)).unwrap_or_else(|| {
                panic!("unexpected call to {address:?} with selector {selector:?}")
            });
            (function.clone(), handler.clone())
        };
        self.record_call(address, &function.name, block);
        let args = function.decode_input(&data[4..]).expect("malformed call data");
        handler(&args, block)
    }

    fn handle_storage_call(&self, selector: [u8; 4], input: &[u8], block: BlockId) -> Token {
        let storage = storage_contract();
        let function = storage
            .functions()
            .find(|function| function.short_signature() == selector)
            .expect("unknown storage function");
        self.record_call(STORAGE_ADDRESS, &function.name, block);

        let args = function.decode_input(input).expect("malformed call data");
        let key = H256::from_token(args[0].clone()).expect("storage key is not bytes32");
        let state = self.state.read().unwrap();
        match function.name.as_str() {
            "getBool" => state.bools.get(&key).copied().unwrap_or(false).into_token(),
            "getAddress" => state
                .addresses
                .get(&key)
                .copied()
                .unwrap_or_default()
                .into_token(),
            name => panic!("storage function `{name}` is not supported"),
        }
    }

    fn record_call(&self, address: Address, function: &str, block: BlockId) {
        self.state.write().unwrap().calls.push(MockCall {
            address,
            function: function.to_owned(),
            block,
        });
    }
}

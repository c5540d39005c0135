use std::fmt;

use async_trait::async_trait;
use stader_basic_types::{
    web3::types::Block, Address, BlockId, BlockNumber, Bytes, CallRequest, L1BlockNumber,
    L1ChainId, TransactionReceipt, H256, U256,
};

pub use crate::types::{
    CallFunctionArgs, ClientCallWrapper, ClientRpcContext, ContractCall, ContractCallError,
    EnrichedClientError, EnrichedClientResult, ExecutedTxStatus, Options, RawTransactionBytes,
    SignedCallResult, SigningError,
};

pub mod clients;
mod types;

/// Common Web3 interface, as seen by the watchtower tasks.
/// Encapsulates the raw Web3 interaction, providing a high-level interface.
///
/// ## Trait contents
///
/// This trait contains methods that perform the "abstract" queries to Web3. That is,
/// there are no assumptions about the contract or account that is used to perform the queries.
/// If you want to add a method to this trait, make sure that it doesn't depend on any particular
/// contract or account address. For that, you can use the `BoundEthInterface` trait.
#[async_trait]
pub trait EthInterface: Sync + Send + fmt::Debug {
    /// Clones this client into a boxed trait object.
    fn clone_boxed(&self) -> Box<dyn EthInterface>;

    /// Fetches the L1 chain ID (in contrast to [`BoundEthInterface::chain_id()`] which returns
    /// the *expected* L1 chain ID).
    async fn fetch_chain_id(&self) -> EnrichedClientResult<L1ChainId>;

    /// Returns `true` if the execution client is still syncing.
    async fn syncing(&self) -> EnrichedClientResult<bool>;

    /// Returns the nonce of the provided account at the specified block.
    async fn nonce_at_for_account(
        &self,
        account: Address,
        block: BlockNumber,
    ) -> EnrichedClientResult<U256>;

    /// Returns the `base_fee_per_gas` value for the currently pending L1 block.
    async fn get_pending_block_base_fee_per_gas(&self) -> EnrichedClientResult<U256>;

    /// Returns the current block number.
    async fn block_number(&self) -> EnrichedClientResult<L1BlockNumber>;

    /// Estimates gas required to execute the call.
    async fn estimate_gas(&self, req: CallRequest) -> EnrichedClientResult<U256>;

    /// Sends a transaction to the Ethereum network.
    async fn send_raw_tx(&self, tx: RawTransactionBytes) -> EnrichedClientResult<H256>;

    /// Fetches the transaction status for a specified transaction hash.
    ///
    /// Returns `Ok(None)` if the transaction is either not found or not executed yet.
    /// Returns `Err` only if the request fails (e.g. due to network issues).
    async fn get_tx_status(&self, hash: H256) -> EnrichedClientResult<Option<ExecutedTxStatus>>;

    /// Returns the receipt for the specified transaction hash.
    async fn tx_receipt(&self, tx_hash: H256) -> EnrichedClientResult<Option<TransactionReceipt>>;

    /// Invokes a function on a contract using `eth_call`. The call is executed against the
    /// latest block unless `block` is specified.
    async fn call_contract_function(
        &self,
        request: CallRequest,
        block: Option<BlockId>,
    ) -> EnrichedClientResult<Bytes>;

    /// Returns the block header for the specified block number or hash.
    async fn block(&self, block_id: BlockId) -> EnrichedClientResult<Option<Block<H256>>>;
}

/// An extension of `EthInterface` trait, which is used to perform queries that are bound to
/// a certain account.
///
/// When adding a method to this trait, make sure that it's indeed "bound". If not, add it
/// to the `EthInterface` trait instead.
#[async_trait]
pub trait BoundEthInterface: AsRef<dyn EthInterface> + 'static + Sync + Send + fmt::Debug {
    /// Clones this client.
    fn clone_boxed(&self) -> Box<dyn BoundEthInterface>;

    /// Chain ID of the L1 network the client is *configured* to connected to.
    ///
    /// This value should be externally provided by the user rather than requested from the network
    /// to avoid accidental network mismatch.
    fn chain_id(&self) -> L1ChainId;

    /// Address of the account associated with the object implementing the trait.
    fn sender_account(&self) -> Address;

    /// Signs the transaction and sends it to the Ethereum network.
    /// Expected to use credentials associated with `Self::sender_account()`.
    async fn sign_prepared_tx_for_addr(
        &self,
        data: Vec<u8>,
        contract_addr: Address,
        options: Options,
    ) -> Result<SignedCallResult, SigningError>;
}

impl Clone for Box<dyn BoundEthInterface> {
    fn clone(&self) -> Self {
        self.clone_boxed()
    }
}

impl Clone for Box<dyn EthInterface> {
    fn clone(&self) -> Self {
        self.clone_boxed()
    }
}

impl dyn BoundEthInterface {
    /// Returns the nonce of the `Self::sender_account()` at the specified block.
    pub async fn nonce_at(&self, block: BlockNumber) -> EnrichedClientResult<U256> {
        self.as_ref()
            .nonce_at_for_account(self.sender_account(), block)
            .await
    }

    /// Returns the pending nonce of the `Self::sender_account()`.
    pub async fn pending_nonce(&self) -> EnrichedClientResult<U256> {
        self.nonce_at(BlockNumber::Pending).await
    }
}

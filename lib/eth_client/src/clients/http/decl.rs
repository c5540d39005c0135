use jsonrpsee::{core::RpcResult, proc_macros::rpc};
use stader_basic_types::{
    web3::types::Block, Address, BlockId, BlockNumber, Bytes, CallRequest, SyncState,
    TransactionReceipt, H256, U256, U64,
};

/// Subset of the L1 `eth` namespace used by the watchtower.
#[rpc(client, namespace = "eth")]
pub(super) trait L1EthNamespace {
    #[method(name = "chainId")]
    async fn chain_id(&self) -> RpcResult<U64>;

    #[method(name = "syncing")]
    async fn syncing(&self) -> RpcResult<SyncState>;

    #[method(name = "blockNumber")]
    async fn get_block_number(&self) -> RpcResult<U64>;

    // **Important.** Must be called with `full_transactions = false` only.
    #[method(name = "getBlockByNumber")]
    async fn get_block_by_number(
        &self,
        block_number: BlockNumber,
        full_transactions: bool,
    ) -> RpcResult<Option<Block<H256>>>;

    // **Important.** Must be called with `full_transactions = false` only.
    #[method(name = "getBlockByHash")]
    async fn get_block_by_hash(
        &self,
        hash: H256,
        full_transactions: bool,
    ) -> RpcResult<Option<Block<H256>>>;

    #[method(name = "getTransactionCount")]
    async fn get_transaction_count(&self, address: Address, block: BlockNumber)
        -> RpcResult<U256>;

    #[method(name = "call")]
    async fn call(&self, req: CallRequest, block: BlockId) -> RpcResult<Bytes>;

    #[method(name = "estimateGas")]
    async fn estimate_gas(&self, req: CallRequest) -> RpcResult<U256>;

    #[method(name = "sendRawTransaction")]
    async fn send_raw_transaction(&self, tx_bytes: Bytes) -> RpcResult<H256>;

    #[method(name = "getTransactionReceipt")]
    async fn get_transaction_receipt(&self, hash: H256)
        -> RpcResult<Option<TransactionReceipt>>;
}

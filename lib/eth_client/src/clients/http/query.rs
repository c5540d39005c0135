use std::{fmt, time::Duration};

use async_trait::async_trait;
use jsonrpsee::{
    core::ClientError,
    http_client::{HttpClient, HttpClientBuilder},
};
use stader_basic_types::{
    web3::types::Block, Address, BlockId, BlockNumber, Bytes, CallRequest, L1BlockNumber,
    L1ChainId, SyncState, TransactionReceipt, H256, U256,
};

use super::{decl::L1EthNamespaceClient, Method, METRICS};
use crate::{
    types::{ClientRpcContext, EnrichedClientError, EnrichedClientResult, ExecutedTxStatus},
    EthInterface, RawTransactionBytes,
};

/// HTTP JSON-RPC client for an execution layer node. Doesn't have any access to a private key
/// and can only perform read-only queries and relay already signed transactions.
#[derive(Clone)]
pub struct QueryClient {
    client: HttpClient,
    url: String,
    component: &'static str,
}

impl fmt::Debug for QueryClient {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        // The URL may contain an API key, so only the host is shown.
        let host = self
            .url
            .split("://")
            .nth(1)
            .and_then(|rest| rest.split(['/', '?']).next())
            .unwrap_or("<invalid URL>");
        formatter
            .debug_struct("QueryClient")
            .field("host", &host)
            .field("component", &self.component)
            .finish()
    }
}

impl QueryClient {
    pub fn new(url: &str, request_timeout: Duration) -> Result<Self, ClientError> {
        let client = HttpClientBuilder::default()
            .request_timeout(request_timeout)
            .build(url)?;
        Ok(Self {
            client,
            url: url.to_owned(),
            component: "",
        })
    }

    /// Sets the component name used to label the issued requests in metrics.
    #[must_use]
    pub fn for_component(mut self, component: &'static str) -> Self {
        self.component = component;
        self
    }

    async fn block_by_number(&self, number: BlockNumber) -> EnrichedClientResult<Option<Block<H256>>> {
        self.client
            .get_block_by_number(number, false)
            .rpc_context("get_block_by_number")
            .with_arg("number", &number)
            .with_arg("with_transactions", &false)
            .await
    }
}

#[async_trait]
impl EthInterface for QueryClient {
    fn clone_boxed(&self) -> Box<dyn EthInterface> {
        Box::new(self.clone())
    }

    async fn fetch_chain_id(&self) -> EnrichedClientResult<L1ChainId> {
        METRICS.call[&(Method::ChainId, self.component)].inc();
        let latency = METRICS.direct[&Method::ChainId].start();
        let chain_id = self.client.chain_id().rpc_context("chain_id").await?;
        latency.observe();
        Ok(L1ChainId(chain_id.as_u64()))
    }

    async fn syncing(&self) -> EnrichedClientResult<bool> {
        METRICS.call[&(Method::Syncing, self.component)].inc();
        let latency = METRICS.direct[&Method::Syncing].start();
        let state = self.client.syncing().rpc_context("syncing").await?;
        latency.observe();
        Ok(matches!(state, SyncState::Syncing(_)))
    }

    async fn nonce_at_for_account(
        &self,
        account: Address,
        block: BlockNumber,
    ) -> EnrichedClientResult<U256> {
        METRICS.call[&(Method::NonceAtForAccount, self.component)].inc();
        let latency = METRICS.direct[&Method::NonceAtForAccount].start();
        let nonce = self
            .client
            .get_transaction_count(account, block)
            .rpc_context("get_transaction_count")
            .with_arg("account", &account)
            .with_arg("block", &block)
            .await?;
        latency.observe();
        Ok(nonce)
    }

    async fn get_pending_block_base_fee_per_gas(&self) -> EnrichedClientResult<U256> {
        METRICS.call[&(Method::PendingBlockBaseFee, self.component)].inc();
        let latency = METRICS.direct[&Method::PendingBlockBaseFee].start();

        let block = match self.block_by_number(BlockNumber::Pending).await? {
            Some(block) => block,
            // Some nodes (e.g., local dev chains) don't expose a pending block.
            None => self
                .block_by_number(BlockNumber::Latest)
                .await?
                .ok_or_else(|| {
                    EnrichedClientError::custom("latest block is missing", "get_block_by_number")
                })?,
        };
        latency.observe();

        block.base_fee_per_gas.ok_or_else(|| {
            EnrichedClientError::custom("block has no base fee", "get_block_by_number")
                .with_arg("number", &block.number)
        })
    }

    async fn block_number(&self) -> EnrichedClientResult<L1BlockNumber> {
        METRICS.call[&(Method::BlockNumber, self.component)].inc();
        let latency = METRICS.direct[&Method::BlockNumber].start();
        let block_number = self
            .client
            .get_block_number()
            .rpc_context("get_block_number")
            .await?;
        latency.observe();
        Ok(L1BlockNumber(block_number.as_u64()))
    }

    async fn estimate_gas(&self, req: CallRequest) -> EnrichedClientResult<U256> {
        METRICS.call[&(Method::EstimateGas, self.component)].inc();
        let latency = METRICS.direct[&Method::EstimateGas].start();
        let to = req.to;
        let gas = self
            .client
            .estimate_gas(req)
            .rpc_context("estimate_gas")
            .with_arg("to", &to)
            .await?;
        latency.observe();
        Ok(gas)
    }

    async fn send_raw_tx(&self, tx: RawTransactionBytes) -> EnrichedClientResult<H256> {
        METRICS.call[&(Method::SendRawTx, self.component)].inc();
        let latency = METRICS.direct[&Method::SendRawTx].start();
        let hash = self
            .client
            .send_raw_transaction(Bytes(tx.0))
            .rpc_context("send_raw_transaction")
            .await?;
        latency.observe();
        Ok(hash)
    }

    async fn get_tx_status(&self, hash: H256) -> EnrichedClientResult<Option<ExecutedTxStatus>> {
        METRICS.call[&(Method::GetTxStatus, self.component)].inc();
        let latency = METRICS.direct[&Method::GetTxStatus].start();

        let receipt = self.tx_receipt(hash).await?;
        let res = receipt.and_then(|receipt| match receipt.status {
            Some(status) if receipt.block_number.is_some() => {
                let success = status.as_u64() == 1;
                Some(ExecutedTxStatus {
                    tx_hash: receipt.transaction_hash,
                    success,
                    receipt,
                })
            }
            _ => None,
        });

        latency.observe();
        Ok(res)
    }

    async fn tx_receipt(&self, tx_hash: H256) -> EnrichedClientResult<Option<TransactionReceipt>> {
        METRICS.call[&(Method::TxReceipt, self.component)].inc();
        let latency = METRICS.direct[&Method::TxReceipt].start();
        let receipt = self
            .client
            .get_transaction_receipt(tx_hash)
            .rpc_context("get_transaction_receipt")
            .with_arg("hash", &tx_hash)
            .await?;
        latency.observe();
        Ok(receipt)
    }

    async fn call_contract_function(
        &self,
        request: CallRequest,
        block: Option<BlockId>,
    ) -> EnrichedClientResult<Bytes> {
        METRICS.call[&(Method::CallContractFunction, self.component)].inc();
        let latency = METRICS.direct[&Method::CallContractFunction].start();
        let block = block.unwrap_or_else(|| BlockNumber::Latest.into());
        let to = request.to;
        let output = self
            .client
            .call(request, block)
            .rpc_context("call")
            .with_arg("to", &to)
            .with_arg("block", &block)
            .await?;
        latency.observe();
        Ok(output)
    }

    async fn block(&self, block_id: BlockId) -> EnrichedClientResult<Option<Block<H256>>> {
        METRICS.call[&(Method::Block, self.component)].inc();
        let latency = METRICS.direct[&Method::Block].start();
        let block = match block_id {
            BlockId::Hash(hash) => {
                self.client
                    .get_block_by_hash(hash, false)
                    .rpc_context("get_block_by_hash")
                    .with_arg("hash", &hash)
                    .await?
            }
            BlockId::Number(number) => self.block_by_number(number).await?,
        };
        latency.observe();
        Ok(block)
    }
}

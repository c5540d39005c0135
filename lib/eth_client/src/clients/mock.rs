use std::{
    collections::HashMap,
    fmt,
    sync::{Arc, RwLock},
};

use async_trait::async_trait;
use jsonrpsee::{core::ClientError, types::ErrorObject};
use stader_basic_types::{
    abi::Tokenizable, ethabi, web3::types::Block, Address, BlockId, BlockNumber, Bytes,
    CallRequest, L1BlockNumber, L1ChainId, TransactionReceipt, H256, U256, U64,
};

use crate::{
    types::{EnrichedClientError, EnrichedClientResult, ExecutedTxStatus, SignedCallResult},
    BoundEthInterface, EthInterface, Options, RawTransactionBytes, SigningError,
};

/// Length of the fixed-size tail appended to the calldata by [`MockEthereum`] signing:
/// recipient, gas limit, max fee, priority fee and nonce.
const MOCK_TX_TAIL_LEN: usize = 20 + 4 * 32;

/// Transaction sent via [`MockEthereum`].
#[derive(Debug, Clone, PartialEq)]
pub struct MockTx {
    pub recipient: Address,
    pub input: Vec<u8>,
    pub hash: H256,
    pub gas: U256,
    pub max_fee_per_gas: U256,
    pub max_priority_fee_per_gas: U256,
    pub nonce: u64,
}

impl From<Vec<u8>> for MockTx {
    fn from(tx: Vec<u8>) -> Self {
        let len = tx.len();
        let tail = len - MOCK_TX_TAIL_LEN;
        let recipient = Address::from_slice(&tx[tail..tail + 20]);
        let gas = U256::from_big_endian(&tx[len - 128..len - 96]);
        let max_fee_per_gas = U256::from_big_endian(&tx[len - 96..len - 64]);
        let max_priority_fee_per_gas = U256::from_big_endian(&tx[len - 64..len - 32]);
        let nonce = U256::from_big_endian(&tx[len - 32..]).as_u64();
        let hash = H256::from_slice(&tx[..32]);

        Self {
            recipient,
            input: tx[32..tail].to_vec(),
            hash,
            gas,
            max_fee_per_gas,
            max_priority_fee_per_gas,
            nonce,
        }
    }
}

/// Mutable part of [`MockEthereum`] that needs to be synchronized via an `RwLock`.
#[derive(Debug, Default)]
struct MockEthereumInner {
    block_number: u64,
    syncing: bool,
    tx_statuses: HashMap<H256, ExecutedTxStatus>,
    sent_txs: Vec<MockTx>,
    pending_nonce: u64,
    account_nonces: HashMap<Address, u64>,
    block_timestamps: HashMap<u64, u64>,
}

impl MockEthereumInner {
    fn execute_tx(&mut self, tx_hash: H256, success: bool, confirmations: u64) {
        let block_number = self.block_number;
        self.block_number += confirmations;
        let status = ExecutedTxStatus {
            tx_hash,
            success,
            receipt: TransactionReceipt {
                gas_used: Some(21_000_u32.into()),
                block_number: Some(block_number.into()),
                transaction_hash: tx_hash,
                status: Some(U64::from(u64::from(success))),
                ..TransactionReceipt::default()
            },
        };
        self.tx_statuses.insert(tx_hash, status);
    }
}

type CallHandler =
    dyn Fn(&CallRequest, BlockId) -> Result<ethabi::Token, EnrichedClientError> + Send + Sync;

/// Mock Ethereum client is capable of recording all the incoming requests for the further analysis.
#[derive(Clone)]
pub struct MockEthereum {
    max_fee_per_gas: U256,
    max_priority_fee_per_gas: U256,
    base_fee_per_gas: U256,
    gas_estimate: Result<U256, String>,
    /// If set, sent transactions are mined immediately with the specified outcome.
    auto_mining: Option<bool>,
    /// If set, nonce requests never complete.
    stalled_nonce_reads: bool,
    inner: Arc<RwLock<MockEthereumInner>>,
    call_handler: Arc<CallHandler>,
}

impl fmt::Debug for MockEthereum {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("MockEthereum")
            .field("max_fee_per_gas", &self.max_fee_per_gas)
            .field("max_priority_fee_per_gas", &self.max_priority_fee_per_gas)
            .field("base_fee_per_gas", &self.base_fee_per_gas)
            .field("gas_estimate", &self.gas_estimate)
            .field("auto_mining", &self.auto_mining)
            .field("stalled_nonce_reads", &self.stalled_nonce_reads)
            .field("inner", &self.inner)
            .finish_non_exhaustive()
    }
}

impl Default for MockEthereum {
    fn default() -> Self {
        Self {
            max_fee_per_gas: 100.into(),
            max_priority_fee_per_gas: 10.into(),
            base_fee_per_gas: 10.into(),
            gas_estimate: Ok(100_000.into()),
            auto_mining: None,
            stalled_nonce_reads: false,
            inner: Arc::default(),
            call_handler: Arc::new(|call, block_id| {
                panic!("Unexpected eth_call: {call:?}, {block_id:?}");
            }),
        }
    }
}

impl MockEthereum {
    pub const SENDER_ACCOUNT: Address = Address::repeat_byte(0x11);

    /// A fake hasher, which calculates an `std::hash` instead of keccak.
    fn fake_hash(data: &[u8]) -> H256 {
        use std::{collections::hash_map::DefaultHasher, hash::Hasher};

        let mut hasher = DefaultHasher::new();
        hasher.write(data);
        H256::from_low_u64_ne(hasher.finish())
    }

    /// Returns the number of transactions sent via this client.
    pub fn sent_tx_count(&self) -> usize {
        self.inner.read().unwrap().sent_txs.len()
    }

    /// Returns all transactions sent via this client in the sending order.
    pub fn sent_txs(&self) -> Vec<MockTx> {
        self.inner.read().unwrap().sent_txs.clone()
    }

    /// Increments the blocks by a provided `confirmations` and marks the sent transaction
    /// as executed.
    pub fn execute_tx(&self, tx_hash: H256, success: bool, confirmations: u64) {
        self.inner
            .write()
            .unwrap()
            .execute_tx(tx_hash, success, confirmations);
    }

    pub fn set_syncing(&self, syncing: bool) {
        self.inner.write().unwrap().syncing = syncing;
    }

    pub fn with_block_number(self, number: u64) -> Self {
        self.inner.write().unwrap().block_number = number;
        self
    }

    pub fn with_block_timestamp(self, number: u64, timestamp: u64) -> Self {
        self.inner
            .write()
            .unwrap()
            .block_timestamps
            .insert(number, timestamp);
        self
    }

    pub fn with_base_fee(self, base_fee_per_gas: U256) -> Self {
        Self {
            base_fee_per_gas,
            ..self
        }
    }

    pub fn with_gas_estimate(self, gas: U256) -> Self {
        Self {
            gas_estimate: Ok(gas),
            ..self
        }
    }

    /// Makes gas estimation fail, as it does for calls that would revert.
    pub fn with_failing_gas_estimate(self, message: &str) -> Self {
        Self {
            gas_estimate: Err(message.to_owned()),
            ..self
        }
    }

    /// Sets the pending nonce of an account other than [`Self::SENDER_ACCOUNT`].
    pub fn with_account_nonce(self, account: Address, nonce: u64) -> Self {
        self.inner
            .write()
            .unwrap()
            .account_nonces
            .insert(account, nonce);
        self
    }

    /// Makes nonce requests hang, as they do on an unresponsive node.
    pub fn with_stalled_nonce_reads(self) -> Self {
        Self {
            stalled_nonce_reads: true,
            ..self
        }
    }

    pub fn with_auto_mining(self, success: bool) -> Self {
        Self {
            auto_mining: Some(success),
            ..self
        }
    }

    pub fn with_call_handler<F>(self, call_handler: F) -> Self
    where
        F: 'static + Send + Sync + Fn(&CallRequest, BlockId) -> ethabi::Token,
    {
        Self {
            call_handler: Arc::new(move |call, block_id| Ok(call_handler(call, block_id))),
            ..self
        }
    }

    pub fn with_fallible_call_handler<F>(self, call_handler: F) -> Self
    where
        F: 'static
            + Send
            + Sync
            + Fn(&CallRequest, BlockId) -> Result<ethabi::Token, EnrichedClientError>,
    {
        Self {
            call_handler: Arc::new(call_handler),
            ..self
        }
    }

    fn sign_prepared_tx(
        &self,
        mut raw_tx: Vec<u8>,
        contract_addr: Address,
        options: Options,
        nonce: U256,
    ) -> SignedCallResult {
        let max_fee_per_gas = options.max_fee_per_gas.unwrap_or(self.max_fee_per_gas);
        let max_priority_fee_per_gas = options
            .max_priority_fee_per_gas
            .unwrap_or(self.max_priority_fee_per_gas);
        let gas = options.gas.unwrap_or_default();

        // Parameters are appended to distinguish the same transactions with different gas
        // by their hash in tests.
        raw_tx.extend_from_slice(contract_addr.as_bytes());
        for value in [gas, max_fee_per_gas, max_priority_fee_per_gas, nonce] {
            raw_tx.extend_from_slice(&ethabi::encode(&[value.into_token()]));
        }
        let hash = Self::fake_hash(&raw_tx);

        let mut new_raw_tx = hash.as_bytes().to_vec();
        new_raw_tx.extend(raw_tx);
        SignedCallResult {
            raw_tx: RawTransactionBytes(new_raw_tx),
            max_priority_fee_per_gas,
            max_fee_per_gas,
            nonce,
            hash,
        }
    }
}

#[async_trait]
impl EthInterface for MockEthereum {
    fn clone_boxed(&self) -> Box<dyn EthInterface> {
        Box::new(self.clone())
    }

    async fn fetch_chain_id(&self) -> EnrichedClientResult<L1ChainId> {
        Ok(L1ChainId(9))
    }

    async fn syncing(&self) -> EnrichedClientResult<bool> {
        Ok(self.inner.read().unwrap().syncing)
    }

    async fn nonce_at_for_account(
        &self,
        account: Address,
        block: BlockNumber,
    ) -> EnrichedClientResult<U256> {
        if self.stalled_nonce_reads {
            return std::future::pending().await;
        }
        let inner = self.inner.read().unwrap();
        let nonce = match block {
            BlockNumber::Pending if account == Self::SENDER_ACCOUNT => inner.pending_nonce,
            BlockNumber::Pending => inner.account_nonces.get(&account).copied().unwrap_or(0),
            _ => unimplemented!(
                "`nonce_at_for_account()` called with unsupported block number: {block:?}"
            ),
        };
        Ok(nonce.into())
    }

    async fn get_pending_block_base_fee_per_gas(&self) -> EnrichedClientResult<U256> {
        Ok(self.base_fee_per_gas)
    }

    async fn block_number(&self) -> EnrichedClientResult<L1BlockNumber> {
        Ok(L1BlockNumber(self.inner.read().unwrap().block_number))
    }

    async fn estimate_gas(&self, _req: CallRequest) -> EnrichedClientResult<U256> {
        self.gas_estimate.clone().map_err(|message| {
            let err = ErrorObject::owned(3, message, None::<()>);
            EnrichedClientError::new(ClientError::Call(err), "estimate_gas")
        })
    }

    async fn send_raw_tx(&self, tx: RawTransactionBytes) -> EnrichedClientResult<H256> {
        let mock_tx = MockTx::from(tx.0);
        let mock_tx_hash = mock_tx.hash;
        let mut inner = self.inner.write().unwrap();

        if mock_tx.nonce < inner.pending_nonce {
            let err = ErrorObject::owned(-32000, "nonce too low", None::<()>);
            return Err(EnrichedClientError::new(
                ClientError::Call(err),
                "send_raw_transaction",
            ));
        }
        inner.pending_nonce = mock_tx.nonce + 1;
        inner.sent_txs.push(mock_tx);
        if let Some(success) = self.auto_mining {
            inner.execute_tx(mock_tx_hash, success, 1);
        }
        Ok(mock_tx_hash)
    }

    async fn get_tx_status(&self, hash: H256) -> EnrichedClientResult<Option<ExecutedTxStatus>> {
        Ok(self.inner.read().unwrap().tx_statuses.get(&hash).cloned())
    }

    async fn tx_receipt(&self, tx_hash: H256) -> EnrichedClientResult<Option<TransactionReceipt>> {
        let inner = self.inner.read().unwrap();
        Ok(inner
            .tx_statuses
            .get(&tx_hash)
            .map(|status| status.receipt.clone()))
    }

    async fn call_contract_function(
        &self,
        request: CallRequest,
        block: Option<BlockId>,
    ) -> EnrichedClientResult<Bytes> {
        let token = (self.call_handler)(&request, block.unwrap_or(BlockNumber::Latest.into()))?;
        // Functions with multiple outputs are represented by a tuple token.
        let encoded = match token {
            ethabi::Token::Tuple(tokens) => ethabi::encode(&tokens),
            token => ethabi::encode(&[token]),
        };
        Ok(Bytes(encoded))
    }

    async fn block(&self, block_id: BlockId) -> EnrichedClientResult<Option<Block<H256>>> {
        let inner = self.inner.read().unwrap();
        let number = match block_id {
            BlockId::Number(BlockNumber::Number(number)) => number.as_u64(),
            BlockId::Number(BlockNumber::Latest) => inner.block_number,
            _ => unimplemented!("`block()` called with unsupported block ID: {block_id:?}"),
        };
        Ok(inner.block_timestamps.get(&number).map(|&timestamp| Block {
            number: Some(number.into()),
            timestamp: timestamp.into(),
            base_fee_per_gas: Some(self.base_fee_per_gas),
            ..Block::default()
        }))
    }
}

#[async_trait]
impl BoundEthInterface for MockEthereum {
    fn clone_boxed(&self) -> Box<dyn BoundEthInterface> {
        Box::new(self.clone())
    }

    fn chain_id(&self) -> L1ChainId {
        L1ChainId(9)
    }

    fn sender_account(&self) -> Address {
        Self::SENDER_ACCOUNT
    }

    async fn sign_prepared_tx_for_addr(
        &self,
        data: Vec<u8>,
        contract_addr: Address,
        options: Options,
    ) -> Result<SignedCallResult, SigningError> {
        let nonce = match options.nonce {
            Some(nonce) => nonce,
            None => {
                self.nonce_at_for_account(Self::SENDER_ACCOUNT, BlockNumber::Pending)
                    .await?
            }
        };
        Ok(self.sign_prepared_tx(data, contract_addr, options, nonce))
    }
}

impl AsRef<dyn EthInterface> for MockEthereum {
    fn as_ref(&self) -> &(dyn EthInterface + 'static) {
        self
    }
}

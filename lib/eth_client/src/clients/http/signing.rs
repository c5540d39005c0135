use std::{fmt, sync::Arc};

use async_trait::async_trait;
use stader_basic_types::{keccak256, Address, L1ChainId, H256, U256};
use stader_eth_signer::{EthereumSigner, PrivateKeySigner, SignerError, TransactionParameters};

use super::{Method, METRICS};
use crate::{
    types::{SignedCallResult, SigningError},
    BoundEthInterface, EthInterface, Options, RawTransactionBytes,
};

/// HTTP-based Ethereum client, backed by a private key to sign transactions.
pub type PKSigningClient = SigningClient<PrivateKeySigner>;

impl PKSigningClient {
    pub fn new_raw(
        operator_private_key: H256,
        default_priority_fee_per_gas: U256,
        chain_id: L1ChainId,
        query_client: Box<dyn EthInterface>,
    ) -> Result<Self, SignerError> {
        let signer = PrivateKeySigner::new(operator_private_key)?;
        let operator_address = signer.address();
        tracing::info!("Node account address: {operator_address:?}");
        Ok(SigningClient::new(
            query_client,
            operator_address,
            signer,
            default_priority_fee_per_gas,
            chain_id,
        ))
    }
}

/// Gas limit value to be used in transaction if for some reason
/// gas limit was not set for it.
///
/// This is an emergency value, which will not be used normally.
const FALLBACK_GAS_LIMIT: u64 = 3_000_000;

/// HTTP-based client, instantiated for a certain account. This client is capable of signing transactions.
#[derive(Clone)]
pub struct SigningClient<S: EthereumSigner> {
    inner: Arc<EthDirectClientInner<S>>,
    query_client: Box<dyn EthInterface>,
}

struct EthDirectClientInner<S: EthereumSigner> {
    eth_signer: S,
    sender_account: Address,
    chain_id: L1ChainId,
    default_priority_fee_per_gas: U256,
}

impl<S: EthereumSigner> fmt::Debug for SigningClient<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // We do not want to have a private key in the debug representation.
        f.debug_struct("SigningClient")
            .field("sender_account", &self.inner.sender_account)
            .field("chain_id", &self.inner.chain_id)
            .finish()
    }
}

impl<S: EthereumSigner> AsRef<dyn EthInterface> for SigningClient<S> {
    fn as_ref(&self) -> &(dyn EthInterface + 'static) {
        &*self.query_client
    }
}

#[async_trait]
impl<S: EthereumSigner> BoundEthInterface for SigningClient<S> {
    fn clone_boxed(&self) -> Box<dyn BoundEthInterface> {
        Box::new(self.clone())
    }

    fn chain_id(&self) -> L1ChainId {
        self.inner.chain_id
    }

    fn sender_account(&self) -> Address {
        self.inner.sender_account
    }

    async fn sign_prepared_tx_for_addr(
        &self,
        data: Vec<u8>,
        contract_addr: Address,
        options: Options,
    ) -> Result<SignedCallResult, SigningError> {
        let latency = METRICS.direct[&Method::SignPreparedTx].start();
        let max_priority_fee_per_gas = options
            .max_priority_fee_per_gas
            .unwrap_or(self.inner.default_priority_fee_per_gas);

        // Fetch current base fee and add `max_priority_fee_per_gas`
        let max_fee_per_gas = match options.max_fee_per_gas {
            Some(max_fee_per_gas) => max_fee_per_gas,
            None => {
                self.as_ref().get_pending_block_base_fee_per_gas().await? + max_priority_fee_per_gas
            }
        };

        if max_fee_per_gas < max_priority_fee_per_gas {
            return Err(SigningError::WrongFeeProvided(
                max_fee_per_gas,
                max_priority_fee_per_gas,
            ));
        }

        let nonce = match options.nonce {
            Some(nonce) => nonce,
            None => <dyn BoundEthInterface>::pending_nonce(self).await?,
        };

        let gas = options.gas.unwrap_or_else(|| {
            // Verbosity level is set to `error`, since we expect all the transactions to have
            // a set limit, but don't want to crash the application if for some reason in some
            // place limit was not set.
            tracing::error!(
                "No gas limit was set for transaction, using the default limit: {FALLBACK_GAS_LIMIT}"
            );
            U256::from(FALLBACK_GAS_LIMIT)
        });

        let tx = TransactionParameters {
            nonce,
            to: contract_addr,
            gas,
            value: options.value.unwrap_or_default(),
            data,
            chain_id: self.inner.chain_id.0,
            max_fee_per_gas,
            max_priority_fee_per_gas,
        };
        let signed_tx = self.inner.eth_signer.sign_transaction(tx).await?;
        let hash = H256(keccak256(&signed_tx));
        latency.observe();

        Ok(SignedCallResult {
            raw_tx: RawTransactionBytes(signed_tx),
            max_priority_fee_per_gas,
            max_fee_per_gas,
            nonce,
            hash,
        })
    }
}

impl<S: EthereumSigner> SigningClient<S> {
    pub fn new(
        query_client: Box<dyn EthInterface>,
        operator_eth_addr: Address,
        eth_signer: S,
        default_priority_fee_per_gas: U256,
        chain_id: L1ChainId,
    ) -> Self {
        Self {
            inner: Arc::new(EthDirectClientInner {
                sender_account: operator_eth_addr,
                eth_signer,
                chain_id,
                default_priority_fee_per_gas,
            }),
            query_client,
        }
    }
}

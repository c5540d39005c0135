use async_trait::async_trait;
use stader_basic_types::Address;

pub use crate::{pk_signer::PrivateKeySigner, raw_ethereum_tx::TransactionParameters};

mod pk_signer;
mod raw_ethereum_tx;

#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum SignerError {
    #[error("invalid private key: {0}")]
    InvalidPrivateKey(#[source] secp256k1::Error),
    #[error("signing failed: {0}")]
    SigningFailed(String),
}

#[async_trait]
pub trait EthereumSigner: 'static + Send + Sync + Clone {
    /// Signs the transaction, returning its raw (RLP-encoded, typed) representation.
    async fn sign_transaction(&self, raw_tx: TransactionParameters)
        -> Result<Vec<u8>, SignerError>;

    async fn get_address(&self) -> Result<Address, SignerError>;
}

use std::fmt;

use async_trait::async_trait;
use secp256k1::{Message, PublicKey, SecretKey, SECP256K1};
use stader_basic_types::{keccak256, Address, H256};

use crate::{
    raw_ethereum_tx::{Signature, TransactionParameters},
    EthereumSigner, SignerError,
};

/// Signer holding the node operator's private key in memory.
#[derive(Clone)]
pub struct PrivateKeySigner {
    private_key: SecretKey,
    address: Address,
}

impl fmt::Debug for PrivateKeySigner {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("PrivateKeySigner")
            .field("address", &self.address)
            .finish_non_exhaustive()
    }
}

impl PrivateKeySigner {
    pub fn new(private_key: H256) -> Result<Self, SignerError> {
        let private_key =
            SecretKey::from_slice(private_key.as_bytes()).map_err(SignerError::InvalidPrivateKey)?;
        let public_key = PublicKey::from_secret_key(SECP256K1, &private_key);
        // The address is the last 20 bytes of the hashed uncompressed key without its prefix byte.
        let hash = keccak256(&public_key.serialize_uncompressed()[1..]);
        Ok(Self {
            private_key,
            address: Address::from_slice(&hash[12..]),
        })
    }

    pub fn address(&self) -> Address {
        self.address
    }

    fn sign_hash(&self, hash: H256) -> Result<Signature, SignerError> {
        let message = Message::from_slice(hash.as_bytes())
            .map_err(|err| SignerError::SigningFailed(err.to_string()))?;
        let (recovery_id, bytes) = SECP256K1
            .sign_ecdsa_recoverable(&message, &self.private_key)
            .serialize_compact();
        Ok(Signature {
            v: recovery_id.to_i32() as u8,
            r: H256::from_slice(&bytes[..32]),
            s: H256::from_slice(&bytes[32..]),
        })
    }
}

#[async_trait]
impl EthereumSigner for PrivateKeySigner {
    async fn sign_transaction(
        &self,
        raw_tx: TransactionParameters,
    ) -> Result<Vec<u8>, SignerError> {
        let signature = self.sign_hash(raw_tx.signing_hash())?;
        Ok(raw_tx.encode_signed(&signature))
    }

    async fn get_address(&self) -> Result<Address, SignerError> {
        Ok(self.address)
    }
}

#[cfg(test)]
mod tests {
    use secp256k1::ecdsa::{RecoverableSignature, RecoveryId};
    use stader_basic_types::U256;

    use super::*;

    fn test_key() -> H256 {
        H256::from_low_u64_be(1)
    }

    #[test]
    fn address_is_derived_from_key() {
        let signer = PrivateKeySigner::new(test_key()).unwrap();
        let expected: Address = "0x7e5f4552091a69125d5dfcb7b8c2659029395bdf".parse().unwrap();
        assert_eq!(signer.address(), expected);
        assert!(!format!("{signer:?}").contains("private_key"));
    }

    #[test]
    fn zero_key_is_rejected() {
        let err = PrivateKeySigner::new(H256::zero()).unwrap_err();
        assert!(matches!(err, SignerError::InvalidPrivateKey(_)), "{err}");
    }

    #[tokio::test]
    async fn signed_transaction_recovers_to_signer() {
        let signer = PrivateKeySigner::new(test_key()).unwrap();
        let tx = TransactionParameters {
            nonce: 3.into(),
            to: Address::repeat_byte(0x33),
            gas: 21_000.into(),
            chain_id: 5,
            max_fee_per_gas: 10_000_000_000_u64.into(),
            max_priority_fee_per_gas: 1_000_000_000_u64.into(),
            ..TransactionParameters::default()
        };
        let raw = signer.sign_transaction(tx.clone()).await.unwrap();
        assert_eq!(raw[0], 2);

        let rlp = rlp::Rlp::new(&raw[1..]);
        assert_eq!(rlp.item_count().unwrap(), 12);
        let v: u8 = rlp.val_at(9).unwrap();
        let r: U256 = rlp.val_at(10).unwrap();
        let s: U256 = rlp.val_at(11).unwrap();
        let mut compact = [0_u8; 64];
        r.to_big_endian(&mut compact[..32]);
        s.to_big_endian(&mut compact[32..]);

        let signature =
            RecoverableSignature::from_compact(&compact, RecoveryId::from_i32(v.into()).unwrap())
                .unwrap();
        let message = Message::from_slice(tx.signing_hash().as_bytes()).unwrap();
        let public_key = SECP256K1.recover_ecdsa(&message, &signature).unwrap();
        let hash = keccak256(&public_key.serialize_uncompressed()[1..]);
        assert_eq!(Address::from_slice(&hash[12..]), signer.address());
    }
}

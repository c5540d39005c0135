//! RLP encoding of EIP-1559 transactions. These are the only transactions the watchtower sends.

use rlp::RlpStream;
use stader_basic_types::{keccak256, Address, H256, U256};

const EIP1559_TX_ID: u8 = 2;

#[derive(Clone, Debug, PartialEq, Default)]
pub struct TransactionParameters {
    pub nonce: U256,
    pub to: Address,
    /// Gas limit.
    pub gas: U256,
    pub value: U256,
    pub data: Vec<u8>,
    pub chain_id: u64,
    pub max_fee_per_gas: U256,
    pub max_priority_fee_per_gas: U256,
}

/// Recoverable ECDSA signature in the form expected by typed transactions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Signature {
    /// Recovery ID (0 or 1).
    pub v: u8,
    pub r: H256,
    pub s: H256,
}

impl TransactionParameters {
    fn encode(&self, signature: Option<&Signature>) -> Vec<u8> {
        let mut stream = RlpStream::new();
        stream.begin_list(if signature.is_some() { 12 } else { 9 });
        stream.append(&self.chain_id);
        stream.append(&self.nonce);
        stream.append(&self.max_priority_fee_per_gas);
        stream.append(&self.max_fee_per_gas);
        stream.append(&self.gas);
        stream.append(&self.to);
        stream.append(&self.value);
        stream.append(&self.data);
        // Empty access list
        stream.begin_list(0);

        if let Some(signature) = signature {
            stream.append(&signature.v);
            stream.append(&U256::from_big_endian(signature.r.as_bytes()));
            stream.append(&U256::from_big_endian(signature.s.as_bytes()));
        }
        [&[EIP1559_TX_ID], stream.as_raw()].concat()
    }

    /// Hash that has to be signed to authorize the transaction.
    pub(crate) fn signing_hash(&self) -> H256 {
        H256(keccak256(&self.encode(None)))
    }

    pub(crate) fn encode_signed(&self, signature: &Signature) -> Vec<u8> {
        self.encode(Some(signature))
    }
}

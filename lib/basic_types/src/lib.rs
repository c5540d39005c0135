//! The declaration of the most primitive types used by the watchtower.
//!
//! Most of them are just re-exported from the `web3` crate.

#[macro_use]
mod macros;

pub mod abi;
pub mod units;

use std::{fmt, num::ParseIntError, ops::Add, ops::Deref, str::FromStr};

use serde::{Deserialize, Serialize};
use tiny_keccak::{Hasher, Keccak};

pub use web3;
pub use web3::ethabi;
pub use web3::types::{
    Address, BlockId, BlockNumber, Bytes, CallRequest, SyncState, TransactionReceipt, H160, H256,
    U256, U64,
};

basic_type!(
    /// Ethereum network block sequential index.
    L1BlockNumber,
    u64
);

basic_type!(
    /// ChainId in the Ethereum network.
    L1ChainId,
    u64
);

basic_type!(
    /// Beacon chain slot.
    Slot,
    u64
);

basic_type!(
    /// Beacon chain epoch.
    Epoch,
    u64
);

impl From<L1BlockNumber> for BlockNumber {
    fn from(number: L1BlockNumber) -> Self {
        BlockNumber::Number(number.0.into())
    }
}

impl From<L1BlockNumber> for BlockId {
    fn from(number: L1BlockNumber) -> Self {
        BlockId::Number(number.into())
    }
}

/// Computes the keccak256 digest of the provided bytes.
pub fn keccak256(bytes: &[u8]) -> [u8; 32] {
    let mut output = [0u8; 32];
    let mut hasher = Keccak::v256();
    hasher.update(bytes);
    hasher.finalize(&mut output);
    output
}

/// Encodes a `U256` as a 32-byte big-endian word.
pub fn u256_to_be_bytes(value: U256) -> [u8; 32] {
    let mut bytes = [0u8; 32];
    value.to_big_endian(&mut bytes);
    bytes
}

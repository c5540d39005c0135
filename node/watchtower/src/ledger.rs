//! Records of previous oracle submissions kept in the storage contract.
//!
//! The network contract marks every accepted submission under two storage keys: a coarse one
//! derived from the submitting node and the reported block, and a fine one additionally derived
//! from the submitted values. The records are written by the contract only; the watchtower
//! reads them to avoid paying for submissions the contract has already seen. They do not
//! prevent duplicates: a submission may still be sent twice if the node restarts between
//! broadcasting a transaction and the record becoming visible.

use stader_basic_types::{keccak256, u256_to_be_bytes, Address, L1BlockNumber, H256, U256};
use stader_protocol::{storage, ProtocolContext, ProtocolError};

/// What the ledger knows about a node's submission for a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedgerStatus {
    /// Nothing was submitted for the block.
    Absent,
    /// Different values were submitted for the block.
    Outdated,
    /// Exactly these values were submitted for the block.
    Submitted,
}

/// Key derivation for a single submission topic.
#[derive(Debug, Clone, Copy)]
pub struct SubmissionLedger {
    salt: &'static str,
}

impl SubmissionLedger {
    /// Ledger of RPL price submissions.
    pub const PRICES: Self = Self::new("network.prices.submitted.node");

    pub const fn new(salt: &'static str) -> Self {
        Self { salt }
    }

    pub fn coarse_key(&self, node: Address, block: L1BlockNumber) -> H256 {
        H256(keccak256(&self.preimage(node, block, &[])))
    }

    pub fn fine_key(&self, node: Address, block: L1BlockNumber, values: &[U256]) -> H256 {
        H256(keccak256(&self.preimage(node, block, values)))
    }

    fn preimage(&self, node: Address, block: L1BlockNumber, values: &[U256]) -> Vec<u8> {
        let mut preimage = Vec::with_capacity(self.salt.len() + 20 + 32 * (values.len() + 1));
        preimage.extend_from_slice(self.salt.as_bytes());
        preimage.extend_from_slice(node.as_bytes());
        preimage.extend_from_slice(&u256_to_be_bytes(block.0.into()));
        for &value in values {
            preimage.extend_from_slice(&u256_to_be_bytes(value));
        }
        preimage
    }

    pub async fn has_coarse_record(
        &self,
        context: &ProtocolContext,
        node: Address,
        block: L1BlockNumber,
    ) -> Result<bool, ProtocolError> {
        storage::get_bool(context, self.coarse_key(node, block), None).await
    }

    pub async fn has_fine_record(
        &self,
        context: &ProtocolContext,
        node: Address,
        block: L1BlockNumber,
        values: &[U256],
    ) -> Result<bool, ProtocolError> {
        storage::get_bool(context, self.fine_key(node, block, values), None).await
    }

    /// Checks both records against the latest chain state.
    pub async fn status(
        &self,
        context: &ProtocolContext,
        node: Address,
        block: L1BlockNumber,
        values: &[U256],
    ) -> Result<LedgerStatus, ProtocolError> {
        let (has_coarse, has_fine) = futures::try_join!(
            self.has_coarse_record(context, node, block),
            self.has_fine_record(context, node, block, values),
        )?;
        Ok(if has_fine {
            LedgerStatus::Submitted
        } else if has_coarse {
            LedgerStatus::Outdated
        } else {
            LedgerStatus::Absent
        })
    }
}

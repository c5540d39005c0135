//! Queries against the trusted node DAO.

use stader_basic_types::{Address, L1BlockNumber, U256};
use stader_contracts::{dao_node_trusted_contract, ContractName};
use stader_utils::BatchedReader;

use crate::{ProtocolContext, ProtocolError};

/// Concurrent member address reads.
const MEMBER_ADDRESS_BATCH: BatchedReader = BatchedReader::new(50);

pub async fn member_exists(
    context: &ProtocolContext,
    node: Address,
    block: Option<L1BlockNumber>,
) -> Result<bool, ProtocolError> {
    context
        .call(
            ContractName::DaoNodeTrusted,
            dao_node_trusted_contract(),
            "getMemberExists",
            node,
            block,
        )
        .await
}

pub async fn member_count(
    context: &ProtocolContext,
    block: Option<L1BlockNumber>,
) -> Result<u64, ProtocolError> {
    context
        .call(
            ContractName::DaoNodeTrusted,
            dao_node_trusted_contract(),
            "getMemberCount",
            (),
            block,
        )
        .await
}

pub async fn member_at(
    context: &ProtocolContext,
    index: u64,
    block: Option<L1BlockNumber>,
) -> Result<Address, ProtocolError> {
    context
        .call(
            ContractName::DaoNodeTrusted,
            dao_node_trusted_contract(),
            "getMemberAt",
            U256::from(index),
            block,
        )
        .await
}

/// Returns addresses of all trusted members in the order of their DAO indices.
/// Pass a block to get a consistent snapshot of the member set.
pub async fn member_addresses(
    context: &ProtocolContext,
    block: Option<L1BlockNumber>,
) -> Result<Vec<Address>, ProtocolError> {
    let count = member_count(context, block).await?;
    MEMBER_ADDRESS_BATCH
        .read(count as usize, |index| member_at(context, index as u64, block))
        .await
}

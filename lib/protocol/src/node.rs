//! Node staking queries.

use stader_basic_types::{L1BlockNumber, U256};
use stader_contracts::{node_staking_contract, ContractName};

use crate::{ProtocolContext, ProtocolError};

/// Total effective RPL stake of the nodes in `offset..offset + limit` at the given RPL price.
/// `limit == 0` covers all nodes starting from `offset`.
pub async fn total_effective_rpl_stake(
    context: &ProtocolContext,
    offset: u64,
    limit: u64,
    rpl_price: U256,
    block: Option<L1BlockNumber>,
) -> Result<U256, ProtocolError> {
    context
        .call(
            ContractName::NodeStaking,
            node_staking_contract(),
            "calculateTotalEffectiveRPLStake",
            (U256::from(offset), U256::from(limit), rpl_price),
            block,
        )
        .await
}

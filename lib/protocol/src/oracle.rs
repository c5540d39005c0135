//! External price oracle quoting token rates in ETH.

use stader_basic_types::{Address, L1BlockNumber, U256};
use stader_contracts::{price_oracle_contract, ContractName};

use crate::{ProtocolContext, ProtocolError};

/// Returns the RPL rate in ETH quoted by the oracle at `oracle_address`, including
/// rates through connector tokens.
pub async fn rpl_rate_to_eth(
    context: &ProtocolContext,
    oracle_address: Address,
    block: Option<L1BlockNumber>,
) -> Result<U256, ProtocolError> {
    let rpl_token = context.contract_address(ContractName::TokenRpl).await?;
    context
        .call_at(
            oracle_address,
            price_oracle_contract(),
            "getRateToEth",
            (rpl_token, true),
            block,
        )
        .await
}

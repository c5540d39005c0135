//! Network prices and balances.

use stader_basic_types::{L1BlockNumber, U256};
use stader_contracts::{network_balances_contract, network_prices_contract, ContractName};
use stader_eth_client::ContractCall;

use crate::{ProtocolContext, ProtocolError};

/// Block for which RPL prices were last submitted by the oracle DAO.
pub async fn prices_block(
    context: &ProtocolContext,
    block: Option<L1BlockNumber>,
) -> Result<L1BlockNumber, ProtocolError> {
    let number: u64 = context
        .call(
            ContractName::NetworkPrices,
            network_prices_contract(),
            "getPricesBlock",
            (),
            block,
        )
        .await?;
    Ok(L1BlockNumber(number))
}

/// RPL price in ETH (as a wei-denominated ratio) recorded by the network.
pub async fn rpl_price(
    context: &ProtocolContext,
    block: Option<L1BlockNumber>,
) -> Result<U256, ProtocolError> {
    context
        .call(
            ContractName::NetworkPrices,
            network_prices_contract(),
            "getRPLPrice",
            (),
            block,
        )
        .await
}

/// Latest block for which prices may be submitted.
pub async fn latest_reportable_prices_block(
    context: &ProtocolContext,
    block: Option<L1BlockNumber>,
) -> Result<L1BlockNumber, ProtocolError> {
    let number: u64 = context
        .call(
            ContractName::NetworkPrices,
            network_prices_contract(),
            "getLatestReportableBlock",
            (),
            block,
        )
        .await?;
    Ok(L1BlockNumber(number))
}

/// Transaction submitting the RPL price and the total effective RPL stake for `block`.
pub async fn submit_prices(
    context: &ProtocolContext,
    block: L1BlockNumber,
    rpl_price: U256,
    effective_rpl_stake: U256,
) -> Result<ContractCall, ProtocolError> {
    context
        .contract_call(
            ContractName::NetworkPrices,
            network_prices_contract(),
            "submitPrices",
            (U256::from(block.0), rpl_price, effective_rpl_stake),
        )
        .await
}

pub async fn balances_block(
    context: &ProtocolContext,
    block: Option<L1BlockNumber>,
) -> Result<L1BlockNumber, ProtocolError> {
    let number: u64 = context
        .call(
            ContractName::NetworkBalances,
            network_balances_contract(),
            "getBalancesBlock",
            (),
            block,
        )
        .await?;
    Ok(L1BlockNumber(number))
}

pub async fn latest_reportable_balances_block(
    context: &ProtocolContext,
    block: Option<L1BlockNumber>,
) -> Result<L1BlockNumber, ProtocolError> {
    let number: u64 = context
        .call(
            ContractName::NetworkBalances,
            network_balances_contract(),
            "getLatestReportableBlock",
            (),
            block,
        )
        .await?;
    Ok(L1BlockNumber(number))
}

/// Network balances recorded by the oracle DAO.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NetworkBalances {
    pub block: L1BlockNumber,
    pub total_eth: U256,
    pub staking_eth: U256,
    pub reth_supply: U256,
}

/// Fetches all recorded network balances concurrently.
pub async fn network_balances(
    context: &ProtocolContext,
    block: Option<L1BlockNumber>,
) -> Result<NetworkBalances, ProtocolError> {
    let abi = network_balances_contract();
    let name = ContractName::NetworkBalances;
    let (balances_block, total_eth, staking_eth, reth_supply) = futures::try_join!(
        balances_block(context, block),
        context.call(name, abi, "getTotalETHBalance", (), block),
        context.call(name, abi, "getStakingETHBalance", (), block),
        context.call(name, abi, "getTotalRETHSupply", (), block),
    )?;
    Ok(NetworkBalances {
        block: balances_block,
        total_eth,
        staking_eth,
        reth_supply,
    })
}

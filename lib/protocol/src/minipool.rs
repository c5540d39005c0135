//! Minipool queries. Collections are read through [`BatchedReader`]s with bounded concurrency.

use std::ops;

use stader_basic_types::{
    abi::{Detokenize, Tokenize},
    Address, L1BlockNumber, U256,
};
use stader_contracts::{minipool_manager_contract, ContractName};
use stader_utils::BatchedReader;

use crate::{ProtocolContext, ProtocolError};

const ADDRESS_BATCH: BatchedReader = BatchedReader::new(50);
const DETAILS_BATCH: BatchedReader = BatchedReader::new(20);
/// Number of minipools covered by a single `getMinipoolCountPerStatus` call.
const STATUS_PAGE_SIZE: usize = 250;

/// Minipool details.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MinipoolDetails {
    pub address: Address,
    pub exists: bool,
    pub pubkey: Vec<u8>,
}

/// Number of minipools in each status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MinipoolCountsPerStatus {
    pub initialized: U256,
    pub prelaunch: U256,
    pub staking: U256,
    pub withdrawable: U256,
    pub dissolved: U256,
}

impl ops::Add for MinipoolCountsPerStatus {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self {
            initialized: self.initialized + rhs.initialized,
            prelaunch: self.prelaunch + rhs.prelaunch,
            staking: self.staking + rhs.staking,
            withdrawable: self.withdrawable + rhs.withdrawable,
            dissolved: self.dissolved + rhs.dissolved,
        }
    }
}

async fn call_manager<R: Detokenize>(
    context: &ProtocolContext,
    function: &str,
    params: impl Tokenize,
    block: Option<L1BlockNumber>,
) -> Result<R, ProtocolError> {
    context
        .call(
            ContractName::MinipoolManager,
            minipool_manager_contract(),
            function,
            params,
            block,
        )
        .await
}

pub async fn minipool_count(
    context: &ProtocolContext,
    block: Option<L1BlockNumber>,
) -> Result<u64, ProtocolError> {
    call_manager(context, "getMinipoolCount", (), block).await
}

pub async fn minipool_at(
    context: &ProtocolContext,
    index: u64,
    block: Option<L1BlockNumber>,
) -> Result<Address, ProtocolError> {
    call_manager(context, "getMinipoolAt", U256::from(index), block).await
}

pub async fn node_minipool_count(
    context: &ProtocolContext,
    node: Address,
    block: Option<L1BlockNumber>,
) -> Result<u64, ProtocolError> {
    call_manager(context, "getNodeMinipoolCount", node, block).await
}

pub async fn node_minipool_at(
    context: &ProtocolContext,
    node: Address,
    index: u64,
    block: Option<L1BlockNumber>,
) -> Result<Address, ProtocolError> {
    call_manager(context, "getNodeMinipoolAt", (node, U256::from(index)), block).await
}

pub async fn node_validating_minipool_count(
    context: &ProtocolContext,
    node: Address,
    block: Option<L1BlockNumber>,
) -> Result<u64, ProtocolError> {
    call_manager(context, "getNodeValidatingMinipoolCount", node, block).await
}

pub async fn node_validating_minipool_at(
    context: &ProtocolContext,
    node: Address,
    index: u64,
    block: Option<L1BlockNumber>,
) -> Result<Address, ProtocolError> {
    call_manager(
        context,
        "getNodeValidatingMinipoolAt",
        (node, U256::from(index)),
        block,
    )
    .await
}

pub async fn minipool_exists(
    context: &ProtocolContext,
    minipool: Address,
    block: Option<L1BlockNumber>,
) -> Result<bool, ProtocolError> {
    call_manager(context, "getMinipoolExists", minipool, block).await
}

pub async fn minipool_pubkey(
    context: &ProtocolContext,
    minipool: Address,
    block: Option<L1BlockNumber>,
) -> Result<Vec<u8>, ProtocolError> {
    call_manager(context, "getMinipoolPubkey", minipool, block).await
}

/// Fetches existence flag and validator pubkey of a minipool concurrently.
pub async fn minipool_details(
    context: &ProtocolContext,
    minipool: Address,
    block: Option<L1BlockNumber>,
) -> Result<MinipoolDetails, ProtocolError> {
    let (exists, pubkey) = futures::try_join!(
        minipool_exists(context, minipool, block),
        minipool_pubkey(context, minipool, block),
    )?;
    Ok(MinipoolDetails {
        address: minipool,
        exists,
        pubkey,
    })
}

/// Addresses of all minipools in the order of their indices.
pub async fn minipool_addresses(
    context: &ProtocolContext,
    block: Option<L1BlockNumber>,
) -> Result<Vec<Address>, ProtocolError> {
    let count = minipool_count(context, block).await?;
    ADDRESS_BATCH
        .read(count as usize, |index| {
            minipool_at(context, index as u64, block)
        })
        .await
}

pub async fn node_minipool_addresses(
    context: &ProtocolContext,
    node: Address,
    block: Option<L1BlockNumber>,
) -> Result<Vec<Address>, ProtocolError> {
    let count = node_minipool_count(context, node, block).await?;
    ADDRESS_BATCH
        .read(count as usize, |index| {
            node_minipool_at(context, node, index as u64, block)
        })
        .await
}

async fn load_details(
    context: &ProtocolContext,
    addresses: &[Address],
    block: Option<L1BlockNumber>,
) -> Result<Vec<MinipoolDetails>, ProtocolError> {
    DETAILS_BATCH
        .read(addresses.len(), |index| {
            minipool_details(context, addresses[index], block)
        })
        .await
}

/// Details of all minipools.
pub async fn minipools(
    context: &ProtocolContext,
    block: Option<L1BlockNumber>,
) -> Result<Vec<MinipoolDetails>, ProtocolError> {
    let addresses = minipool_addresses(context, block).await?;
    load_details(context, &addresses, block).await
}

/// Details of all minipools belonging to `node`.
pub async fn node_minipools(
    context: &ProtocolContext,
    node: Address,
    block: Option<L1BlockNumber>,
) -> Result<Vec<MinipoolDetails>, ProtocolError> {
    let addresses = node_minipool_addresses(context, node, block).await?;
    load_details(context, &addresses, block).await
}

/// Validator pubkeys of the `node` minipools currently in the staking status.
pub async fn node_validating_minipool_pubkeys(
    context: &ProtocolContext,
    node: Address,
    block: Option<L1BlockNumber>,
) -> Result<Vec<Vec<u8>>, ProtocolError> {
    let count = node_validating_minipool_count(context, node, block).await?;
    ADDRESS_BATCH
        .read(count as usize, |index| async move {
            let minipool = node_validating_minipool_at(context, node, index as u64, block).await?;
            minipool_pubkey(context, minipool, block).await
        })
        .await
}

/// Counts minipools in each status, summing up the paginated contract results.
pub async fn minipool_counts_per_status(
    context: &ProtocolContext,
    block: Option<L1BlockNumber>,
) -> Result<MinipoolCountsPerStatus, ProtocolError> {
    let count = minipool_count(context, block).await?;
    ADDRESS_BATCH
        .fold_pages(
            count as usize,
            STATUS_PAGE_SIZE,
            MinipoolCountsPerStatus::default(),
            |offset, limit| async move {
                let (initialized, prelaunch, staking, withdrawable, dissolved) = call_manager(
                    context,
                    "getMinipoolCountPerStatus",
                    (U256::from(offset), U256::from(limit)),
                    block,
                )
                .await?;
                Ok::<_, ProtocolError>(MinipoolCountsPerStatus {
                    initialized,
                    prelaunch,
                    staking,
                    withdrawable,
                    dissolved,
                })
            },
            |total, page| total + page,
        )
        .await
}

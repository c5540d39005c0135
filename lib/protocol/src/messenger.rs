//! Messenger relaying the RPL rate to an L2 network.

use stader_basic_types::{Address, L1BlockNumber};
use stader_contracts::price_messenger_contract;
use stader_eth_client::{CallFunctionArgs, ContractCall};

use crate::{ProtocolContext, ProtocolError};

/// Whether the rate known to the L2 network differs from the current L1 rate.
pub async fn rate_stale(
    context: &ProtocolContext,
    messenger_address: Address,
    block: Option<L1BlockNumber>,
) -> Result<bool, ProtocolError> {
    context
        .call_at(
            messenger_address,
            price_messenger_contract(),
            "rateStale",
            (),
            block,
        )
        .await
}

/// Transaction relaying the current rate.
pub fn submit_rate(messenger_address: Address) -> ContractCall {
    CallFunctionArgs::new("submitRate", ()).for_contract(messenger_address, price_messenger_contract())
}

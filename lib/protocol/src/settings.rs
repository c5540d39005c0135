//! Network settings of the protocol DAO.

use stader_basic_types::L1BlockNumber;
use stader_contracts::{dao_protocol_settings_network_contract, ContractName};

use crate::{ProtocolContext, ProtocolError};

/// Whether price submissions by trusted nodes are currently enabled.
pub async fn submit_prices_enabled(
    context: &ProtocolContext,
    block: Option<L1BlockNumber>,
) -> Result<bool, ProtocolError> {
    context
        .call(
            ContractName::DaoProtocolSettingsNetwork,
            dao_protocol_settings_network_contract(),
            "getSubmitPricesEnabled",
            (),
            block,
        )
        .await
}

pub async fn submit_balances_enabled(
    context: &ProtocolContext,
    block: Option<L1BlockNumber>,
) -> Result<bool, ProtocolError> {
    context
        .call(
            ContractName::DaoProtocolSettingsNetwork,
            dao_protocol_settings_network_contract(),
            "getSubmitBalancesEnabled",
            (),
            block,
        )
        .await
}

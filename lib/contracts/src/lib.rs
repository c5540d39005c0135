//! ABIs of the protocol contracts the watchtower talks to, embedded into the binary.
//!
//! Protocol contracts are deployed behind the storage contract, which maps each [`ContractName`]
//! to its current address.

use once_cell::sync::Lazy;
use stader_basic_types::ethabi::Contract;

/// Names under which the protocol contracts are registered in the storage contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContractName {
    NetworkPrices,
    NetworkBalances,
    DaoNodeTrusted,
    DaoProtocolSettingsNetwork,
    NodeStaking,
    MinipoolManager,
    TokenRpl,
}

impl ContractName {
    pub const fn registry_name(self) -> &'static str {
        match self {
            Self::NetworkPrices => "rocketNetworkPrices",
            Self::NetworkBalances => "rocketNetworkBalances",
            Self::DaoNodeTrusted => "rocketDAONodeTrusted",
            Self::DaoProtocolSettingsNetwork => "rocketDAOProtocolSettingsNetwork",
            Self::NodeStaking => "rocketNodeStaking",
            Self::MinipoolManager => "rocketMinipoolManager",
            Self::TokenRpl => "rocketTokenRPL",
        }
    }
}

fn load_abi(name: &str, json: &str) -> Contract {
    Contract::load(json.as_bytes())
        .unwrap_or_else(|err| panic!("embedded ABI of `{name}` is malformed: {err}"))
}

macro_rules! embedded_abi {
    ($(#[$attr:meta])* $fn_name:ident, $file:literal) => {
        $(#[$attr])*
        pub fn $fn_name() -> &'static Contract {
            static ABI: Lazy<Contract> =
                Lazy::new(|| load_abi($file, include_str!(concat!("../abi/", $file, ".json"))));
            &ABI
        }
    };
}

embedded_abi!(
    /// Key/value storage holding protocol state and the contract registry.
    storage_contract,
    "RocketStorage"
);
embedded_abi!(network_prices_contract, "RocketNetworkPrices");
embedded_abi!(network_balances_contract, "RocketNetworkBalances");
embedded_abi!(dao_node_trusted_contract, "RocketDAONodeTrusted");
embedded_abi!(
    dao_protocol_settings_network_contract,
    "RocketDAOProtocolSettingsNetwork"
);
embedded_abi!(node_staking_contract, "RocketNodeStaking");
embedded_abi!(minipool_manager_contract, "RocketMinipoolManager");
embedded_abi!(
    /// Price aggregator quoting token rates in ETH.
    price_oracle_contract,
    "OneInchOracle"
);
embedded_abi!(
    /// Messenger relaying the RPL rate to an L2 network.
    price_messenger_contract,
    "PriceMessenger"
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedded_abis_are_valid() {
        let expected: &[(&Contract, &[&str])] = &[
            (storage_contract(), &["getBool", "getAddress", "getUint"]),
            (
                network_prices_contract(),
                &["getPricesBlock", "getLatestReportableBlock", "submitPrices"],
            ),
            (
                network_balances_contract(),
                &["getBalancesBlock", "getLatestReportableBlock"],
            ),
            (
                dao_node_trusted_contract(),
                &["getMemberExists", "getMemberCount", "getMemberAt"],
            ),
            (
                dao_protocol_settings_network_contract(),
                &["getSubmitPricesEnabled"],
            ),
            (node_staking_contract(), &["calculateTotalEffectiveRPLStake"]),
            (
                minipool_manager_contract(),
                &["getMinipoolAt", "getMinipoolCountPerStatus", "getMinipoolPubkey"],
            ),
            (price_oracle_contract(), &["getRateToEth"]),
            (price_messenger_contract(), &["rateStale", "submitRate"]),
        ];
        for (contract, functions) in expected {
            for &function in *functions {
                contract.function(function).unwrap();
            }
        }
    }

    #[test]
    fn submit_prices_selector() {
        let function = network_prices_contract().function("submitPrices").unwrap();
        assert_eq!(function.signature(), "submitPrices(uint256,uint256,uint256)");
        assert_eq!(function.inputs.len(), 3);
    }
}

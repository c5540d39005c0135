use serde::Deserialize;
use stader_basic_types::{units::gwei_to_wei, U256};

pub const DEFAULT_MAX_FEE_PER_GAS_GWEI: f64 = 150.0;
pub const DEFAULT_MAX_PRIORITY_FEE_PER_GAS_GWEI: f64 = 2.0;
pub const DEFAULT_GAS_LIMIT_MULTIPLIER: f64 = 1.5;
pub const DEFAULT_MAX_GAS_LIMIT: u64 = 30_000_000;

/// Fee caps and gas limit policy applied to every transaction the watchtower sends.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct GasConfig {
    /// Upper bound for the max fee per gas, in gwei. Transactions that would need more are not sent.
    #[serde(default = "GasConfig::default_max_fee_per_gas_gwei")]
    pub max_fee_per_gas_gwei: f64,
    #[serde(default = "GasConfig::default_max_priority_fee_per_gas_gwei")]
    pub max_priority_fee_per_gas_gwei: f64,
    /// Safety margin applied to the estimated gas limit.
    #[serde(default = "GasConfig::default_gas_limit_multiplier")]
    pub gas_limit_multiplier: f64,
    #[serde(default = "GasConfig::default_max_gas_limit")]
    pub max_gas_limit: u64,
}

impl Default for GasConfig {
    fn default() -> Self {
        Self {
            max_fee_per_gas_gwei: Self::default_max_fee_per_gas_gwei(),
            max_priority_fee_per_gas_gwei: Self::default_max_priority_fee_per_gas_gwei(),
            gas_limit_multiplier: Self::default_gas_limit_multiplier(),
            max_gas_limit: Self::default_max_gas_limit(),
        }
    }
}

impl GasConfig {
    fn default_max_fee_per_gas_gwei() -> f64 {
        DEFAULT_MAX_FEE_PER_GAS_GWEI
    }

    fn default_max_priority_fee_per_gas_gwei() -> f64 {
        DEFAULT_MAX_PRIORITY_FEE_PER_GAS_GWEI
    }

    fn default_gas_limit_multiplier() -> f64 {
        DEFAULT_GAS_LIMIT_MULTIPLIER
    }

    fn default_max_gas_limit() -> u64 {
        DEFAULT_MAX_GAS_LIMIT
    }

    pub fn max_fee_per_gas(&self) -> U256 {
        gwei_to_wei(self.max_fee_per_gas_gwei)
    }

    pub fn max_priority_fee_per_gas(&self) -> U256 {
        gwei_to_wei(self.max_priority_fee_per_gas_gwei)
    }
}

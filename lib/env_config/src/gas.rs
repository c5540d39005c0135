use stader_config::GasConfig;

use crate::{envy_load, FromEnv};

impl FromEnv for GasConfig {
    fn from_env() -> anyhow::Result<Self> {
        let config: Self = envy_load("gas", "WATCHTOWER_GAS_")?;
        anyhow::ensure!(
            config.max_priority_fee_per_gas_gwei <= config.max_fee_per_gas_gwei,
            "Max priority fee ({} gwei) cannot exceed max fee ({} gwei)",
            config.max_priority_fee_per_gas_gwei,
            config.max_fee_per_gas_gwei
        );
        anyhow::ensure!(
            config.gas_limit_multiplier >= 1.0,
            "Gas limit multiplier must be at least 1, got {}",
            config.gas_limit_multiplier
        );
        Ok(config)
    }
}

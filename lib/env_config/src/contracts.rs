use stader_config::ContractsConfig;

use crate::{envy_load, FromEnv};

impl FromEnv for ContractsConfig {
    fn from_env() -> anyhow::Result<Self> {
        envy_load("contracts", "CONTRACTS_")
    }
}

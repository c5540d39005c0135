use stader_config::WatchtowerConfig;

use crate::{envy_load, FromEnv};

impl FromEnv for WatchtowerConfig {
    fn from_env() -> anyhow::Result<Self> {
        let config: Self = envy_load("watchtower", "WATCHTOWER_")?;
        anyhow::ensure!(
            config.rate_relay_turn_blocks > 0,
            "`rate_relay_turn_blocks` must be positive"
        );
        Ok(config)
    }
}

use stader_config::ObservabilityConfig;

use crate::{envy_load, FromEnv};

impl FromEnv for ObservabilityConfig {
    fn from_env() -> anyhow::Result<Self> {
        let mut config: Self = envy_load("observability", "OBSERVABILITY_")?;
        if config.log_directives.is_none() {
            config.log_directives = std::env::var("RUST_LOG").ok();
        }
        Ok(config)
    }
}

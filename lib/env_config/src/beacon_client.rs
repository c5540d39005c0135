use stader_config::BeaconClientConfig;

use crate::{envy_load, FromEnv};

impl FromEnv for BeaconClientConfig {
    fn from_env() -> anyhow::Result<Self> {
        envy_load("beacon_client", "BEACON_CLIENT_")
    }
}

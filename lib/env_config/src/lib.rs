use anyhow::Context as _;
use serde::de::DeserializeOwned;

mod beacon_client;
mod contracts;
mod eth_client;
mod gas;
mod observability;
#[cfg(test)]
mod test_utils;
mod wallets;
mod watchtower;

pub trait FromEnv: Sized {
    fn from_env() -> anyhow::Result<Self>;
}

/// Convenience function that loads the structure from the environment variables given the prefix.
pub fn envy_load<T: DeserializeOwned>(name: &str, prefix: &str) -> anyhow::Result<T> {
    envy::prefixed(prefix)
        .from_env()
        .with_context(|| format!("Cannot load config <{name}>"))
}

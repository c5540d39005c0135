use stader_config::EthClientConfig;

use crate::{envy_load, FromEnv};

impl FromEnv for EthClientConfig {
    fn from_env() -> anyhow::Result<Self> {
        let config: Self = envy_load("eth_client", "ETH_CLIENT_")?;
        if config.web3_url.contains(',') {
            anyhow::bail!(
                "Multiple web3 URLs aren't supported. Provided invalid value: {}",
                config.web3_url
            );
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::EnvMutex;

    static MUTEX: EnvMutex = EnvMutex::new();

    #[test]
    fn from_env() {
        let mut lock = MUTEX.lock();
        let config = r#"
            ETH_CLIENT_CHAIN_ID="1"
            ETH_CLIENT_WEB3_URL="http://127.0.0.1:8545"
            ETH_CLIENT_ARCHIVE_WEB3_URL="http://127.0.0.1:9545"
        "#;
        lock.set_env(config);
        lock.remove_env(&["ETH_CLIENT_REQUEST_TIMEOUT_MS"]);

        let actual = EthClientConfig::from_env().unwrap();
        assert_eq!(
            actual,
            EthClientConfig {
                chain_id: 1,
                web3_url: "http://127.0.0.1:8545".into(),
                archive_web3_url: Some("http://127.0.0.1:9545".into()),
                request_timeout_ms: 30_000,
            }
        );
    }

    #[test]
    fn multiple_urls_are_rejected() {
        let mut lock = MUTEX.lock();
        let config = r#"
            ETH_CLIENT_CHAIN_ID="1"
            ETH_CLIENT_WEB3_URL="http://127.0.0.1:8545,http://127.0.0.1:8546"
        "#;
        lock.set_env(config);

        let err = EthClientConfig::from_env().unwrap_err().to_string();
        assert!(err.contains("Multiple web3 URLs"), "{err}");
    }
}

use stader_config::WalletConfig;

use crate::{envy_load, FromEnv};

impl FromEnv for WalletConfig {
    fn from_env() -> anyhow::Result<Self> {
        envy_load("node_wallet", "NODE_WALLET_")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{addr, hash, EnvMutex};

    static MUTEX: EnvMutex = EnvMutex::new();

    #[test]
    fn from_env() {
        let mut lock = MUTEX.lock();
        let config = r#"
            NODE_WALLET_PRIVATE_KEY="0x27593fea79697e947890ecbecce7901b0008345e5d7259710d0dd5e500d040be"
            NODE_WALLET_ADDRESS="0xde03a0b5963f75f1c8485b355ff6d30f3093bde7"
        "#;
        lock.set_env(config);

        let actual = WalletConfig::from_env().unwrap();
        assert_eq!(
            actual.private_key,
            hash("27593fea79697e947890ecbecce7901b0008345e5d7259710d0dd5e500d040be")
        );
        assert_eq!(
            actual.address,
            Some(addr("de03a0b5963f75f1c8485b355ff6d30f3093bde7"))
        );
        assert!(!format!("{actual:?}").contains("27593fea"));
    }
}

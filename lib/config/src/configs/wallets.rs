use std::fmt;

use serde::Deserialize;
use stader_basic_types::{Address, H256};

/// Node operator wallet used to sign watchtower transactions.
#[derive(Clone, PartialEq, Deserialize)]
pub struct WalletConfig {
    pub private_key: H256,
    /// Expected address of the wallet. Used to validate private key integrity.
    #[serde(default)]
    pub address: Option<Address>,
}

impl fmt::Debug for WalletConfig {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("WalletConfig")
            .field("address", &self.address)
            .finish_non_exhaustive()
    }
}

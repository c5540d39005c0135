#![allow(clippy::upper_case_acronyms, clippy::derive_partial_eq_without_eq)]

pub use crate::configs::{
    BeaconClientConfig, ContractsConfig, EthClientConfig, GasConfig, ObservabilityConfig,
    WalletConfig, WatchtowerConfig,
};

pub mod configs;

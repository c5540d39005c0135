use std::time::Duration;

use serde::Deserialize;

/// By default, the watchtower tasks run every 5 minutes.
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 300_000;
/// Default upper bound for a single step of a task (one remote read or write).
pub const DEFAULT_STEP_TIMEOUT_MS: u64 = 60_000;
/// Default maximum number of attempts to get a transaction receipt.
const DEFAULT_RECEIPT_CHECKING_MAX_ATTEMPTS: u32 = 60;
/// Default number of milliseconds to sleep between receipt checks.
const DEFAULT_RECEIPT_CHECKING_SLEEP_MS: u64 = 5_000;
/// Number of blocks each trusted member is responsible for relaying the RPL rate.
pub const DEFAULT_RATE_RELAY_TURN_BLOCKS: u64 = 75;

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct WatchtowerConfig {
    #[serde(default = "WatchtowerConfig::default_poll_interval")]
    pub poll_interval_ms: u64,
    #[serde(default = "WatchtowerConfig::default_step_timeout")]
    pub step_timeout_ms: u64,
    #[serde(default = "WatchtowerConfig::default_receipt_checking_max_attempts")]
    pub receipt_checking_max_attempts: u32,
    #[serde(default = "WatchtowerConfig::default_receipt_checking_sleep")]
    pub receipt_checking_sleep_ms: u64,
    #[serde(default = "WatchtowerConfig::default_rate_relay_turn_blocks")]
    pub rate_relay_turn_blocks: u64,
}

impl Default for WatchtowerConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: Self::default_poll_interval(),
            step_timeout_ms: Self::default_step_timeout(),
            receipt_checking_max_attempts: Self::default_receipt_checking_max_attempts(),
            receipt_checking_sleep_ms: Self::default_receipt_checking_sleep(),
            rate_relay_turn_blocks: Self::default_rate_relay_turn_blocks(),
        }
    }
}

impl WatchtowerConfig {
    fn default_poll_interval() -> u64 {
        DEFAULT_POLL_INTERVAL_MS
    }

    fn default_step_timeout() -> u64 {
        DEFAULT_STEP_TIMEOUT_MS
    }

    fn default_receipt_checking_max_attempts() -> u32 {
        DEFAULT_RECEIPT_CHECKING_MAX_ATTEMPTS
    }

    fn default_receipt_checking_sleep() -> u64 {
        DEFAULT_RECEIPT_CHECKING_SLEEP_MS
    }

    fn default_rate_relay_turn_blocks() -> u64 {
        DEFAULT_RATE_RELAY_TURN_BLOCKS
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn step_timeout(&self) -> Duration {
        Duration::from_millis(self.step_timeout_ms)
    }

    pub fn receipt_checking_sleep(&self) -> Duration {
        Duration::from_millis(self.receipt_checking_sleep_ms)
    }
}

use std::time::Duration;

use anyhow::Context as _;
use stader_basic_types::H256;
use stader_eth_client::{EthInterface, ExecutedTxStatus, SignedCallResult};

use crate::step::run_step;

/// Broadcasts signed transactions and polls for their inclusion.
#[derive(Debug, Clone)]
pub struct TransactionWaiter {
    max_attempts: u32,
    poll_interval: Duration,
    step_timeout: Duration,
}

impl TransactionWaiter {
    pub fn new(max_attempts: u32, poll_interval: Duration, step_timeout: Duration) -> Self {
        Self {
            max_attempts,
            poll_interval,
            step_timeout,
        }
    }

    /// Sends a transaction and waits until it's mined. Returns an error if the transaction
    /// is rejected, reverts or isn't mined within the configured number of attempts.
    pub async fn send_and_wait(
        &self,
        client: &dyn EthInterface,
        signed_tx: SignedCallResult,
    ) -> anyhow::Result<ExecutedTxStatus> {
        let expected_hash = signed_tx.hash;
        let hash = run_step(
            self.step_timeout,
            "send_raw_tx",
            client.send_raw_tx(signed_tx.raw_tx),
        )
        .await?;
        if hash != expected_hash {
            tracing::warn!("Node returned hash {hash:?} for transaction {expected_hash:?}");
        }
        tracing::info!(
            tx_hash = ?hash,
            nonce = %signed_tx.nonce,
            "Transaction sent, waiting for it to be mined"
        );
        self.wait(client, hash).await
    }

    async fn wait(&self, client: &dyn EthInterface, hash: H256) -> anyhow::Result<ExecutedTxStatus> {
        for _ in 0..self.max_attempts {
            let status = run_step(self.step_timeout, "tx_status", client.get_tx_status(hash))
                .await
                .with_context(|| format!("failed getting status of transaction {hash:?}"))?;
            match status {
                Some(status) if status.success => {
                    tracing::info!(
                        tx_hash = ?hash,
                        "Transaction mined in block {:?}",
                        status.receipt.block_number
                    );
                    return Ok(status);
                }
                Some(status) => {
                    anyhow::bail!(
                        "transaction {hash:?} reverted in block {:?}",
                        status.receipt.block_number
                    );
                }
                None => tokio::time::sleep(self.poll_interval).await,
            }
        }
        anyhow::bail!(
            "transaction {hash:?} was not mined after {} attempts",
            self.max_attempts
        )
    }
}

//! Watchtower daemon tasks run by trusted Stader nodes.
//!
//! The only task submitting on-chain data is [`SubmitRplPrice`], which also drives the
//! best-effort [`OptimismRateRelay`]. [`Watchtower`] runs it on a fixed interval.

use std::time::Duration;

use tokio::sync::watch;

pub use crate::{
    finality::{FinalityGate, Reportability},
    gas::{GasDecision, GasNegotiator, TxFees},
    ledger::{LedgerStatus, SubmissionLedger},
    rate_relay::{OptimismRateRelay, RelayOutcome},
    sender::{SendOutcome, TransactionSender},
    submit_rpl_price::{PriceSubmissionOutcome, SubmitRplPrice},
    turn::TurnScheduler,
    tx_waiter::TransactionWaiter,
};
use crate::metrics::ErrorKind;

mod finality;
mod gas;
mod ledger;
mod metrics;
mod rate_relay;
mod sender;
mod step;
mod submit_rpl_price;
#[cfg(test)]
mod tests;
mod turn;
mod tx_waiter;

/// Error of a watchtower iteration.
#[derive(Debug, thiserror::Error)]
pub enum WatchtowerError {
    /// Reading the chain state failed. The iteration is repeated on the next tick.
    #[error("failed querying chain state: {0:#}")]
    Query(anyhow::Error),
    /// A transaction was rejected, reverted or not mined in time.
    #[error("failed submitting transaction: {0:#}")]
    Submission(anyhow::Error),
}

impl WatchtowerError {
    /// Returns `true` for errors that need operator attention (e.g., a stuck nonce or an
    /// insufficient balance).
    pub fn is_alerting(&self) -> bool {
        matches!(self, Self::Submission(_))
    }

    fn kind(&self) -> ErrorKind {
        match self {
            Self::Query(_) => ErrorKind::Query,
            Self::Submission(_) => ErrorKind::Submission,
        }
    }
}

/// Runs the watchtower tasks until a stop signal is received.
#[derive(Debug)]
pub struct Watchtower {
    submit_rpl_price: SubmitRplPrice,
    poll_interval: Duration,
}

impl Watchtower {
    pub fn new(submit_rpl_price: SubmitRplPrice, poll_interval: Duration) -> Self {
        Self {
            submit_rpl_price,
            poll_interval,
        }
    }

    /// Iterations never overlap: a tick missed while an iteration is running is delayed.
    pub async fn run(self, mut stop_receiver: watch::Receiver<bool>) -> anyhow::Result<()> {
        let mut timer = tokio::time::interval(self.poll_interval);
        timer.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        while !*stop_receiver.borrow_and_update() {
            tokio::select! {
                _ = timer.tick() => { /* continue iterations */ }
                _ = stop_receiver.changed() => break,
            }

            let iteration = self.submit_rpl_price.run_once();
            let result = tokio::select! {
                result = iteration => result,
                _ = stop_receiver.changed() => break,
            };
            match result {
                Ok(outcome) => tracing::debug!("RPL price iteration finished: {outcome:?}"),
                Err(err) if err.is_alerting() => {
                    tracing::error!("RPL price submission failed: {err}");
                }
                Err(err) => tracing::warn!("RPL price iteration failed: {err}"),
            }
        }

        tracing::info!("Stop signal received, watchtower is shutting down");
        Ok(())
    }
}

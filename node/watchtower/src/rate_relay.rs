//! Best-effort relay of the RPL rate to Optimism.
//!
//! The messenger contract reports whether the rate known on Optimism is stale. Trusted members
//! take turns refreshing it in windows of blocks; a member that misses its turn is covered by
//! the next one.

use std::{sync::Arc, time::Duration};

use anyhow::Context as _;
use stader_basic_types::{Address, L1BlockNumber, H256};
use stader_protocol::{messenger, trusted_node, ProtocolContext};

use crate::{
    metrics::{RelayTaskOutcome, METRICS},
    sender::{SendOutcome, TransactionSender},
    step::run_step,
    turn::TurnScheduler,
    WatchtowerError,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayOutcome {
    /// The rate on Optimism is up to date.
    RateFresh,
    NotMyTurn {
        block: L1BlockNumber,
        turn_index: Option<usize>,
    },
    FeeAboveCap,
    Submitted { block: L1BlockNumber, tx_hash: H256 },
}

impl RelayOutcome {
    fn metrics_label(&self) -> RelayTaskOutcome {
        match self {
            Self::RateFresh => RelayTaskOutcome::RateFresh,
            Self::NotMyTurn { .. } => RelayTaskOutcome::NotMyTurn,
            Self::FeeAboveCap => RelayTaskOutcome::FeeAboveCap,
            Self::Submitted { .. } => RelayTaskOutcome::Submitted,
        }
    }
}

#[derive(Debug)]
pub struct OptimismRateRelay {
    context: Arc<ProtocolContext>,
    sender: Arc<TransactionSender>,
    messenger: Address,
    scheduler: TurnScheduler,
    step_timeout: Duration,
}

impl OptimismRateRelay {
    pub fn new(
        context: Arc<ProtocolContext>,
        sender: Arc<TransactionSender>,
        messenger: Address,
        scheduler: TurnScheduler,
        step_timeout: Duration,
    ) -> Self {
        Self {
            context,
            sender,
            messenger,
            scheduler,
            step_timeout,
        }
    }

    #[tracing::instrument(name = "OptimismRateRelay::run_once", skip_all)]
    pub async fn run_once(&self) -> Result<RelayOutcome, WatchtowerError> {
        let result = self.relay_rate().await;
        match &result {
            Ok(outcome) => {
                METRICS.relay_iterations[&outcome.metrics_label()].inc();
            }
            Err(err) => {
                METRICS.relay_iterations[&RelayTaskOutcome::Failed].inc();
                METRICS.errors[&err.kind()].inc();
            }
        }
        result
    }

    async fn relay_rate(&self) -> Result<RelayOutcome, WatchtowerError> {
        let is_stale = run_step(
            self.step_timeout,
            "rate_stale",
            messenger::rate_stale(&self.context, self.messenger, None),
        )
        .await
        .map_err(WatchtowerError::Query)?;
        if !is_stale {
            return Ok(RelayOutcome::RateFresh);
        }

        let (block, members) = self.members().await.map_err(WatchtowerError::Query)?;
        let node = self.sender.sender_account();
        if !self.scheduler.is_my_turn(&members, node, block) {
            let turn_index = self.scheduler.turn_index(members.len(), block);
            tracing::debug!("Optimism rate is stale, but it's not this node's turn to submit it");
            return Ok(RelayOutcome::NotMyTurn { block, turn_index });
        }

        tracing::info!("Submitting rate to Optimism...");
        let call = messenger::submit_rate(self.messenger);
        match self.sender.send(&call).await? {
            SendOutcome::FeeAboveCap => Ok(RelayOutcome::FeeAboveCap),
            SendOutcome::Mined { tx_hash, .. } => {
                tracing::info!("Successfully submitted Optimism price for block {block}.");
                Ok(RelayOutcome::Submitted { block, tx_hash })
            }
        }
    }

    /// Returns the current block and the member list as of that block.
    async fn members(&self) -> anyhow::Result<(L1BlockNumber, Vec<Address>)> {
        let block = run_step(
            self.step_timeout,
            "block_number",
            self.context.client().block_number(),
        )
        .await?;
        let members = run_step(
            self.step_timeout,
            "trusted_members",
            trusted_node::member_addresses(&self.context, Some(block)),
        )
        .await
        .with_context(|| format!("failed enumerating trusted members at block {block}"))?;
        Ok((block, members))
    }
}

//! Submission of the RPL price and the total effective RPL stake by trusted nodes.

use std::{sync::Arc, time::Duration};

use anyhow::Context as _;
use stader_basic_types::{units::format_eth, Address, Epoch, L1BlockNumber, H256, U256};
use stader_beacon_client::BeaconInterface;
use stader_protocol::{
    network, node, oracle, settings, trusted_node, ProtocolContext, ProtocolError,
};

use crate::{
    finality::{FinalityGate, Reportability},
    ledger::{LedgerStatus, SubmissionLedger},
    metrics::{PriceTaskOutcome, METRICS},
    rate_relay::OptimismRateRelay,
    sender::{SendOutcome, TransactionSender},
    step::run_step,
    WatchtowerError,
};

/// Outcome of a single [`SubmitRplPrice`] iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriceSubmissionOutcome {
    /// The execution client is still syncing.
    NotSynced,
    /// The node isn't a trusted member, or price submissions are disabled.
    NotEligible,
    /// Prices are already recorded for the latest reportable block.
    NothingToReport {
        reportable_block: L1BlockNumber,
        prices_block: L1BlockNumber,
    },
    /// The epoch of the reportable block isn't finalized yet.
    AwaitingFinality {
        block: L1BlockNumber,
        epoch: Epoch,
        finalized_epoch: Epoch,
    },
    /// This node has already submitted the same values for the block.
    AlreadySubmitted { block: L1BlockNumber },
    /// Submission was skipped because of the fee cap.
    FeeAboveCap { block: L1BlockNumber },
    Submitted { block: L1BlockNumber, tx_hash: H256 },
}

impl PriceSubmissionOutcome {
    fn metrics_label(&self) -> PriceTaskOutcome {
        match self {
            Self::NotSynced => PriceTaskOutcome::NotSynced,
            Self::NotEligible => PriceTaskOutcome::NotEligible,
            Self::NothingToReport { .. } => PriceTaskOutcome::NothingToReport,
            Self::AwaitingFinality { .. } => PriceTaskOutcome::AwaitingFinality,
            Self::AlreadySubmitted { .. } => PriceTaskOutcome::AlreadySubmitted,
            Self::FeeAboveCap { .. } => PriceTaskOutcome::FeeAboveCap,
            Self::Submitted { .. } => PriceTaskOutcome::Submitted,
        }
    }
}

/// Values reported for a block.
/// Checks whether a failed read was rejected by the node rather than by the client itself.
fn is_gateway_error(err: &anyhow::Error) -> bool {
    err.downcast_ref::<ProtocolError>()
        .is_some_and(ProtocolError::is_gateway_error)
}

#[derive(Debug, Clone, Copy)]
struct PriceReport {
    block: L1BlockNumber,
    rpl_price: U256,
    effective_rpl_stake: U256,
}

/// Watchtower task submitting the RPL price for the latest reportable block.
///
/// Each [`Self::run_once()`] call performs one full check: eligibility, the Optimism rate relay,
/// the reportable block and its finality, the price itself, previous submissions, and finally
/// the submission transaction.
#[derive(Debug)]
pub struct SubmitRplPrice {
    context: Arc<ProtocolContext>,
    archive_context: Option<ProtocolContext>,
    beacon: Arc<dyn BeaconInterface>,
    sender: Arc<TransactionSender>,
    price_oracle: Address,
    rate_relay: Option<OptimismRateRelay>,
    step_timeout: Duration,
}

impl SubmitRplPrice {
    pub fn new(
        context: Arc<ProtocolContext>,
        beacon: Arc<dyn BeaconInterface>,
        sender: Arc<TransactionSender>,
        price_oracle: Address,
        step_timeout: Duration,
    ) -> Self {
        Self {
            context,
            archive_context: None,
            beacon,
            sender,
            price_oracle,
            rate_relay: None,
            step_timeout,
        }
    }

    /// Sets the context used for historical reads the primary execution client cannot serve.
    pub fn with_archive_context(mut self, archive_context: ProtocolContext) -> Self {
        self.archive_context = Some(archive_context);
        self
    }

    pub fn with_rate_relay(mut self, rate_relay: OptimismRateRelay) -> Self {
        self.rate_relay = Some(rate_relay);
        self
    }

    pub async fn run_once(&self) -> Result<PriceSubmissionOutcome, WatchtowerError> {
        let latency = METRICS.iteration_latency.start();
        let result = self.submit_prices().await;
        latency.observe();

        match &result {
            Ok(outcome) => {
                METRICS.price_iterations[&outcome.metrics_label()].inc();
            }
            Err(err) => {
                METRICS.price_iterations[&PriceTaskOutcome::Failed].inc();
                METRICS.errors[&err.kind()].inc();
            }
        }
        result
    }

    async fn submit_prices(&self) -> Result<PriceSubmissionOutcome, WatchtowerError> {
        let node = self.sender.sender_account();
        if self.is_syncing().await.map_err(WatchtowerError::Query)? {
            tracing::info!("Execution client is syncing, skipping RPL price submission");
            return Ok(PriceSubmissionOutcome::NotSynced);
        }
        if !self.is_eligible(node).await.map_err(WatchtowerError::Query)? {
            return Ok(PriceSubmissionOutcome::NotEligible);
        }

        if let Some(rate_relay) = &self.rate_relay {
            if let Err(err) = rate_relay.run_once().await {
                tracing::warn!("Error submitting Optimism price: {err}");
            }
        }

        tracing::info!("Checking for RPL price checkpoint...");
        let (reportable_block, prices_block) = self
            .reportable_block()
            .await
            .map_err(WatchtowerError::Query)?;
        METRICS.prices_block.set(prices_block.0);
        if reportable_block <= prices_block {
            tracing::debug!(
                "Prices are already recorded for the latest reportable block {reportable_block}"
            );
            return Ok(PriceSubmissionOutcome::NothingToReport {
                reportable_block,
                prices_block,
            });
        }

        let block = reportable_block;
        let reportability = self
            .check_finality(block)
            .await
            .map_err(WatchtowerError::Query)?;
        if let Reportability::Pending {
            epoch,
            finalized_epoch,
        } = reportability
        {
            tracing::info!(
                "Prices must be reported for EL block {block}, waiting until epoch {epoch} \
                 is finalized (currently {finalized_epoch})"
            );
            return Ok(PriceSubmissionOutcome::AwaitingFinality {
                block,
                epoch,
                finalized_epoch,
            });
        }

        tracing::info!("Getting RPL price for block {block}...");
        let report = self
            .price_report(block)
            .await
            .map_err(WatchtowerError::Query)?;
        tracing::info!("RPL price: {} ETH", format_eth(report.rpl_price));

        let values = [report.rpl_price, report.effective_rpl_stake];
        let ledger_status = run_step(
            self.step_timeout,
            "submission_ledger",
            SubmissionLedger::PRICES.status(&self.context, node, block, &values),
        )
        .await
        .map_err(WatchtowerError::Query)?;
        match ledger_status {
            LedgerStatus::Submitted => {
                tracing::debug!("Prices for block {block} are already submitted by this node");
                return Ok(PriceSubmissionOutcome::AlreadySubmitted { block });
            }
            LedgerStatus::Outdated => {
                tracing::info!(
                    "Have previously submitted out-of-date prices for block {block}, trying again..."
                );
            }
            LedgerStatus::Absent => {}
        }

        self.submit(report).await
    }

    #[tracing::instrument(skip_all)]
    async fn is_syncing(&self) -> anyhow::Result<bool> {
        run_step(self.step_timeout, "syncing", self.context.client().syncing()).await
    }

    #[tracing::instrument(skip_all, fields(node = ?node))]
    async fn is_eligible(&self, node: Address) -> anyhow::Result<bool> {
        let (is_member, submissions_enabled) = futures::try_join!(
            run_step(
                self.step_timeout,
                "member_exists",
                trusted_node::member_exists(&self.context, node, None),
            ),
            run_step(
                self.step_timeout,
                "submit_prices_enabled",
                settings::submit_prices_enabled(&self.context, None),
            ),
        )?;
        if !is_member {
            tracing::debug!("Node is not a trusted member, skipping RPL price submission");
        } else if !submissions_enabled {
            tracing::debug!("Price submissions are disabled, skipping RPL price submission");
        }
        Ok(is_member && submissions_enabled)
    }

    #[tracing::instrument(skip_all)]
    async fn reportable_block(&self) -> anyhow::Result<(L1BlockNumber, L1BlockNumber)> {
        futures::try_join!(
            run_step(
                self.step_timeout,
                "latest_reportable_block",
                network::latest_reportable_prices_block(&self.context, None),
            ),
            run_step(
                self.step_timeout,
                "prices_block",
                network::prices_block(&self.context, None),
            ),
        )
    }

    #[tracing::instrument(skip(self))]
    async fn check_finality(&self, block: L1BlockNumber) -> anyhow::Result<Reportability> {
        let header = run_step(
            self.step_timeout,
            "block_header",
            self.context.client().block(block.into()),
        )
        .await?
        .with_context(|| format!("block {block} is not known to the execution client"))?;
        let (eth2_config, finalized_epoch) = futures::try_join!(
            run_step(self.step_timeout, "eth2_config", self.beacon.eth2_config()),
            run_step(
                self.step_timeout,
                "finalized_epoch",
                self.beacon.finalized_epoch()
            ),
        )?;
        Ok(FinalityGate::new(eth2_config).check(header.timestamp.as_u64(), finalized_epoch))
    }

    /// Reads the price and the effective stake pinned at `block`. Both values are read through
    /// the same client; the archive client is used if the primary one fails to serve the block
    /// (e.g., because its state is pruned).
    #[tracing::instrument(skip(self))]
    async fn price_report(&self, block: L1BlockNumber) -> anyhow::Result<PriceReport> {
        let primary = oracle::rpl_rate_to_eth(&self.context, self.price_oracle, Some(block));
        let primary_result = run_step(self.step_timeout, "rpl_price", primary).await;
        let (context, rpl_price) = match (primary_result, &self.archive_context) {
            (Ok(price), _) => (&*self.context, price),
            (Err(err), Some(archive_context)) if is_gateway_error(&err) => {
                tracing::warn!(
                    "Primary execution client failed reading RPL price at block {block}, \
                     using the archive client: {err:#}"
                );
                let archive =
                    oracle::rpl_rate_to_eth(archive_context, self.price_oracle, Some(block));
                let price = run_step(self.step_timeout, "archive_rpl_price", archive)
                    .await
                    .context("archive client failed reading RPL price")?;
                (archive_context, price)
            }
            (Err(err), _) => return Err(err),
        };

        let effective_rpl_stake = run_step(
            self.step_timeout,
            "effective_rpl_stake",
            node::total_effective_rpl_stake(context, 0, 0, rpl_price, Some(block)),
        )
        .await?;
        Ok(PriceReport {
            block,
            rpl_price,
            effective_rpl_stake,
        })
    }

    #[tracing::instrument(skip_all, fields(block = %report.block))]
    async fn submit(&self, report: PriceReport) -> Result<PriceSubmissionOutcome, WatchtowerError> {
        let block = report.block;
        tracing::info!("Submitting RPL price for block {block}...");
        let call = run_step(
            self.step_timeout,
            "prepare_submit_prices",
            network::submit_prices(
                &self.context,
                block,
                report.rpl_price,
                report.effective_rpl_stake,
            ),
        )
        .await
        .map_err(WatchtowerError::Query)?;

        match self.sender.send(&call).await? {
            SendOutcome::FeeAboveCap => Ok(PriceSubmissionOutcome::FeeAboveCap { block }),
            SendOutcome::Mined { tx_hash, .. } => {
                tracing::info!("Successfully submitted RPL price for block {block}.");
                Ok(PriceSubmissionOutcome::Submitted { block, tx_hash })
            }
        }
    }
}

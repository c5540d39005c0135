//! Gas limit and fee selection for watchtower transactions.

use std::time::Duration;

use anyhow::Context as _;
use stader_basic_types::{
    units::{format_eth, wei_to_gwei},
    CallRequest, U256,
};
use stader_config::configs::GasConfig;
use stader_eth_client::EthInterface;

use crate::{step::run_step, WatchtowerError};

/// Fees and gas limit of a transaction that may be sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TxFees {
    pub gas_limit: U256,
    pub max_fee_per_gas: U256,
    pub max_priority_fee_per_gas: U256,
}

/// Outcome of gas negotiation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GasDecision {
    Proceed(TxFees),
    /// The network currently requires a higher fee than the configured cap.
    AboveCap { required_fee: U256, max_fee: U256 },
}

/// Applies the configured fee cap and gas limit policy.
#[derive(Debug, Clone)]
pub struct GasNegotiator {
    config: GasConfig,
}

impl GasNegotiator {
    pub fn new(config: GasConfig) -> Self {
        Self { config }
    }

    /// Returns the estimate clamped to the max gas limit, and the limit to actually use.
    pub fn gas_limits(&self, estimate: U256) -> (U256, U256) {
        let max_gas_limit = self.config.max_gas_limit;
        let estimate = estimate.min(max_gas_limit.into()).as_u64();
        let safe_limit = (estimate as f64 * self.config.gas_limit_multiplier) as u64;
        (estimate.into(), safe_limit.min(max_gas_limit).into())
    }

    /// Estimates gas for `request` and decides whether it may be sent under the configured caps.
    pub async fn negotiate(
        &self,
        client: &dyn EthInterface,
        request: CallRequest,
        step_timeout: Duration,
    ) -> Result<GasDecision, WatchtowerError> {
        let estimate = run_step(step_timeout, "estimate_gas", client.estimate_gas(request))
            .await
            .context("could not estimate the gas required to submit the transaction")
            .map_err(WatchtowerError::Submission)?;
        let base_fee = run_step(
            step_timeout,
            "pending_base_fee",
            client.get_pending_block_base_fee_per_gas(),
        )
        .await
        .map_err(WatchtowerError::Query)?;

        let max_fee = self.config.max_fee_per_gas();
        let max_priority_fee = self.config.max_priority_fee_per_gas();
        let required_fee = base_fee + max_priority_fee;
        if required_fee > max_fee {
            tracing::warn!(
                "Current network fee is {:.2} gwei, which is higher than the max fee of {:.2} gwei. \
                 Aborting the transaction",
                wei_to_gwei(required_fee),
                wei_to_gwei(max_fee)
            );
            return Ok(GasDecision::AboveCap {
                required_fee,
                max_fee,
            });
        }

        let (estimated_limit, safe_limit) = self.gas_limits(estimate);
        tracing::info!(
            "Estimated gas limit is {estimated_limit}, safe gas limit is {safe_limit}. \
             The transaction will use a max fee of {:.6} gwei, for a total of up to {} - {} ETH",
            wei_to_gwei(max_fee),
            format_eth(estimated_limit * max_fee),
            format_eth(safe_limit * max_fee)
        );
        Ok(GasDecision::Proceed(TxFees {
            gas_limit: safe_limit,
            max_fee_per_gas: max_fee,
            max_priority_fee_per_gas: max_priority_fee,
        }))
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use stader_basic_types::units::gwei_to_wei;
    use stader_eth_client::clients::MockEthereum;

    use super::*;

    const TIMEOUT: Duration = Duration::from_secs(5);

    fn negotiator() -> GasNegotiator {
        GasNegotiator::new(GasConfig {
            max_fee_per_gas_gwei: 50.0,
            max_priority_fee_per_gas_gwei: 2.0,
            ..GasConfig::default()
        })
    }

    #[test]
    fn gas_limits_are_clamped() {
        let negotiator = negotiator();
        assert_eq!(
            negotiator.gas_limits(100_000.into()),
            (100_000.into(), 150_000.into())
        );
        assert_eq!(
            negotiator.gas_limits(25_000_000.into()),
            (25_000_000.into(), 30_000_000.into())
        );
        assert_eq!(
            negotiator.gas_limits(U256::MAX),
            (30_000_000.into(), 30_000_000.into())
        );
    }

    #[tokio::test]
    async fn fees_within_cap() {
        let client = MockEthereum::default()
            .with_base_fee(gwei_to_wei(20.0))
            .with_gas_estimate(200_000.into());
        let decision = negotiator()
            .negotiate(&client, CallRequest::default(), TIMEOUT)
            .await
            .unwrap();
        assert_eq!(
            decision,
            GasDecision::Proceed(TxFees {
                gas_limit: 300_000.into(),
                max_fee_per_gas: gwei_to_wei(50.0),
                max_priority_fee_per_gas: gwei_to_wei(2.0),
            })
        );
    }

    #[tokio::test]
    async fn fees_above_cap() {
        let client = MockEthereum::default().with_base_fee(gwei_to_wei(49.0));
        let decision = negotiator()
            .negotiate(&client, CallRequest::default(), TIMEOUT)
            .await
            .unwrap();
        assert_eq!(
            decision,
            GasDecision::AboveCap {
                required_fee: gwei_to_wei(51.0),
                max_fee: gwei_to_wei(50.0),
            }
        );
    }

    #[tokio::test]
    async fn failed_estimation_is_a_submission_error() {
        let client = MockEthereum::default().with_failing_gas_estimate("execution reverted");
        let err = negotiator()
            .negotiate(&client, CallRequest::default(), TIMEOUT)
            .await
            .unwrap_err();
        assert_matches!(err, WatchtowerError::Submission(_));
        assert!(err.to_string().contains("execution reverted"), "{err}");
    }
}

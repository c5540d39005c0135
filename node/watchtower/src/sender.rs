use std::time::Duration;

use anyhow::Context as _;
use stader_basic_types::{Address, H256, U64};
use stader_eth_client::{BoundEthInterface, ContractCall, Options};

use crate::{
    gas::{GasDecision, GasNegotiator},
    metrics::METRICS,
    step::run_step,
    tx_waiter::TransactionWaiter,
    WatchtowerError,
};

/// Result of an attempt to send a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    Mined {
        tx_hash: H256,
        block_number: Option<U64>,
    },
    /// The transaction wasn't sent because of the fee cap.
    FeeAboveCap,
}

/// Sends contract transactions from the node account: negotiates gas, signs, broadcasts
/// and waits for inclusion.
#[derive(Debug)]
pub struct TransactionSender {
    eth_client: Box<dyn BoundEthInterface>,
    gas: GasNegotiator,
    waiter: TransactionWaiter,
    step_timeout: Duration,
}

impl TransactionSender {
    pub fn new(
        eth_client: Box<dyn BoundEthInterface>,
        gas: GasNegotiator,
        waiter: TransactionWaiter,
        step_timeout: Duration,
    ) -> Self {
        Self {
            eth_client,
            gas,
            waiter,
            step_timeout,
        }
    }

    /// Address of the node account.
    pub fn sender_account(&self) -> Address {
        self.eth_client.sender_account()
    }

    pub async fn send(&self, call: &ContractCall) -> Result<SendOutcome, WatchtowerError> {
        let function = call.function_name().to_owned();
        let data = call
            .encode_input()
            .with_context(|| format!("failed encoding `{function}` call"))
            .map_err(WatchtowerError::Query)?;
        let mut request = call
            .to_call_request()
            .with_context(|| format!("failed encoding `{function}` call"))
            .map_err(WatchtowerError::Query)?;
        request.from = Some(self.sender_account());

        let client = (*self.eth_client).as_ref();
        let fees = match self.gas.negotiate(client, request, self.step_timeout).await? {
            GasDecision::Proceed(fees) => fees,
            GasDecision::AboveCap { .. } => return Ok(SendOutcome::FeeAboveCap),
        };

        let options = Options {
            gas: Some(fees.gas_limit),
            max_fee_per_gas: Some(fees.max_fee_per_gas),
            max_priority_fee_per_gas: Some(fees.max_priority_fee_per_gas),
            ..Options::default()
        };
        let signed_tx = run_step(
            self.step_timeout,
            "sign_tx",
            self.eth_client
                .sign_prepared_tx_for_addr(data, call.contract_address(), options),
        )
        .await
        .with_context(|| format!("cannot sign a `{function}` transaction"))
        .map_err(WatchtowerError::Submission)?;
        let status = self
            .waiter
            .send_and_wait(client, signed_tx)
            .await
            .with_context(|| format!("`{function}` transaction failed"))
            .map_err(WatchtowerError::Submission)?;

        METRICS.confirmed_txs[&function].inc();
        Ok(SendOutcome::Mined {
            tx_hash: status.tx_hash,
            block_number: status.receipt.block_number,
        })
    }
}

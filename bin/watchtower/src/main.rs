use std::{num::NonZeroU64, sync::Arc};

use anyhow::Context as _;
use clap::Parser;
use stader_beacon_client::HttpBeaconClient;
use stader_config::{
    BeaconClientConfig, ContractsConfig, EthClientConfig, GasConfig, ObservabilityConfig,
    WalletConfig, WatchtowerConfig,
};
use stader_env_config::FromEnv;
use stader_eth_client::{
    clients::{PKSigningClient, QueryClient},
    BoundEthInterface, EthInterface,
};
use stader_protocol::ProtocolContext;
use stader_vlog::{prometheus::PrometheusExporterConfig, Logs, ObservabilityBuilder};
use stader_watchtower::{
    GasNegotiator, OptimismRateRelay, SubmitRplPrice, TransactionSender, TransactionWaiter,
    TurnScheduler, Watchtower,
};
use tokio::sync::watch;

#[derive(Debug, Parser)]
#[command(author = "Stader Labs", version, about = "Stader node watchtower", long_about = None)]
struct Cli {
    /// Run a single iteration of the watchtower tasks and exit.
    #[arg(long)]
    once: bool,
}

#[derive(Debug)]
struct Configs {
    watchtower: WatchtowerConfig,
    eth_client: EthClientConfig,
    beacon_client: BeaconClientConfig,
    gas: GasConfig,
    contracts: ContractsConfig,
    wallet: WalletConfig,
}

impl Configs {
    fn from_env() -> anyhow::Result<Self> {
        Ok(Self {
            watchtower: WatchtowerConfig::from_env().context("WatchtowerConfig")?,
            eth_client: EthClientConfig::from_env().context("EthClientConfig")?,
            beacon_client: BeaconClientConfig::from_env().context("BeaconClientConfig")?,
            gas: GasConfig::from_env().context("GasConfig")?,
            contracts: ContractsConfig::from_env().context("ContractsConfig")?,
            wallet: WalletConfig::from_env().context("WalletConfig")?,
        })
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let opt = Cli::parse();

    let observability_config =
        ObservabilityConfig::from_env().context("ObservabilityConfig")?;
    let logs = Logs::new(&observability_config.log_format)?
        .with_log_directives(observability_config.log_directives.clone());
    ObservabilityBuilder::new().with_logs(Some(logs)).try_build()?;

    let configs = Configs::from_env()?;
    let submit_rpl_price = build_price_task(&configs).await?;
    if opt.once {
        let outcome = submit_rpl_price.run_once().await?;
        tracing::info!("Watchtower iteration finished: {outcome:?}");
        return Ok(());
    }

    let (stop_sender, stop_receiver) = watch::channel(false);
    let watchtower = Watchtower::new(submit_rpl_price, configs.watchtower.poll_interval());
    let mut watchtower_task = tokio::spawn(watchtower.run(stop_receiver.clone()));
    let exporter_task = observability_config
        .prometheus_port
        .map(|port| tokio::spawn(PrometheusExporterConfig::pull(port).run(stop_receiver)));

    let finished_result = tokio::select! {
        signal = tokio::signal::ctrl_c() => {
            signal.context("failed listening for Ctrl+C")?;
            tracing::info!("Stop signal received, shutting down");
            None
        }
        result = &mut watchtower_task => Some(result),
    };
    stop_sender.send_replace(true);

    let watchtower_result = match finished_result {
        Some(result) => result,
        None => watchtower_task.await,
    };
    if let Some(exporter_task) = exporter_task {
        exporter_task
            .await
            .context("Prometheus exporter panicked")??;
    }
    watchtower_result.context("watchtower panicked")?
}

async fn build_price_task(configs: &Configs) -> anyhow::Result<SubmitRplPrice> {
    let watchtower_config = &configs.watchtower;
    let eth_config = &configs.eth_client;
    let step_timeout = watchtower_config.step_timeout();

    let query_client = QueryClient::new(&eth_config.web3_url, eth_config.request_timeout())
        .context("failed creating execution client")?
        .for_component("watchtower");
    let chain_id = query_client
        .fetch_chain_id()
        .await
        .context("failed fetching chain ID")?;
    anyhow::ensure!(
        chain_id == eth_config.chain_id(),
        "execution client is connected to chain {chain_id}, expected {}",
        eth_config.chain_id()
    );

    let signing_client = PKSigningClient::new_raw(
        configs.wallet.private_key,
        configs.gas.max_priority_fee_per_gas(),
        eth_config.chain_id(),
        Box::new(query_client.clone()),
    )
    .context("invalid node wallet private key")?;
    if let Some(expected_address) = configs.wallet.address {
        anyhow::ensure!(
            signing_client.sender_account() == expected_address,
            "node wallet private key doesn't correspond to the configured address {expected_address:?}"
        );
    }

    let context = Arc::new(ProtocolContext::new(
        Box::new(query_client),
        configs.contracts.storage_addr,
    ));
    let beacon = HttpBeaconClient::from_config(&configs.beacon_client)
        .context("failed creating beacon client")?;
    let waiter = TransactionWaiter::new(
        watchtower_config.receipt_checking_max_attempts,
        watchtower_config.receipt_checking_sleep(),
        step_timeout,
    );
    let sender = Arc::new(TransactionSender::new(
        Box::new(signing_client),
        GasNegotiator::new(configs.gas.clone()),
        waiter,
        step_timeout,
    ));

    let mut task = SubmitRplPrice::new(
        context.clone(),
        Arc::new(beacon),
        sender.clone(),
        configs.contracts.price_oracle_addr,
        step_timeout,
    );
    if let Some(archive_url) = &eth_config.archive_web3_url {
        let archive_client = QueryClient::new(archive_url, eth_config.request_timeout())
            .context("failed creating archive execution client")?
            .for_component("watchtower_archive");
        task = task.with_archive_context(context.for_client(Box::new(archive_client)));
    }
    if let Some(messenger) = configs.contracts.optimism_messenger_addr {
        let turn_blocks = NonZeroU64::new(watchtower_config.rate_relay_turn_blocks)
            .context("rate relay turn window must be positive")?;
        let rate_relay = OptimismRateRelay::new(
            context,
            sender,
            messenger,
            TurnScheduler::new(turn_blocks),
            step_timeout,
        );
        task = task.with_rate_relay(rate_relay);
    } else {
        tracing::info!("Optimism messenger is not configured, rate relay is disabled");
    }
    Ok(task)
}

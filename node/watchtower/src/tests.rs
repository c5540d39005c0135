//! Scenario tests for the watchtower tasks against a mock protocol deployment.

use std::{num::NonZeroU64, sync::Arc, time::Duration};

use assert_matches::assert_matches;
use stader_basic_types::{
    abi::Tokenizable, ethabi::Token, units::gwei_to_wei, Address, BlockId, Epoch, L1BlockNumber,
    U256,
};
use stader_beacon_client::{Eth2Config, MockBeaconClient};
use stader_config::configs::GasConfig;
use stader_contracts::{
    dao_node_trusted_contract, dao_protocol_settings_network_contract, network_prices_contract,
    node_staking_contract, price_messenger_contract, price_oracle_contract, ContractName,
};
use stader_eth_client::{clients::MockEthereum, EnrichedClientError};
use stader_protocol::{
    testonly::{MockChain, STORAGE_ADDRESS},
    ProtocolContext,
};
use test_casing::test_casing;
use tokio::sync::watch;

use super::*;

const PRICES_ADDRESS: Address = Address::repeat_byte(0x01);
const DAO_ADDRESS: Address = Address::repeat_byte(0xda);
const SETTINGS_ADDRESS: Address = Address::repeat_byte(0x5e);
const NODE_STAKING_ADDRESS: Address = Address::repeat_byte(0x05);
const RPL_TOKEN_ADDRESS: Address = Address::repeat_byte(0x70);
const ORACLE_ADDRESS: Address = Address::repeat_byte(0x0c);
const MESSENGER_ADDRESS: Address = Address::repeat_byte(0x0e);

const NODE: Address = MockEthereum::SENDER_ACCOUNT;
const REPORTABLE_BLOCK: L1BlockNumber = L1BlockNumber(5_760);
/// Block timestamp of `REPORTABLE_BLOCK`; belongs to slot 333 and epoch 10.
const REPORTABLE_BLOCK_TIMESTAMP: u64 = 4_000;
/// `(5_850 / 75) % 4 == 2`, i.e., the turn of the member with index 2.
const CURRENT_BLOCK: u64 = 5_850;
const STEP_TIMEOUT: Duration = Duration::from_secs(10);

fn rpl_price() -> U256 {
    U256::from(7_500_000_000_000_000_u64)
}

fn effective_rpl_stake() -> U256 {
    U256::from(1_234_567) * U256::exp10(18)
}

fn gateway_error() -> EnrichedClientError {
    EnrichedClientError::custom("missing trie node", "eth_call")
}

/// How the oracle responds to a pinned price read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PriceRead {
    Available,
    /// The node can't serve the state at the reportable block.
    Pruned,
    /// The node returns output that can't be decoded.
    Malformed,
}

#[derive(Debug, Clone)]
struct ChainParams {
    is_member: bool,
    submissions_enabled: bool,
    prices_block: L1BlockNumber,
    price_read: PriceRead,
    members: Vec<Address>,
    rate_stale: Option<bool>,
}

impl Default for ChainParams {
    fn default() -> Self {
        Self {
            is_member: true,
            submissions_enabled: true,
            prices_block: L1BlockNumber(5_000),
            price_read: PriceRead::Available,
            members: vec![
                Address::repeat_byte(0xa0),
                Address::repeat_byte(0xa1),
                NODE,
                Address::repeat_byte(0xa3),
            ],
            rate_stale: Some(false),
        }
    }
}

fn assert_pinned(block: BlockId) {
    assert_eq!(block, BlockId::from(REPORTABLE_BLOCK));
}

fn mock_chain(params: &ChainParams) -> MockChain {
    let ChainParams {
        is_member,
        submissions_enabled,
        prices_block,
        price_read,
        members,
        rate_stale,
    } = params.clone();
    let member_count = members.len();

    MockChain::new()
        .with_contract(ContractName::NetworkPrices, PRICES_ADDRESS)
        .with_contract(ContractName::DaoNodeTrusted, DAO_ADDRESS)
        .with_contract(ContractName::DaoProtocolSettingsNetwork, SETTINGS_ADDRESS)
        .with_contract(ContractName::NodeStaking, NODE_STAKING_ADDRESS)
        .with_contract(ContractName::TokenRpl, RPL_TOKEN_ADDRESS)
        .with_view(DAO_ADDRESS, dao_node_trusted_contract(), "getMemberExists", move |args, _| {
            assert_eq!(args, [Token::Address(NODE)]);
            is_member.into_token()
        })
        .with_view(DAO_ADDRESS, dao_node_trusted_contract(), "getMemberCount", move |_, _| {
            U256::from(member_count).into_token()
        })
        .with_view(DAO_ADDRESS, dao_node_trusted_contract(), "getMemberAt", move |args, _| {
            let index = U256::from_token(args[0].clone()).unwrap().as_usize();
            members[index].into_token()
        })
        .with_view(
            SETTINGS_ADDRESS,
            dao_protocol_settings_network_contract(),
            "getSubmitPricesEnabled",
            move |_, _| submissions_enabled.into_token(),
        )
        .with_view(
            PRICES_ADDRESS,
            network_prices_contract(),
            "getLatestReportableBlock",
            |_, _| U256::from(REPORTABLE_BLOCK.0).into_token(),
        )
        .with_view(PRICES_ADDRESS, network_prices_contract(), "getPricesBlock", move |_, _| {
            U256::from(prices_block.0).into_token()
        })
        .with_fallible_view(
            ORACLE_ADDRESS,
            price_oracle_contract(),
            "getRateToEth",
            move |args, block| {
                assert_eq!(args, [Token::Address(RPL_TOKEN_ADDRESS), Token::Bool(true)]);
                assert_pinned(block);
                match price_read {
                    PriceRead::Available => Ok(rpl_price().into_token()),
                    PriceRead::Pruned => Err(gateway_error()),
                    PriceRead::Malformed => Ok(Token::Tuple(vec![])),
                }
            },
        )
        .with_view(
            NODE_STAKING_ADDRESS,
            node_staking_contract(),
            "calculateTotalEffectiveRPLStake",
            |args, block| {
                assert_eq!(
                    args,
                    [
                        Token::Uint(0.into()),
                        Token::Uint(0.into()),
                        Token::Uint(rpl_price())
                    ]
                );
                assert_pinned(block);
                effective_rpl_stake().into_token()
            },
        )
        .with_fallible_view(
            MESSENGER_ADDRESS,
            price_messenger_contract(),
            "rateStale",
            move |_, _| rate_stale.map(Tokenizable::into_token).ok_or_else(gateway_error),
        )
}

#[derive(Debug)]
struct TestEnv {
    chain: MockChain,
    client: MockEthereum,
    beacon: MockBeaconClient,
    context: Arc<ProtocolContext>,
    sender: Arc<TransactionSender>,
}

impl TestEnv {
    fn new(params: ChainParams) -> Self {
        Self::with_client(params, MockEthereum::default().with_auto_mining(true))
    }

    fn with_client(params: ChainParams, client: MockEthereum) -> Self {
        let chain = mock_chain(&params);
        let client = chain.install(
            client
                .with_block_number(CURRENT_BLOCK)
                .with_block_timestamp(REPORTABLE_BLOCK.0, REPORTABLE_BLOCK_TIMESTAMP),
        );
        let beacon = MockBeaconClient::new(Eth2Config::new(0, 12, 32).unwrap());
        beacon.set_finalized_epoch(Epoch(10));

        let context = Arc::new(ProtocolContext::new(
            Box::new(client.clone()),
            STORAGE_ADDRESS,
        ));
        let waiter = TransactionWaiter::new(3, Duration::from_millis(10), STEP_TIMEOUT);
        let sender = Arc::new(TransactionSender::new(
            Box::new(client.clone()),
            GasNegotiator::new(GasConfig::default()),
            waiter,
            STEP_TIMEOUT,
        ));
        Self {
            chain,
            client,
            beacon,
            context,
            sender,
        }
    }

    fn task(&self) -> SubmitRplPrice {
        SubmitRplPrice::new(
            self.context.clone(),
            Arc::new(self.beacon.clone()),
            self.sender.clone(),
            ORACLE_ADDRESS,
            STEP_TIMEOUT,
        )
    }

    fn relay(&self) -> OptimismRateRelay {
        let scheduler = TurnScheduler::new(NonZeroU64::new(75).unwrap());
        OptimismRateRelay::new(
            self.context.clone(),
            self.sender.clone(),
            MESSENGER_ADDRESS,
            scheduler,
            STEP_TIMEOUT,
        )
    }

    fn called_functions(&self) -> Vec<String> {
        self.chain
            .calls()
            .into_iter()
            .filter(|call| call.address != STORAGE_ADDRESS)
            .map(|call| call.function)
            .collect()
    }
}

fn expected_submit_prices_input() -> Vec<u8> {
    network_prices_contract()
        .function("submitPrices")
        .unwrap()
        .encode_input(&[
            Token::Uint(REPORTABLE_BLOCK.0.into()),
            Token::Uint(rpl_price()),
            Token::Uint(effective_rpl_stake()),
        ])
        .unwrap()
}

#[tokio::test]
async fn submitting_price_for_finalized_block() {
    let env = TestEnv::new(ChainParams::default());
    let outcome = env.task().run_once().await.unwrap();
    assert_matches!(
        outcome,
        PriceSubmissionOutcome::Submitted { block, .. } if block == REPORTABLE_BLOCK
    );

    let sent_txs = env.client.sent_txs();
    assert_eq!(sent_txs.len(), 1);
    let tx = &sent_txs[0];
    assert_eq!(tx.recipient, PRICES_ADDRESS);
    assert_eq!(tx.input, expected_submit_prices_input());
    assert_eq!(tx.gas, 150_000.into());
    assert_eq!(tx.max_fee_per_gas, gwei_to_wei(150.0));
    assert_eq!(tx.max_priority_fee_per_gas, gwei_to_wei(2.0));

    let functions = env.called_functions();
    assert!(functions.contains(&"getRateToEth".to_owned()), "{functions:?}");
    assert!(
        functions.contains(&"calculateTotalEffectiveRPLStake".to_owned()),
        "{functions:?}"
    );
}

#[tokio::test]
async fn waiting_for_finality() {
    let env = TestEnv::new(ChainParams::default());
    env.beacon.set_finalized_epoch(Epoch(9));

    let outcome = env.task().run_once().await.unwrap();
    assert_eq!(
        outcome,
        PriceSubmissionOutcome::AwaitingFinality {
            block: REPORTABLE_BLOCK,
            epoch: Epoch(10),
            finalized_epoch: Epoch(9),
        }
    );
    assert_eq!(env.client.sent_tx_count(), 0);
    assert!(!env.called_functions().contains(&"getRateToEth".to_owned()));

    // The boundary epoch is reportable.
    env.beacon.set_finalized_epoch(Epoch(10));
    let outcome = env.task().run_once().await.unwrap();
    assert_matches!(outcome, PriceSubmissionOutcome::Submitted { .. });
}

#[tokio::test]
async fn nothing_to_report() {
    let env = TestEnv::new(ChainParams {
        prices_block: REPORTABLE_BLOCK,
        ..ChainParams::default()
    });
    let outcome = env.task().run_once().await.unwrap();
    assert_eq!(
        outcome,
        PriceSubmissionOutcome::NothingToReport {
            reportable_block: REPORTABLE_BLOCK,
            prices_block: REPORTABLE_BLOCK,
        }
    );
    assert_eq!(env.client.sent_tx_count(), 0);
}

#[test_casing(3, [(false, true), (true, false), (false, false)])]
#[tokio::test]
async fn ineligible_node_does_nothing(is_member: bool, submissions_enabled: bool) {
    let env = TestEnv::new(ChainParams {
        is_member,
        submissions_enabled,
        ..ChainParams::default()
    });
    let outcome = env.task().with_rate_relay(env.relay()).run_once().await.unwrap();
    assert_eq!(outcome, PriceSubmissionOutcome::NotEligible);

    let mut functions = env.called_functions();
    functions.sort();
    assert_eq!(functions, ["getMemberExists", "getSubmitPricesEnabled"]);
    assert_eq!(env.client.sent_tx_count(), 0);
}

#[tokio::test]
async fn syncing_client_is_skipped() {
    let env = TestEnv::new(ChainParams::default());
    env.client.set_syncing(true);
    let outcome = env.task().run_once().await.unwrap();
    assert_eq!(outcome, PriceSubmissionOutcome::NotSynced);
    assert!(env.chain.calls().is_empty());
}

#[tokio::test]
async fn already_submitted_values_are_not_resubmitted() {
    let env = TestEnv::new(ChainParams::default());
    let ledger = SubmissionLedger::PRICES;
    env.chain
        .set_storage_bool(ledger.coarse_key(NODE, REPORTABLE_BLOCK), true);
    env.chain.set_storage_bool(
        ledger.fine_key(NODE, REPORTABLE_BLOCK, &[rpl_price(), effective_rpl_stake()]),
        true,
    );

    let outcome = env.task().run_once().await.unwrap();
    assert_eq!(
        outcome,
        PriceSubmissionOutcome::AlreadySubmitted {
            block: REPORTABLE_BLOCK
        }
    );
    assert_eq!(env.client.sent_tx_count(), 0);
}

#[tokio::test]
async fn outdated_submission_is_retried() {
    let env = TestEnv::new(ChainParams::default());
    env.chain.set_storage_bool(
        SubmissionLedger::PRICES.coarse_key(NODE, REPORTABLE_BLOCK),
        true,
    );

    let outcome = env.task().run_once().await.unwrap();
    assert_matches!(outcome, PriceSubmissionOutcome::Submitted { .. });
    assert_eq!(env.client.sent_txs()[0].input, expected_submit_prices_input());
}

#[tokio::test]
async fn fee_above_cap_aborts_submission() {
    let client = MockEthereum::default()
        .with_auto_mining(true)
        .with_base_fee(gwei_to_wei(200.0));
    let env = TestEnv::with_client(ChainParams::default(), client);

    let outcome = env.task().run_once().await.unwrap();
    assert_eq!(
        outcome,
        PriceSubmissionOutcome::FeeAboveCap {
            block: REPORTABLE_BLOCK
        }
    );
    assert_eq!(env.client.sent_tx_count(), 0);
}

#[tokio::test]
async fn reverted_submission_is_alerting_error() {
    let client = MockEthereum::default().with_auto_mining(false);
    let env = TestEnv::with_client(ChainParams::default(), client);

    let err = env.task().run_once().await.unwrap_err();
    assert_matches!(err, WatchtowerError::Submission(_));
    assert!(err.is_alerting());
    assert!(err.to_string().contains("submitPrices"), "{err}");
    assert_eq!(env.client.sent_tx_count(), 1);
}

#[tokio::test]
async fn failed_read_is_query_error() {
    let env = TestEnv::new(ChainParams {
        price_read: PriceRead::Pruned,
        ..ChainParams::default()
    });

    let err = env.task().run_once().await.unwrap_err();
    assert_matches!(err, WatchtowerError::Query(_));
    assert!(!err.is_alerting());
    assert!(err.to_string().contains("missing trie node"), "{err}");
    assert_eq!(env.client.sent_tx_count(), 0);
}

#[tokio::test]
async fn pinned_reads_fall_back_to_archive_client() {
    let env = TestEnv::new(ChainParams {
        price_read: PriceRead::Pruned,
        ..ChainParams::default()
    });
    let archive_chain = mock_chain(&ChainParams::default());
    let archive_context = env.context.for_client(Box::new(archive_chain.client()));

    let outcome = env
        .task()
        .with_archive_context(archive_context)
        .run_once()
        .await
        .unwrap();
    assert_matches!(outcome, PriceSubmissionOutcome::Submitted { .. });
    assert_eq!(env.client.sent_txs()[0].input, expected_submit_prices_input());

    let archive_functions: Vec<_> = archive_chain
        .calls()
        .into_iter()
        .filter(|call| call.address != STORAGE_ADDRESS)
        .map(|call| call.function)
        .collect();
    assert_eq!(
        archive_functions,
        ["getRateToEth", "calculateTotalEffectiveRPLStake"]
    );
    assert!(!env
        .called_functions()
        .contains(&"calculateTotalEffectiveRPLStake".to_owned()));
}

#[tokio::test]
async fn malformed_price_is_not_read_from_archive_client() {
    let env = TestEnv::new(ChainParams {
        price_read: PriceRead::Malformed,
        ..ChainParams::default()
    });
    let archive_chain = mock_chain(&ChainParams::default());
    let archive_context = env.context.for_client(Box::new(archive_chain.client()));

    let err = env
        .task()
        .with_archive_context(archive_context)
        .run_once()
        .await
        .unwrap_err();
    assert_matches!(err, WatchtowerError::Query(_));
    assert!(err.to_string().contains("decoding"), "{err}");
    assert_eq!(archive_chain.call_count(ORACLE_ADDRESS), 0);
    assert_eq!(env.client.sent_tx_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn hanging_nonce_read_times_out_signing() {
    let client = MockEthereum::default()
        .with_auto_mining(true)
        .with_stalled_nonce_reads();
    let env = TestEnv::with_client(ChainParams::default(), client);

    let err = env.task().run_once().await.unwrap_err();
    assert_matches!(err, WatchtowerError::Submission(_));
    assert!(err.to_string().contains("`sign_tx` timed out"), "{err}");
    assert_eq!(env.client.sent_tx_count(), 0);
}

#[tokio::test]
async fn relaying_stale_rate_on_my_turn() {
    let env = TestEnv::new(ChainParams {
        rate_stale: Some(true),
        ..ChainParams::default()
    });

    let outcome = env.relay().run_once().await.unwrap();
    assert_matches!(
        outcome,
        RelayOutcome::Submitted { block, .. } if block == L1BlockNumber(CURRENT_BLOCK)
    );
    let sent_txs = env.client.sent_txs();
    assert_eq!(sent_txs.len(), 1);
    assert_eq!(sent_txs[0].recipient, MESSENGER_ADDRESS);
    let submit_rate = price_messenger_contract().function("submitRate").unwrap();
    assert_eq!(sent_txs[0].input, submit_rate.short_signature());

    // The member list is read at the block used for the turn decision.
    let member_reads: Vec<_> = env
        .chain
        .calls()
        .into_iter()
        .filter(|call| call.address == DAO_ADDRESS)
        .collect();
    assert_eq!(member_reads.len(), 5);
    assert!(member_reads
        .iter()
        .all(|call| call.block == BlockId::from(L1BlockNumber(CURRENT_BLOCK))));
}

#[tokio::test]
async fn fresh_rate_is_not_relayed() {
    let env = TestEnv::new(ChainParams::default());
    let outcome = env.relay().run_once().await.unwrap();
    assert_eq!(outcome, RelayOutcome::RateFresh);
    assert_eq!(env.called_functions(), ["rateStale"]);
}

#[test_casing(2, [1, 3])]
#[tokio::test]
async fn stale_rate_is_not_relayed_out_of_turn(node_index: usize) {
    let mut members: Vec<_> = (0..4).map(|i| Address::repeat_byte(0xa0 + i)).collect();
    members[node_index] = NODE;
    let env = TestEnv::new(ChainParams {
        members,
        rate_stale: Some(true),
        ..ChainParams::default()
    });

    let outcome = env.relay().run_once().await.unwrap();
    assert_eq!(
        outcome,
        RelayOutcome::NotMyTurn {
            block: L1BlockNumber(CURRENT_BLOCK),
            turn_index: Some(2),
        }
    );
    assert_eq!(env.client.sent_tx_count(), 0);
}

#[tokio::test]
async fn node_missing_from_member_list_never_relays() {
    let env = TestEnv::new(ChainParams {
        members: vec![Address::repeat_byte(0xa0); 4],
        rate_stale: Some(true),
        ..ChainParams::default()
    });
    let outcome = env.relay().run_once().await.unwrap();
    assert_matches!(outcome, RelayOutcome::NotMyTurn { .. });
    assert_eq!(env.client.sent_tx_count(), 0);
}

#[tokio::test]
async fn relay_runs_before_price_submission() {
    let env = TestEnv::new(ChainParams {
        rate_stale: Some(true),
        ..ChainParams::default()
    });
    let outcome = env.task().with_rate_relay(env.relay()).run_once().await.unwrap();
    assert_matches!(outcome, PriceSubmissionOutcome::Submitted { .. });

    let recipients: Vec<_> = env.client.sent_txs().iter().map(|tx| tx.recipient).collect();
    assert_eq!(recipients, [MESSENGER_ADDRESS, PRICES_ADDRESS]);
    let nonces: Vec<_> = env.client.sent_txs().iter().map(|tx| tx.nonce).collect();
    assert_eq!(nonces, [0, 1]);
}

#[tokio::test]
async fn relay_errors_do_not_fail_price_submission() {
    let env = TestEnv::new(ChainParams {
        rate_stale: None,
        ..ChainParams::default()
    });
    let relay_err = env.relay().run_once().await.unwrap_err();
    assert_matches!(relay_err, WatchtowerError::Query(_));

    let outcome = env.task().with_rate_relay(env.relay()).run_once().await.unwrap();
    assert_matches!(outcome, PriceSubmissionOutcome::Submitted { .. });
    let recipients: Vec<_> = env.client.sent_txs().iter().map(|tx| tx.recipient).collect();
    assert_eq!(recipients, [PRICES_ADDRESS]);
}

#[tokio::test(start_paused = true)]
async fn watchtower_keeps_running_after_errors() {
    const POLL_INTERVAL: Duration = Duration::from_secs(300);

    let env = TestEnv::new(ChainParams::default());
    let failing_chain = env.chain.clone().with_fallible_view(
        DAO_ADDRESS,
        dao_node_trusted_contract(),
        "getMemberExists",
        |_, _| Err(gateway_error()),
    );
    let watchtower = Watchtower::new(env.task(), POLL_INTERVAL);
    let (stop_sender, stop_receiver) = watch::channel(false);
    let watchtower_task = tokio::spawn(watchtower.run(stop_receiver));

    tokio::time::sleep(POLL_INTERVAL * 5 / 2).await;
    stop_sender.send_replace(true);
    watchtower_task.await.unwrap().unwrap();

    let member_checks = failing_chain
        .calls()
        .into_iter()
        .filter(|call| call.function == "getMemberExists")
        .count();
    assert_eq!(member_checks, 3);
    assert_eq!(env.client.sent_tx_count(), 0);
}

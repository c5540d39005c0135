use std::time::Duration;

use vise::{
    Buckets, Counter, EncodeLabelSet, EncodeLabelValue, Histogram, LabeledFamily, Metrics,
};

pub use self::{
    query::QueryClient,
    signing::{PKSigningClient, SigningClient},
};

mod decl;
mod query;
mod signing;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EncodeLabelSet, EncodeLabelValue)]
#[metrics(label = "method", rename_all = "snake_case")]
enum Method {
    ChainId,
    Syncing,
    NonceAtForAccount,
    PendingBlockBaseFee,
    BlockNumber,
    EstimateGas,
    SendRawTx,
    GetTxStatus,
    TxReceipt,
    CallContractFunction,
    Block,
    SignPreparedTx,
}

#[derive(Debug, Metrics)]
#[metrics(prefix = "eth_client")]
struct EthClientMetrics {
    /// Number of calls to each method, grouped by the calling component.
    #[metrics(labels = ["method", "component"])]
    call: LabeledFamily<(Method, &'static str), Counter, 2>,
    /// Latency of direct RPC calls.
    #[metrics(buckets = Buckets::LATENCIES)]
    direct: vise::Family<Method, Histogram<Duration>>,
}

#[vise::register]
static METRICS: vise::Global<EthClientMetrics> = vise::Global::new();

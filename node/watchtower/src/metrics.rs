use std::time::Duration;

use vise::{
    Buckets, Counter, EncodeLabelSet, EncodeLabelValue, Family, Gauge, Histogram, LabeledFamily,
    Metrics, Unit,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EncodeLabelValue, EncodeLabelSet)]
#[metrics(label = "outcome", rename_all = "snake_case")]
pub(crate) enum PriceTaskOutcome {
    NotSynced,
    NotEligible,
    NothingToReport,
    AwaitingFinality,
    AlreadySubmitted,
    FeeAboveCap,
    Submitted,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EncodeLabelValue, EncodeLabelSet)]
#[metrics(label = "outcome", rename_all = "snake_case")]
pub(crate) enum RelayTaskOutcome {
    RateFresh,
    NotMyTurn,
    FeeAboveCap,
    Submitted,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EncodeLabelValue, EncodeLabelSet)]
#[metrics(label = "kind", rename_all = "snake_case")]
pub(crate) enum ErrorKind {
    Query,
    Submission,
}

#[derive(Debug, Metrics)]
#[metrics(prefix = "watchtower")]
pub(crate) struct WatchtowerMetrics {
    /// Outcomes of RPL price submission iterations.
    pub price_iterations: Family<PriceTaskOutcome, Counter>,
    /// Outcomes of Optimism rate relay attempts.
    pub relay_iterations: Family<RelayTaskOutcome, Counter>,
    /// Errors returned by watchtower iterations. Submission errors need operator attention.
    pub errors: Family<ErrorKind, Counter>,
    /// Last block for which RPL prices were recorded by the network.
    pub prices_block: Gauge<u64>,
    /// Number of transactions confirmed on L1.
    #[metrics(labels = ["function"])]
    pub confirmed_txs: LabeledFamily<String, Counter>,
    #[metrics(buckets = Buckets::LATENCIES, unit = Unit::Seconds)]
    pub iteration_latency: Histogram<Duration>,
    /// Latency of remote steps performed by the tasks.
    #[metrics(unit = Unit::Seconds, labels = ["step"], buckets = Buckets::LATENCIES)]
    pub step_latency: LabeledFamily<&'static str, Histogram<Duration>>,
}

#[vise::register]
pub(crate) static METRICS: vise::Global<WatchtowerMetrics> = vise::Global::new();

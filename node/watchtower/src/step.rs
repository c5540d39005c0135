use std::{error::Error as StdError, future::Future, time::Duration};

use anyhow::Context as _;

use crate::metrics::METRICS;

/// Runs a single remote step of a task, bounding its duration.
pub(crate) async fn run_step<T, E>(
    timeout: Duration,
    step: &'static str,
    future: impl Future<Output = Result<T, E>>,
) -> anyhow::Result<T>
where
    E: StdError + Send + Sync + 'static,
{
    let latency = METRICS.step_latency[&step].start();
    let output = tokio::time::timeout(timeout, future).await;
    latency.observe();
    output
        .map_err(|_| anyhow::anyhow!("`{step}` timed out after {timeout:?}"))?
        .with_context(|| format!("`{step}` failed"))
}

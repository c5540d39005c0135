//! Prometheus-related functionality, such as [`PrometheusExporterConfig`].

use std::net::Ipv4Addr;

use anyhow::Context as _;
use tokio::sync::watch;
use vise::MetricsCollection;
use vise_exporter::MetricsExporter;

/// Configuration of a Prometheus exporter serving metrics over HTTP.
#[derive(Debug)]
pub struct PrometheusExporterConfig {
    port: u16,
}

impl PrometheusExporterConfig {
    /// Creates an exporter that will run an HTTP server on the specified `port`.
    pub const fn pull(port: u16) -> Self {
        Self { port }
    }

    /// Runs the exporter until the stop signal is received. Should be spawned in a separate Tokio task.
    pub async fn run(self, mut stop_receiver: watch::Receiver<bool>) -> anyhow::Result<()> {
        let registry = MetricsCollection::lazy().collect();
        let metrics_exporter =
            MetricsExporter::new(registry.into()).with_graceful_shutdown(async move {
                stop_receiver.changed().await.ok();
            });

        let bind_address = (Ipv4Addr::UNSPECIFIED, self.port).into();
        tracing::info!(port = self.port, "Starting Prometheus exporter");
        metrics_exporter
            .start(bind_address)
            .await
            .context("Failed starting metrics server")?;
        Ok(())
    }
}

//! Observability subsystem of the watchtower: log output configuration and the Prometheus exporter.

use anyhow::Context as _;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

pub use crate::logs::{LogFormat, Logs};

pub mod logs;
pub mod prometheus;

/// Builder for the observability subsystem.
#[derive(Debug, Default)]
pub struct ObservabilityBuilder {
    logs: Option<Logs>,
}

impl ObservabilityBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_logs(mut self, logs: Option<Logs>) -> Self {
        self.logs = logs;
        self
    }

    /// Installs the global subscriber. Returns an error if one is already installed.
    pub fn try_build(self) -> anyhow::Result<()> {
        let logs = self.logs.unwrap_or_default();
        logs.install_panic_hook();
        let filter = logs.build_filter()?;

        tracing_subscriber::registry()
            .with(filter)
            .with(logs.into_layer())
            .try_init()
            .context("failed installing global tracer / logger")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_installation_fails() {
        let logs = Logs::new("json").unwrap().with_log_directives(Some("debug".into()));
        ObservabilityBuilder::new()
            .with_logs(Some(logs))
            .try_build()
            .unwrap();
        tracing::info!(answer = 42, "structured log");

        assert!(ObservabilityBuilder::new().try_build().is_err());
    }
}

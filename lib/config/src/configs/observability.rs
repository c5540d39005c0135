use serde::Deserialize;

/// Configuration for logging and metrics export.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct ObservabilityConfig {
    /// Format of the logs as expected by the `vlog` crate.
    /// Currently must be either `plain` or `json`.
    #[serde(default = "ObservabilityConfig::default_log_format")]
    pub log_format: String,
    /// Log directives in format that is used in `RUST_LOG`.
    #[serde(default)]
    pub log_directives: Option<String>,
    /// Port to serve Prometheus metrics on. Metrics are not exported if unset.
    #[serde(default)]
    pub prometheus_port: Option<u16>,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_format: Self::default_log_format(),
            log_directives: None,
            prometheus_port: None,
        }
    }
}

impl ObservabilityConfig {
    fn default_log_format() -> String {
        "plain".to_owned()
    }
}

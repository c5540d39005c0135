use std::{backtrace::Backtrace, panic::PanicHookInfo, str::FromStr};

use anyhow::Context as _;
use serde::Deserialize;
use tracing_subscriber::{fmt, registry::LookupSpan, EnvFilter, Layer};

const DEFAULT_DIRECTIVES: &str = "info";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Plain,
    Json,
}

impl FromStr for LogFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "plain" => Ok(Self::Plain),
            "json" => Ok(Self::Json),
            _ => anyhow::bail!("unsupported log format `{s}`; expected `plain` or `json`"),
        }
    }
}

/// Log output settings.
#[derive(Debug, Default)]
pub struct Logs {
    format: LogFormat,
    log_directives: Option<String>,
}

impl Logs {
    pub fn new(format: &str) -> anyhow::Result<Self> {
        Ok(Self {
            format: format.parse()?,
            log_directives: None,
        })
    }

    pub fn with_log_directives(mut self, log_directives: Option<String>) -> Self {
        self.log_directives = log_directives;
        self
    }

    pub(crate) fn build_filter(&self) -> anyhow::Result<EnvFilter> {
        let directives = self.log_directives.as_deref().unwrap_or(DEFAULT_DIRECTIVES);
        EnvFilter::builder()
            .parse(directives)
            .with_context(|| format!("invalid log directives `{directives}`"))
    }

    pub(crate) fn into_layer<S>(self) -> Box<dyn Layer<S> + Send + Sync>
    where
        S: tracing::Subscriber + for<'span> LookupSpan<'span> + Send + Sync,
    {
        match self.format {
            LogFormat::Plain => fmt::layer().with_target(true).boxed(),
            LogFormat::Json => fmt::layer()
                .json()
                .flatten_event(true)
                .with_current_span(true)
                .boxed(),
        }
    }

    /// JSON logs are consumed by machines, so panics are routed through `tracing` as well.
    pub(crate) fn install_panic_hook(&self) {
        if self.format == LogFormat::Json {
            std::panic::set_hook(Box::new(json_panic_handler));
        }
    }
}

fn json_panic_handler(panic_info: &PanicHookInfo<'_>) {
    let backtrace = Backtrace::force_capture();
    let location = panic_info
        .location()
        .map(|location| location.to_string())
        .unwrap_or_default();
    tracing::error!(
        %location,
        backtrace = %backtrace,
        "panic occurred: {panic_info}"
    );
}

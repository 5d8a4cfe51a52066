//! Engine configuration.

use crate::{
    client::RetryPolicy,
    constants::{SETTLEMENT_POLL_INTERVAL, SETTLEMENT_TIMEOUT},
};
use eyre::WrapErr;
use serde::{Deserialize, Serialize};
use std::{path::Path, time::Duration};
use url::Url;

/// Engine configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Base URL of the node's HTTP API.
    pub node_url: Url,
    /// Transport endpoint used for raw recipient ids that did not decode as
    /// an RGB invoice. Raw-recipient sends fail fast without one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_transport_endpoint: Option<String>,
    /// Per-request timeout of the HTTP client.
    #[serde(default = "default_request_timeout")]
    pub request_timeout: Duration,
    /// Interval between settlement polls.
    #[serde(default = "default_poll_interval")]
    pub poll_interval: Duration,
    /// Wall-clock ceiling a payment may stay pending.
    #[serde(default = "default_settlement_timeout")]
    pub settlement_timeout: Duration,
    /// Retry policy of the resilient client.
    #[serde(default)]
    pub retry: RetryPolicy,
}

fn default_request_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_poll_interval() -> Duration {
    SETTLEMENT_POLL_INTERVAL
}

fn default_settlement_timeout() -> Duration {
    SETTLEMENT_TIMEOUT
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            node_url: Url::parse("http://localhost:3001").expect("valid default url"),
            default_transport_endpoint: None,
            request_timeout: default_request_timeout(),
            poll_interval: default_poll_interval(),
            settlement_timeout: default_settlement_timeout(),
            retry: RetryPolicy::default(),
        }
    }
}

impl EngineConfig {
    /// Sets the node URL.
    pub fn with_node_url(mut self, node_url: Url) -> Self {
        self.node_url = node_url;
        self
    }

    /// Sets the default transport endpoint for raw recipient ids.
    pub fn with_default_transport_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.default_transport_endpoint = Some(endpoint.into());
        self
    }

    /// Sets the per-request timeout.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Sets the settlement poll interval.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Sets the settlement ceiling.
    pub fn with_settlement_timeout(mut self, timeout: Duration) -> Self {
        self.settlement_timeout = timeout;
        self
    }

    /// Sets the retry policy.
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Loads the configuration from a YAML file.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> eyre::Result<Self> {
        let path = path.as_ref();
        let file = std::fs::File::open(path)
            .wrap_err_with(|| format!("failed to open config file: {}", path.display()))?;
        serde_yaml::from_reader(&file)
            .wrap_err_with(|| format!("failed to parse config file: {}", path.display()))
    }

    /// Saves the configuration to a YAML file.
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> eyre::Result<()> {
        let content = serde_yaml::to_string(self)?;
        std::fs::write(path.as_ref(), content)
            .wrap_err_with(|| format!("failed to write config file: {}", path.as_ref().display()))
    }
}

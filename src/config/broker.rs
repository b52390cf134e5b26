//! Broker (log) configuration

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

/// Broker configuration shared by the publisher and the dispatch loop
#[derive(Debug, Clone, Deserialize)]
pub struct BrokerConfig {
    /// Bootstrap server list (`host:port[,host:port]`).
    ///
    /// Left empty when the process has no broker; publishers are then
    /// reported as unavailable instead of failing startup.
    #[serde(default)]
    pub address: String,

    /// Consumer group id used by the dispatch loop
    #[serde(default = "default_group_id")]
    pub group_id: String,

    /// Topic events are published to and consumed from
    #[serde(default = "default_topic")]
    pub topic: String,

    /// Upper bound of a single poll wait, in milliseconds
    #[serde(default = "default_poll_timeout_ms")]
    pub poll_timeout_ms: u64,

    /// Offset auto-commit interval, in milliseconds
    #[serde(default = "default_auto_commit_interval_ms")]
    pub auto_commit_interval_ms: u64,

    /// How long a send may wait in the producer queue, in milliseconds
    #[serde(default = "default_send_timeout_ms")]
    pub send_timeout_ms: u64,

    /// How long closing a publisher waits for outstanding sends, in milliseconds
    #[serde(default = "default_close_timeout_ms")]
    pub close_timeout_ms: u64,
}

impl BrokerConfig {
    /// True when a bootstrap address has been configured
    pub fn has_address(&self) -> bool {
        !self.address.trim().is_empty()
    }

    pub fn poll_timeout(&self) -> Duration {
        Duration::from_millis(self.poll_timeout_ms)
    }

    pub fn send_timeout(&self) -> Duration {
        Duration::from_millis(self.send_timeout_ms)
    }

    pub fn close_timeout(&self) -> Duration {
        Duration::from_millis(self.close_timeout_ms)
    }

    /// Validate broker configuration.
    ///
    /// A blank address is accepted here; it only matters when a publisher
    /// or consumer is actually built.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.group_id.trim().is_empty() {
            return Err(ValidationError::MissingRequired("BROKER__GROUP_ID"));
        }
        if self.topic.trim().is_empty() {
            return Err(ValidationError::MissingRequired("BROKER__TOPIC"));
        }
        if self.has_address() {
            for server in self.address.split(',') {
                if !server.trim().contains(':') {
                    return Err(ValidationError::InvalidBrokerAddress(server.trim().to_string()));
                }
            }
        }
        if self.poll_timeout_ms == 0 || self.poll_timeout_ms > 60_000 {
            return Err(ValidationError::InvalidTimeout("BROKER__POLL_TIMEOUT_MS"));
        }
        if self.auto_commit_interval_ms == 0 {
            return Err(ValidationError::InvalidTimeout("BROKER__AUTO_COMMIT_INTERVAL_MS"));
        }
        if self.send_timeout_ms == 0 {
            return Err(ValidationError::InvalidTimeout("BROKER__SEND_TIMEOUT_MS"));
        }
        Ok(())
    }
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            address: String::new(),
            group_id: default_group_id(),
            topic: default_topic(),
            poll_timeout_ms: default_poll_timeout_ms(),
            auto_commit_interval_ms: default_auto_commit_interval_ms(),
            send_timeout_ms: default_send_timeout_ms(),
            close_timeout_ms: default_close_timeout_ms(),
        }
    }
}

fn default_group_id() -> String {
    "person-service-group".to_string()
}

fn default_topic() -> String {
    "app-global-topic".to_string()
}

fn default_poll_timeout_ms() -> u64 {
    1000
}

fn default_auto_commit_interval_ms() -> u64 {
    1000
}

fn default_send_timeout_ms() -> u64 {
    5000
}

fn default_close_timeout_ms() -> u64 {
    5000
}

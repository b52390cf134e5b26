//! Dispatch loop configuration

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

/// What the dispatch loop does with already-fetched records when a stop is
/// requested mid-batch.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ShutdownPolicy {
    /// Stop before the next record. The consumer still commits everything
    /// it fetched when it closes, so the rest of the batch is lost for this
    /// group and is not redelivered after restart.
    #[default]
    Drop,
    /// Finish the current batch, then stop.
    Drain,
}

/// Dispatch configuration
#[derive(Debug, Clone, Deserialize)]
pub struct DispatchConfig {
    /// Upper bound for one handler invocation, in milliseconds
    #[serde(default = "default_handler_timeout_ms")]
    pub handler_timeout_ms: u64,

    /// Behaviour for in-flight records on stop
    #[serde(default)]
    pub shutdown: ShutdownPolicy,
}

impl DispatchConfig {
    pub fn handler_timeout(&self) -> Duration {
        Duration::from_millis(self.handler_timeout_ms)
    }

    /// Validate dispatch configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.handler_timeout_ms == 0 {
            return Err(ValidationError::InvalidTimeout("DISPATCH__HANDLER_TIMEOUT_MS"));
        }
        Ok(())
    }
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            handler_timeout_ms: default_handler_timeout_ms(),
            shutdown: ShutdownPolicy::default(),
        }
    }
}

fn default_handler_timeout_ms() -> u64 {
    30_000
}

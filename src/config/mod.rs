//! Application configuration module
//!
//! This module provides type-safe configuration loading from environment variables
//! using the `config` and `dotenvy` crates. Configuration is loaded with the
//! `EVENT_BRIDGE_` prefix and nested values use double underscores as separators.
//!
//! # Example
//!
//! ```no_run
//! use event_bridge::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//!
//! println!("Consuming {} as {}", config.broker.topic, config.broker.group_id);
//! ```

mod broker;
mod cache;
mod dispatch;
mod error;

pub use broker::BrokerConfig;
pub use cache::CacheConfig;
pub use dispatch::{DispatchConfig, ShutdownPolicy};
pub use error::{ConfigError, ValidationError};

use serde::Deserialize;

/// Root application configuration
///
/// Every section has defaults, so an empty environment loads successfully;
/// only the broker address has no usable default.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Broker configuration (address, group, topic, timeouts)
    #[serde(default)]
    pub broker: BrokerConfig,

    /// Dispatch loop configuration (handler timeout, shutdown policy)
    #[serde(default)]
    pub dispatch: DispatchConfig,

    /// Cache configuration (Redis host/port)
    #[serde(default)]
    pub cache: CacheConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// This function:
    /// 1. Loads `.env` file if present (for development)
    /// 2. Reads environment variables with `EVENT_BRIDGE` prefix
    /// 3. Uses `__` (double underscore) to separate nested values
    /// 4. Deserializes into typed configuration structs
    ///
    /// # Environment Variable Format
    ///
    /// - `EVENT_BRIDGE__BROKER__ADDRESS=kafka:9092` -> `broker.address`
    /// - `EVENT_BRIDGE__CACHE__PORT=6380` -> `cache.port = 6380`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if values cannot be parsed into expected types.
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if present (development)
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("EVENT_BRIDGE")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate all configuration values
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` if any configuration value is invalid.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.broker.validate()?;
        self.dispatch.validate()?;
        self.cache.validate()?;
        Ok(())
    }
}

//! Configuration module for the Relay runtime.
//!
//! Provides TOML + environment based configuration loading and validation
//! for the dispatcher, server settings, and logging.

pub mod error;
pub mod loader;
pub mod schema;
pub mod validation;

pub use error::{ConfigError, ConfigResult};
pub use loader::{ConfigLoader, Profile, load_config, load_config_from_file};
pub use schema::{
    LogFormat, LogLevel, LogOutput, LoggingConfig, RelayConfig, ServerConfig, SpanEventConfig,
};
pub use validation::validate_config;

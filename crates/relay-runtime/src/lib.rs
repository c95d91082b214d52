//! # Relay Runtime
//!
//! Orchestration layer for the Relay dispatch framework.
//!
//! This crate provides everything around the dispatch core that a running
//! service needs:
//!
//! - Configuration loading and validation (`config`): TOML files, profiles,
//!   `RELAY_*` environment variables.
//! - Logging setup (`logging`): a `tracing-subscriber` builder driven by
//!   configuration.
//! - The hook registry (`hooks`): explicit, instance-based lifecycle and
//!   extension callbacks.
//! - Inbound adapters (`adapter`): the seam between transports and the
//!   shared dispatcher.
//! - The runtime itself (`runtime`): spawns adapter tasks and handles
//!   graceful shutdown.
//!
//! ```rust,ignore
//! use relay_runtime::{RelayRuntime, logging};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let mut runtime = RelayRuntime::new();
//!     logging::init_from_config(&runtime.config().logging);
//!
//!     runtime.mount(build_dispatcher()?);
//!     runtime.register_adapter(my_adapter);
//!
//!     // Runs until Ctrl+C
//!     runtime.run().await?;
//!     Ok(())
//! }
//! ```

pub mod adapter;
pub mod config;
pub mod error;
pub mod hooks;
pub mod logging;
pub mod runtime;

// Re-exports
pub use adapter::{ChannelAdapter, InboundAdapter, InboundUnit, effective_method};
pub use config::{ConfigError, ConfigLoader, ConfigResult, RelayConfig, load_config};
pub use error::{RuntimeError, RuntimeResult};
pub use hooks::{HookCallback, HookRegistry};
pub use logging::{LoggingBuilder, SpanEvents};
pub use runtime::{RelayRuntime, RuntimeBuilder};

// Re-export tracing for use by application crates
pub use tracing;
pub use tracing_subscriber;

/// Prelude module for convenient imports.
///
/// Provides the commonly used logging macros alongside the runtime types.
pub mod prelude {
    pub use tracing::{Level, debug, error, info, instrument, span, trace, warn};
}

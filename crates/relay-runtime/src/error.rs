//! Runtime error types.

use thiserror::Error;

use relay_core::BoxError;

use crate::config::ConfigError;

/// Errors that can occur during runtime operations.
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// Configuration loading or validation failed.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// `run` was called before a dispatcher was mounted.
    #[error("No dispatcher mounted on the runtime")]
    DispatcherMissing,

    /// An adapter failed while running.
    #[error("Adapter '{name}' failed: {source}")]
    Adapter {
        /// Adapter name.
        name: String,
        /// Underlying failure.
        #[source]
        source: BoxError,
    },
}

impl RuntimeError {
    /// Wraps an adapter failure.
    pub fn adapter(name: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self::Adapter {
            name: name.into(),
            source: source.into(),
        }
    }
}

/// Result type for runtime operations.
pub type RuntimeResult<T> = Result<T, RuntimeError>;

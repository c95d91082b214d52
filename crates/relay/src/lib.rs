//! # Relay
//!
//! A request dispatch framework serving HTTP routes and chat-bot message
//! streams through one core.
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────────┐     ┌────────────┐     ┌───────────────────────────────┐
//! │    Runtime    │────▶│ Dispatcher │────▶│ global ++ route middleware    │──▶ action
//! │  (Adapters)   │     │ (shared,   │     │ (onion pipeline, outermost    │
//! └───────────────┘     │  read-only)│     │  first, explicit chain)       │
//!                       └────────────┘     └───────────────────────────────┘
//! ```
//!
//! - **Runtime**: loads config, owns the hook registry, drives adapters
//! - **Adapters**: transports feeding `{discriminator, path}` units
//! - **Dispatcher**: resolves paths, scans the route table in registration
//!   order, builds the middleware pipeline, invokes the terminal action
//! - **Controllers**: named units constructed fresh per invocation through
//!   an explicit registry
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use relay::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut runtime = RelayRuntime::new();
//!
//!     let mut dispatcher = Dispatcher::http();
//!     dispatcher.register_controller("Users", || UsersController);
//!     dispatcher.get("/users/<id>", Action::parse("Users@show")?, &[])?;
//!     runtime.mount(dispatcher);
//!
//!     let (adapter, _tx) = ChannelAdapter::new("webhook", 64);
//!     runtime.register_adapter(adapter);
//!
//!     runtime.run().await?;
//!     Ok(())
//! }
//! ```

pub use relay_core as core;
pub use relay_runtime as runtime;

/// Prelude module for convenient imports.
///
/// ```rust,ignore
/// use relay::prelude::*;
/// ```
pub mod prelude {
    // Runtime - main entry point
    pub use relay_runtime::{RelayRuntime, RuntimeBuilder};

    // Dispatch core
    pub use relay_core::{
        Action, Controller, DispatchContext, DispatchMode, Dispatcher, Middleware, MiddlewareRef,
        Next, PathParams, Response, WILDCARD,
    };

    // Tower integration
    pub use relay_core::{DispatchRequest, DispatchService};

    // Errors
    pub use relay_core::{ActionError, DispatchError, DispatchResult, RegistrationError};

    // Adapters and hooks
    pub use relay_runtime::{ChannelAdapter, HookRegistry, InboundAdapter, InboundUnit};

    // Configuration and logging
    pub use relay_runtime::config::{RelayConfig, load_config};
    pub use relay_runtime::logging::{LoggingBuilder, SpanEvents};
}

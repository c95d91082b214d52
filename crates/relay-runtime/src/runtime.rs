//! Main runtime orchestration.
//!
//! [`RelayRuntime`] ties the pieces together: it loads configuration, owns
//! the hook registry, holds the shared dispatcher, and drives inbound
//! adapters. Its lifecycle mirrors the dispatcher's two phases:
//!
//! 1. **Setup**: load config, build and mount a fully-registered
//!    [`Dispatcher`], register adapters.
//! 2. **Run**: spawn one task per adapter, all sharing the dispatcher
//!    behind an `Arc`, then wait for Ctrl+C (or a caller-supplied shutdown
//!    future) and cancel the adapters cooperatively.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use relay_runtime::RelayRuntime;
//!
//! let mut runtime = RelayRuntime::new();
//!
//! let mut dispatcher = Dispatcher::http();
//! dispatcher.get("/users/<id>", Action::parse("Users@show")?, &[])?;
//! runtime.mount(dispatcher);
//!
//! let (adapter, tx) = ChannelAdapter::new("webhook", 64);
//! runtime.register_adapter(adapter);
//!
//! runtime.run().await?;
//! ```

use std::sync::Arc;

use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use relay_core::Dispatcher;

use crate::adapter::InboundAdapter;
use crate::config::{ConfigLoader, ConfigResult, RelayConfig, validate_config};
use crate::error::{RuntimeError, RuntimeResult};
use crate::hooks::HookRegistry;

/// The Relay runtime: configuration, hooks, one dispatcher, many adapters.
pub struct RelayRuntime {
    config: RelayConfig,
    hooks: Arc<HookRegistry>,
    dispatcher: Option<Arc<Dispatcher>>,
    adapters: Vec<Arc<dyn InboundAdapter>>,
    shutdown: CancellationToken,
}

impl std::fmt::Debug for RelayRuntime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RelayRuntime")
            .field("config", &self.config)
            .field("dispatcher", &self.dispatcher.is_some())
            .field("adapters", &self.adapters.len())
            .field("shutdown", &self.shutdown)
            .finish()
    }
}

impl RelayRuntime {
    /// Creates a runtime with automatic configuration loading.
    ///
    /// Searches the current directory (then the user config directory) for
    /// `relay.toml`; falls back to defaults when nothing is found.
    pub fn new() -> Self {
        let config = ConfigLoader::new()
            .with_current_dir()
            .with_user_config_dir()
            .load()
            .unwrap_or_else(|e| {
                eprintln!("Warning: Failed to load config ({e}), using defaults");
                RelayConfig::default()
            });

        Self::from_config(&config)
    }

    /// Creates a runtime from a pre-loaded configuration.
    pub fn from_config(config: &RelayConfig) -> Self {
        Self {
            config: config.clone(),
            hooks: Arc::new(HookRegistry::new()),
            dispatcher: None,
            adapters: Vec::new(),
            shutdown: CancellationToken::new(),
        }
    }

    /// Creates a runtime builder for custom configuration loading.
    pub fn builder() -> RuntimeBuilder {
        RuntimeBuilder::new()
    }

    /// The loaded configuration.
    pub fn config(&self) -> &RelayConfig {
        &self.config
    }

    /// The hook registry shared with application code.
    pub fn hooks(&self) -> Arc<HookRegistry> {
        Arc::clone(&self.hooks)
    }

    /// Creates an HTTP-mode dispatcher pre-configured from the `server`
    /// settings (currently the path prefix).
    ///
    /// Register controllers and routes on it, then [`mount`](Self::mount) it.
    pub fn http_dispatcher(&self) -> Dispatcher {
        match &self.config.server.path_prefix {
            Some(prefix) => Dispatcher::http().with_path_prefix(prefix),
            None => Dispatcher::http(),
        }
    }

    /// Mounts the dispatcher the adapters will share.
    ///
    /// The dispatcher must have finished its registration phase; it is
    /// read-only from here on. Returns the shared handle for callers that
    /// want to dispatch directly (e.g. an embedded HTTP server).
    pub fn mount(&mut self, dispatcher: Dispatcher) -> Arc<Dispatcher> {
        let shared = Arc::new(dispatcher);
        self.dispatcher = Some(Arc::clone(&shared));
        shared
    }

    /// The mounted dispatcher, if any.
    pub fn dispatcher(&self) -> Option<&Arc<Dispatcher>> {
        self.dispatcher.as_ref()
    }

    /// Registers an inbound adapter.
    pub fn register_adapter(&mut self, adapter: impl InboundAdapter) {
        self.adapters.push(Arc::new(adapter));
    }

    /// Number of registered adapters.
    pub fn adapter_count(&self) -> usize {
        self.adapters.len()
    }

    /// A token that cancels the running adapters when triggered.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Runs the adapters until Ctrl+C.
    pub async fn run(&self) -> RuntimeResult<()> {
        self.run_until(async {
            if let Err(e) = signal::ctrl_c().await {
                error!(error = %e, "Failed to listen for shutdown signal");
            }
        })
        .await
    }

    /// Runs the adapters until the given future completes.
    ///
    /// Used directly in tests and by embedders with their own shutdown
    /// signal.
    pub async fn run_until<F>(&self, shutdown: F) -> RuntimeResult<()>
    where
        F: Future<Output = ()>,
    {
        let dispatcher = self
            .dispatcher
            .as_ref()
            .ok_or(RuntimeError::DispatcherMissing)?;

        if self.adapters.is_empty() {
            warn!("Runtime started with no adapters registered");
        }

        self.hooks.trigger("runtime.start", &[]);
        info!(
            adapters = self.adapters.len(),
            routes = dispatcher.route_count(),
            "Runtime started"
        );

        let mut tasks = Vec::with_capacity(self.adapters.len());
        for adapter in &self.adapters {
            let name = adapter.name().to_string();
            let task = tokio::spawn(
                Arc::clone(adapter).run(Arc::clone(dispatcher), self.shutdown.child_token()),
            );
            tasks.push((name, task));
        }

        tokio::select! {
            _ = shutdown => {
                info!("Shutdown requested");
            }
            _ = self.shutdown.cancelled() => {
                info!("Shutdown token cancelled");
            }
        }

        self.shutdown.cancel();

        for (name, task) in tasks {
            match task.await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => error!(adapter = %name, error = %e, "Adapter exited with error"),
                Err(e) => error!(adapter = %name, error = %e, "Adapter task panicked"),
            }
        }

        self.hooks.trigger("runtime.stop", &[]);
        info!("Runtime stopped");
        Ok(())
    }
}

impl Default for RelayRuntime {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for custom configuration loading.
pub struct RuntimeBuilder {
    loader: ConfigLoader,
}

impl RuntimeBuilder {
    /// Creates a builder with default loader settings.
    pub fn new() -> Self {
        Self {
            loader: ConfigLoader::new(),
        }
    }

    /// Loads from a specific configuration file.
    pub fn config_file<P: AsRef<std::path::Path>>(mut self, path: P) -> Self {
        self.loader = self.loader.file(path);
        self
    }

    /// Sets the configuration profile.
    pub fn profile(mut self, profile: impl Into<String>) -> Self {
        self.loader = self.loader.profile(profile);
        self
    }

    /// Adds a search path for configuration files.
    pub fn search_path<P: AsRef<std::path::Path>>(mut self, path: P) -> Self {
        self.loader = self.loader.search_path(path);
        self
    }

    /// Disables environment variable loading.
    pub fn without_env(mut self) -> Self {
        self.loader = self.loader.without_env();
        self
    }

    /// Merges programmatic configuration overrides.
    pub fn merge(mut self, config: RelayConfig) -> Self {
        self.loader = self.loader.merge(config);
        self
    }

    /// Loads, validates, and builds the runtime.
    pub fn build(self) -> ConfigResult<RelayRuntime> {
        let config = self.loader.load()?;
        validate_config(&config)?;
        Ok(RelayRuntime::from_config(&config))
    }
}

impl Default for RuntimeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::{ChannelAdapter, InboundUnit, message_unit};
    use relay_core::{Action, Response};
    use std::sync::Mutex;

    fn runtime() -> RelayRuntime {
        RelayRuntime::from_config(&RelayConfig::default())
    }

    #[tokio::test]
    async fn run_without_dispatcher_fails() {
        let rt = runtime();
        let err = rt.run_until(async {}).await.unwrap_err();
        assert!(matches!(err, RuntimeError::DispatcherMissing));
    }

    #[tokio::test]
    async fn channel_adapter_feeds_the_dispatcher() {
        let seen: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
        let seen_in_action = Arc::clone(&seen);

        let mut dispatcher = Dispatcher::message();
        dispatcher
            .any(
                "/echo <text>",
                Action::handler(move |params| {
                    let seen = Arc::clone(&seen_in_action);
                    async move {
                        seen.lock()
                            .unwrap()
                            .push(params.get("text").unwrap_or("").to_string());
                        Ok(Response::ok("ok"))
                    }
                }),
                &[],
            )
            .unwrap();

        let mut rt = runtime();
        rt.mount(dispatcher);

        let (adapter, tx) = ChannelAdapter::new("test-stream", 8);
        rt.register_adapter(adapter);
        assert_eq!(rt.adapter_count(), 1);

        tx.send(message_unit("/echo hello")).await.unwrap();
        tx.send(InboundUnit::message("/echo world")).await.unwrap();
        drop(tx);

        // Give the adapter a moment to drain, then stop.
        let token = rt.shutdown_token();
        rt.run_until(async move {
            tokio::time::sleep(std::time::Duration::from_millis(50)).await;
            token.cancel();
        })
        .await
        .unwrap();

        assert_eq!(*seen.lock().unwrap(), vec!["hello", "world"]);
    }

    #[tokio::test]
    async fn lifecycle_hooks_fire() {
        let mut rt = runtime();
        rt.mount(Dispatcher::http());

        let order: Arc<Mutex<Vec<&'static str>>> = Arc::new(Mutex::new(Vec::new()));
        let hooks = rt.hooks();

        let start_log = Arc::clone(&order);
        hooks.add("runtime.start", 10, move |_args| {
            start_log.lock().unwrap().push("start");
            serde_json::Value::Null
        });
        let stop_log = Arc::clone(&order);
        hooks.add("runtime.stop", 10, move |_args| {
            stop_log.lock().unwrap().push("stop");
            serde_json::Value::Null
        });

        rt.run_until(async {}).await.unwrap();
        assert_eq!(*order.lock().unwrap(), vec!["start", "stop"]);
    }

    #[tokio::test]
    async fn http_dispatcher_applies_configured_prefix() {
        let mut config = RelayConfig::default();
        config.server.path_prefix = Some("/index.php".to_string());
        let rt = RelayRuntime::from_config(&config);

        let mut dispatcher = rt.http_dispatcher();
        dispatcher
            .get(
                "/ping",
                Action::handler(|_p| async { Ok(Response::ok("pong")) }),
                &[],
            )
            .unwrap();

        let response = dispatcher.dispatch("GET", "/index.php/ping").await.unwrap();
        assert_eq!(response.body, "pong");
    }

    #[test]
    fn builder_validates_config() {
        let mut bad = RelayConfig::default();
        bad.server.port = 0;

        let err = RelayRuntime::builder()
            .without_env()
            .merge(bad)
            .build()
            .unwrap_err();
        assert!(matches!(err, crate::config::ConfigError::InvalidPort(0)));
    }
}

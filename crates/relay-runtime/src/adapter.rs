//! Inbound transport adapters.
//!
//! An [`InboundAdapter`] is the narrow seam between a transport (an HTTP
//! server, a bot event stream) and the dispatch core: it produces
//! [`InboundUnit`]s — a discriminator plus a raw path or message — feeds
//! them to a shared read-only dispatcher, and renders or emits the results.
//! Cancellation, timeouts, and error reporting for business failures all
//! live here; the core propagates errors unmodified and the adapter decides
//! what to do with them.
//!
//! The provider-specific stream client (authentication, wire protocol,
//! reconnects) is out of scope; [`ChannelAdapter`] is the generic
//! stand-in that any such client can push units into.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{Mutex, mpsc};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use relay_core::{DispatchRequest, Dispatcher, WILDCARD};

use crate::error::RuntimeResult;

/// One inbound unit of work handed to the dispatcher.
///
/// This is the same shape as [`DispatchRequest`]; the alias exists so
/// adapter implementations read in transport vocabulary.
pub type InboundUnit = DispatchRequest;

/// A long-lived transport actor driven by the runtime.
///
/// The runtime spawns one task per adapter; every adapter shares the same
/// dispatcher and must treat it as read-only. `run` should return promptly
/// once `shutdown` is cancelled.
#[async_trait]
pub trait InboundAdapter: Send + Sync + 'static {
    /// Adapter name, used in logs.
    fn name(&self) -> &str;

    /// Runs the adapter loop until the source is exhausted or shutdown is
    /// requested.
    async fn run(
        self: Arc<Self>,
        dispatcher: Arc<Dispatcher>,
        shutdown: CancellationToken,
    ) -> RuntimeResult<()>;
}

/// Resolves the effective HTTP method, honoring a `_method` override on
/// POST requests (HTML forms cannot submit PUT/DELETE directly).
///
/// The override is supplied by the transport from its raw parameter source;
/// it only applies when the wire method is POST and the override is
/// non-empty.
pub fn effective_method(method: &str, method_override: Option<&str>) -> String {
    let method = method.to_uppercase();
    match method_override {
        Some(over) if method == "POST" && !over.is_empty() => over.to_uppercase(),
        _ => method,
    }
}

/// Generic channel-fed adapter.
///
/// An external event source pushes [`InboundUnit`]s into the sending half;
/// this adapter drains the receiving half and dispatches each unit. The
/// loop ends when every sender is dropped or shutdown is requested.
///
/// # Example
///
/// ```rust,ignore
/// let (adapter, tx) = ChannelAdapter::new("dingtalk-stream", 64);
/// runtime.register_adapter(adapter);
///
/// // elsewhere, the stream client:
/// tx.send(InboundUnit::message("/weather tokyo")).await?;
/// ```
pub struct ChannelAdapter {
    name: String,
    receiver: Mutex<mpsc::Receiver<InboundUnit>>,
}

impl ChannelAdapter {
    /// Creates an adapter and the sending half of its channel.
    pub fn new(name: impl Into<String>, capacity: usize) -> (Self, mpsc::Sender<InboundUnit>) {
        let (tx, rx) = mpsc::channel(capacity);
        (
            Self {
                name: name.into(),
                receiver: Mutex::new(rx),
            },
            tx,
        )
    }
}

#[async_trait]
impl InboundAdapter for ChannelAdapter {
    fn name(&self) -> &str {
        &self.name
    }

    async fn run(
        self: Arc<Self>,
        dispatcher: Arc<Dispatcher>,
        shutdown: CancellationToken,
    ) -> RuntimeResult<()> {
        let mut receiver = self.receiver.lock().await;
        info!(adapter = %self.name, "adapter started");

        loop {
            tokio::select! {
                unit = receiver.recv() => {
                    let Some(unit) = unit else {
                        debug!(adapter = %self.name, "source closed, stopping");
                        break;
                    };
                    match dispatcher.dispatch(&unit.discriminator, &unit.path).await {
                        Ok(response) => {
                            debug!(
                                adapter = %self.name,
                                status = response.status,
                                "unit dispatched"
                            );
                        }
                        Err(err) => {
                            // Business failures surface here, not in the core.
                            error!(adapter = %self.name, error = %err, "dispatch failed");
                        }
                    }
                }
                _ = shutdown.cancelled() => {
                    debug!(adapter = %self.name, "shutdown requested");
                    break;
                }
            }
        }

        info!(adapter = %self.name, "adapter stopped");
        Ok(())
    }
}

/// Message-style convenience: a unit dispatched under the wildcard
/// discriminator.
pub fn message_unit(text: impl Into<String>) -> InboundUnit {
    InboundUnit::new(WILDCARD, text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn effective_method_passthrough() {
        assert_eq!(effective_method("get", None), "GET");
        assert_eq!(effective_method("POST", None), "POST");
    }

    #[test]
    fn effective_method_override_applies_to_post_only() {
        assert_eq!(effective_method("POST", Some("delete")), "DELETE");
        assert_eq!(effective_method("GET", Some("delete")), "GET");
        assert_eq!(effective_method("POST", Some("")), "POST");
    }

    #[test]
    fn message_unit_uses_wildcard() {
        let unit = message_unit("/help");
        assert_eq!(unit.discriminator, WILDCARD);
        assert_eq!(unit.path, "/help");
    }
}

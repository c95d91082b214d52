//! Tower Service adapter for the dispatcher.
//!
//! Wrapping a shared [`Dispatcher`] as a `tower::Service` lets transports
//! stack ordinary Tower middleware — timeouts, rate limits, load shedding —
//! around an entire dispatch cycle. Cancellation and timeout semantics
//! belong to the transport layer, not the core, and this is the seam where
//! they attach.
//!
//! # Example
//!
//! ```rust,ignore
//! use tower::ServiceBuilder;
//! use tower::timeout::TimeoutLayer;
//! use std::time::Duration;
//!
//! let service = ServiceBuilder::new()
//!     .layer(TimeoutLayer::new(Duration::from_secs(5)))
//!     .service(DispatchService::new(dispatcher));
//! ```

use std::sync::Arc;
use std::task::{Context, Poll};

use futures::future::BoxFuture;
use tower::Service;

use crate::dispatcher::Dispatcher;
use crate::error::DispatchError;
use crate::response::Response;
use crate::route::WILDCARD;

/// One inbound unit of work for the service adapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchRequest {
    /// HTTP method or message-type wildcard.
    pub discriminator: String,
    /// Raw path or message text; resolved by the dispatcher.
    pub path: String,
}

impl DispatchRequest {
    /// Creates a request for an explicit discriminator.
    pub fn new(discriminator: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            discriminator: discriminator.into(),
            path: path.into(),
        }
    }

    /// Creates a wildcard (message-style) request.
    pub fn message(text: impl Into<String>) -> Self {
        Self::new(WILDCARD, text)
    }
}

/// `tower::Service` over a shared, read-only [`Dispatcher`].
///
/// Cloning is cheap: clones share the same dispatcher.
#[derive(Debug, Clone)]
pub struct DispatchService {
    dispatcher: Arc<Dispatcher>,
}

impl DispatchService {
    /// Wraps a dispatcher that has finished its registration phase.
    pub fn new(dispatcher: Arc<Dispatcher>) -> Self {
        Self { dispatcher }
    }

    /// The underlying dispatcher.
    pub fn dispatcher(&self) -> &Arc<Dispatcher> {
        &self.dispatcher
    }
}

impl Service<DispatchRequest> for DispatchService {
    type Response = Response;
    type Error = DispatchError;
    type Future = BoxFuture<'static, Result<Response, DispatchError>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, request: DispatchRequest) -> Self::Future {
        let dispatcher = Arc::clone(&self.dispatcher);
        Box::pin(async move {
            dispatcher
                .dispatch(&request.discriminator, &request.path)
                .await
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::Action;
    use tower::ServiceExt;

    #[tokio::test]
    async fn service_dispatches_requests() {
        let mut dispatcher = Dispatcher::http();
        dispatcher
            .get(
                "/ping",
                Action::handler(|_p| async { Ok(Response::ok("pong")) }),
                &[],
            )
            .unwrap();

        let service = DispatchService::new(Arc::new(dispatcher));
        let response = service
            .oneshot(DispatchRequest::new("GET", "/ping"))
            .await
            .unwrap();
        assert_eq!(response.body, "pong");
    }

    #[tokio::test]
    async fn message_request_uses_wildcard() {
        let request = DispatchRequest::message("/help");
        assert_eq!(request.discriminator, WILDCARD);
    }
}

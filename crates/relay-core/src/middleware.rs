//! Middleware pipeline built around an explicit chain and a cursor.
//!
//! A pipeline is an ordered slice of middleware wrapping a terminal action
//! (onion model): the first middleware in the chain runs outermost and
//! decides whether and when to hand control inward by calling
//! [`Next::run`]. Not calling it short-circuits the pipeline and makes that
//! middleware's return value the dispatch result.
//!
//! The chain is a plain slice plus an index cursor — no nested closures —
//! so it stays inspectable and each link is trivially testable. Execution
//! is sequential within one dispatch cycle; there is no parallelism across
//! links.
//!
//! # Example
//!
//! ```rust,ignore
//! struct RequestLog;
//!
//! #[async_trait]
//! impl Middleware for RequestLog {
//!     async fn handle(&self, ctx: &DispatchContext, next: Next<'_>) -> DispatchResult {
//!         tracing::info!(path = ctx.path(), "request");
//!         next.run().await
//!     }
//! }
//! ```

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;

use crate::action::{Action, ActionInvoker};
use crate::context::DispatchContext;
use crate::error::{DispatchError, DispatchResult};

/// A single pipeline link.
///
/// Implementations forward by awaiting `next.run()`, or short-circuit by
/// returning without it (auth rejections, caches). Errors returned here are
/// propagated unmodified to the dispatch caller.
#[async_trait]
pub trait Middleware: Send + Sync {
    /// Processes the request, optionally forwarding to the next link.
    async fn handle(&self, ctx: &DispatchContext, next: Next<'_>) -> DispatchResult;
}

/// Reference to a middleware: a registry name resolved at registration
/// time, or a ready-made instance.
#[derive(Clone)]
pub enum MiddlewareRef {
    /// Resolved against the [`MiddlewareRegistry`] when the route is
    /// registered; unknown names fail that registration call.
    Named(String),
    /// Used as-is.
    Instance(Arc<dyn Middleware>),
}

impl MiddlewareRef {
    /// References a registered middleware by name.
    pub fn named(name: impl Into<String>) -> Self {
        Self::Named(name.into())
    }

    /// Wraps a concrete middleware instance.
    pub fn instance(middleware: impl Middleware + 'static) -> Self {
        Self::Instance(Arc::new(middleware))
    }
}

impl From<&str> for MiddlewareRef {
    fn from(name: &str) -> Self {
        Self::named(name)
    }
}

impl From<String> for MiddlewareRef {
    fn from(name: String) -> Self {
        Self::Named(name)
    }
}

impl From<Arc<dyn Middleware>> for MiddlewareRef {
    fn from(middleware: Arc<dyn Middleware>) -> Self {
        Self::Instance(middleware)
    }
}

impl fmt::Debug for MiddlewareRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Named(name) => write!(f, "MiddlewareRef::Named({name})"),
            Self::Instance(_) => f.write_str("MiddlewareRef::Instance"),
        }
    }
}

/// Factory producing a middleware instance when a named reference resolves.
pub type MiddlewareFactory = Arc<dyn Fn() -> Arc<dyn Middleware> + Send + Sync>;

/// Name → factory lookup table for middleware.
///
/// Populated during the registration phase; named references resolve once,
/// when their route is registered.
#[derive(Clone, Default)]
pub struct MiddlewareRegistry {
    factories: HashMap<String, MiddlewareFactory>,
}

impl MiddlewareRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a middleware factory under a name.
    ///
    /// Re-registering a name overwrites the previous factory.
    pub fn register<F, M>(&mut self, name: impl Into<String>, factory: F)
    where
        F: Fn() -> M + Send + Sync + 'static,
        M: Middleware + 'static,
    {
        self.factories.insert(
            name.into(),
            Arc::new(move || Arc::new(factory()) as Arc<dyn Middleware>),
        );
    }

    /// Returns `true` if a middleware is registered under `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    /// Resolves a name into an instance.
    pub fn resolve(&self, name: &str) -> Option<Arc<dyn Middleware>> {
        self.factories.get(name).map(|f| f())
    }
}

impl fmt::Debug for MiddlewareRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MiddlewareRegistry")
            .field("len", &self.factories.len())
            .finish()
    }
}

/// The terminal end of a pipeline: the resolved action plus its invoker.
pub(crate) struct Terminal<'a> {
    invoker: &'a ActionInvoker,
    action: &'a Action,
}

impl<'a> Terminal<'a> {
    pub(crate) fn new(invoker: &'a ActionInvoker, action: &'a Action) -> Self {
        Self { invoker, action }
    }

    async fn invoke(&self, ctx: &DispatchContext) -> DispatchResult {
        self.invoker
            .invoke(self.action, ctx.params().clone())
            .await
            .map_err(DispatchError::Action)
    }
}

/// Continuation handed to each middleware link.
///
/// Holds the chain, the terminal, and a cursor into the chain. `run`
/// consumes the value, so a link can forward at most once.
pub struct Next<'a> {
    chain: &'a [Arc<dyn Middleware>],
    terminal: &'a Terminal<'a>,
    ctx: &'a DispatchContext,
    index: usize,
}

impl<'a> Next<'a> {
    pub(crate) fn new(
        chain: &'a [Arc<dyn Middleware>],
        terminal: &'a Terminal<'a>,
        ctx: &'a DispatchContext,
    ) -> Self {
        Self {
            chain,
            terminal,
            ctx,
            index: 0,
        }
    }

    /// Number of links remaining, not counting the terminal action.
    pub fn remaining(&self) -> usize {
        self.chain.len().saturating_sub(self.index)
    }

    /// Advances into the next link, or the terminal action once the chain
    /// is exhausted.
    pub async fn run(self) -> DispatchResult {
        match self.chain.get(self.index) {
            Some(link) => {
                let next = Next {
                    chain: self.chain,
                    terminal: self.terminal,
                    ctx: self.ctx,
                    index: self.index + 1,
                };
                link.handle(self.ctx, next).await
            }
            None => self.terminal.invoke(self.ctx).await,
        }
    }
}

/// Runs a full pipeline: chain links outermost-first, then the terminal.
pub(crate) async fn run_pipeline(
    chain: &[Arc<dyn Middleware>],
    invoker: &ActionInvoker,
    action: &Action,
    ctx: &DispatchContext,
) -> DispatchResult {
    let terminal = Terminal::new(invoker, action);
    Next::new(chain, &terminal, ctx).run().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::response::Response;
    use std::sync::Mutex;

    /// Spy middleware that records its label before and after forwarding.
    struct Recording {
        label: &'static str,
        log: Arc<Mutex<Vec<String>>>,
    }

    #[async_trait]
    impl Middleware for Recording {
        async fn handle(&self, _ctx: &DispatchContext, next: Next<'_>) -> DispatchResult {
            self.log.lock().unwrap().push(format!("{}:enter", self.label));
            let result = next.run().await;
            self.log.lock().unwrap().push(format!("{}:exit", self.label));
            result
        }
    }

    /// Middleware that never forwards.
    struct Reject;

    #[async_trait]
    impl Middleware for Reject {
        async fn handle(&self, _ctx: &DispatchContext, _next: Next<'_>) -> DispatchResult {
            Ok(Response::with_status(403, "rejected"))
        }
    }

    fn chain_of(links: Vec<Arc<dyn Middleware>>) -> Vec<Arc<dyn Middleware>> {
        links
    }

    fn counting_action(calls: Arc<Mutex<Vec<String>>>) -> Action {
        Action::handler(move |_params| {
            let calls = Arc::clone(&calls);
            async move {
                calls.lock().unwrap().push("action".to_string());
                Ok(Response::ok("done"))
            }
        })
    }

    #[tokio::test]
    async fn links_run_outermost_first() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let chain = chain_of(vec![
            Arc::new(Recording {
                label: "a",
                log: Arc::clone(&log),
            }),
            Arc::new(Recording {
                label: "b",
                log: Arc::clone(&log),
            }),
        ]);

        let invoker = ActionInvoker::default();
        let action = counting_action(Arc::clone(&log));
        let ctx = DispatchContext::new("GET", "/");

        let response = run_pipeline(&chain, &invoker, &action, &ctx).await.unwrap();
        assert_eq!(response.body, "done");
        assert_eq!(
            *log.lock().unwrap(),
            vec!["a:enter", "b:enter", "action", "b:exit", "a:exit"]
        );
    }

    #[tokio::test]
    async fn reversed_chain_mirrors_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let chain = chain_of(vec![
            Arc::new(Recording {
                label: "b",
                log: Arc::clone(&log),
            }),
            Arc::new(Recording {
                label: "a",
                log: Arc::clone(&log),
            }),
        ]);

        let invoker = ActionInvoker::default();
        let action = counting_action(Arc::clone(&log));
        let ctx = DispatchContext::new("GET", "/");

        run_pipeline(&chain, &invoker, &action, &ctx).await.unwrap();
        assert_eq!(
            *log.lock().unwrap(),
            vec!["b:enter", "a:enter", "action", "a:exit", "b:exit"]
        );
    }

    #[tokio::test]
    async fn short_circuit_skips_inner_links_and_action() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let chain = chain_of(vec![
            Arc::new(Reject),
            Arc::new(Recording {
                label: "inner",
                log: Arc::clone(&log),
            }),
        ]);

        let invoker = ActionInvoker::default();
        let action = counting_action(Arc::clone(&log));
        let ctx = DispatchContext::new("GET", "/");

        let response = run_pipeline(&chain, &invoker, &action, &ctx).await.unwrap();
        assert_eq!(response.status, 403);
        assert!(log.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn empty_chain_invokes_action_directly() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let invoker = ActionInvoker::default();
        let action = counting_action(Arc::clone(&log));
        let ctx = DispatchContext::new("GET", "/");

        let response = run_pipeline(&[], &invoker, &action, &ctx).await.unwrap();
        assert_eq!(response.body, "done");
        assert_eq!(*log.lock().unwrap(), vec!["action"]);
    }

    #[tokio::test]
    async fn middleware_errors_propagate() {
        struct Failing;

        #[async_trait]
        impl Middleware for Failing {
            async fn handle(&self, _ctx: &DispatchContext, _next: Next<'_>) -> DispatchResult {
                Err(DispatchError::middleware("broken link"))
            }
        }

        let invoker = ActionInvoker::default();
        let action = Action::handler(|_params| async { Ok(Response::ok("unreachable")) });
        let ctx = DispatchContext::new("GET", "/");
        let chain = chain_of(vec![Arc::new(Failing)]);

        let err = run_pipeline(&chain, &invoker, &action, &ctx)
            .await
            .unwrap_err();
        assert!(matches!(err, DispatchError::Middleware(_)));
    }

    #[test]
    fn named_ref_from_str() {
        let mw: MiddlewareRef = "auth".into();
        assert!(matches!(mw, MiddlewareRef::Named(ref n) if n == "auth"));
    }
}

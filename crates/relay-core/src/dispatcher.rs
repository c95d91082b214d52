//! Request dispatcher: resolve → match → build pipeline → execute.
//!
//! The [`Dispatcher`] owns the route table, the global middleware chain,
//! the controller and middleware registries, and the fallback action. Its
//! lifecycle has two phases:
//!
//! 1. **Registration** (`&mut self`): controllers and middleware are named,
//!    routes are registered and validated fail-fast. Malformed templates and
//!    unknown names are rejected here, never at dispatch.
//! 2. **Dispatch** (`&self`): the table is read-only, so a single dispatcher
//!    behind an `Arc` serves HTTP-style and message-stream callers
//!    concurrently without locking.
//!
//! A dispatch cycle walks a fixed path: normalize the inbound path, scan the
//! route table in registration order, merge global and route middleware
//! (global first), then run the pipeline around the terminal action. A
//! lookup miss is not an error — it produces the fallback action wrapped in
//! the global middleware only, since no route was identified to own the
//! request. A dispatch-time action resolution failure is logged (it means a
//! misconfigured route) and degrades to the same fallback path.
//!
//! # Example
//!
//! ```rust,ignore
//! let mut dispatcher = Dispatcher::http();
//! dispatcher.register_controller("Users", || UsersController);
//! dispatcher.get("/users/<id>", Action::parse("Users@show")?, &[])?;
//!
//! let response = dispatcher.dispatch("GET", "/users/42").await?;
//! ```

use std::sync::Arc;

use tracing::{Instrument, Level, debug, error, span};

use crate::action::{Action, ActionInvoker, Controller, ControllerRegistry};
use crate::context::DispatchContext;
use crate::error::{DispatchError, DispatchResult, RegistrationError};
use crate::middleware::{Middleware, MiddlewareRef, MiddlewareRegistry, run_pipeline};
use crate::pattern::Pattern;
use crate::response::Response;
use crate::route::{RouteEntry, RouteTable, WILDCARD};

/// How inbound strings are normalized before matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DispatchMode {
    /// URL paths: query string stripped, optional prefix stripped, trailing
    /// separator enforced on templates and inputs alike.
    #[default]
    Http,
    /// Bot messages: surrounding whitespace trimmed, nothing appended.
    Message,
}

/// The central dispatch object.
pub struct Dispatcher {
    mode: DispatchMode,
    path_prefix: Option<String>,
    table: RouteTable,
    global: Vec<Arc<dyn Middleware>>,
    middlewares: MiddlewareRegistry,
    invoker: ActionInvoker,
    fallback: Action,
}

impl Dispatcher {
    /// Creates an empty dispatcher in the given mode.
    ///
    /// The fallback starts as a built-in handler producing
    /// [`Response::not_found`].
    pub fn new(mode: DispatchMode) -> Self {
        Self {
            mode,
            path_prefix: None,
            table: RouteTable::new(),
            global: Vec::new(),
            middlewares: MiddlewareRegistry::new(),
            invoker: ActionInvoker::default(),
            fallback: Action::handler(|_params| async { Ok(Response::not_found()) }),
        }
    }

    /// Shorthand for `Dispatcher::new(DispatchMode::Http)`.
    pub fn http() -> Self {
        Self::new(DispatchMode::Http)
    }

    /// Shorthand for `Dispatcher::new(DispatchMode::Message)`.
    pub fn message() -> Self {
        Self::new(DispatchMode::Message)
    }

    /// Sets a path prefix stripped from inbound HTTP paths, e.g.
    /// `/index.php`. Ignored in message mode.
    pub fn with_path_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.path_prefix = Some(prefix.into());
        self
    }

    /// The dispatcher's normalization mode.
    pub fn mode(&self) -> DispatchMode {
        self.mode
    }

    /// Number of registered templates.
    pub fn route_count(&self) -> usize {
        self.table.len()
    }

    /// The controller registry (read side).
    pub fn controllers(&self) -> &ControllerRegistry {
        self.invoker.controllers()
    }

    // ─── Registration phase ──────────────────────────────────────────────

    /// Registers a controller factory under a name.
    pub fn register_controller<F, C>(&mut self, name: impl Into<String>, factory: F)
    where
        F: Fn() -> C + Send + Sync + 'static,
        C: Controller + 'static,
    {
        self.invoker.controllers_mut().register(name, factory);
    }

    /// Registers a middleware factory under a name, making it addressable
    /// from route registrations via [`MiddlewareRef::Named`].
    pub fn register_middleware<F, M>(&mut self, name: impl Into<String>, factory: F)
    where
        F: Fn() -> M + Send + Sync + 'static,
        M: Middleware + 'static,
    {
        self.middlewares.register(name, factory);
    }

    /// Appends a middleware to the global chain.
    ///
    /// Global middleware wraps every dispatch — matched routes and the
    /// fallback alike — and always runs before route-specific middleware,
    /// in the order added.
    pub fn add_global_middleware(
        &mut self,
        middleware: impl Into<MiddlewareRef>,
    ) -> Result<(), RegistrationError> {
        let resolved = self.resolve_middleware(&middleware.into())?;
        self.global.push(resolved);
        Ok(())
    }

    /// Replaces the fallback action invoked when no route matches.
    ///
    /// Controller actions are validated against the registry here, like any
    /// route registration.
    pub fn set_fallback(&mut self, action: Action) -> Result<(), RegistrationError> {
        self.validate_action(&action)?;
        self.fallback = action;
        Ok(())
    }

    /// Registers an action under every `(discriminator, template)` pair.
    ///
    /// All templates are compiled and all names resolved before the table
    /// is touched, so a failed call leaves the dispatcher unchanged.
    /// Re-registering an existing template overwrites silently per
    /// discriminator and keeps the template's scan priority.
    pub fn register_route(
        &mut self,
        discriminators: &[&str],
        templates: &[&str],
        action: Action,
        middleware: &[MiddlewareRef],
    ) -> Result<(), RegistrationError> {
        if discriminators.is_empty() || templates.is_empty() {
            return Ok(());
        }

        self.validate_action(&action)?;

        let resolved: Vec<Arc<dyn Middleware>> = middleware
            .iter()
            .map(|m| self.resolve_middleware(m))
            .collect::<Result<_, _>>()?;

        let patterns: Vec<Pattern> = templates
            .iter()
            .map(|t| Pattern::compile(&self.normalize_template(t)))
            .collect::<Result<_, _>>()?;

        let discriminators: Vec<String> =
            discriminators.iter().map(|d| d.to_uppercase()).collect();

        for pattern in patterns {
            debug!(
                template = pattern.template(),
                discriminators = ?discriminators,
                "route registered"
            );
            self.table.insert(
                pattern,
                &discriminators,
                RouteEntry::new(action.clone(), resolved.clone()),
            );
        }

        Ok(())
    }

    /// Registers a `GET` route.
    pub fn get(
        &mut self,
        template: &str,
        action: Action,
        middleware: &[MiddlewareRef],
    ) -> Result<(), RegistrationError> {
        self.register_route(&["GET"], &[template], action, middleware)
    }

    /// Registers a `POST` route.
    pub fn post(
        &mut self,
        template: &str,
        action: Action,
        middleware: &[MiddlewareRef],
    ) -> Result<(), RegistrationError> {
        self.register_route(&["POST"], &[template], action, middleware)
    }

    /// Registers a `PUT` route.
    pub fn put(
        &mut self,
        template: &str,
        action: Action,
        middleware: &[MiddlewareRef],
    ) -> Result<(), RegistrationError> {
        self.register_route(&["PUT"], &[template], action, middleware)
    }

    /// Registers a `DELETE` route.
    pub fn delete(
        &mut self,
        template: &str,
        action: Action,
        middleware: &[MiddlewareRef],
    ) -> Result<(), RegistrationError> {
        self.register_route(&["DELETE"], &[template], action, middleware)
    }

    /// Registers a route under the wildcard discriminator, matching any
    /// method (HTTP) or any message type (message mode).
    pub fn any(
        &mut self,
        template: &str,
        action: Action,
        middleware: &[MiddlewareRef],
    ) -> Result<(), RegistrationError> {
        self.register_route(&[WILDCARD], &[template], action, middleware)
    }

    fn validate_action(&self, action: &Action) -> Result<(), RegistrationError> {
        if let Action::Controller { name, .. } = action {
            if !self.invoker.controllers().contains(name) {
                return Err(RegistrationError::UnknownController(name.clone()));
            }
        }
        Ok(())
    }

    fn resolve_middleware(
        &self,
        middleware: &MiddlewareRef,
    ) -> Result<Arc<dyn Middleware>, RegistrationError> {
        match middleware {
            MiddlewareRef::Named(name) => self
                .middlewares
                .resolve(name)
                .ok_or_else(|| RegistrationError::UnknownMiddleware(name.clone())),
            MiddlewareRef::Instance(instance) => Ok(Arc::clone(instance)),
        }
    }

    // ─── Dispatch phase ──────────────────────────────────────────────────

    /// Dispatches one inbound request.
    ///
    /// `discriminator` is the HTTP method (case-insensitive) or
    /// [`WILDCARD`] for message dispatch; `raw_path` is the unresolved path
    /// or message text. Returns the pipeline result, or the fallback result
    /// when nothing matches.
    pub async fn dispatch(&self, discriminator: &str, raw_path: &str) -> DispatchResult {
        let discriminator = discriminator.to_uppercase();
        let path = self.resolve_path(raw_path);
        let span = span!(Level::DEBUG, "dispatch", discriminator = %discriminator, path = %path);
        self.dispatch_resolved(&discriminator, &path)
            .instrument(span)
            .await
    }

    /// Runs the match → build → execute sequence on an already-resolved
    /// path.
    async fn dispatch_resolved(&self, discriminator: &str, path: &str) -> DispatchResult {
        let Some(found) = self.table.lookup(discriminator, path) else {
            debug!("no route matched, dispatching fallback");
            return self.run_fallback(discriminator, path).await;
        };

        debug!(template = found.template, "route matched");
        let ctx =
            DispatchContext::new(discriminator, path).with_match(found.template, found.params);

        let chain: Vec<Arc<dyn Middleware>> = self
            .global
            .iter()
            .chain(found.entry.middleware())
            .cloned()
            .collect();

        match run_pipeline(&chain, &self.invoker, found.entry.action(), &ctx).await {
            Err(DispatchError::Action(err)) if err.is_resolution() => {
                error!(
                    error = %err,
                    template = found.template,
                    "action resolution failed, degrading to fallback"
                );
                self.run_fallback(discriminator, path).await
            }
            result => result,
        }
    }

    /// Dispatches a bot message under the wildcard discriminator.
    pub async fn dispatch_message(&self, text: &str) -> DispatchResult {
        self.dispatch(WILDCARD, text).await
    }

    /// Runs the fallback action wrapped in the global chain only.
    ///
    /// Route-specific middleware never applies here: no route owns the
    /// request.
    async fn run_fallback(&self, discriminator: &str, path: &str) -> DispatchResult {
        let ctx = DispatchContext::new(discriminator, path);
        match run_pipeline(&self.global, &self.invoker, &self.fallback, &ctx).await {
            Err(DispatchError::Action(err)) if err.is_resolution() => {
                // A broken fallback must not take the dispatcher down with it.
                error!(error = %err, "fallback action unresolvable, returning bare not-found");
                Ok(Response::not_found())
            }
            result => result,
        }
    }

    /// Normalizes an inbound path/message per the dispatch mode.
    fn resolve_path(&self, raw: &str) -> String {
        match self.mode {
            DispatchMode::Http => {
                let without_query = match raw.split_once('?') {
                    Some((path, _query)) => path,
                    None => raw,
                };
                let stripped = match &self.path_prefix {
                    Some(prefix) => without_query.strip_prefix(prefix.as_str()).unwrap_or(without_query),
                    None => without_query,
                };
                let mut path = if stripped.is_empty() {
                    "/".to_string()
                } else {
                    stripped.to_string()
                };
                if !path.ends_with('/') {
                    path.push('/');
                }
                path
            }
            DispatchMode::Message => raw.trim().to_string(),
        }
    }

    /// Normalizes a template the same way inbound strings are normalized.
    fn normalize_template(&self, template: &str) -> String {
        match self.mode {
            DispatchMode::Http => {
                let mut template = if template.is_empty() {
                    "/".to_string()
                } else {
                    template.to_string()
                };
                if !template.ends_with('/') {
                    template.push('/');
                }
                template
            }
            DispatchMode::Message => template.trim().to_string(),
        }
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("mode", &self.mode)
            .field("routes", &self.table.len())
            .field("global_middleware", &self.global.len())
            .finish()
    }
}

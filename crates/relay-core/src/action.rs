//! Action descriptors and their invocation.
//!
//! A route's terminal action comes in three registrable shapes, mirroring
//! the `registerRoute` surface:
//!
//! - a function handler ([`Action::handler`]),
//! - a `(controller, method)` pair ([`Action::controller`]),
//! - a `"Controller@method"` spec string ([`Action::parse`]).
//!
//! All three normalize into the [`Action`] tagged union. Controller names
//! resolve against a [`ControllerRegistry`] — an explicit name → factory
//! lookup table, no reflection — and unknown names fail at registration
//! rather than at dispatch. A fresh controller instance is constructed per
//! invocation; controllers are stateless or self-initializing.
//!
//! Parameters are passed as a single structured [`PathParams`] value,
//! uniformly for every action shape.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use futures::future::BoxFuture;

use crate::error::{ActionError, BoxError, RegistrationError};
use crate::pattern::PathParams;
use crate::response::Response;

/// Future returned by a function handler.
pub type HandlerFuture = BoxFuture<'static, Result<Response, BoxError>>;

/// Type-erased function handler.
pub type HandlerFn = Arc<dyn Fn(PathParams) -> HandlerFuture + Send + Sync>;

/// A terminal action descriptor, resolved lazily at dispatch time.
#[derive(Clone)]
pub enum Action {
    /// A function handler invoked with the extracted parameters.
    Handler(HandlerFn),
    /// A controller method, resolved through the [`ControllerRegistry`].
    Controller {
        /// Registered controller name.
        name: String,
        /// Method to invoke on the constructed instance.
        method: String,
    },
}

impl Action {
    /// Wraps an async function as a handler action.
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// let action = Action::handler(|params: PathParams| async move {
    ///     Ok(Response::ok(format!("user:{}", params.get("id").unwrap_or(""))))
    /// });
    /// ```
    pub fn handler<F, Fut>(f: F) -> Self
    where
        F: Fn(PathParams) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Response, BoxError>> + Send + 'static,
    {
        Self::Handler(Arc::new(move |params| {
            let fut: HandlerFuture = Box::pin(f(params));
            fut
        }))
    }

    /// References a controller method by name.
    pub fn controller(name: impl Into<String>, method: impl Into<String>) -> Self {
        Self::Controller {
            name: name.into(),
            method: method.into(),
        }
    }

    /// Parses a `"Controller@method"` spec string.
    pub fn parse(spec: &str) -> Result<Self, RegistrationError> {
        match spec.split_once('@') {
            Some((name, method)) if !name.is_empty() && !method.is_empty() => {
                Ok(Self::controller(name, method))
            }
            _ => Err(RegistrationError::MalformedActionSpec(spec.to_string())),
        }
    }
}

impl fmt::Debug for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Handler(_) => f.write_str("Action::Handler"),
            Self::Controller { name, method } => write!(f, "Action::Controller({name}@{method})"),
        }
    }
}

/// A named unit of route handling, constructed fresh per invocation.
///
/// Implementors dispatch on the method name and return
/// [`ActionError::unknown_method`] for anything they do not expose:
///
/// ```rust,ignore
/// struct Users;
///
/// #[async_trait]
/// impl Controller for Users {
///     async fn call(&self, method: &str, params: PathParams) -> Result<Response, ActionError> {
///         match method {
///             "show" => Ok(Response::ok(format!("user:{}", params.get("id").unwrap_or("")))),
///             _ => Err(ActionError::unknown_method("Users", method)),
///         }
///     }
/// }
/// ```
#[async_trait]
pub trait Controller: Send + Sync {
    /// Invokes the named method with the extracted parameters.
    async fn call(&self, method: &str, params: PathParams) -> Result<Response, ActionError>;
}

/// Factory producing a fresh controller instance per invocation.
pub type ControllerFactory = Arc<dyn Fn() -> Box<dyn Controller> + Send + Sync>;

/// Name → factory lookup table for controllers.
///
/// Populated during the registration phase and read-only afterwards; route
/// registration validates controller names against it so that a broken name
/// is caught before the first dispatch.
#[derive(Clone, Default)]
pub struct ControllerRegistry {
    factories: HashMap<String, ControllerFactory>,
}

impl ControllerRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a controller factory under a name.
    ///
    /// Re-registering a name overwrites the previous factory.
    pub fn register<F, C>(&mut self, name: impl Into<String>, factory: F)
    where
        F: Fn() -> C + Send + Sync + 'static,
        C: Controller + 'static,
    {
        self.factories.insert(
            name.into(),
            Arc::new(move || Box::new(factory()) as Box<dyn Controller>),
        );
    }

    /// Returns `true` if a controller is registered under `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    /// Number of registered controllers.
    pub fn len(&self) -> usize {
        self.factories.len()
    }

    /// Returns `true` if no controllers are registered.
    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }

    /// Constructs a fresh instance of the named controller.
    pub(crate) fn construct(&self, name: &str) -> Option<Box<dyn Controller>> {
        self.factories.get(name).map(|f| f())
    }
}

impl fmt::Debug for ControllerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ControllerRegistry")
            .field("len", &self.factories.len())
            .finish()
    }
}

/// Normalizes every [`Action`] shape into a single invocation contract.
#[derive(Debug, Clone, Default)]
pub struct ActionInvoker {
    controllers: ControllerRegistry,
}

impl ActionInvoker {
    /// Creates an invoker over a controller registry.
    pub fn new(controllers: ControllerRegistry) -> Self {
        Self { controllers }
    }

    /// The underlying controller registry.
    pub fn controllers(&self) -> &ControllerRegistry {
        &self.controllers
    }

    /// Mutable access to the controller registry (registration phase only).
    pub fn controllers_mut(&mut self) -> &mut ControllerRegistry {
        &mut self.controllers
    }

    /// Invokes an action with the extracted parameters.
    ///
    /// Controller actions construct a fresh instance per call. Resolution
    /// failures are reported as [`ActionError::UnknownController`] /
    /// [`ActionError::UnknownMethod`]; the dispatcher downgrades those to the
    /// fallback path.
    pub async fn invoke(&self, action: &Action, params: PathParams) -> Result<Response, ActionError> {
        match action {
            Action::Handler(f) => f(params).await.map_err(ActionError::Failed),
            Action::Controller { name, method } => {
                let controller = self
                    .controllers
                    .construct(name)
                    .ok_or_else(|| ActionError::UnknownController(name.clone()))?;
                controller.call(method, params).await
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Users;

    #[async_trait]
    impl Controller for Users {
        async fn call(&self, method: &str, params: PathParams) -> Result<Response, ActionError> {
            match method {
                "show" => Ok(Response::ok(format!(
                    "user:{}",
                    params.get("id").unwrap_or("")
                ))),
                _ => Err(ActionError::unknown_method("Users", method)),
            }
        }
    }

    fn params(pairs: &[(&str, &str)]) -> PathParams {
        pairs
            .iter()
            .map(|(n, v)| (n.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn parse_accepts_controller_at_method() {
        let action = Action::parse("Users@show").unwrap();
        assert!(matches!(
            action,
            Action::Controller { ref name, ref method } if name == "Users" && method == "show"
        ));
    }

    #[test]
    fn parse_rejects_malformed_specs() {
        for spec in ["Users", "@show", "Users@", "@"] {
            assert!(matches!(
                Action::parse(spec),
                Err(RegistrationError::MalformedActionSpec(_))
            ));
        }
    }

    #[tokio::test]
    async fn handler_receives_params() {
        let invoker = ActionInvoker::default();
        let action = Action::handler(|params: PathParams| async move {
            Ok(Response::ok(params.get("id").unwrap_or("none").to_string()))
        });

        let response = invoker
            .invoke(&action, params(&[("id", "42")]))
            .await
            .unwrap();
        assert_eq!(response.body, "42");
    }

    #[tokio::test]
    async fn controller_method_is_invoked() {
        let mut registry = ControllerRegistry::new();
        registry.register("Users", || Users);
        let invoker = ActionInvoker::new(registry);

        let response = invoker
            .invoke(&Action::controller("Users", "show"), params(&[("id", "7")]))
            .await
            .unwrap();
        assert_eq!(response.body, "user:7");
    }

    #[tokio::test]
    async fn fresh_instance_per_invocation() {
        static BUILT: AtomicUsize = AtomicUsize::new(0);

        struct Counting;

        #[async_trait]
        impl Controller for Counting {
            async fn call(&self, _method: &str, _params: PathParams) -> Result<Response, ActionError> {
                Ok(Response::ok(""))
            }
        }

        let mut registry = ControllerRegistry::new();
        registry.register("Counting", || {
            BUILT.fetch_add(1, Ordering::SeqCst);
            Counting
        });
        let invoker = ActionInvoker::new(registry);
        let action = Action::controller("Counting", "anything");

        invoker.invoke(&action, PathParams::new()).await.unwrap();
        invoker.invoke(&action, PathParams::new()).await.unwrap();
        assert_eq!(BUILT.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn unknown_controller_is_a_resolution_error() {
        let invoker = ActionInvoker::default();
        let err = invoker
            .invoke(&Action::controller("Ghost", "run"), PathParams::new())
            .await
            .unwrap_err();
        assert!(err.is_resolution());
    }

    #[tokio::test]
    async fn unknown_method_is_a_resolution_error() {
        let mut registry = ControllerRegistry::new();
        registry.register("Users", || Users);
        let invoker = ActionInvoker::new(registry);

        let err = invoker
            .invoke(&Action::controller("Users", "destroy"), PathParams::new())
            .await
            .unwrap_err();
        assert!(err.is_resolution());
    }
}

//! Error types for the Relay dispatch core.
//!
//! The taxonomy follows the lifecycle of a route:
//!
//! - [`PatternError`] — a template failed to compile. Surfaces during
//!   registration and is fatal to that registration call only.
//! - [`RegistrationError`] — a route could not be registered (bad template,
//!   unknown controller or middleware name, malformed action spec).
//! - [`ActionError`] — the terminal action could not be resolved or failed
//!   while running. Resolution failures are downgraded to the fallback path
//!   by the dispatcher; business failures propagate.
//! - [`DispatchError`] — what the caller of `dispatch` sees. A lookup miss is
//!   *not* an error: it produces the fallback response instead.

use thiserror::Error;

/// Boxed error type used at the handler/middleware boundary.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors raised while compiling a route template.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PatternError {
    /// A `<` marker was opened but never closed.
    #[error("unterminated parameter marker in template '{template}'")]
    UnclosedMarker {
        /// The offending template.
        template: String,
    },

    /// A parameter name is empty or not a valid identifier.
    #[error("invalid parameter name '{name}' in template '{template}'")]
    InvalidParamName {
        /// The offending template.
        template: String,
        /// The rejected name.
        name: String,
    },

    /// The same parameter name appears twice in one template.
    #[error("duplicate parameter name '{name}' in template '{template}'")]
    DuplicateParam {
        /// The offending template.
        template: String,
        /// The repeated name.
        name: String,
    },

    /// Two parameter markers with no literal text between them. There is no
    /// unambiguous way to split the input, so this is rejected up front.
    #[error("adjacent parameter markers without a separating literal in template '{template}'")]
    AdjacentParams {
        /// The offending template.
        template: String,
    },

    /// The generated matcher failed to build.
    #[error("template '{template}' failed to compile: {reason}")]
    Compile {
        /// The offending template.
        template: String,
        /// Engine-reported reason.
        reason: String,
    },
}

/// Errors raised while registering a route.
///
/// Registration is fail-fast: every template, action, and middleware
/// reference is validated before the route table is touched, so a failed
/// call leaves the table unchanged.
#[derive(Debug, Error)]
pub enum RegistrationError {
    /// A template failed to compile.
    #[error(transparent)]
    Pattern(#[from] PatternError),

    /// The action names a controller that was never registered.
    #[error("no controller registered under '{0}'")]
    UnknownController(String),

    /// A middleware reference names an entry that was never registered.
    #[error("no middleware registered under '{0}'")]
    UnknownMiddleware(String),

    /// An action spec string did not have the `Controller@method` shape.
    #[error("malformed action spec '{0}', expected 'Controller@method'")]
    MalformedActionSpec(String),
}

/// Errors raised while resolving or running a terminal action.
#[derive(Debug, Error)]
pub enum ActionError {
    /// The descriptor names a controller absent from the registry.
    #[error("no controller registered under '{0}'")]
    UnknownController(String),

    /// The controller exists but does not expose the requested method.
    #[error("controller '{controller}' does not expose method '{method}'")]
    UnknownMethod {
        /// Controller name from the descriptor.
        controller: String,
        /// Method name from the descriptor.
        method: String,
    },

    /// The action ran and failed. This is a business-logic failure and is
    /// propagated unmodified to the dispatch caller.
    #[error(transparent)]
    Failed(#[from] BoxError),
}

impl ActionError {
    /// Creates an [`ActionError::UnknownMethod`].
    pub fn unknown_method(controller: impl Into<String>, method: impl Into<String>) -> Self {
        Self::UnknownMethod {
            controller: controller.into(),
            method: method.into(),
        }
    }

    /// Creates an [`ActionError::Failed`] from any error type.
    pub fn failed(err: impl Into<BoxError>) -> Self {
        Self::Failed(err.into())
    }

    /// Returns `true` if this is a resolution failure (missing controller or
    /// method) rather than a failure of the action itself. The dispatcher
    /// converts resolution failures into the fallback path.
    pub fn is_resolution(&self) -> bool {
        matches!(self, Self::UnknownController(_) | Self::UnknownMethod { .. })
    }
}

/// Errors surfaced to the caller of `dispatch`.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The terminal action failed.
    #[error("action failed: {0}")]
    Action(#[source] ActionError),

    /// A middleware link failed. The core never catches these.
    #[error("middleware failed: {0}")]
    Middleware(#[source] BoxError),
}

impl DispatchError {
    /// Wraps an arbitrary error as a middleware failure.
    pub fn middleware(err: impl Into<BoxError>) -> Self {
        Self::Middleware(err.into())
    }
}

impl From<ActionError> for DispatchError {
    fn from(err: ActionError) -> Self {
        Self::Action(err)
    }
}

/// Result type produced by a full dispatch cycle.
pub type DispatchResult = Result<crate::response::Response, DispatchError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolution_errors_are_flagged() {
        assert!(ActionError::UnknownController("Users".into()).is_resolution());
        assert!(ActionError::unknown_method("Users", "show").is_resolution());
        assert!(!ActionError::failed("boom").is_resolution());
    }

    #[test]
    fn display_includes_names() {
        let err = ActionError::unknown_method("Users", "show");
        assert_eq!(
            err.to_string(),
            "controller 'Users' does not expose method 'show'"
        );
    }
}

//! # Relay Core
//!
//! The request dispatch core of the Relay framework: a path/pattern router
//! that serves both HTTP-style requests and chat-bot message streams
//! through one contract.
//!
//! A dispatch cycle runs a fixed sequence:
//!
//! ```text
//! resolve path ──► match route ──► build pipeline ──► execute
//!                     │                (global ++ route middleware
//!                     │                 around the terminal action)
//!                     └─ no match ──► fallback action (global middleware only)
//! ```
//!
//! - [`Pattern`] compiles a route template (`/users/<id>`) and extracts
//!   named parameters from concrete inputs.
//! - [`RouteTable`] stores templates in registration order; lookup scans
//!   linearly so priority among overlapping templates is explicit.
//! - [`Middleware`] links compose an onion pipeline around the terminal
//!   action via an explicit chain and the [`Next`] cursor.
//! - [`Action`] descriptors (function handler, controller pair,
//!   `"Controller@method"` spec) normalize through the [`ActionInvoker`]
//!   and an explicit [`ControllerRegistry`] — no reflection, unknown names
//!   fail at registration.
//! - [`Dispatcher`] ties it together; [`DispatchService`] exposes it as a
//!   `tower::Service` for transport-level middleware.
//!
//! The dispatcher is built once during a registration phase and is
//! read-only afterwards, so HTTP and message-stream transports can share
//! one instance behind an `Arc` without locking.

pub mod action;
pub mod context;
pub mod dispatcher;
pub mod error;
pub mod middleware;
pub mod pattern;
pub mod response;
pub mod route;
pub mod service;

pub use action::{Action, ActionInvoker, Controller, ControllerRegistry, HandlerFn};
pub use context::DispatchContext;
pub use dispatcher::{DispatchMode, Dispatcher};
pub use error::{
    ActionError, BoxError, DispatchError, DispatchResult, PatternError, RegistrationError,
};
pub use middleware::{Middleware, MiddlewareRef, MiddlewareRegistry, Next};
pub use pattern::{PathParams, Pattern};
pub use response::Response;
pub use route::{RouteEntry, RouteMatch, RouteTable, WILDCARD};
pub use service::{DispatchRequest, DispatchService};

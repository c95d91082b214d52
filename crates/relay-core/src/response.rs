//! The dispatch result payload.
//!
//! A [`Response`] is what a terminal action (or the fallback) produces and
//! what the transport adapter renders. HTTP-style transports use the status
//! code; message-style transports only care about the body.

use serde::{Deserialize, Serialize};

/// Payload returned from a dispatch cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Response {
    /// Status code, HTTP semantics. Message transports ignore it.
    pub status: u16,
    /// Response body.
    pub body: String,
}

impl Response {
    /// Creates a `200` response with the given body.
    pub fn ok(body: impl Into<String>) -> Self {
        Self {
            status: 200,
            body: body.into(),
        }
    }

    /// Creates a response with an explicit status code.
    pub fn with_status(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// The generic "not found" response produced by the built-in fallback.
    ///
    /// Carries no diagnostic detail: unmatched and misconfigured routes
    /// present identically to the caller.
    pub fn not_found() -> Self {
        Self {
            status: 404,
            body: "404 Not Found".to_string(),
        }
    }

    /// Returns `true` for a 404 response.
    pub fn is_not_found(&self) -> bool {
        self.status == 404
    }
}

impl From<String> for Response {
    fn from(body: String) -> Self {
        Self::ok(body)
    }
}

impl From<&str> for Response {
    fn from(body: &str) -> Self {
        Self::ok(body)
    }
}

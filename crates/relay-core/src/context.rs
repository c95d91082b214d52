//! Per-request dispatch state.
//!
//! A [`DispatchContext`] is created for each inbound request and discarded
//! once the response is produced. Nothing in it is shared across requests:
//! the route table stays read-only during dispatch, so concurrent cycles
//! never contend.

use crate::pattern::PathParams;

/// Transient state for one dispatch cycle.
///
/// Handed by reference to every middleware link; the extracted parameters
/// reach the terminal action through the invoker.
#[derive(Debug, Clone)]
pub struct DispatchContext {
    discriminator: String,
    path: String,
    template: Option<String>,
    params: PathParams,
}

impl DispatchContext {
    /// Creates a context for a resolved request with no matched route yet.
    ///
    /// The dispatcher builds one per inbound request; constructing contexts
    /// directly is mainly useful for middleware unit tests.
    pub fn new(discriminator: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            discriminator: discriminator.into(),
            path: path.into(),
            template: None,
            params: PathParams::new(),
        }
    }

    /// Attaches the matched template and its extracted parameters.
    pub fn with_match(mut self, template: impl Into<String>, params: PathParams) -> Self {
        self.template = Some(template.into());
        self.params = params;
        self
    }

    /// The discriminator the request was dispatched under (HTTP method, or
    /// `"*"` for message dispatch).
    pub fn discriminator(&self) -> &str {
        &self.discriminator
    }

    /// The resolved (normalized) path or message text.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// The matched route template, if any. `None` on the fallback path.
    pub fn matched_template(&self) -> Option<&str> {
        self.template.as_deref()
    }

    /// Parameters extracted by the route pattern. Empty on static routes
    /// and on the fallback path.
    pub fn params(&self) -> &PathParams {
        &self.params
    }
}

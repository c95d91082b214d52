//! The route table: templates, entries, and lookup.
//!
//! Templates are kept in registration order and scanned linearly on lookup:
//! the first structural match wins, so priority among overlapping templates
//! is exactly registration order. Lookup cost is linear in the number of
//! templates; any replacement strategy must preserve the registration-order
//! tie-breaking.
//!
//! A template that matches structurally but has no entry for the requested
//! discriminator does **not** end the scan: later templates still get a
//! chance, and only after all templates are exhausted does the dispatcher
//! fall back to the not-found action.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::action::Action;
use crate::middleware::Middleware;
use crate::pattern::{PathParams, Pattern};

/// Discriminator that matches any method / message type.
pub const WILDCARD: &str = "*";

/// What a discriminator maps to on a registered template: the terminal
/// action plus the route-specific middleware, already resolved.
#[derive(Clone)]
pub struct RouteEntry {
    action: Action,
    middleware: Vec<Arc<dyn Middleware>>,
}

impl RouteEntry {
    pub(crate) fn new(action: Action, middleware: Vec<Arc<dyn Middleware>>) -> Self {
        Self { action, middleware }
    }

    /// The terminal action descriptor.
    pub fn action(&self) -> &Action {
        &self.action
    }

    /// Route-specific middleware, in registration order.
    pub fn middleware(&self) -> &[Arc<dyn Middleware>] {
        &self.middleware
    }
}

impl fmt::Debug for RouteEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteEntry")
            .field("action", &self.action)
            .field("middleware_count", &self.middleware.len())
            .finish()
    }
}

/// One registered template with its per-discriminator entries.
struct RouteSlot {
    pattern: Pattern,
    entries: HashMap<String, RouteEntry>,
}

/// A successful lookup: the entry, the template that matched, and the
/// extracted parameters.
pub struct RouteMatch<'a> {
    /// The matched entry.
    pub entry: &'a RouteEntry,
    /// The template that matched.
    pub template: &'a str,
    /// Extracted parameters, empty for static templates.
    pub params: PathParams,
}

/// Ordered mapping from templates to per-discriminator entries.
///
/// Built once during the registration phase, read-only during dispatch; no
/// locking is needed as long as registration finishes before the first
/// lookup.
#[derive(Default)]
pub struct RouteTable {
    slots: Vec<RouteSlot>,
}

impl RouteTable {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of registered templates.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Returns `true` if no templates are registered.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Registered templates in scan order.
    pub fn templates(&self) -> impl Iterator<Item = &str> {
        self.slots.iter().map(|slot| slot.pattern.template())
    }

    /// Inserts an entry for each discriminator under the given pattern.
    ///
    /// Re-registering an existing template keeps its original position in
    /// the scan order; per-discriminator entries are overwritten silently
    /// (last write wins).
    pub(crate) fn insert(&mut self, pattern: Pattern, discriminators: &[String], entry: RouteEntry) {
        let slot = match self
            .slots
            .iter_mut()
            .find(|slot| slot.pattern.template() == pattern.template())
        {
            Some(slot) => slot,
            None => {
                self.slots.push(RouteSlot {
                    pattern,
                    entries: HashMap::new(),
                });
                // Just pushed, so the last slot exists.
                self.slots.last_mut().unwrap()
            }
        };

        for discriminator in discriminators {
            slot.entries.insert(discriminator.clone(), entry.clone());
        }
    }

    /// Scans templates in registration order for the first structural match
    /// carrying the requested discriminator (or a wildcard entry).
    pub fn lookup(&self, discriminator: &str, path: &str) -> Option<RouteMatch<'_>> {
        for slot in &self.slots {
            let Some(params) = slot.pattern.matches(path) else {
                continue;
            };
            if let Some(entry) = slot
                .entries
                .get(discriminator)
                .or_else(|| slot.entries.get(WILDCARD))
            {
                return Some(RouteMatch {
                    entry,
                    template: slot.pattern.template(),
                    params,
                });
            }
            // Structural match without the discriminator: keep scanning.
        }
        None
    }
}

impl fmt::Debug for RouteTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteTable")
            .field("templates", &self.slots.len())
            .finish()
    }
}

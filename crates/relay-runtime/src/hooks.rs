//! Explicit hook registry for lifecycle and extension callbacks.
//!
//! Hooks let application code observe runtime lifecycle points
//! (`runtime.start`, `runtime.stop`) and expose its own extension points.
//! The registry is an ordinary object passed around by `Arc` — there is no
//! process-wide static state, so tests can build a fresh registry or
//! [`clear`](HookRegistry::clear) one between cases.
//!
//! Callbacks registered under one name run in ascending priority order,
//! insertion order among equals.
//!
//! # Example
//!
//! ```rust,ignore
//! let hooks = HookRegistry::new();
//! hooks.add("message.received", 10, |args| {
//!     tracing::info!(?args, "message received");
//!     Value::Null
//! });
//!
//! hooks.trigger("message.received", &[json!({"uid": "alice"})]);
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use serde_json::Value;
use tracing::trace;

/// A hook callback: receives the trigger arguments, returns a value.
pub type HookCallback = Arc<dyn Fn(&[Value]) -> Value + Send + Sync>;

struct HookEntry {
    priority: i32,
    callback: HookCallback,
}

/// Ordered, named callback registry.
#[derive(Default)]
pub struct HookRegistry {
    hooks: RwLock<HashMap<String, Vec<HookEntry>>>,
}

impl HookRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a callback under a hook name.
    ///
    /// Lower priorities run first; equal priorities run in insertion order.
    pub fn add<F>(&self, name: impl Into<String>, priority: i32, callback: F)
    where
        F: Fn(&[Value]) -> Value + Send + Sync + 'static,
    {
        let name = name.into();
        let mut hooks = self.hooks.write();
        let entries = hooks.entry(name).or_default();
        entries.push(HookEntry {
            priority,
            callback: Arc::new(callback),
        });
        entries.sort_by_key(|entry| entry.priority);
    }

    /// Runs every callback registered under `name`, collecting results.
    ///
    /// Unknown names yield an empty vec.
    pub fn trigger(&self, name: &str, args: &[Value]) -> Vec<Value> {
        let callbacks = self.callbacks_for(name);
        trace!(hook = name, count = callbacks.len(), "hook triggered");
        callbacks.iter().map(|cb| cb(args)).collect()
    }

    /// Threads `value` through every callback registered under `name`.
    ///
    /// Each callback receives the current value as its first argument
    /// followed by `args`; its return value becomes the next current value.
    /// Unknown names return `value` unchanged.
    pub fn filter(&self, name: &str, value: Value, args: &[Value]) -> Value {
        let callbacks = self.callbacks_for(name);

        let mut current = value;
        for callback in &callbacks {
            let mut call_args = Vec::with_capacity(args.len() + 1);
            call_args.push(current);
            call_args.extend_from_slice(args);
            current = callback(&call_args);
        }
        current
    }

    /// Returns `true` if any callback is registered under `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.hooks.read().contains_key(name)
    }

    /// Number of callbacks registered under `name`.
    pub fn count(&self, name: &str) -> usize {
        self.hooks.read().get(name).map_or(0, Vec::len)
    }

    /// Removes every registered callback. Intended for test teardown.
    pub fn clear(&self) {
        self.hooks.write().clear();
    }

    /// Snapshots the callbacks for a name so user callbacks never run under
    /// the registry lock.
    fn callbacks_for(&self, name: &str) -> Vec<HookCallback> {
        self.hooks
            .read()
            .get(name)
            .map(|entries| entries.iter().map(|e| Arc::clone(&e.callback)).collect())
            .unwrap_or_default()
    }
}

impl std::fmt::Debug for HookRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HookRegistry")
            .field("hook_names", &self.hooks.read().len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn trigger_collects_results_in_priority_order() {
        let hooks = HookRegistry::new();
        hooks.add("greet", 20, |_args| json!("second"));
        hooks.add("greet", 10, |_args| json!("first"));

        let results = hooks.trigger("greet", &[]);
        assert_eq!(results, vec![json!("first"), json!("second")]);
    }

    #[test]
    fn equal_priorities_keep_insertion_order() {
        let hooks = HookRegistry::new();
        hooks.add("x", 10, |_args| json!("a"));
        hooks.add("x", 10, |_args| json!("b"));

        assert_eq!(hooks.trigger("x", &[]), vec![json!("a"), json!("b")]);
    }

    #[test]
    fn trigger_unknown_hook_is_empty() {
        let hooks = HookRegistry::new();
        assert!(hooks.trigger("nope", &[]).is_empty());
    }

    #[test]
    fn callbacks_receive_arguments() {
        let hooks = HookRegistry::new();
        hooks.add("echo", 10, |args| args.first().cloned().unwrap_or(Value::Null));

        let results = hooks.trigger("echo", &[json!(42)]);
        assert_eq!(results, vec![json!(42)]);
    }

    #[test]
    fn filter_threads_the_value_through() {
        let hooks = HookRegistry::new();
        hooks.add("title", 10, |args| {
            json!(format!("{}!", args[0].as_str().unwrap_or("")))
        });
        hooks.add("title", 20, |args| {
            json!(args[0].as_str().unwrap_or("").to_uppercase())
        });

        let result = hooks.filter("title", json!("hello"), &[]);
        assert_eq!(result, json!("HELLO!"));
    }

    #[test]
    fn filter_unknown_hook_returns_value() {
        let hooks = HookRegistry::new();
        assert_eq!(hooks.filter("nope", json!(7), &[]), json!(7));
    }

    #[test]
    fn clear_removes_everything() {
        let hooks = HookRegistry::new();
        hooks.add("a", 10, |_args| Value::Null);
        assert_eq!(hooks.count("a"), 1);

        hooks.clear();
        assert!(!hooks.contains("a"));
        assert_eq!(hooks.count("a"), 0);
    }
}

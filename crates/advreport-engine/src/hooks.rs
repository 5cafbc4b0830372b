//! Success hooks.
//!
//! Callbacks registered per action method, fired after a single-item or
//! bulk action reports success.
//!
//! ## Execution Order
//!
//! 1. Hooks for the action's method (registration order)
//! 2. Wildcard hooks registered under [`ALL_ACTIONS`] (registration order)

use advreport_core::ActionDescriptor;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Method key matching every action.
pub const ALL_ACTIONS: &str = "__all__";

static HOOK_ID_COUNTER: AtomicU64 = AtomicU64::new(0);

fn generate_hook_id() -> String {
    let id = HOOK_ID_COUNTER.fetch_add(1, Ordering::Relaxed);
    format!("success:{}", id)
}

pub type SuccessCallback = Arc<dyn Fn(&ActionDescriptor) + Send + Sync>;

struct HookEntry {
    id: String,
    callback: SuccessCallback,
}

/// Registry of success callbacks keyed by action method.
#[derive(Default)]
pub struct SuccessHooks {
    hooks: RwLock<HashMap<String, Vec<HookEntry>>>,
}

impl SuccessHooks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a callback for `method`. Returns the hook id for removal.
    pub fn on<F>(&self, method: &str, callback: F) -> String
    where
        F: Fn(&ActionDescriptor) + Send + Sync + 'static,
    {
        let id = generate_hook_id();
        self.hooks
            .write()
            .entry(method.to_string())
            .or_default()
            .push(HookEntry {
                id: id.clone(),
                callback: Arc::new(callback),
            });
        tracing::debug!("Added success hook for '{}' (id: {})", method, id);
        id
    }

    /// Register a callback for every action.
    pub fn on_any<F>(&self, callback: F) -> String
    where
        F: Fn(&ActionDescriptor) + Send + Sync + 'static,
    {
        self.on(ALL_ACTIONS, callback)
    }

    /// Remove a hook by id. Returns true if it was registered.
    pub fn remove(&self, id: &str) -> bool {
        let mut hooks = self.hooks.write();
        for entries in hooks.values_mut() {
            if let Some(pos) = entries.iter().position(|e| e.id == id) {
                entries.remove(pos);
                tracing::debug!("Removed success hook {}", id);
                return true;
            }
        }
        false
    }

    pub fn has_hooks(&self, method: &str) -> bool {
        let hooks = self.hooks.read();
        [method, ALL_ACTIONS]
            .iter()
            .any(|key| hooks.get(*key).is_some_and(|e| !e.is_empty()))
    }

    /// Fire the hooks for `action`. Returns how many ran.
    ///
    /// Callbacks are collected first and run without the lock held, so a
    /// callback may register further hooks.
    pub fn fire(&self, action: &ActionDescriptor) -> usize {
        let callbacks: Vec<SuccessCallback> = {
            let hooks = self.hooks.read();
            let mut keys = vec![action.method.as_str()];
            if action.method != ALL_ACTIONS {
                keys.push(ALL_ACTIONS);
            }
            keys.iter()
                .filter_map(|key| hooks.get(*key))
                .flat_map(|entries| entries.iter().map(|e| e.callback.clone()))
                .collect()
        };

        for callback in &callbacks {
            callback(action);
        }
        if !callbacks.is_empty() {
            tracing::debug!(
                "Fired {} success hook(s) for '{}'",
                callbacks.len(),
                action.method
            );
        }
        callbacks.len()
    }
}

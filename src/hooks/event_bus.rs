use super::{Callback, HookRegistry};
use crate::errors::HookError;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

struct Action {
    priority: i32,
    seq: u64,
    callback: Callback,
}

/// In-memory hook registry.
#[derive(Default)]
pub struct EventBus {
    actions: RwLock<HashMap<String, Vec<Action>>>,
    fired: RwLock<HashMap<String, usize>>,
    seq: AtomicU64,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// How many times `event` has been dispatched.
    pub fn did_action(&self, event: &str) -> usize {
        self.fired.read().get(event).copied().unwrap_or(0)
    }

    /// Events with at least one callback, sorted.
    pub fn events(&self) -> Vec<String> {
        let mut events: Vec<String> = self
            .actions
            .read()
            .iter()
            .filter(|(_, actions)| !actions.is_empty())
            .map(|(event, _)| event.clone())
            .collect();
        events.sort();
        events
    }
}

impl HookRegistry for EventBus {
    fn add_action(&self, event: &str, callback: Callback, priority: i32) {
        let seq = self.seq.fetch_add(1, Ordering::Relaxed);
        self.actions
            .write()
            .entry(event.to_string())
            .or_default()
            .push(Action {
                priority,
                seq,
                callback,
            });
        tracing::trace!(event, priority, "Action added");
    }

    fn action_count(&self, event: &str) -> usize {
        self.actions.read().get(event).map(Vec::len).unwrap_or(0)
    }

    fn do_action(&self, event: &str) -> Result<usize, HookError> {
        // Snapshot so callbacks can register further actions without deadlocking.
        let mut queue: Vec<(i32, u64, Callback)> = self
            .actions
            .read()
            .get(event)
            .map(|actions| {
                actions
                    .iter()
                    .map(|a| (a.priority, a.seq, a.callback.clone()))
                    .collect()
            })
            .unwrap_or_default();
        queue.sort_by_key(|(priority, seq, _)| (*priority, *seq));

        *self.fired.write().entry(event.to_string()).or_insert(0) += 1;
        tracing::debug!(event, callbacks = queue.len(), "Dispatching action");

        for (priority, _, callback) in &queue {
            callback().map_err(|err| {
                tracing::warn!(event, priority, error = %err, "Action callback failed");
                HookError::CallbackFailed {
                    event: event.to_string(),
                    priority: *priority,
                    source: err.into(),
                }
            })?;
        }
        Ok(queue.len())
    }
}

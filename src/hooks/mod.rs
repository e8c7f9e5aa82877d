//! Host lifecycle hooks.
//!
//! Components never touch a process-wide hook table; they register callbacks through
//! [`HookRegistry`], and the host (or a test) decides when each event fires.

mod event_bus;

pub use event_bus::EventBus;

use crate::errors::HookError;
use std::sync::Arc;

pub const INIT: &str = "init";
pub const ADMIN_INIT: &str = "admin_init";
pub const AFTER_SETUP_THEME: &str = "after_setup_theme";
pub const ADMIN_NOTICES: &str = "admin_notices";
pub const WIDGETS_INIT: &str = "widgets_init";
pub const REST_API_INIT: &str = "rest_api_init";

/// Priority used by [`HookRegistry::on_event`].
pub const DEFAULT_PRIORITY: i32 = 10;

pub type Callback = Arc<dyn Fn() -> anyhow::Result<()> + Send + Sync>;

/// Wraps a closure as a [`Callback`].
pub fn callback<F>(f: F) -> Callback
where
    F: Fn() -> anyhow::Result<()> + Send + Sync + 'static,
{
    Arc::new(f)
}

pub trait HookRegistry: Send + Sync {
    /// Lower priorities run first; equal priorities run in registration order.
    fn add_action(&self, event: &str, callback: Callback, priority: i32);

    fn on_event(&self, event: &str, callback: Callback) {
        self.add_action(event, callback, DEFAULT_PRIORITY);
    }

    fn has_action(&self, event: &str) -> bool {
        self.action_count(event) > 0
    }

    fn action_count(&self, event: &str) -> usize;

    /// Runs every callback registered for `event` and returns how many ran.
    /// The first failing callback stops the dispatch.
    fn do_action(&self, event: &str) -> Result<usize, HookError>;
}

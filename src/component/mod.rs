//! Components and the parts they declare.
//!
//! A component lists the ids of its parts in a [`ComponentManifest`]. Every part is
//! built by the container, so its constructor dependencies are injected, and stored
//! as the trait object of its kind (`Arc<dyn AdminPage>`, `Arc<dyn PostType>`, ...).

mod manifest;
mod registrar;

pub use manifest::ComponentManifest;
pub use registrar::ComponentRegistrar;

use crate::hooks::HookRegistry;

pub trait Component: Send + Sync {
    /// Parts this component owns.
    fn manifest(&self) -> ComponentManifest;

    /// Component-specific registration, run after all parts are registered.
    fn register(&self, hooks: &dyn HookRegistry) -> anyhow::Result<()>;
}

/// Registered immediately when its component registers.
pub trait AdminPage: Send + Sync {
    fn register(&self, hooks: &dyn HookRegistry) -> anyhow::Result<()>;
}

/// Registered immediately when its component registers.
pub trait AjaxHandler: Send + Sync {
    fn register(&self, hooks: &dyn HookRegistry) -> anyhow::Result<()>;
}

/// Registered immediately when its component registers.
pub trait Shortcode: Send + Sync {
    fn register(&self, hooks: &dyn HookRegistry) -> anyhow::Result<()>;
}

/// Deferred to `after_setup_theme`.
pub trait PostType: Send + Sync {
    fn register(&self) -> anyhow::Result<()>;
}

/// Deferred to `rest_api_init`.
pub trait RestEndpoint: Send + Sync {
    fn register_routes(&self) -> anyhow::Result<()>;
}

/// Deferred to `widgets_init`.
pub trait Widget: Send + Sync {
    fn register_widget(&self) -> anyhow::Result<()>;
}

/// Deferred to `init`.
pub trait CustomTaxonomy: Send + Sync {
    fn register_taxonomy(&self) -> anyhow::Result<()>;
}

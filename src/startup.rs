//! Plugin bootstrap.
//!
//! `StartUp::boot` hooks the plugin's `init`/`admin_init` callbacks, runs its startup
//! code, collects the components it declares and registers each of them.

use crate::component::ComponentRegistrar;
use crate::config::FrameworkConfig;
use crate::errors::ComponentError;
use crate::hooks::{self, callback, HookRegistry};
use crate::infrastructure::container::Container;
use crate::logging::OperationTimer;
use std::sync::Arc;

/// What a concrete plugin provides to the bootstrap.
pub trait Plugin: Send + Sync + 'static {
    /// Runs before components are collected; the place to add bindings.
    fn startup(&self, _container: &Container) -> anyhow::Result<()> {
        Ok(())
    }

    /// Declares components via [`StartUp::add_component`].
    fn components(&self, startup: &mut StartUp) -> Result<(), ComponentError>;

    /// Runs on the `init` event.
    fn init(&self) -> anyhow::Result<()> {
        Ok(())
    }

    /// Runs on the `admin_init` event.
    fn admin_init(&self) -> anyhow::Result<()> {
        Ok(())
    }
}

pub struct StartUp {
    config: FrameworkConfig,
    container: Container,
    hooks: Arc<dyn HookRegistry>,
    components: Vec<String>,
    loaded: Vec<String>,
}

impl StartUp {
    pub fn new(config: FrameworkConfig, container: Container, hooks: Arc<dyn HookRegistry>) -> Self {
        Self {
            config,
            container,
            hooks,
            components: Vec::new(),
            loaded: Vec::new(),
        }
    }

    /// Builds a container from `config.container` and boots `plugin` with it.
    pub fn boot_with_config<P: Plugin>(
        plugin: Arc<P>,
        config: FrameworkConfig,
        hooks: Arc<dyn HookRegistry>,
    ) -> Result<Self, ComponentError> {
        let container = Container::with_options(config.container.clone());
        Self::boot(plugin, config, container, hooks)
    }

    pub fn boot<P: Plugin>(
        plugin: Arc<P>,
        config: FrameworkConfig,
        container: Container,
        hooks: Arc<dyn HookRegistry>,
    ) -> Result<Self, ComponentError> {
        let timer = OperationTimer::new("plugin_boot").with_metadata("plugin", &config.plugin.name);
        let mut startup = Self::new(config, container, hooks);

        let on_init = plugin.clone();
        startup
            .hooks
            .on_event(hooks::INIT, callback(move || on_init.init()));
        let on_admin_init = plugin.clone();
        startup
            .hooks
            .on_event(hooks::ADMIN_INIT, callback(move || on_admin_init.admin_init()));

        plugin
            .startup(&startup.container)
            .map_err(|err| ComponentError::RegistrationFailed {
                id: startup.config.plugin.name.clone(),
                source: err.into(),
            })?;
        plugin.components(&mut startup)?;
        startup.load_components()?;

        tracing::info!(
            plugin = %startup.config.plugin.name,
            version = %startup.config.plugin.version,
            components = startup.loaded.len(),
            "Plugin booted"
        );
        timer.finish();
        Ok(startup)
    }

    /// Accepts `id` only if the container knows how to produce it.
    pub fn add_component(&mut self, id: &str) -> Result<(), ComponentError> {
        if !(self.container.has(id) || self.container.is_instantiable(id)) {
            return Err(ComponentError::InvalidComponent(id.to_string()));
        }
        self.components.push(id.to_string());
        Ok(())
    }

    /// Registers every added component that has not been loaded yet.
    pub fn load_components(&mut self) -> Result<(), ComponentError> {
        let pending: Vec<String> = self.components[self.loaded.len()..].to_vec();
        let registrar = ComponentRegistrar::new(&self.container, self.hooks.as_ref());
        for id in pending {
            registrar.register(&id)?;
            self.loaded.push(id);
        }
        Ok(())
    }

    pub fn components(&self) -> &[String] {
        &self.components
    }

    pub fn loaded(&self) -> &[String] {
        &self.loaded
    }

    pub fn container(&self) -> &Container {
        &self.container
    }

    pub fn hooks(&self) -> &Arc<dyn HookRegistry> {
        &self.hooks
    }

    pub fn config(&self) -> &FrameworkConfig {
        &self.config
    }
}

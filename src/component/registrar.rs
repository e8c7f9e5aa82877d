use super::{
    AdminPage, AjaxHandler, Component, CustomTaxonomy, PostType, RestEndpoint, Shortcode, Widget,
};
use crate::errors::{ComponentError, ContainerError};
use crate::hooks::{self, callback, HookRegistry};
use crate::infrastructure::container::Container;
use std::sync::Arc;

/// Builds components through the container and wires their parts into the hook registry.
pub struct ComponentRegistrar<'a> {
    container: &'a Container,
    hooks: &'a dyn HookRegistry,
}

impl<'a> ComponentRegistrar<'a> {
    pub fn new(container: &'a Container, hooks: &'a dyn HookRegistry) -> Self {
        Self { container, hooks }
    }

    /// Resolves `id` as a component and registers it together with all of its parts.
    pub fn register(&self, id: &str) -> Result<Arc<dyn Component>, ComponentError> {
        let mut path = Vec::new();
        self.register_nested(id, &mut path)
    }

    /// Resolves `id` as a component without registering anything.
    pub fn component(&self, id: &str) -> Result<Arc<dyn Component>, ComponentError> {
        self.part::<dyn Component>(id, "component")
    }

    fn register_nested(
        &self,
        id: &str,
        path: &mut Vec<String>,
    ) -> Result<Arc<dyn Component>, ComponentError> {
        if path.iter().any(|entry| entry == id) {
            let mut chain = path.clone();
            chain.push(id.to_string());
            return Err(ComponentError::Cycle(chain));
        }
        path.push(id.to_string());

        let component = self.component(id)?;
        let manifest = component.manifest();

        for page_id in &manifest.admin_pages {
            let page = self.part::<dyn AdminPage>(page_id, "admin page")?;
            page.register(self.hooks).map_err(|e| failed(page_id, e))?;
        }

        for type_id in &manifest.post_types {
            let post_type = self.part::<dyn PostType>(type_id, "post type")?;
            self.hooks.on_event(
                hooks::AFTER_SETUP_THEME,
                callback(move || post_type.register()),
            );
        }

        for sub_id in &manifest.sub_components {
            self.register_nested(sub_id, path)?;
        }

        for handler_id in &manifest.ajax_handlers {
            let handler = self.part::<dyn AjaxHandler>(handler_id, "AJAX handler")?;
            handler.register(self.hooks).map_err(|e| failed(handler_id, e))?;
        }

        for shortcode_id in &manifest.shortcodes {
            let shortcode = self.part::<dyn Shortcode>(shortcode_id, "shortcode")?;
            shortcode.register(self.hooks).map_err(|e| failed(shortcode_id, e))?;
        }

        for endpoint_id in &manifest.rest_endpoints {
            let endpoint = self.part::<dyn RestEndpoint>(endpoint_id, "REST endpoint")?;
            self.hooks.on_event(
                hooks::REST_API_INIT,
                callback(move || endpoint.register_routes()),
            );
        }

        for widget_id in &manifest.widgets {
            let widget = self.part::<dyn Widget>(widget_id, "widget")?;
            self.hooks.on_event(
                hooks::WIDGETS_INIT,
                callback(move || widget.register_widget()),
            );
        }

        for taxonomy_id in &manifest.custom_taxonomies {
            let taxonomy = self.part::<dyn CustomTaxonomy>(taxonomy_id, "custom taxonomy")?;
            self.hooks
                .on_event(hooks::INIT, callback(move || taxonomy.register_taxonomy()));
        }

        component.register(self.hooks).map_err(|e| failed(id, e))?;
        path.pop();

        tracing::info!(
            component = id,
            parts = manifest.len(),
            sub_components = manifest.sub_components.len(),
            "Component registered"
        );
        Ok(component)
    }

    /// Parts are stored as `Arc<dyn Kind>` so the registrar can check their kind.
    fn part<T: ?Sized + 'static>(
        &self,
        id: &str,
        expected: &'static str,
    ) -> Result<Arc<T>, ComponentError> {
        let instance = self.container.get(id)?;
        instance
            .contract::<Arc<T>>()
            .map_err(|err| match err {
                ContainerError::TypeMismatch { .. } => ComponentError::WrongKind {
                    id: id.to_string(),
                    expected,
                },
                other => other.into(),
            })
    }
}

fn failed(id: &str, err: anyhow::Error) -> ComponentError {
    ComponentError::RegistrationFailed {
        id: id.to_string(),
        source: err.into(),
    }
}

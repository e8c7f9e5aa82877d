use serde::{Deserialize, Serialize};

/// Ids of the parts a component declares, each list in registration order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComponentManifest {
    pub sub_components: Vec<String>,
    pub admin_pages: Vec<String>,
    pub post_types: Vec<String>,
    pub ajax_handlers: Vec<String>,
    pub shortcodes: Vec<String>,
    pub rest_endpoints: Vec<String>,
    pub widgets: Vec<String>,
    pub custom_taxonomies: Vec<String>,
}

impl ComponentManifest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sub_component(mut self, id: impl Into<String>) -> Self {
        self.sub_components.push(id.into());
        self
    }

    pub fn admin_page(mut self, id: impl Into<String>) -> Self {
        self.admin_pages.push(id.into());
        self
    }

    pub fn post_type(mut self, id: impl Into<String>) -> Self {
        self.post_types.push(id.into());
        self
    }

    pub fn ajax_handler(mut self, id: impl Into<String>) -> Self {
        self.ajax_handlers.push(id.into());
        self
    }

    pub fn shortcode(mut self, id: impl Into<String>) -> Self {
        self.shortcodes.push(id.into());
        self
    }

    pub fn rest_endpoint(mut self, id: impl Into<String>) -> Self {
        self.rest_endpoints.push(id.into());
        self
    }

    pub fn widget(mut self, id: impl Into<String>) -> Self {
        self.widgets.push(id.into());
        self
    }

    pub fn custom_taxonomy(mut self, id: impl Into<String>) -> Self {
        self.custom_taxonomies.push(id.into());
        self
    }

    /// Total number of declared parts, sub-components included.
    pub fn len(&self) -> usize {
        self.sub_components.len()
            + self.admin_pages.len()
            + self.post_types.len()
            + self.ajax_handlers.len()
            + self.shortcodes.len()
            + self.rest_endpoints.len()
            + self.widgets.len()
            + self.custom_taxonomies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

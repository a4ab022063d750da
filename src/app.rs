use anyhow::{anyhow, Context, Result};
use serde_json::Value;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

use crate::component::Component;
use crate::context::UiContext;
use crate::services::LocalService;
use crate::state::get_in;
use crate::ui::UiFactory;

/// Headless UI runtime: views from the application state, rendered into the
/// context document
pub struct App {
    ctx: Arc<UiContext>,
    components: Vec<Arc<Component>>,
}

impl App {
    pub fn new(ctx: Arc<UiContext>) -> Self {
        Self {
            ctx,
            components: Vec::new(),
        }
    }

    pub fn context(&self) -> &Arc<UiContext> {
        &self.ctx
    }

    pub fn components(&self) -> &[Arc<Component>] {
        &self.components
    }

    /// Read the application state JSON file
    pub async fn load_state_file(path: &Path) -> Result<Value> {
        let content = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read state file {}", path.display()))?;
        let state = serde_json::from_str(&content)
            .with_context(|| format!("Invalid JSON in {}", path.display()))?;
        Ok(state)
    }

    /// Register the in-process services declared under `services`
    ///
    /// Each operation answers with its declared `result`; `timelines` and
    /// `pollers` are keyed by operation name.
    pub fn initialize_services(&self) -> usize {
        let state = self.ctx.store().get_state();
        let Some(declared) = state.get("services").and_then(Value::as_object) else {
            return 0;
        };

        for (name, declaration) in declared {
            let service = LocalService::new(
                name.as_str(),
                self.ctx.scheduler(),
                self.ctx.config().stream_capacity,
            );
            if let Some(operations) = declaration.get("operations").and_then(Value::as_object) {
                for (operation, body) in operations {
                    let result = body.get("result").cloned().unwrap_or(Value::Null);
                    service.add_operation(operation, move |_| Ok(result.clone()));
                }
            }
            if let Some(timelines) = declaration.get("timelines") {
                service.load_timelines(timelines);
            }
            if let Some(pollers) = declaration.get("pollers") {
                service.load_pollers(pollers);
            }
            self.ctx.services().register(Arc::new(service));
        }

        info!("Registered {} services from state", declared.len());
        declared.len()
    }

    /// Create every declared view
    pub fn initialize_views(&mut self) -> Result<usize> {
        self.components = UiFactory::create_all(&self.ctx)?;
        Ok(self.components.len())
    }

    /// Load every view and create its bindings; returns the binding count
    pub fn load_all(&self) -> Result<usize> {
        let mut bindings = 0;
        for component in &self.components {
            component.load();
            bindings += component.init_bindings()?;
        }
        Ok(bindings)
    }

    /// Top-level views, or the named one
    fn roots(&self, root: Option<&str>) -> Result<Vec<Arc<Component>>> {
        if let Some(name) = root {
            let component = self
                .ctx
                .registry()
                .get(name)
                .ok_or_else(|| anyhow!("Unknown root view {}", name))?;
            return Ok(vec![component]);
        }

        let state = self.ctx.store().get_state();
        let top_level: Vec<String> = get_in(&state, self.ctx.views_root().keys())
            .and_then(Value::as_object)
            .map(|views| views.keys().cloned().collect())
            .unwrap_or_default();
        Ok(top_level
            .iter()
            .filter_map(|name| self.ctx.registry().get(name))
            .collect())
    }

    /// Render the roots and their descendants, each child inside its parent
    pub async fn render(&self, root: Option<&str>, force: bool) -> Result<()> {
        let mut pending = self.roots(root)?;
        let mut rendered = std::collections::HashSet::new();

        while let Some(component) = pending.pop() {
            if !rendered.insert(component.name().to_string()) {
                continue;
            }
            if let Err(e) = component.render(force).await {
                warn!("Rendering {} failed: {}", component.name(), e);
                continue;
            }

            let Some(parent_element) = component.get_dom_element() else {
                continue;
            };
            let children = component.get_children_component();
            for child in children.iter().rev() {
                if !child.dom().has_element() {
                    let element = self
                        .ctx
                        .document()
                        .get_element_by_id(child.name())
                        .unwrap_or_else(|| self.ctx.document().create_element("div", child.name()));
                    parent_element.append_child(element.clone());
                    child.dom().attach(element);
                }
                pending.push(child.clone());
            }
        }
        Ok(())
    }

    /// Wait for every component pipeline to drain
    pub async fn wait_idle(&self) {
        for component in self.ctx.registry().all() {
            component.wait_idle().await;
        }
    }

    /// Markup of the document body
    pub fn html(&self) -> String {
        self.ctx.document().to_html()
    }

    /// Unload every loaded view, stop timers and drop the components
    pub fn shutdown(&mut self) -> Result<()> {
        for component in &self.components {
            if component.is_observing_store() {
                component.unload()?;
            }
        }
        self.ctx.scheduler().cancel_all();
        self.ctx.registry().clear();
        self.components.clear();
        info!("UI runtime shut down");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::state::MemoryStore;
    use serde_json::json;

    fn app(state: Value) -> App {
        let store = Arc::new(MemoryStore::new(state));
        App::new(UiContext::new(EngineConfig::default(), store))
    }

    #[tokio::test]
    async fn test_render_nests_children() {
        let mut app = app(json!({
            "views": {
                "home": {"type": "container", "items": ["status"]},
                "status": {"type": "label", "label": "Ready"}
            }
        }));
        assert_eq!(app.initialize_views().unwrap(), 2);
        app.load_all().unwrap();

        app.render(Some("home"), false).await.unwrap();
        app.wait_idle().await;

        let home = app.context().document().get_element_by_id("home").unwrap();
        let status = app.context().document().get_element_by_id("status").unwrap();
        assert!(Arc::ptr_eq(&status.parent().unwrap(), &home));
        assert!(app.html().contains("Ready"));

        app.shutdown().unwrap();
        assert!(app.context().registry().is_empty());
    }

    #[tokio::test]
    async fn test_services_from_state() {
        let app = app(json!({
            "services": {
                "resources": {
                    "operations": {"get": {"result": [{"id": 1}]}},
                    "timelines": {"get": {"transform": "id", "max": 2, "name": "ids", "interval_seconds": 1}}
                }
            }
        }));
        assert_eq!(app.initialize_services(), 1);

        let service = app.context().services().lookup("resources").await.unwrap();
        let operation = service.operation("get").unwrap();
        assert!(operation.timeline("ids").is_some());
        let stream = operation.execute(None).unwrap();
        assert_eq!(stream.latest(), Some(json!([{"id": 1}])));
    }

    #[tokio::test]
    async fn test_unknown_root_is_an_error() {
        let app = app(json!({"views": {}}));
        assert!(app.render(Some("nope"), false).await.is_err());
    }
}

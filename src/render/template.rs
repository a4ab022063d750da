//! Templates turn component state into vnodes

use crate::error::UiResult;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// Snapshot of a component's last-rendered markup
#[derive(Debug, Clone, PartialEq)]
pub struct VNode {
    pub markup: String,
    pub rendered_at: DateTime<Utc>,
}

impl VNode {
    pub fn new(markup: impl Into<String>) -> Self {
        Self {
            markup: markup.into(),
            rendered_at: Utc::now(),
        }
    }
}

/// What a template sees of the component it renders
#[derive(Debug, Clone)]
pub struct RenderInput {
    pub name: String,
    pub kind: String,
    pub state: Arc<Value>,
}

/// Asynchronous markup producer
#[async_trait]
pub trait Template: Send + Sync {
    async fn render(&self, input: &RenderInput) -> UiResult<VNode>;
}

/// Renders the `label` attribute, falling back to the component name
#[derive(Debug, Default)]
pub struct DefaultTemplate;

#[async_trait]
impl Template for DefaultTemplate {
    async fn render(&self, input: &RenderInput) -> UiResult<VNode> {
        let label = input
            .state
            .get("label")
            .and_then(Value::as_str)
            .unwrap_or(&input.name);
        Ok(VNode::new(format!(
            "<div class=\"{}\">{}</div>",
            input.kind,
            escape(label)
        )))
    }
}

/// Template backed by a closure
pub struct FnTemplate<F> {
    render_fn: F,
}

impl<F> FnTemplate<F>
where
    F: Fn(&RenderInput) -> UiResult<String> + Send + Sync,
{
    pub fn new(render_fn: F) -> Self {
        Self { render_fn }
    }
}

#[async_trait]
impl<F> Template for FnTemplate<F>
where
    F: Fn(&RenderInput) -> UiResult<String> + Send + Sync,
{
    async fn render(&self, input: &RenderInput) -> UiResult<VNode> {
        (self.render_fn)(input).map(VNode::new)
    }
}

/// Templates by component type
pub struct TemplateRegistry {
    templates: RwLock<HashMap<String, Arc<dyn Template>>>,
    fallback: Option<Arc<dyn Template>>,
}

impl TemplateRegistry {
    /// Registry answering unknown types with [`DefaultTemplate`]
    pub fn new() -> Self {
        Self {
            templates: RwLock::new(HashMap::new()),
            fallback: Some(Arc::new(DefaultTemplate)),
        }
    }

    /// Registry with no fallback: unknown types get no template
    pub fn without_fallback() -> Self {
        Self {
            templates: RwLock::new(HashMap::new()),
            fallback: None,
        }
    }

    pub fn register(&self, kind: impl Into<String>, template: Arc<dyn Template>) {
        self.templates.write().insert(kind.into(), template);
    }

    pub fn get(&self, kind: &str) -> Option<Arc<dyn Template>> {
        self.templates
            .read()
            .get(kind)
            .cloned()
            .or_else(|| self.fallback.clone())
    }
}

impl Default for TemplateRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn input(state: Value) -> RenderInput {
        RenderInput {
            name: "home".to_string(),
            kind: "panel".to_string(),
            state: Arc::new(state),
        }
    }

    #[tokio::test]
    async fn test_default_template() {
        let vnode = DefaultTemplate.render(&input(json!({"label": "<Home>"}))).await.unwrap();
        assert_eq!(vnode.markup, "<div class=\"panel\">&lt;Home&gt;</div>");

        let vnode = DefaultTemplate.render(&input(json!({}))).await.unwrap();
        assert_eq!(vnode.markup, "<div class=\"panel\">home</div>");
    }

    #[test]
    fn test_registry_fallback() {
        let registry = TemplateRegistry::new();
        assert!(registry.get("anything").is_some());

        let bare = TemplateRegistry::without_fallback();
        assert!(bare.get("anything").is_none());
        bare.register("label", Arc::new(FnTemplate::new(|i: &RenderInput| Ok(i.name.clone()))));
        assert!(bare.get("label").is_some());
    }
}

//! Component creation from view descriptions

use crate::component::Component;
use crate::context::UiContext;
use crate::error::UiResult;
use crate::state::{get_in, StatePath};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info};

/// Type given to descriptions that do not declare one
pub const DEFAULT_COMPONENT_TYPE: &str = "component";

/// Find the description of view `name` under `root`
///
/// Views are looked up directly under the root first, then in the
/// `children` of every view, depth first.
pub fn find_component_desc(app_state: &Value, name: &str, root: &StatePath) -> Option<Value> {
    let views = get_in(app_state, root.keys())?.as_object()?;
    if let Some(desc) = views.get(name) {
        return Some(desc.clone());
    }
    views.values().find_map(|view| find_in_children(view, name))
}

fn find_in_children(desc: &Value, name: &str) -> Option<Value> {
    let children = desc.get("children")?.as_object()?;
    if let Some(found) = children.get(name) {
        return Some(found.clone());
    }
    children.values().find_map(|child| find_in_children(child, name))
}

/// Creates and registers components
pub struct UiFactory;

impl UiFactory {
    /// Create component `name` from its description and register it
    pub fn create_component(
        ctx: &Arc<UiContext>,
        name: &str,
        desc: &Value,
    ) -> UiResult<Arc<Component>> {
        let mut settings = match desc {
            Value::Object(map) => map.clone(),
            _ => serde_json::Map::new(),
        };
        settings.insert("name".to_string(), Value::String(name.to_string()));
        settings
            .entry("type")
            .or_insert_with(|| Value::String(DEFAULT_COMPONENT_TYPE.to_string()));

        let component = Component::new(ctx.clone(), Value::Object(settings))?;
        ctx.registry().register(component.clone());
        debug!("Created component {} of type {}", name, component.kind());
        Ok(component)
    }

    /// Create every view declared under the views root, nested children
    /// included, in declaration order
    pub fn create_all(ctx: &Arc<UiContext>) -> UiResult<Vec<Arc<Component>>> {
        let state = ctx.store().get_state();
        let Some(views) = get_in(&state, ctx.views_root().keys()).and_then(Value::as_object) else {
            info!("No views under {}", ctx.views_root());
            return Ok(Vec::new());
        };

        let mut created = Vec::new();
        for (name, desc) in views {
            Self::create_tree(ctx, name, desc, &mut created)?;
        }
        info!("Created {} components", created.len());
        Ok(created)
    }

    fn create_tree(
        ctx: &Arc<UiContext>,
        name: &str,
        desc: &Value,
        created: &mut Vec<Arc<Component>>,
    ) -> UiResult<()> {
        if ctx.registry().contains(name) {
            debug!("Component {} already exists", name);
        } else {
            created.push(Self::create_component(ctx, name, desc)?);
        }

        if let Some(children) = desc.get("children").and_then(Value::as_object) {
            for (child_name, child_desc) in children {
                Self::create_tree(ctx, child_name, child_desc, created)?;
            }
        }
        Ok(())
    }
}

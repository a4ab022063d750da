//! Child resolution from the state tree

use super::Component;
use crate::ui::find_component_desc;
use parking_lot::RwLock;
use serde_json::Value;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, warn};

/// Memoized children of one component
///
/// Children come from the `children` keys of the component description,
/// then from its `items` (a view name or `{ "view": name }`), in declaration
/// order. A name declared twice resolves once. Names without a registered
/// component are skipped.
#[derive(Default)]
pub struct ChildResolver {
    cache: RwLock<Option<Arc<Vec<Arc<Component>>>>>,
}

impl ChildResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// The cached list, computed on first use
    pub fn resolve(&self, owner: &Component) -> Arc<Vec<Arc<Component>>> {
        if let Some(cached) = self.cache.read().as_ref() {
            return cached.clone();
        }

        let resolved = Arc::new(Self::compute(owner));
        let mut cache = self.cache.write();
        // Another caller may have filled the cache meanwhile; keep its list.
        cache.get_or_insert(resolved).clone()
    }

    pub fn reset(&self) {
        *self.cache.write() = None;
    }

    pub fn is_cached(&self) -> bool {
        self.cache.read().is_some()
    }

    fn compute(owner: &Component) -> Vec<Arc<Component>> {
        if owner.is_menubar() {
            return Vec::new();
        }

        let ctx = owner.context();
        let app_state = ctx.store().get_state();
        let desc = find_component_desc(&app_state, owner.name(), ctx.views_root())
            .or_else(|| owner.get_state());

        let mut names: Vec<String> = desc
            .as_ref()
            .and_then(|desc| desc.get("children"))
            .and_then(Value::as_object)
            .map(|children| children.keys().cloned().collect())
            .unwrap_or_default();

        let items = owner
            .get_state_value("items")
            .and_then(|items| items.as_array().cloned())
            .unwrap_or_default();
        for item in items {
            match &item {
                Value::String(name) => names.push(name.clone()),
                Value::Object(map) => match map.get("view").and_then(Value::as_str) {
                    Some(name) => names.push(name.to_string()),
                    None => warn!("Component {}: bad item object {}", owner.name(), item),
                },
                other => warn!("Component {}: bad item type {}", owner.name(), other),
            }
        }

        let mut seen = HashSet::new();
        let mut children = Vec::new();
        for name in names {
            if !seen.insert(name.clone()) {
                continue;
            }
            match ctx.registry().get(&name) {
                Some(component) => children.push(component),
                None => warn!("Component {}: bad item component for {}", owner.name(), name),
            }
        }

        debug!("Component {} resolved {} children", owner.name(), children.len());
        children
    }
}

//! Registered components by name

use crate::component::Component;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

/// Name to component map of one UI runtime
#[derive(Default)]
pub struct UiRegistry {
    components: RwLock<HashMap<String, Arc<Component>>>,
}

impl UiRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a component, returning the one it replaced
    pub fn register(&self, component: Arc<Component>) -> Option<Arc<Component>> {
        let name = component.name().to_string();
        let previous = self.components.write().insert(name.clone(), component);
        if previous.is_some() {
            warn!("Component {} registered twice, previous one replaced", name);
        } else {
            debug!("Component {} registered", name);
        }
        previous
    }

    pub fn get(&self, name: &str) -> Option<Arc<Component>> {
        self.components.read().get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.components.read().contains_key(name)
    }

    pub fn unregister(&self, name: &str) -> Option<Arc<Component>> {
        self.components.write().remove(name)
    }

    /// Sorted component names
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.components.read().keys().cloned().collect();
        names.sort();
        names
    }

    pub fn all(&self) -> Vec<Arc<Component>> {
        self.components.read().values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.components.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every component; components hold the context, so this breaks
    /// the context to registry cycle
    pub fn clear(&self) {
        self.components.write().clear();
    }
}

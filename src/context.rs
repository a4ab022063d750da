//! Dependency injection handle
//!
//! Every component and binding receives the same [`UiContext`] instead of
//! reaching for process-wide singletons.

use crate::config::EngineConfig;
use crate::dom::Document;
use crate::render::{AssetRegistry, TemplateRegistry};
use crate::services::{Scheduler, ServiceRegistry};
use crate::state::{PathKey, StatePath, Store};
use crate::stream::Stream;
use crate::ui::UiRegistry;
use std::sync::Arc;

/// Collaborators shared by one UI runtime
pub struct UiContext {
    config: EngineConfig,
    views_root: StatePath,
    store: Arc<dyn Store>,
    registry: UiRegistry,
    services: ServiceRegistry,
    assets: AssetRegistry,
    document: Document,
    templates: TemplateRegistry,
    runtime_logs: Stream,
}

impl UiContext {
    pub fn new(config: EngineConfig, store: Arc<dyn Store>) -> Arc<Self> {
        let logs = Stream::new("runtime_logs", config.stream_capacity);
        Self::with_runtime_logs(config, store, logs)
    }

    /// Build a context around an existing log stream (see
    /// [`init_tracing`](crate::logging::init_tracing))
    pub fn with_runtime_logs(
        config: EngineConfig,
        store: Arc<dyn Store>,
        runtime_logs: Stream,
    ) -> Arc<Self> {
        Arc::new(Self {
            views_root: StatePath::new(vec![PathKey::from(config.views_root.as_str())]),
            services: ServiceRegistry::new(config.service_lookup_timeout()),
            document: Document::new(config.stream_capacity),
            registry: UiRegistry::new(),
            assets: AssetRegistry::new(),
            templates: TemplateRegistry::new(),
            runtime_logs,
            store,
            config,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Path of the views collection in the application state
    pub fn views_root(&self) -> &StatePath {
        &self.views_root
    }

    pub fn store(&self) -> &Arc<dyn Store> {
        &self.store
    }

    pub fn registry(&self) -> &UiRegistry {
        &self.registry
    }

    pub fn services(&self) -> &ServiceRegistry {
        &self.services
    }

    pub fn scheduler(&self) -> Arc<Scheduler> {
        self.services.scheduler()
    }

    pub fn assets(&self) -> &AssetRegistry {
        &self.assets
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn templates(&self) -> &TemplateRegistry {
        &self.templates
    }

    pub fn runtime_logs(&self) -> &Stream {
        &self.runtime_logs
    }
}

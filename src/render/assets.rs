//! Asset readiness
//!
//! Assets (stylesheets, fonts, scripts) are tracked by id in a shared
//! [`AssetRegistry`]. A component lists the ids it depends on and combines
//! their readiness into one shared future.

use futures::future::{join_all, BoxFuture, FutureExt, Shared};
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use tokio::sync::watch;
use tracing::debug;

/// Combined readiness of a component's assets
pub type AssetsPromise = Shared<BoxFuture<'static, ()>>;

/// Readiness signals by asset id
#[derive(Default)]
pub struct AssetRegistry {
    signals: Mutex<HashMap<String, watch::Sender<bool>>>,
}

impl AssetRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn signal(&self, asset_id: &str) -> watch::Receiver<bool> {
        self.signals
            .lock()
            .entry(asset_id.to_string())
            .or_insert_with(|| watch::channel(false).0)
            .subscribe()
    }

    pub fn mark_ready(&self, asset_id: &str) {
        debug!("Asset {} ready", asset_id);
        self.signals
            .lock()
            .entry(asset_id.to_string())
            .or_insert_with(|| watch::channel(false).0)
            .send_replace(true);
    }

    pub fn is_ready(&self, asset_id: &str) -> bool {
        *self.signal(asset_id).borrow()
    }

    /// Resolves once `asset_id` is marked ready
    pub fn wait_ready(&self, asset_id: &str) -> BoxFuture<'static, ()> {
        let mut receiver = self.signal(asset_id);
        async move {
            // The sender lives in the registry; an error means it is gone.
            let _ = receiver.wait_for(|ready| *ready).await;
        }
        .boxed()
    }
}

/// A component's asset dependencies
#[derive(Default)]
pub struct AssetTracker {
    dependencies: RwLock<Vec<String>>,
    promise: RwLock<Option<AssetsPromise>>,
}

impl AssetTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_dependency(&self, asset_id: impl Into<String>) -> usize {
        let mut dependencies = self.dependencies.write();
        dependencies.push(asset_id.into());
        dependencies.len()
    }

    pub fn dependencies(&self) -> Vec<String> {
        self.dependencies.read().clone()
    }

    /// Combine the readiness of every declared dependency
    pub fn init(&self, registry: &AssetRegistry) {
        let waits: Vec<_> = self
            .dependencies
            .read()
            .iter()
            .map(|asset_id| registry.wait_ready(asset_id))
            .collect();
        let promise = join_all(waits).map(|_| ()).boxed().shared();
        *self.promise.write() = Some(promise);
    }

    pub fn promise(&self) -> Option<AssetsPromise> {
        self.promise.read().clone()
    }
}

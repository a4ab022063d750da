#![allow(dead_code)]

use parking_lot::Mutex;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use viewbind::state::{MemoryStore, Store, StoreAction, StoreListener, StoreSubscription};
use viewbind::ui::{find_component_desc, UiFactory};
use viewbind::{Component, EngineConfig, UiContext, UiResult};

/// Memory store that keeps every dispatched action
pub struct RecordingStore {
    inner: MemoryStore,
    actions: Mutex<Vec<StoreAction>>,
}

impl RecordingStore {
    pub fn new(initial: Value) -> Self {
        Self {
            inner: MemoryStore::new(initial),
            actions: Mutex::new(Vec::new()),
        }
    }

    pub fn actions(&self) -> Vec<StoreAction> {
        self.actions.lock().clone()
    }

    pub fn listener_count(&self) -> usize {
        self.inner.listener_count()
    }
}

impl Store for RecordingStore {
    fn get_state(&self) -> Arc<Value> {
        self.inner.get_state()
    }

    fn dispatch(&self, action: StoreAction) -> UiResult<()> {
        self.actions.lock().push(action.clone());
        self.inner.dispatch(action)
    }

    fn subscribe(&self, listener: StoreListener) -> StoreSubscription {
        self.inner.subscribe(listener)
    }
}

pub fn context_with(state: Value) -> (Arc<UiContext>, Arc<RecordingStore>) {
    let store = Arc::new(RecordingStore::new(state));
    let ctx = UiContext::new(EngineConfig::default(), store.clone());
    (ctx, store)
}

/// Create and register view `name` from its description in the state
pub fn create(ctx: &Arc<UiContext>, name: &str) -> Arc<Component> {
    let state = ctx.store().get_state();
    let desc = find_component_desc(&state, name, ctx.views_root())
        .unwrap_or_else(|| panic!("no description for {}", name));
    UiFactory::create_component(ctx, name, &desc).unwrap()
}

/// Create every declared view
pub fn create_all(ctx: &Arc<UiContext>) -> Vec<Arc<Component>> {
    UiFactory::create_all(ctx).unwrap()
}

/// Let spawned subscription tasks deliver what was pushed
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(30)).await;
}

//! State store contract and the in-memory store
//!
//! Components never write into the state tree. The only mutation channel is
//! [`Store::dispatch`] with a [`StoreAction`]; the store swaps in a new tree
//! and notifies its listeners.

use super::path::{set_in, PathKey, StatePath};
use crate::error::UiResult;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use tracing::debug;

/// Actions accepted by the store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum StoreAction {
    /// Insert or replace a JSON resource
    #[serde(rename = "ADD_JSON_RESOURCE")]
    AddJsonResource {
        resource: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        path: Option<StatePath>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        collection: Option<String>,
        json: Value,
    },
}

/// Callback invoked with the new application state after every dispatch
pub type StoreListener = Arc<dyn Fn(&Arc<Value>) + Send + Sync>;

/// Handle detaching a store listener
pub struct StoreSubscription {
    id: u64,
    detach: Option<Box<dyn FnOnce() + Send + Sync>>,
}

impl StoreSubscription {
    pub fn new<F>(id: u64, detach: F) -> Self
    where
        F: FnOnce() + Send + Sync + 'static,
    {
        Self {
            id,
            detach: Some(Box::new(detach)),
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    /// Detach the listener; a second call is a no-op
    pub fn unsubscribe(&mut self) {
        if let Some(detach) = self.detach.take() {
            detach();
        }
    }

    pub fn is_attached(&self) -> bool {
        self.detach.is_some()
    }
}

impl std::fmt::Debug for StoreSubscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreSubscription")
            .field("id", &self.id)
            .field("attached", &self.is_attached())
            .finish()
    }
}

/// External immutable-state container
pub trait Store: Send + Sync {
    /// Current application state
    fn get_state(&self) -> Arc<Value>;

    /// Submit an action
    fn dispatch(&self, action: StoreAction) -> UiResult<()>;

    /// Register a change listener
    fn subscribe(&self, listener: StoreListener) -> StoreSubscription;
}

type ListenerTable = RwLock<Vec<(u64, StoreListener)>>;

/// In-process store with an `ADD_JSON_RESOURCE` reducer
pub struct MemoryStore {
    state: RwLock<Arc<Value>>,
    listeners: Arc<ListenerTable>,
    next_listener_id: AtomicU64,
}

impl MemoryStore {
    pub fn new(initial: Value) -> Self {
        Self {
            state: RwLock::new(Arc::new(initial)),
            listeners: Arc::new(RwLock::new(Vec::new())),
            next_listener_id: AtomicU64::new(1),
        }
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.read().len()
    }

    fn reduce(state: &Value, action: &StoreAction) -> UiResult<Value> {
        match action {
            StoreAction::AddJsonResource {
                resource,
                path,
                collection,
                json,
            } => {
                let target: Vec<PathKey> = match (path, collection) {
                    (Some(path), _) if !path.is_empty() => path.keys().to_vec(),
                    (_, Some(collection)) => {
                        vec![collection.clone().into(), resource.clone().into()]
                    }
                    _ => vec![resource.clone().into()],
                };
                set_in(state, &target, json.clone())
            }
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new(Value::Object(Default::default()))
    }
}

impl Store for MemoryStore {
    fn get_state(&self) -> Arc<Value> {
        self.state.read().clone()
    }

    fn dispatch(&self, action: StoreAction) -> UiResult<()> {
        let new_state = {
            let mut state = self.state.write();
            let next = Arc::new(Self::reduce(&state, &action)?);
            *state = next.clone();
            next
        };
        debug!("Store dispatched {:?}", action);

        let listeners: Vec<StoreListener> = self
            .listeners
            .read()
            .iter()
            .map(|(_, listener)| listener.clone())
            .collect();
        for listener in listeners {
            listener(&new_state);
        }
        Ok(())
    }

    fn subscribe(&self, listener: StoreListener) -> StoreSubscription {
        let id = self.next_listener_id.fetch_add(1, Ordering::SeqCst);
        self.listeners.write().push((id, listener));

        let table: Weak<ListenerTable> = Arc::downgrade(&self.listeners);
        StoreSubscription::new(id, move || {
            if let Some(table) = table.upgrade() {
                table.write().retain(|(listener_id, _)| *listener_id != id);
            }
        })
    }
}

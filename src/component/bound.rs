//! Load / unload lifecycle and bindings of a component

use super::Component;
use crate::binding::{
    Binding, BindingList, BindingSource, BindingSpec, BindingState, BindingsLoader,
    RawBindingConfig,
};
use crate::error::{UiError, UiResult};
use crate::state::{get_in, StoreListener, StoreSubscription};
use crate::stream::Stream;
use parking_lot::{Mutex, RwLock};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Bindings of one component keyed by binding id
#[derive(Default)]
pub struct BindingManager {
    bindings: RwLock<BTreeMap<String, Arc<dyn Binding>>>,
}

impl BindingManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, binding: Arc<dyn Binding>) {
        self.bindings
            .write()
            .insert(binding.id().to_string(), binding);
    }

    pub fn get(&self, id: &str) -> Option<Arc<dyn Binding>> {
        self.bindings.read().get(id).cloned()
    }

    pub fn ids(&self) -> Vec<String> {
        self.bindings.read().keys().cloned().collect()
    }

    pub fn all(&self) -> Vec<Arc<dyn Binding>> {
        self.bindings.read().values().cloned().collect()
    }

    pub fn remove(&self, id: &str) -> Option<Arc<dyn Binding>> {
        self.bindings.write().remove(id)
    }

    pub fn len(&self) -> usize {
        self.bindings.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Remove and return every binding
    pub fn drain(&self) -> Vec<Arc<dyn Binding>> {
        std::mem::take(&mut *self.bindings.write())
            .into_values()
            .collect()
    }
}

/// The store subscription of one component and its load flag
///
/// The subscription is created by the first `load`, detached by `unload`
/// and attached again by a later `load`.
#[derive(Default)]
pub struct StoreObserver {
    subscription: Mutex<Option<StoreSubscription>>,
    last_slice: Mutex<Option<Value>>,
    loaded: AtomicBool,
}

impl StoreObserver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a subscription was ever created
    pub fn exists(&self) -> bool {
        self.subscription.lock().is_some()
    }

    pub fn is_attached(&self) -> bool {
        self.subscription
            .lock()
            .as_ref()
            .is_some_and(StoreSubscription::is_attached)
    }

    fn attach_with<F>(&self, subscribe: F)
    where
        F: FnOnce() -> StoreSubscription,
    {
        let mut subscription = self.subscription.lock();
        if subscription.as_ref().is_some_and(StoreSubscription::is_attached) {
            return;
        }
        *subscription = Some(subscribe());
    }

    fn detach(&self) {
        if let Some(subscription) = self.subscription.lock().as_mut() {
            subscription.unsubscribe();
        }
    }

    /// Remember the component slice; true when it differs from the last one
    fn record_slice(&self, slice: Option<Value>) -> bool {
        let mut last = self.last_slice.lock();
        if *last == slice {
            return false;
        }
        *last = slice;
        true
    }
}

impl Component {
    pub fn is_loaded(&self) -> bool {
        self.observer.loaded.load(Ordering::SeqCst)
    }

    /// Whether the store observer is currently attached
    pub fn is_observing_store(&self) -> bool {
        self.observer.is_attached()
    }

    /// Attach the store observer and initialize assets
    ///
    /// A no-op while loaded. Bindings are created by
    /// [`init_bindings`](Self::init_bindings).
    pub fn load(self: &Arc<Self>) {
        let _entered = self.span().enter();
        if self.is_loaded() {
            debug!("Component {} already loaded", self.name());
            return;
        }

        self.observer.attach_with(|| {
            let current = get_in(&self.ctx.store().get_state(), self.state_path.keys()).cloned();
            self.observer.record_slice(current);

            let component = Arc::downgrade(self);
            let path = self.state_path.clone();
            let listener: StoreListener = Arc::new(move |state: &Arc<Value>| {
                let Some(component) = component.upgrade() else {
                    return;
                };
                let slice = get_in(state, path.keys()).cloned();
                if component.observer.record_slice(slice) {
                    debug!("State of {} changed", component.name());
                    component.reset_children();
                    let _ticket = component.update();
                }
            });
            self.ctx.store().subscribe(listener)
        });

        if self.get_state().is_none() {
            debug!("Component {} has no state", self.name());
            return;
        }

        self.init_assets();
        self.observer.loaded.store(true, Ordering::SeqCst);
    }

    /// Create the bindings declared in the component state
    ///
    /// Returns how many bindings were created. A precondition error of any
    /// declaration stops the pass and is returned.
    pub fn init_bindings(self: &Arc<Self>) -> UiResult<usize> {
        let _entered = self.span().enter();
        let Some(state) = self.get_state() else {
            return Ok(0);
        };
        let Some(declarations) = state.get("bindings").filter(|b| b.is_object()) else {
            return Ok(0);
        };

        let mut created = 0;
        for list in BindingList::ALL {
            let Some(entries) = declarations.get(list.key()).and_then(Value::as_array) else {
                continue;
            };

            for entry in entries {
                let raw = RawBindingConfig::from_value(entry)?;
                let mut spec = BindingSpec::normalize(raw, list, self.name())?;

                let stream_source = match &spec.source {
                    BindingSource::Stream {
                        name,
                        source_type,
                        source_selector,
                        ..
                    } => Some(self.resolve_source_stream(
                        name,
                        source_type.as_deref(),
                        source_selector.as_deref(),
                    )),
                    _ => None,
                };
                match stream_source {
                    Some(Some(stream)) => spec = spec.with_stream(stream),
                    Some(None) => {
                        warn!("Component {}: dropping stream binding without a valid source", self.name());
                        continue;
                    }
                    None => {}
                }

                let id = format!("binding_{}", Uuid::new_v4());
                for binding in BindingsLoader::load(&id, &self.ctx, self, spec)?.into_vec() {
                    self.bindings.insert(binding.clone());
                    // Setup may have failed before the insert.
                    if matches!(binding.state(), BindingState::Failed(_)) {
                        self.bindings.remove(binding.id());
                        continue;
                    }
                    created += 1;
                }
            }
        }

        info!("Component {} has {} new bindings", self.name(), created);
        Ok(created)
    }

    fn resolve_source_stream(
        &self,
        name: &str,
        source_type: Option<&str>,
        source_selector: Option<&str>,
    ) -> Option<Stream> {
        if name.is_empty() {
            return None;
        }
        match (source_type, source_selector) {
            (Some("views"), Some(selector)) if !selector.is_empty() => {
                match self.ctx.registry().get(selector) {
                    Some(source) => source.get_named_stream(name),
                    None => {
                        warn!("Component {}: stream source view {} not found", self.name(), selector);
                        None
                    }
                }
            }
            _ => self.get_named_stream(name),
        }
    }

    /// Tear down every binding and detach the store observer
    ///
    /// Fails when no store observer was ever created, that is when `load`
    /// never ran.
    pub fn unload(&self) -> UiResult<()> {
        let _entered = self.span().enter();
        if !self.observer.exists() {
            return Err(UiError::precondition(format!(
                "component {}: unload without store observer",
                self.name()
            )));
        }

        let bindings = self.bindings.drain();
        for binding in &bindings {
            binding.unsubscribe();
            binding.unsubscribe_state_update();
        }
        self.observer.detach();
        self.observer.loaded.store(false, Ordering::SeqCst);

        info!("Component {} unloaded {} bindings", self.name(), bindings.len());
        Ok(())
    }

    pub fn bindings(&self) -> Vec<Arc<dyn Binding>> {
        self.bindings.all()
    }

    pub fn binding(&self, id: &str) -> Option<Arc<dyn Binding>> {
        self.bindings.get(id)
    }

    pub fn binding_ids(&self) -> Vec<String> {
        self.bindings.ids()
    }

    pub fn binding_count(&self) -> usize {
        self.bindings.len()
    }

    /// Forget a binding whose setup failed
    ///
    /// The map only holds bindings with a live or pending subscription.
    pub(crate) fn drop_binding(&self, id: &str) {
        if let Some(binding) = self.bindings.remove(id) {
            binding.unsubscribe_state_update();
            debug!("Component {} dropped failed binding {}", self.name(), id);
        }
    }
}

//! State and subscriptions shared by every binding kind

use super::config::{BindingKind, TargetSpec};
use crate::component::Component;
use crate::context::UiContext;
use crate::error::{UiError, UiResult};
use crate::stream::{Stream, Subscription};
use parking_lot::Mutex;
use serde_json::Value;
use std::sync::{Arc, Weak};
use tokio::sync::watch;
use tokio::task::AbortHandle;
use tracing::{debug, error, warn};

/// Lifecycle of a binding
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BindingState {
    Unbound,
    Binding,
    Bound,
    Failed(String),
    Unsubscribed,
}

impl BindingState {
    /// No more transitions happen without an explicit call
    pub fn is_settled(&self) -> bool {
        matches!(
            self,
            BindingState::Bound | BindingState::Failed(_) | BindingState::Unsubscribed
        )
    }
}

#[derive(Default)]
struct Subscriptions {
    values: Option<Subscription>,
    errors: Option<Subscription>,
    state_update: Option<Subscription>,
    setup: Option<AbortHandle>,
    cancelled: bool,
}

/// Identity, targets and live subscriptions of one binding
pub struct BindingCore {
    id: String,
    kind: BindingKind,
    ctx: Arc<UiContext>,
    owner: Weak<Component>,
    owner_name: String,
    target: TargetSpec,
    state_path: Option<Value>,
    state: watch::Sender<BindingState>,
    subscriptions: Mutex<Subscriptions>,
}

impl BindingCore {
    pub fn new(
        id: impl Into<String>,
        kind: BindingKind,
        ctx: Arc<UiContext>,
        owner: &Arc<Component>,
        target: TargetSpec,
        state_path: Option<Value>,
    ) -> Self {
        let (state, _) = watch::channel(BindingState::Unbound);
        Self {
            id: id.into(),
            kind,
            ctx,
            owner: Arc::downgrade(owner),
            owner_name: owner.name().to_string(),
            target,
            state_path,
            state,
            subscriptions: Mutex::new(Subscriptions::default()),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn kind(&self) -> BindingKind {
        self.kind
    }

    pub fn target(&self) -> &TargetSpec {
        &self.target
    }

    pub fn context(&self) -> &Arc<UiContext> {
        &self.ctx
    }

    pub fn owner(&self) -> Option<Arc<Component>> {
        self.owner.upgrade()
    }

    pub fn owner_name(&self) -> &str {
        &self.owner_name
    }

    pub fn state(&self) -> BindingState {
        self.state.borrow().clone()
    }

    /// Wait until the binding is bound, failed or unsubscribed
    pub async fn settled(&self) -> BindingState {
        let mut receiver = self.state.subscribe();
        let settled = match receiver.wait_for(BindingState::is_settled).await {
            Ok(state) => state.clone(),
            Err(_) => self.state(),
        };
        settled
    }

    /// Whether a value subscription is live
    pub fn is_subscribed(&self) -> bool {
        self.subscriptions.lock().values.is_some()
    }

    pub fn has_state_update(&self) -> bool {
        self.subscriptions.lock().state_update.is_some()
    }

    /// Check the target side of the declaration
    pub fn validate_target(&self) -> UiResult<()> {
        if self.target.targets.is_empty() {
            return Err(UiError::precondition(format!(
                "binding {} of {}: bad targets",
                self.id, self.owner_name
            )));
        }
        if self.target.method.is_empty() {
            return Err(UiError::precondition(format!(
                "binding {} of {}: bad target method",
                self.id, self.owner_name
            )));
        }
        Ok(())
    }

    /// Resolve target names to live components
    pub fn resolve_targets(&self) -> UiResult<Vec<Weak<Component>>> {
        let mut resolved = Vec::with_capacity(self.target.targets.len());
        for name in &self.target.targets {
            if *name == self.owner_name {
                resolved.push(self.owner.clone());
                continue;
            }
            match self.ctx.registry().get(name) {
                Some(component) => resolved.push(Arc::downgrade(&component)),
                None => warn!("Binding {}: target {} is not registered", self.id, name),
            }
        }

        if resolved.is_empty() {
            return Err(UiError::precondition(format!(
                "binding {} of {}: no registered target",
                self.id, self.owner_name
            )));
        }
        Ok(resolved)
    }

    /// Enter the async setup phase
    pub fn mark_binding(&self) {
        let subscriptions = self.subscriptions.lock();
        if !subscriptions.cancelled {
            self.state.send_replace(BindingState::Binding);
        }
    }

    /// Keep the handle of the running setup so unsubscribe can cancel it
    pub fn track_setup(&self, handle: AbortHandle) {
        let mut subscriptions = self.subscriptions.lock();
        if subscriptions.cancelled {
            handle.abort();
        } else {
            subscriptions.setup = Some(handle);
        }
    }

    pub fn fail(&self, error: &UiError) {
        error!("Binding {} of {} failed: {}", self.id, self.owner_name, error);
        let subscriptions = self.subscriptions.lock();
        if !subscriptions.cancelled {
            self.state
                .send_replace(BindingState::Failed(error.to_string()));
        }
    }

    /// Route every value of `stream` to the target method of every target
    pub fn bind_stream(&self, stream: &Stream) -> UiResult<()> {
        let targets = self.resolve_targets()?;
        let method = self.target.method.clone();
        let options = self.target.options.clone();
        let id = self.id.clone();

        let values = stream.subscribe(move |value| {
            for target in &targets {
                let Some(component) = target.upgrade() else {
                    continue;
                };
                if let Err(e) = component.invoke_method(&method, value.clone(), &options) {
                    warn!("Binding {}: {} on {} failed: {}", id, method, component.name(), e);
                }
            }
        });

        let id = self.id.clone();
        let errors = stream.on_error(move |message| {
            warn!("Binding {}: source error: {}", id, message);
        });

        let state_update = self.state_path.clone().map(|path| {
            let owner = self.owner.clone();
            stream.subscribe(move |value| {
                if let Some(component) = owner.upgrade() {
                    if let Err(e) = component.dispatch_update_state_value_action(&path, value) {
                        warn!("State update of {} failed: {}", component.name(), e);
                    }
                }
            })
        });

        let mut subscriptions = self.subscriptions.lock();
        if subscriptions.cancelled {
            // Unsubscribed while setting up: the new subscriptions drop here.
            debug!("Binding {} was cancelled during setup", self.id);
            return Ok(());
        }
        subscriptions.values = Some(values);
        subscriptions.errors = Some(errors);
        subscriptions.state_update = state_update;
        subscriptions.setup = None;
        self.state.send_replace(BindingState::Bound);
        debug!("Binding {} bound on stream {}", self.id, stream.name());
        Ok(())
    }

    /// Tear down the value subscription and cancel a running setup
    ///
    /// Safe to call at any point of the lifecycle, any number of times.
    pub fn unsubscribe(&self) -> bool {
        let mut subscriptions = self.subscriptions.lock();
        subscriptions.cancelled = true;

        let mut released = false;
        if let Some(setup) = subscriptions.setup.take() {
            setup.abort();
            released = true;
        }
        if let Some(mut values) = subscriptions.values.take() {
            values.unsubscribe();
            released = true;
        }
        if let Some(mut errors) = subscriptions.errors.take() {
            errors.unsubscribe();
        }
        self.state.send_replace(BindingState::Unsubscribed);
        released
    }

    /// Tear down the state-path subscription
    pub fn unsubscribe_state_update(&self) -> bool {
        match self.subscriptions.lock().state_update.take() {
            Some(mut subscription) => {
                subscription.unsubscribe();
                true
            }
            None => false,
        }
    }
}

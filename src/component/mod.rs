//! Components
//!
//! A [`Component`] is one node of the UI tree. It is composed of
//! capability parts, each in its own module:
//!
//! - `rendered`: the serialized render pipeline and assets
//! - `bound`: load / unload and the bindings of the component
//! - `stated`: updates, children and state dispatch
//! - `value`: text and object values, sizes
//!
//! All queued work of a component runs on its [`TaskQueue`], one step at a
//! time, in call order.

pub mod bound;
pub mod children;
pub mod rendered;
pub mod stated;
pub mod value;

pub use bound::{BindingManager, StoreObserver};
pub use children::ChildResolver;

use crate::context::UiContext;
use crate::dom::{DomHandle, ElementRef};
use crate::error::{UiError, UiResult};
use crate::identity::Identity;
use crate::render::{AssetTracker, Renderer, TaskQueue};
use crate::state::{PathKey, StatePath};
use crate::stream::Stream;
use parking_lot::RwLock;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn, Span};

/// Handler registered with [`Component::register_method`]
pub type MethodHandler = Arc<dyn Fn(&Arc<Component>, Value, &Value) -> UiResult<()> + Send + Sync>;

/// Instance-specific step run by `update` with the previous and current element
pub type UpdateHook = Arc<dyn Fn(&Component, Option<ElementRef>, ElementRef) + Send + Sync>;

/// Component type that never resolves children
pub const MENUBAR_TYPE: &str = "menubar";

/// Named stream every component exposes
pub const RUNTIME_LOGS_STREAM: &str = "runtime_logs";

/// A stateful UI component
pub struct Component {
    identity: Identity,
    ctx: Arc<UiContext>,
    state_path: StatePath,
    dom: DomHandle,
    renderer: Renderer,
    assets: AssetTracker,
    queue: TaskQueue,
    bindings: BindingManager,
    observer: StoreObserver,
    children: ChildResolver,
    methods: RwLock<HashMap<String, MethodHandler>>,
    named_streams: RwLock<HashMap<String, Stream>>,
    update_self: RwLock<Option<UpdateHook>>,
}

impl std::fmt::Debug for Component {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Component")
            .field("name", &self.name())
            .field("kind", &self.kind())
            .field("loaded", &self.is_loaded())
            .field("bindings", &self.bindings.len())
            .finish()
    }
}

impl Component {
    /// Create a component from its settings (`name` and `type` required)
    ///
    /// The component is not registered; see [`UiFactory`](crate::ui::UiFactory).
    pub fn new(ctx: Arc<UiContext>, settings: Value) -> UiResult<Arc<Self>> {
        let identity = Identity::from_settings(settings)?;
        let name = identity.name().to_string();

        let template = ctx.templates().get(identity.kind());
        let assets = AssetTracker::new();
        if let Some(dependencies) = identity.settings().get("assets").and_then(Value::as_array) {
            for asset_id in dependencies.iter().filter_map(Value::as_str) {
                assets.add_dependency(asset_id);
            }
        }

        Ok(Arc::new(Self {
            state_path: ctx.views_root().child(PathKey::from(name.as_str())),
            dom: DomHandle::new(name.clone()),
            renderer: Renderer::new(template),
            queue: TaskQueue::new(name),
            bindings: BindingManager::new(),
            observer: StoreObserver::new(),
            children: ChildResolver::new(),
            methods: RwLock::new(HashMap::new()),
            named_streams: RwLock::new(HashMap::new()),
            update_self: RwLock::new(None),
            assets,
            identity,
            ctx,
        }))
    }

    pub fn name(&self) -> &str {
        self.identity.name()
    }

    pub fn kind(&self) -> &str {
        self.identity.kind()
    }

    pub fn settings(&self) -> &Value {
        self.identity.settings()
    }

    pub fn span(&self) -> &Span {
        self.identity.span()
    }

    pub fn context(&self) -> &Arc<UiContext> {
        &self.ctx
    }

    /// Where the component state lives in the application state
    pub fn state_path(&self) -> &StatePath {
        &self.state_path
    }

    pub fn dom(&self) -> &DomHandle {
        &self.dom
    }

    pub fn get_dom_element(&self) -> Option<ElementRef> {
        self.dom.element()
    }

    pub fn renderer(&self) -> &Renderer {
        &self.renderer
    }

    pub fn queue(&self) -> &TaskQueue {
        &self.queue
    }

    pub fn is_menubar(&self) -> bool {
        self.kind() == MENUBAR_TYPE
    }

    /// Register an instance method bindings can target
    ///
    /// Registered methods take precedence over the built-in ones.
    pub fn register_method<F>(&self, name: &str, handler: F)
    where
        F: Fn(&Arc<Component>, Value, &Value) -> UiResult<()> + Send + Sync + 'static,
    {
        self.methods
            .write()
            .insert(name.to_string(), Arc::new(handler));
    }

    /// Run the target method `method` with `value`
    pub fn invoke_method(self: &Arc<Self>, method: &str, value: Value, options: &Value) -> UiResult<()> {
        let registered = self.methods.read().get(method).cloned();
        if let Some(handler) = registered {
            return handler(self, value, options);
        }

        match method {
            "set_text_value" => self.set_text_value(&value),
            "set_object_value" => self.set_object_value(&value),
            "dispatch_update_state_action" => self.dispatch_update_state_action(value),
            "dispatch_update_state_value_action" => {
                let path = options.get("path").cloned().unwrap_or(Value::Null);
                self.dispatch_update_state_value_action(&path, value)
            }
            "update" => {
                // Queued; the ticket is not needed for the step to run.
                let _ticket = self.update();
                Ok(())
            }
            "render" => {
                let _ticket = self.render(false);
                Ok(())
            }
            "clear" => {
                self.clear();
                Ok(())
            }
            "register_and_render_inside_from_json" => {
                let _ticket = self.register_and_render_inside_from_json(&value);
                Ok(())
            }
            _ => Err(UiError::UnknownMethod {
                component: self.name().to_string(),
                method: method.to_string(),
            }),
        }
    }

    /// Expose a stream to `stream` bindings under `name`
    pub fn register_named_stream(&self, name: &str, stream: Stream) {
        self.named_streams
            .write()
            .insert(name.to_lowercase(), stream);
    }

    /// Resolve a named stream; names are case insensitive
    pub fn get_named_stream(&self, name: &str) -> Option<Stream> {
        let name = name.to_lowercase();
        if name == RUNTIME_LOGS_STREAM {
            return Some(self.ctx.runtime_logs().clone());
        }
        if let Some(stream) = self.named_streams.read().get(&name) {
            return Some(stream.clone());
        }
        warn!("Component {}: unknown named stream {}", self.name(), name);
        None
    }

    /// Install the instance-specific update step
    pub fn set_update_self<F>(&self, hook: F)
    where
        F: Fn(&Component, Option<ElementRef>, ElementRef) + Send + Sync + 'static,
    {
        *self.update_self.write() = Some(Arc::new(hook));
    }

    fn update_hook(&self) -> Option<UpdateHook> {
        self.update_self.read().clone()
    }

    /// Detach the element and drop the component from the registry
    pub fn destroy(&self) {
        debug!("Destroying component {}", self.name());
        if let Some(element) = self.dom.release() {
            element.detach();
        }
        if let Some(registered) = self.ctx.registry().get(self.name()) {
            if std::ptr::eq(Arc::as_ptr(&registered), self) {
                self.ctx.registry().unregister(self.name());
            }
        }
    }
}

//! State traversal, updates and dispatch

use super::Component;
use crate::error::UiResult;
use crate::render::QueueTicket;
use crate::state::{get_in, set_in, StatePath, StoreAction};
use crate::ui::UiFactory;
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, error, info, warn, Instrument};

impl Component {
    /// Current component state
    ///
    /// The slice at the component state path when the store has one, the
    /// creation settings otherwise.
    pub fn get_state(&self) -> Option<Value> {
        let state = self.ctx.store().get_state();
        match get_in(&state, self.state_path.keys()) {
            Some(slice) => Some(slice.clone()),
            None => Some(self.settings().clone()),
        }
    }

    /// One attribute of the component state
    pub fn get_state_value(&self, key: &str) -> Option<Value> {
        self.get_state()?.get(key).cloned()
    }

    /// Queue an update step
    ///
    /// The step picks up the element the document now holds under the
    /// component id, runs the self-update hook, then updates the children.
    /// Children queue on their own pipelines. One update reaches each
    /// component at most once, so views listing each other as items do not
    /// update each other forever.
    pub fn update(self: &Arc<Self>) -> QueueTicket {
        self.update_in(UpdateWave::starting_at(self.name()))
    }

    fn update_in(self: &Arc<Self>, wave: UpdateWave) -> QueueTicket {
        let component = self.clone();
        let step = async move {
            debug!("Updating {}", component.name());
            let Some(current) = component.ctx.document().get_element_by_id(component.dom.dom_id())
            else {
                return Ok(());
            };

            let previous = component.dom.element();
            if !component.dom.holds(&current) {
                debug!("Element of {} was replaced", component.name());
                if let Some(stale) = component.dom.attach(current.clone()) {
                    stale.detach();
                }
            }

            if let Some(hook) = component.update_hook() {
                hook(component.as_ref(), previous, current);
            }

            component.update_children_in(&wave);
            Ok(())
        };
        self.queue.enqueue(step.instrument(self.span().clone()))
    }

    /// Queue an update on every resolved child
    pub fn update_children(&self) {
        self.update_children_in(&UpdateWave::starting_at(self.name()));
    }

    fn update_children_in(&self, wave: &UpdateWave) {
        for child in self.get_children_component().iter() {
            if !wave.enter(child.name()) {
                warn!("Component {}: child {} already updated, cycle in items", self.name(), child.name());
                continue;
            }
            debug!("Updating child {} of {}", child.name(), self.name());
            let _ticket = child.update_in(wave.clone());
        }
    }

    /// Resolved children, cached until [`reset_children`](Self::reset_children)
    pub fn get_children_component(&self) -> Arc<Vec<Arc<Component>>> {
        self.children.resolve(self)
    }

    /// Drop the cached children list
    pub fn reset_children(&self) {
        self.children.reset();
    }

    /// Reset the displayed value
    pub fn clear(&self) {
        self.dom.set_text("");
    }

    /// Replace the component state in the store
    ///
    /// Values that are not objects are ignored.
    pub fn dispatch_update_state_action(&self, new_state: Value) -> UiResult<()> {
        if !new_state.is_object() {
            debug!("Component {}: ignoring non object state", self.name());
            return Ok(());
        }

        self.ctx.store().dispatch(StoreAction::AddJsonResource {
            resource: self.name().to_string(),
            path: Some(self.state_path.clone()),
            collection: None,
            json: new_state,
        })
    }

    /// Set `value` at `path` inside the component state and dispatch it
    ///
    /// A path that is not a non-empty array of keys and indices, or whose
    /// index lies past the end of an array, is logged and nothing is
    /// dispatched.
    pub fn dispatch_update_state_value_action(&self, path: &Value, value: Value) -> UiResult<()> {
        let Some(path) = StatePath::from_value(path) else {
            error!(
                "Component {}: bad path array {} for value {}",
                self.name(),
                path,
                value
            );
            return Ok(());
        };

        let state = self.get_state().unwrap_or(Value::Null);
        let new_state = match set_in(&state, path.keys(), value) {
            Ok(new_state) => new_state,
            Err(e) => {
                error!("Component {}: cannot set {}: {}", self.name(), path, e);
                return Ok(());
            }
        };
        self.dispatch_update_state_action(new_state)
    }

    /// Value of a getter other components can read descriptions from
    pub fn call_getter(&self, getter: &str) -> Option<Value> {
        match getter {
            "get_object_value" => self.get_object_value(),
            "get_text_value" => Some(Value::String(self.get_text_value())),
            "get_state" => self.get_state(),
            _ => None,
        }
    }

    /// Register a view description read from another component
    ///
    /// `options` names the source view and getter (`json_source_view`,
    /// `json_source_getter`); an event payload wraps them in `data`. Bad
    /// options are logged and yield `None`.
    pub fn register_from_json(&self, options: &Value) -> Option<Value> {
        let options = if options.get("is_event_handler").and_then(Value::as_bool) == Some(true) {
            options.get("data").unwrap_or(&Value::Null)
        } else {
            options
        };
        if !options.is_object() {
            warn!("Component {}: bad options object", self.name());
            return None;
        }

        let Some(view) = options.get("json_source_view").and_then(Value::as_str) else {
            warn!("Component {}: bad options.json_source_view string", self.name());
            return None;
        };
        let Some(getter) = options.get("json_source_getter").and_then(Value::as_str) else {
            warn!("Component {}: bad options.json_source_getter string", self.name());
            return None;
        };
        let Some(source) = self.ctx.registry().get(view) else {
            warn!("Component {}: view {} is not a json source", self.name(), view);
            return None;
        };
        let Some(json) = source.call_getter(getter) else {
            warn!("Component {}: bad json source getter {} on {}", self.name(), getter, view);
            return None;
        };
        let Some(name) = json.get("name").and_then(Value::as_str).map(str::to_string) else {
            warn!("Component {}: bad json.name string", self.name());
            return None;
        };

        let action = StoreAction::AddJsonResource {
            resource: name,
            path: None,
            collection: Some(self.ctx.config().views_root.clone()),
            json: json.clone(),
        };
        if let Err(e) = self.ctx.store().dispatch(action) {
            warn!("Component {}: register_from_json failed: {}", self.name(), e);
            return None;
        }
        Some(json)
    }

    /// Create component `name` inside this element and render it
    ///
    /// The sub element is created with id `name` unless a direct child with
    /// that id exists. An element with that id elsewhere is an error that is
    /// logged. Returns the ticket of the forced render.
    pub fn render_inside_from_json(self: &Arc<Self>, name: &str, desc: &Value) -> Option<QueueTicket> {
        let Some(this_element) = self.dom.element() else {
            warn!("Component {}: no dom element to render {} inside", self.name(), name);
            return None;
        };

        let document = self.ctx.document();
        let sub_element = match document.get_element_by_id(name) {
            Some(existing) => {
                let is_direct_child = existing
                    .parent()
                    .is_some_and(|parent| Arc::ptr_eq(&parent, &this_element));
                if !is_direct_child {
                    warn!("Component {}: an element {} exists elsewhere", self.name(), name);
                    return None;
                }
                existing
            }
            None => {
                let created = document.create_element("div", name);
                this_element.append_child(created.clone());
                created
            }
        };

        let component = match UiFactory::create_component(&self.ctx, name, desc) {
            Ok(component) => component,
            Err(e) => {
                warn!("Component {}: cannot create {}: {}", self.name(), name, e);
                return None;
            }
        };
        component.dom.attach(sub_element);

        info!("Component {} renders {} inside", self.name(), name);
        Some(component.render(true))
    }

    /// [`register_from_json`](Self::register_from_json) then
    /// [`render_inside_from_json`](Self::render_inside_from_json)
    pub fn register_and_render_inside_from_json(self: &Arc<Self>, options: &Value) -> Option<QueueTicket> {
        let json = self.register_from_json(options)?;
        let name = json.get("name").and_then(Value::as_str)?.to_string();
        self.render_inside_from_json(&name, &json)
    }
}

/// Components already reached by one update cascade
#[derive(Clone)]
struct UpdateWave(Arc<Mutex<HashSet<String>>>);

impl UpdateWave {
    fn starting_at(name: &str) -> Self {
        Self(Arc::new(Mutex::new(HashSet::from([name.to_string()]))))
    }

    /// False when `name` was reached before
    fn enter(&self, name: &str) -> bool {
        self.0.lock().insert(name.to_string())
    }
}

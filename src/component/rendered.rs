//! Render pipeline of a component

use super::Component;
use crate::render::{AssetsPromise, QueueTicket, RenderInput, VNode};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, Instrument};

impl Component {
    fn render_input(&self) -> RenderInput {
        RenderInput {
            name: self.name().to_string(),
            kind: self.kind().to_string(),
            state: Arc::new(self.get_state().unwrap_or(Value::Null)),
        }
    }

    /// Queue a render step
    ///
    /// `force` rebuilds the vnode from the template; otherwise a missing
    /// vnode is built and an existing one patched into the element. A
    /// successful step recomputes the component size.
    pub fn render(self: &Arc<Self>, force: bool) -> QueueTicket {
        let component = self.clone();
        let step = async move {
            debug!("Rendering {} (force={})", component.name(), force);
            let input = component.render_input();
            component
                .renderer
                .render(input, force, &component.dom, component.ctx.document())
                .await?;
            component.update_size();
            Ok(())
        };
        self.queue.enqueue(step.instrument(self.span().clone()))
    }

    /// Wait until every step queued so far has settled
    pub async fn wait_idle(&self) {
        // The result of the no-op step carries no information.
        let _ = self.queue.enqueue(async { Ok(()) }).await;
    }

    /// Last rendered vnode
    pub fn vnode(&self) -> Option<VNode> {
        self.renderer.vnode()
    }

    pub fn is_visible(&self) -> bool {
        self.renderer.is_visible()
    }

    /// Refresh the vnode from the live element
    pub fn save_rendering(&self) {
        if let Some(element) = self.dom.element() {
            self.renderer.save_rendering(&element);
        }
    }

    pub fn add_assets_dependancy(&self, asset_id: &str) -> usize {
        self.assets.add_dependency(asset_id)
    }

    pub fn get_assets_dependancies(&self) -> Vec<String> {
        self.assets.dependencies()
    }

    /// Combine the readiness of every declared asset
    pub fn init_assets(&self) {
        self.assets.init(self.ctx.assets());
    }

    /// Completes once every declared asset is ready; `None` before
    /// [`init_assets`](Self::init_assets)
    pub fn get_assets_promise(&self) -> Option<AssetsPromise> {
        self.assets.promise()
    }
}

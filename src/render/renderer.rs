//! Vnode cache and rebuild/patch decision

use super::template::{RenderInput, Template, VNode};
use crate::dom::{Document, DomHandle, ElementRef};
use crate::error::{UiError, UiResult};
use parking_lot::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::debug;

/// Owns the template and the last vnode of one component
#[derive(Default)]
pub struct Renderer {
    template: RwLock<Option<Arc<dyn Template>>>,
    vnode: RwLock<Option<VNode>>,
    visible: AtomicBool,
}

impl Renderer {
    pub fn new(template: Option<Arc<dyn Template>>) -> Self {
        Self {
            template: RwLock::new(template),
            vnode: RwLock::new(None),
            visible: AtomicBool::new(false),
        }
    }

    pub fn set_template(&self, template: Arc<dyn Template>) {
        *self.template.write() = Some(template);
    }

    pub fn has_template(&self) -> bool {
        self.template.read().is_some()
    }

    pub fn has_vnode(&self) -> bool {
        self.vnode.read().is_some()
    }

    pub fn vnode(&self) -> Option<VNode> {
        self.vnode.read().clone()
    }

    pub fn is_visible(&self) -> bool {
        self.visible.load(Ordering::SeqCst)
    }

    /// One render step
    ///
    /// `force` rebuilds the vnode first; without a vnode one is built; the
    /// live element is then patched from the cached vnode. Fails when there
    /// is neither a template nor a cached vnode.
    pub async fn render(
        &self,
        input: RenderInput,
        force: bool,
        dom: &DomHandle,
        document: &Document,
    ) -> UiResult<()> {
        if force || !self.has_vnode() {
            // Clone out of the lock: it is never held across an await.
            let template = self.template.read().clone();
            match template {
                Some(template) => {
                    debug!("Building vnode for {} (force={})", input.name, force);
                    let vnode = template.render(&input).await?;
                    *self.vnode.write() = Some(vnode);
                }
                None if force => {
                    return Err(UiError::render(format!(
                        "no template to rebuild vnode for {}",
                        input.name
                    )));
                }
                None => {}
            }
        }

        let vnode = self.vnode().ok_or_else(|| {
            UiError::render(format!("no dom vnode to render for {}", input.name))
        })?;
        self.process_rendering_vnode(&vnode, dom, document);
        Ok(())
    }

    /// Create or patch the live element from `vnode`
    pub fn process_rendering_vnode(&self, vnode: &VNode, dom: &DomHandle, document: &Document) {
        let element = match dom.element() {
            Some(element) => element,
            None => {
                let element = document
                    .get_element_by_id(dom.dom_id())
                    .unwrap_or_else(|| {
                        let element = document.create_element("div", dom.dom_id());
                        document.body().append_child(element.clone());
                        element
                    });
                dom.attach(element.clone());
                element
            }
        };

        element.set_markup(vnode.markup.clone());
        self.visible.store(true, Ordering::SeqCst);
    }

    /// Refresh the cached vnode from the live element
    pub fn save_rendering(&self, element: &ElementRef) {
        *self.vnode.write() = Some(VNode::new(element.markup()));
    }
}

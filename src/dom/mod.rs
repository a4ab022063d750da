//! DOM access for components
//!
//! [`DomHandle`] owns the single element a component renders into. The
//! element id follows the component name, which is how a component finds its
//! element again after the host replaced it.

pub mod document;

pub use document::{Document, Element, ElementRef, Size};

use parking_lot::{Mutex, RwLock};
use std::sync::Arc;

/// A component's element handle
#[derive(Debug)]
pub struct DomHandle {
    dom_id: String,
    element: RwLock<Option<ElementRef>>,
    pending_text: Mutex<Option<String>>,
}

impl DomHandle {
    pub fn new(dom_id: impl Into<String>) -> Self {
        Self {
            dom_id: dom_id.into(),
            element: RwLock::new(None),
            pending_text: Mutex::new(None),
        }
    }

    pub fn dom_id(&self) -> &str {
        &self.dom_id
    }

    pub fn element(&self) -> Option<ElementRef> {
        self.element.read().clone()
    }

    pub fn has_element(&self) -> bool {
        self.element.read().is_some()
    }

    /// Attach an element, flushing text written while detached
    pub fn attach(&self, element: ElementRef) -> Option<ElementRef> {
        if let Some(text) = self.pending_text.lock().take() {
            element.set_text(text);
        }
        self.element.write().replace(element)
    }

    pub fn release(&self) -> Option<ElementRef> {
        self.element.write().take()
    }

    /// Whether `candidate` is the element currently held
    pub fn holds(&self, candidate: &ElementRef) -> bool {
        self.element
            .read()
            .as_ref()
            .is_some_and(|current| Arc::ptr_eq(current, candidate))
    }

    pub fn text(&self) -> String {
        match self.element() {
            Some(element) => element.text(),
            None => self.pending_text.lock().clone().unwrap_or_default(),
        }
    }

    /// Set the element text, or keep it until an element is attached
    pub fn set_text(&self, text: impl Into<String>) {
        let text = text.into();
        match self.element() {
            Some(element) => element.set_text(text),
            None => *self.pending_text.lock() = Some(text),
        }
    }

    pub fn offset_size(&self) -> Size {
        self.element()
            .map(|element| element.offset_size())
            .unwrap_or_default()
    }
}

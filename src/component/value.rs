//! Displayed values and sizes

use super::Component;
use crate::dom::Size;
use crate::error::UiResult;
use serde_json::Value;
use std::collections::HashSet;
use tracing::{debug, warn};

impl Component {
    pub fn get_text_value(&self) -> String {
        self.dom.text()
    }

    /// Display a value as text; strings are shown without quotes
    pub fn set_text_value(&self, value: &Value) -> UiResult<()> {
        let text = match value {
            Value::String(text) => text.clone(),
            other => other.to_string(),
        };
        self.dom.set_text(text);
        Ok(())
    }

    /// Parse the displayed text as JSON
    pub fn get_object_value(&self) -> Option<Value> {
        let text = self.dom.text();
        match serde_json::from_str(&text) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!("Component {}: bad json string {:?}: {}", self.name(), text, e);
                None
            }
        }
    }

    /// Display a value as JSON text
    pub fn set_object_value(&self, value: &Value) -> UiResult<()> {
        let text = serde_json::to_string(value)?;
        self.dom.set_text(text);
        Ok(())
    }

    /// Measured size of the element
    pub fn get_size(&self) -> Size {
        self.dom.offset_size()
    }

    /// Propagate a size to the children; missing dimensions come from the
    /// element
    pub fn resize(&self, width: Option<u32>, height: Option<u32>) -> Size {
        self.resize_in(width, height, &mut HashSet::new())
    }

    fn resize_in(&self, width: Option<u32>, height: Option<u32>, visiting: &mut HashSet<String>) -> Size {
        let measured = self.get_size();
        let size = Size::new(
            width.unwrap_or(measured.width),
            height.unwrap_or(measured.height),
        );
        debug!("Resizing {} to {}x{}", self.name(), size.width, size.height);

        visiting.insert(self.name().to_string());
        for child in self.get_children_component().iter() {
            if visiting.contains(child.name()) {
                warn!("Component {}: not resizing {}, cycle in items", self.name(), child.name());
                continue;
            }
            child.resize_in(Some(size.width), Some(size.height), visiting);
        }
        size
    }

    /// Sum the children sizes, falling back to the element size, and apply
    /// the result to the element style
    ///
    /// A child that is also an ancestor counts for nothing.
    pub fn update_size(&self) -> Size {
        self.update_size_in(&mut HashSet::new())
    }

    fn update_size_in(&self, ancestors: &mut HashSet<String>) -> Size {
        ancestors.insert(self.name().to_string());
        let mut size = Size::default();
        for child in self.get_children_component().iter() {
            if ancestors.contains(child.name()) {
                warn!("Component {}: skipping size of {}, cycle in items", self.name(), child.name());
                continue;
            }
            let child_size = child.update_size_in(ancestors);
            size.width += child_size.width;
            size.height += child_size.height;
        }
        ancestors.remove(self.name());

        if size.is_degenerate() {
            size = self.get_size();
        }

        if let Some(element) = self.dom.element() {
            element.set_style("width", format!("{}px", size.width));
            element.set_style("height", format!("{}px", size.height));
        }
        debug!("Size of {} is {}x{}", self.name(), size.width, size.height);
        size
    }
}

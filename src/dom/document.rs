//! Headless document model
//!
//! Stands in for the browser DOM: a tree of elements addressed by id, each
//! carrying markup, text, inline styles and a measured box, plus DOM event
//! streams keyed by selector and event name.

use crate::stream::Stream;
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Weak};
use tracing::debug;

pub type ElementRef = Arc<Element>;

/// Width and height in pixels
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

impl Size {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn is_degenerate(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

#[derive(Debug, Default)]
struct ElementData {
    id: String,
    tag: String,
    markup: String,
    text: String,
    style: BTreeMap<String, String>,
    offset: Size,
    parent: Weak<Element>,
    children: Vec<ElementRef>,
}

/// A single document node
#[derive(Debug)]
pub struct Element {
    data: RwLock<ElementData>,
}

impl Element {
    pub fn new(tag: impl Into<String>, id: impl Into<String>) -> ElementRef {
        Arc::new(Self {
            data: RwLock::new(ElementData {
                id: id.into(),
                tag: tag.into(),
                ..Default::default()
            }),
        })
    }

    pub fn id(&self) -> String {
        self.data.read().id.clone()
    }

    pub fn tag(&self) -> String {
        self.data.read().tag.clone()
    }

    pub fn markup(&self) -> String {
        self.data.read().markup.clone()
    }

    pub fn set_markup(&self, markup: impl Into<String>) {
        self.data.write().markup = markup.into();
    }

    pub fn text(&self) -> String {
        self.data.read().text.clone()
    }

    pub fn set_text(&self, text: impl Into<String>) {
        self.data.write().text = text.into();
    }

    pub fn style(&self, key: &str) -> Option<String> {
        self.data.read().style.get(key).cloned()
    }

    pub fn set_style(&self, key: impl Into<String>, value: impl Into<String>) {
        self.data.write().style.insert(key.into(), value.into());
    }

    /// Measured box, as laid out by the host
    pub fn offset_size(&self) -> Size {
        self.data.read().offset
    }

    pub fn set_offset_size(&self, size: Size) {
        self.data.write().offset = size;
    }

    pub fn parent(&self) -> Option<ElementRef> {
        self.data.read().parent.upgrade()
    }

    pub fn children(&self) -> Vec<ElementRef> {
        self.data.read().children.clone()
    }

    /// Append `child`, moving it out of its previous parent
    pub fn append_child(self: &Arc<Self>, child: ElementRef) {
        child.detach();
        child.data.write().parent = Arc::downgrade(self);
        self.data.write().children.push(child);
    }

    /// Remove a direct child; returns whether it was found
    pub fn remove_child(&self, child: &ElementRef) -> bool {
        let removed = {
            let mut data = self.data.write();
            let before = data.children.len();
            data.children.retain(|c| !Arc::ptr_eq(c, child));
            before != data.children.len()
        };
        if removed {
            child.data.write().parent = Weak::new();
        }
        removed
    }

    /// Remove this element from its parent; returns whether it had one
    pub fn detach(self: &Arc<Self>) -> bool {
        match self.parent() {
            Some(parent) => parent.remove_child(self),
            None => false,
        }
    }

    /// Depth-first search of this subtree, self included
    pub fn find_by_id(self: &Arc<Self>, id: &str) -> Option<ElementRef> {
        if self.data.read().id == id {
            return Some(self.clone());
        }
        self.children()
            .into_iter()
            .find_map(|child| child.find_by_id(id))
    }

    /// Serialized subtree, markup first and text after children
    pub fn outer_html(&self) -> String {
        let data = self.data.read();
        let mut html = format!("<{} id=\"{}\"", data.tag, data.id);
        if !data.style.is_empty() {
            let style: Vec<String> = data
                .style
                .iter()
                .map(|(k, v)| format!("{}:{}", k, v))
                .collect();
            html.push_str(&format!(" style=\"{}\"", style.join(";")));
        }
        html.push('>');
        html.push_str(&data.markup);
        for child in &data.children {
            html.push_str(&child.outer_html());
        }
        html.push_str(&data.text);
        html.push_str(&format!("</{}>", data.tag));
        html
    }
}

/// The document owning the element tree and DOM event streams
pub struct Document {
    body: ElementRef,
    events: Mutex<HashMap<(String, String), Stream>>,
    stream_capacity: usize,
}

impl Document {
    pub fn new(stream_capacity: usize) -> Self {
        Self {
            body: Element::new("body", "body"),
            events: Mutex::new(HashMap::new()),
            stream_capacity,
        }
    }

    pub fn body(&self) -> ElementRef {
        self.body.clone()
    }

    pub fn get_element_by_id(&self, id: &str) -> Option<ElementRef> {
        self.body.find_by_id(id)
    }

    /// Create a detached element
    pub fn create_element(&self, tag: &str, id: &str) -> ElementRef {
        Element::new(tag, id)
    }

    /// Stream of `event` occurrences on `selector` (`#id` or bare id)
    pub fn event_stream(&self, selector: &str, event: &str) -> Stream {
        let key = (normalize_selector(selector), event.to_string());
        self.events
            .lock()
            .entry(key)
            .or_insert_with(|| {
                Stream::new(format!("{}:{}", selector, event), self.stream_capacity)
            })
            .clone()
    }

    /// Fire `event` on `selector`; returns whether anything listens for it
    pub fn emit(&self, selector: &str, event: &str, payload: Value) -> bool {
        let key = (normalize_selector(selector), event.to_string());
        let stream = self.events.lock().get(&key).cloned();
        match stream {
            Some(stream) => {
                debug!("DOM event {} on {}", event, selector);
                stream.push(payload);
                true
            }
            None => false,
        }
    }

    pub fn to_html(&self) -> String {
        self.body.outer_html()
    }
}

fn normalize_selector(selector: &str) -> String {
    selector.trim().trim_start_matches('#').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tree_operations() {
        let document = Document::new(8);
        let panel = document.create_element("div", "panel");
        let label = document.create_element("span", "label");
        document.body().append_child(panel.clone());
        panel.append_child(label.clone());

        let found = document.get_element_by_id("label").unwrap();
        assert!(Arc::ptr_eq(&found, &label));
        assert!(Arc::ptr_eq(&label.parent().unwrap(), &panel));

        assert!(label.detach());
        assert!(!label.detach());
        assert!(document.get_element_by_id("label").is_none());
    }

    #[test]
    fn test_append_moves_between_parents() {
        let document = Document::new(8);
        let a = document.create_element("div", "a");
        let b = document.create_element("div", "b");
        let item = document.create_element("div", "item");
        document.body().append_child(a.clone());
        document.body().append_child(b.clone());

        a.append_child(item.clone());
        b.append_child(item.clone());

        assert!(a.children().is_empty());
        assert_eq!(b.children().len(), 1);
    }

    #[test]
    fn test_outer_html() {
        let document = Document::new(8);
        let panel = document.create_element("div", "panel");
        panel.set_markup("<h1>Title</h1>");
        panel.set_style("width", "10px");
        panel.set_text("body");
        document.body().append_child(panel);

        assert_eq!(
            document.to_html(),
            "<body id=\"body\"><div id=\"panel\" style=\"width:10px\"><h1>Title</h1>body</div></body>"
        );
    }

    #[test]
    fn test_event_stream_is_shared_per_selector() {
        let document = Document::new(8);
        let a = document.event_stream("#button", "click");
        let b = document.event_stream("button", "click");
        assert!(a.same_stream(&b));
        assert!(!document.emit("#other", "click", Value::Null));
    }
}

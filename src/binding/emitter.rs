//! Bindings on document events
//!
//! `emitter_jquery` and `emitter_dom` declarations both land here: the
//! headless document exposes one event stream per selector and event name.

use super::base::BindingCore;
use super::Binding;
use crate::error::{UiError, UiResult};
use std::sync::Arc;
use tracing::debug;

/// Routes a document event stream to the targets
pub struct BindingEmitter {
    core: BindingCore,
    selector: String,
    event: String,
}

impl BindingEmitter {
    pub fn new(core: BindingCore, selector: impl Into<String>, event: impl Into<String>) -> Self {
        Self {
            core,
            selector: selector.into(),
            event: event.into(),
        }
    }

    pub fn selector(&self) -> &str {
        &self.selector
    }

    pub fn event(&self) -> &str {
        &self.event
    }
}

impl Binding for BindingEmitter {
    fn core(&self) -> &BindingCore {
        &self.core
    }

    fn build(self: Arc<Self>) -> UiResult<()> {
        if self.selector.is_empty() || self.event.is_empty() {
            return Err(UiError::precondition(format!(
                "binding {} of {}: bad dom selector or event",
                self.core.id(),
                self.core.owner_name()
            )));
        }
        self.core.validate_target()?;
        self.core.mark_binding();

        debug!(
            "Binding {} listens to {} on {}",
            self.core.id(),
            self.event,
            self.selector
        );
        let stream = self
            .core
            .context()
            .document()
            .event_stream(&self.selector, &self.event);
        self.core.bind_stream(&stream).inspect_err(|e| self.core.fail(e))
    }
}

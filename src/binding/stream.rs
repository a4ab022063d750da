//! Binding from a live engine stream

use super::base::BindingCore;
use super::Binding;
use crate::error::UiResult;
use crate::stream::Stream;
use std::sync::Arc;

/// Routes an already resolved stream to the targets
pub struct BindingStream {
    core: BindingCore,
    stream: Stream,
}

impl BindingStream {
    pub fn new(core: BindingCore, stream: Stream) -> Self {
        Self { core, stream }
    }

    pub fn stream(&self) -> &Stream {
        &self.stream
    }
}

impl Binding for BindingStream {
    fn core(&self) -> &BindingCore {
        &self.core
    }

    fn build(self: Arc<Self>) -> UiResult<()> {
        self.core.validate_target()?;
        self.core.mark_binding();
        self.core.bind_stream(&self.stream).inspect_err(|e| self.core.fail(e))
    }
}

//! Binding factory

use super::config::{BindingSource, BindingSpec, TargetSpec};
use super::base::BindingCore;
use super::emitter::BindingEmitter;
use super::service::BindingService;
use super::stream::BindingStream;
use super::Binding;
use crate::component::Component;
use crate::context::UiContext;
use crate::error::{UiError, UiResult};
use std::sync::Arc;
use tracing::debug;

/// What the factory produced for one declaration
pub enum LoadedBinding {
    Single(Arc<dyn Binding>),
    /// Emitter fan-out, ids suffixed with the handler index
    Many(Vec<Arc<dyn Binding>>),
}

impl LoadedBinding {
    pub fn into_vec(self) -> Vec<Arc<dyn Binding>> {
        match self {
            LoadedBinding::Single(binding) => vec![binding],
            LoadedBinding::Many(bindings) => bindings,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            LoadedBinding::Single(_) => 1,
            LoadedBinding::Many(bindings) => bindings.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Maps a binding kind to its concrete binding and builds it
pub struct BindingsLoader;

impl BindingsLoader {
    pub fn load(
        id: &str,
        ctx: &Arc<UiContext>,
        owner: &Arc<Component>,
        spec: BindingSpec,
    ) -> UiResult<LoadedBinding> {
        debug!("Loading {} binding {} for {}", spec.kind, id, owner.name());

        let core = |id: String, target: TargetSpec| {
            BindingCore::new(id, spec.kind, ctx.clone(), owner, target, spec.state_path.clone())
        };

        let loaded = match &spec.source {
            BindingSource::Service { service, method } => LoadedBinding::Single(Arc::new(
                BindingService::new(core(id.to_string(), spec.target.clone()), service, method, None),
            )),
            BindingSource::Timeline {
                service,
                method,
                timeline,
            } => LoadedBinding::Single(Arc::new(BindingService::new(
                core(id.to_string(), spec.target.clone()),
                service,
                method,
                Some(timeline.clone()),
            ))),
            BindingSource::Stream {
                resolved: Some(stream),
                ..
            } => LoadedBinding::Single(Arc::new(BindingStream::new(
                core(id.to_string(), spec.target.clone()),
                stream.clone(),
            ))),
            BindingSource::Stream { name, .. } => {
                return Err(UiError::precondition(format!(
                    "binding {}: stream source {} is not resolved",
                    id, name
                )));
            }
            BindingSource::Emitter { selector, event } if spec.handlers.is_empty() => {
                LoadedBinding::Single(Arc::new(BindingEmitter::new(
                    core(id.to_string(), spec.target.clone()),
                    selector.clone(),
                    event.clone(),
                )))
            }
            BindingSource::Emitter { selector, event } => LoadedBinding::Many(
                spec.handlers
                    .iter()
                    .enumerate()
                    .map(|(index, handler)| {
                        Arc::new(BindingEmitter::new(
                            core(format!("{}_{}", id, index), handler.clone()),
                            selector.clone(),
                            event.clone(),
                        )) as Arc<dyn Binding>
                    })
                    .collect(),
            ),
        };

        match &loaded {
            LoadedBinding::Single(binding) => binding.clone().build()?,
            LoadedBinding::Many(bindings) => {
                for binding in bindings {
                    binding.clone().build()?;
                }
            }
        }
        Ok(loaded)
    }
}

//! Binding on a service operation or one of its timelines

use super::base::BindingCore;
use super::Binding;
use crate::error::{UiError, UiResult};
use crate::stream::Stream;
use futures::FutureExt;
use parking_lot::Mutex;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tracing::{info, Instrument};

/// Subscribes the targets to the result stream of a service operation
///
/// With a timeline name the binding follows that timeline of the operation
/// instead of its raw results.
pub struct BindingService {
    core: BindingCore,
    service: String,
    method: String,
    timeline: Option<String>,
    stream: Mutex<Option<Stream>>,
}

impl BindingService {
    pub fn new(
        core: BindingCore,
        service: impl Into<String>,
        method: impl Into<String>,
        timeline: Option<String>,
    ) -> Self {
        Self {
            core,
            service: service.into(),
            method: method.into(),
            timeline,
            stream: Mutex::new(None),
        }
    }

    pub fn service_name(&self) -> &str {
        &self.service
    }

    pub fn method_name(&self) -> &str {
        &self.method
    }

    /// Live stream once the service was resolved
    pub fn stream(&self) -> Option<Stream> {
        self.stream.lock().clone()
    }

    fn validate(&self) -> UiResult<()> {
        let owner = self.core.owner_name();
        if self.service.is_empty() {
            return Err(UiError::precondition(format!(
                "component {}: bad service name",
                owner
            )));
        }
        if self.method.is_empty() {
            return Err(UiError::precondition(format!(
                "component {}: service {}: bad service method",
                owner, self.service
            )));
        }
        if self.timeline.as_deref() == Some("") {
            return Err(UiError::precondition(format!(
                "component {}: service {}: bad timeline name",
                owner, self.service
            )));
        }
        self.core.validate_target()?;
        self.core.resolve_targets()?;
        Ok(())
    }

    /// Resolve the service, open the stream and bind it to the targets
    pub async fn bind_svc(&self) -> UiResult<()> {
        let service = self.core.context().services().lookup(&self.service).await?;
        info!(
            "Service {} found for component {}",
            self.service,
            self.core.owner_name()
        );

        let operation = service.operation(&self.method).ok_or_else(|| {
            UiError::precondition(format!(
                "service {} has no method {}",
                self.service, self.method
            ))
        })?;

        let stream = match &self.timeline {
            Some(timeline) => operation.timeline(timeline).ok_or_else(|| {
                UiError::service(format!(
                    "{}.{} has no timeline {}",
                    self.service, self.method, timeline
                ))
            })?,
            None => operation.execute(self.core.target().method_operands())?,
        };

        *self.stream.lock() = Some(stream.clone());
        self.core.bind_stream(&stream)
    }
}

impl Binding for BindingService {
    fn core(&self) -> &BindingCore {
        &self.core
    }

    fn build(self: Arc<Self>) -> UiResult<()> {
        self.validate()?;
        self.core.mark_binding();

        let span = match self.core.owner() {
            Some(owner) => owner.span().clone(),
            None => tracing::Span::current(),
        };
        let binding = self.clone();
        let setup = tokio::spawn(
            async move {
                let error = match AssertUnwindSafe(binding.bind_svc()).catch_unwind().await {
                    Ok(Ok(())) => return,
                    Ok(Err(e)) => e,
                    Err(_) => UiError::TaskPanicked(format!("setup of binding {}", binding.id())),
                };
                binding.core.fail(&error);
                if let Some(owner) = binding.core.owner() {
                    owner.drop_binding(binding.id());
                }
            }
            .instrument(span),
        );
        self.core.track_setup(setup.abort_handle());
        Ok(())
    }
}

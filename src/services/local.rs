//! In-process services
//!
//! A [`LocalService`] runs its operations as handler closures inside the
//! engine. Operation results go to a replaying stream per operation, which
//! timelines and pollers share.

use super::poller::PollerSettings;
use super::registry::{Service, ServiceOperation};
use super::scheduler::Scheduler;
use super::timeline::{Timeline, TimelineSettings};
use crate::error::{UiError, UiResult};
use crate::stream::{Stream, Subscription};
use parking_lot::{Mutex, RwLock};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Operation body: operands in, result value out
pub type OperationHandler = Arc<dyn Fn(&Value) -> UiResult<Value> + Send + Sync>;

/// One operation of a [`LocalService`]
pub struct LocalOperation {
    label: String,
    name: String,
    handler: OperationHandler,
    stream: Stream,
    scheduler: Arc<Scheduler>,
    timelines: RwLock<HashMap<String, Arc<Timeline>>>,
    feeds: Mutex<Vec<Subscription>>,
    stream_capacity: usize,
}

fn run_handler(label: &str, handler: &OperationHandler, stream: &Stream, operands: &Value) {
    match handler(operands) {
        Ok(result) => stream.push(result),
        Err(e) => {
            error!("Operation {} failed: {}", label, e);
            stream.push_error(e.to_string());
        }
    }
}

impl LocalOperation {
    fn new(
        service: &str,
        name: &str,
        handler: OperationHandler,
        scheduler: Arc<Scheduler>,
        stream_capacity: usize,
    ) -> Self {
        let label = format!("{}.{}", service, name);
        Self {
            stream: Stream::with_replay(label.clone(), stream_capacity),
            label,
            name: name.to_string(),
            handler,
            scheduler,
            timelines: RwLock::new(HashMap::new()),
            feeds: Mutex::new(Vec::new()),
            stream_capacity,
        }
    }

    /// Result stream shared by every execution
    pub fn stream(&self) -> Stream {
        self.stream.clone()
    }

    /// Derive a timeline from the results of this operation
    pub fn add_timeline(&self, settings: TimelineSettings) -> Arc<Timeline> {
        info!("Operation {} gets timeline {}", self.label, settings.name);
        let timeline = Arc::new(Timeline::new(settings, self.stream_capacity));
        self.feeds.lock().push(timeline.attach(&self.stream));
        self.timelines
            .write()
            .insert(timeline.name().to_string(), timeline.clone());
        timeline
    }

    pub fn get_timeline(&self, name: &str) -> Option<Arc<Timeline>> {
        self.timelines.read().get(name).cloned()
    }

    /// Re-run the operation on a named timer
    pub fn create_poller(&self, settings: &PollerSettings, operands: Value) -> bool {
        let Some(interval) = settings.interval() else {
            warn!("Poller {} of {} has no interval", settings.name, self.label);
            return false;
        };

        debug!("Create poller {} for {}", settings.name, self.label);
        let label = self.label.clone();
        let handler = self.handler.clone();
        let stream = self.stream.clone();
        self.scheduler.schedule_if_absent(
            &settings.name,
            interval,
            Arc::new(move || run_handler(&label, &handler, &stream, &operands)),
        );
        true
    }
}

impl ServiceOperation for LocalOperation {
    fn name(&self) -> &str {
        &self.name
    }

    fn execute(&self, operands: Option<Value>) -> UiResult<Stream> {
        let operands = operands.unwrap_or(Value::Null);

        if let Some(poller) = PollerSettings::from_operands(&operands) {
            self.create_poller(&poller, operands.clone());
        }

        // Derive before running so the first result reaches the derived stream.
        let stream = match operands.get("debounce_milliseconds").and_then(Value::as_u64) {
            Some(ms) => self.stream.debounce_immediate(Duration::from_millis(ms)),
            None => self.stream.clone(),
        };

        run_handler(&self.label, &self.handler, &self.stream, &operands);
        Ok(stream)
    }

    fn timeline(&self, name: &str) -> Option<Stream> {
        self.get_timeline(name).map(|timeline| timeline.stream())
    }
}

/// Service whose operations run in process
pub struct LocalService {
    name: String,
    operations: RwLock<HashMap<String, Arc<LocalOperation>>>,
    scheduler: Arc<Scheduler>,
    stream_capacity: usize,
}

impl LocalService {
    pub fn new(name: impl Into<String>, scheduler: Arc<Scheduler>, stream_capacity: usize) -> Self {
        Self {
            name: name.into(),
            operations: RwLock::new(HashMap::new()),
            scheduler,
            stream_capacity,
        }
    }

    /// Builder form of [`add_operation`](Self::add_operation)
    pub fn with_operation<F>(self, name: &str, handler: F) -> Self
    where
        F: Fn(&Value) -> UiResult<Value> + Send + Sync + 'static,
    {
        self.add_operation(name, handler);
        self
    }

    pub fn add_operation<F>(&self, name: &str, handler: F) -> Arc<LocalOperation>
    where
        F: Fn(&Value) -> UiResult<Value> + Send + Sync + 'static,
    {
        let operation = Arc::new(LocalOperation::new(
            &self.name,
            name,
            Arc::new(handler),
            self.scheduler.clone(),
            self.stream_capacity,
        ));
        self.operations
            .write()
            .insert(name.to_string(), operation.clone());
        operation
    }

    pub fn local_operation(&self, name: &str) -> Option<Arc<LocalOperation>> {
        self.operations.read().get(name).cloned()
    }

    pub fn add_timeline(&self, operation: &str, settings: TimelineSettings) -> UiResult<Arc<Timeline>> {
        let op = self.local_operation(operation).ok_or_else(|| {
            UiError::service(format!("{} has no operation {}", self.name, operation))
        })?;
        Ok(op.add_timeline(settings))
    }

    /// Apply `{ operation: settings | [settings] }` timeline declarations
    pub fn load_timelines(&self, declarations: &Value) -> usize {
        let Some(map) = declarations.as_object() else {
            return 0;
        };

        let mut created = 0;
        for (operation, settings) in map {
            for settings in TimelineSettings::list_from_value(settings) {
                match self.add_timeline(operation, settings) {
                    Ok(_) => created += 1,
                    Err(e) => warn!("Skipping timeline: {}", e),
                }
            }
        }
        created
    }

    /// Apply `{ operation: poller }` declarations
    pub fn load_pollers(&self, declarations: &Value) -> usize {
        let Some(map) = declarations.as_object() else {
            return 0;
        };

        let mut created = 0;
        for (operation, settings) in map {
            let wrapped = serde_json::json!({ "poller": settings });
            let (Some(op), Some(poller)) = (
                self.local_operation(operation),
                PollerSettings::from_operands(&wrapped),
            ) else {
                warn!("Skipping poller for {}.{}", self.name, operation);
                continue;
            };
            if op.create_poller(&poller, Value::Null) {
                created += 1;
            }
        }
        created
    }
}

impl Service for LocalService {
    fn name(&self) -> &str {
        &self.name
    }

    fn operation(&self, name: &str) -> Option<Arc<dyn ServiceOperation>> {
        self.local_operation(name)
            .map(|op| op as Arc<dyn ServiceOperation>)
    }

    fn operation_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.operations.read().keys().cloned().collect();
        names.sort();
        names
    }
}

//! Service contracts and the named service registry

use super::scheduler::Scheduler;
use crate::error::{UiError, UiResult};
use crate::stream::Stream;
use parking_lot::RwLock;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;
use tokio::time::Instant;
use tracing::{debug, warn};

/// A named operation producing a reactive result stream
pub trait ServiceOperation: Send + Sync {
    fn name(&self) -> &str;

    /// Issue the operation; results arrive on the returned stream
    fn execute(&self, operands: Option<Value>) -> UiResult<Stream>;

    /// Stream of a named timeline derived from this operation
    fn timeline(&self, _name: &str) -> Option<Stream> {
        None
    }
}

/// A named capability exposing operations
pub trait Service: Send + Sync {
    fn name(&self) -> &str;

    fn operation(&self, name: &str) -> Option<Arc<dyn ServiceOperation>>;

    fn operation_names(&self) -> Vec<String>;
}

/// Registry of services reachable by bindings
pub struct ServiceRegistry {
    services: RwLock<HashMap<String, Arc<dyn Service>>>,
    registered: Notify,
    scheduler: Arc<Scheduler>,
    lookup_timeout: Duration,
}

impl ServiceRegistry {
    pub fn new(lookup_timeout: Duration) -> Self {
        Self {
            services: RwLock::new(HashMap::new()),
            registered: Notify::new(),
            scheduler: Arc::new(Scheduler::new()),
            lookup_timeout,
        }
    }

    /// Timers shared by every service
    pub fn scheduler(&self) -> Arc<Scheduler> {
        self.scheduler.clone()
    }

    pub fn register(&self, service: Arc<dyn Service>) {
        let name = service.name().to_string();
        if self.services.write().insert(name.clone(), service).is_some() {
            warn!("Service {} registered twice, previous one replaced", name);
        }
        debug!("Service {} registered", name);
        self.registered.notify_waiters();
    }

    pub fn unregister(&self, name: &str) -> bool {
        self.services.write().remove(name).is_some()
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Service>> {
        self.services.read().get(name).cloned()
    }

    pub fn names(&self) -> Vec<String> {
        self.services.read().keys().cloned().collect()
    }

    /// Resolve a service, waiting for it to be registered
    pub async fn lookup(&self, name: &str) -> UiResult<Arc<dyn Service>> {
        let deadline = Instant::now() + self.lookup_timeout;
        loop {
            // Created before the check so a registration in between is not missed.
            let notified = self.registered.notified();
            tokio::pin!(notified);

            if let Some(service) = self.get(name) {
                return Ok(service);
            }
            if tokio::time::timeout_at(deadline, notified).await.is_err() {
                return Err(UiError::ServiceNotFound(name.to_string()));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::local::LocalService;
    use serde_json::json;

    #[tokio::test]
    async fn test_lookup_waits_for_registration() {
        let registry = Arc::new(ServiceRegistry::new(Duration::from_secs(1)));
        let waiting = {
            let registry = registry.clone();
            tokio::spawn(async move { registry.lookup("resources").await })
        };
        tokio::task::yield_now().await;

        let service = LocalService::new("resources", registry.scheduler(), 8)
            .with_operation("get", |_| Ok(json!([])));
        registry.register(Arc::new(service));

        let found = waiting.await.unwrap().unwrap();
        assert_eq!(found.name(), "resources");
        assert_eq!(found.operation_names(), vec!["get".to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_lookup_times_out() {
        let registry = ServiceRegistry::new(Duration::from_millis(100));
        let result = registry.lookup("missing").await;
        assert!(matches!(result, Err(UiError::ServiceNotFound(name)) if name == "missing"));
    }
}

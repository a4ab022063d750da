//! Tracing setup and the runtime log stream
//!
//! Besides the usual formatted output, every log event is republished as a
//! JSON value on the runtime logs stream, which components expose as the
//! `runtime_logs` named stream.

use crate::config::EngineConfig;
use crate::error::{UiError, UiResult};
use crate::stream::Stream;
use chrono::Utc;
use serde_json::{json, Map, Value};
use tracing::field::{Field, Visit};
use tracing::{Event, Subscriber};
use tracing_subscriber::layer::{Context, SubscriberExt};
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer};

/// Binding deliveries log on failure; republishing them could feed a binding
/// on the log stream its own failures.
const SKIPPED_TARGET: &str = "viewbind::binding";

/// Layer pushing every event onto a [`Stream`]
pub struct RuntimeLogLayer {
    logs: Stream,
}

impl RuntimeLogLayer {
    pub fn new(logs: Stream) -> Self {
        Self { logs }
    }
}

impl<S> Layer<S> for RuntimeLogLayer
where
    S: Subscriber,
{
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let metadata = event.metadata();
        if metadata.target().starts_with(SKIPPED_TARGET) {
            return;
        }

        let mut visitor = JsonVisitor::default();
        event.record(&mut visitor);

        self.logs.push(json!({
            "ts": Utc::now().to_rfc3339(),
            "level": metadata.level().to_string(),
            "target": metadata.target(),
            "message": visitor.message,
            "fields": Value::Object(visitor.fields),
        }));
    }
}

#[derive(Default)]
struct JsonVisitor {
    message: String,
    fields: Map<String, Value>,
}

impl JsonVisitor {
    fn insert(&mut self, field: &Field, value: Value) {
        if field.name() == "message" {
            self.message = match value {
                Value::String(text) => text,
                other => other.to_string(),
            };
        } else {
            self.fields.insert(field.name().to_string(), value);
        }
    }
}

impl Visit for JsonVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        self.insert(field, Value::String(format!("{:?}", value)));
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        self.insert(field, Value::String(value.to_string()));
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.insert(field, json!(value));
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.insert(field, json!(value));
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        self.insert(field, json!(value));
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.insert(field, json!(value));
    }
}

/// Install the global subscriber: formatted output plus the log stream
pub fn init_tracing(config: &EngineConfig, logs: &Stream) -> UiResult<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_filter))
        .map_err(|e| UiError::config(format!("bad log filter {}: {}", config.log_filter, e)))?;

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(RuntimeLogLayer::new(logs.clone()))
        .try_init()
        .map_err(|e| UiError::config(format!("tracing already initialized: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_events_are_published() {
        let logs = Stream::with_replay("runtime_logs", 16);
        let subscriber = tracing_subscriber::registry().with(RuntimeLogLayer::new(logs.clone()));

        tracing::subscriber::with_default(subscriber, || {
            tracing::warn!(component = "panel", count = 3, "child skipped");
        });

        let entry = logs.latest().unwrap();
        assert_eq!(entry["level"], "WARN");
        assert_eq!(entry["message"], "child skipped");
        assert_eq!(entry["fields"]["component"], "panel");
        assert_eq!(entry["fields"]["count"], 3);
    }

    #[test]
    fn test_binding_events_are_not_republished() {
        let logs = Stream::with_replay("runtime_logs", 16);
        let subscriber = tracing_subscriber::registry().with(RuntimeLogLayer::new(logs.clone()));

        tracing::subscriber::with_default(subscriber, || {
            tracing::warn!(target: "viewbind::binding::base", "delivery failed");
        });

        assert!(logs.latest().is_none());
    }
}

use std::io;
use thiserror::Error;

pub type UiResult<T> = Result<T, UiError>;

/// Engine errors
///
/// `Precondition` is the fatal tier: it reports a configuration or
/// programmer defect and must reach the caller. Every other variant is a
/// runtime condition that callers log and degrade around.
#[derive(Error, Debug)]
pub enum UiError {
    /// Violated precondition (bad binding config, unload before load, ...)
    #[error("Precondition failed: {0}")]
    Precondition(String),

    /// Render pipeline step failed
    #[error("Render error: {0}")]
    Render(String),

    /// Named service was not registered in time
    #[error("Service not found: {0}")]
    ServiceNotFound(String),

    /// Service operation failed at runtime
    #[error("Service error: {0}")]
    Service(String),

    /// Target method is not known by the component
    #[error("Unknown method {method} on component {component}")]
    UnknownMethod { component: String, method: String },

    /// Malformed state path
    #[error("Invalid state path: {0}")]
    InvalidPath(String),

    /// The component task queue worker is gone
    #[error("Task queue closed for {0}")]
    QueueClosed(String),

    /// A queued step panicked
    #[error("Queued task panicked in {0}")]
    TaskPanicked(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// JSON (de)serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

impl UiError {
    /// Create a new precondition error
    pub fn precondition<S: Into<String>>(msg: S) -> Self {
        UiError::Precondition(msg.into())
    }

    /// Create a new render error
    pub fn render<S: Into<String>>(msg: S) -> Self {
        UiError::Render(msg.into())
    }

    /// Create a new service error
    pub fn service<S: Into<String>>(msg: S) -> Self {
        UiError::Service(msg.into())
    }

    /// Create a new configuration error
    pub fn config<S: Into<String>>(msg: S) -> Self {
        UiError::Config(msg.into())
    }

    /// Whether the error belongs to the fatal tier
    pub fn is_precondition(&self) -> bool {
        matches!(self, UiError::Precondition(_))
    }
}

//! Engine configuration
//!
//! Loaded from a TOML file; every field has a default so a missing file or a
//! partial file is valid.

use crate::error::{UiError, UiResult};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Root key of the application state holding view descriptions
    pub views_root: String,
    /// Capacity of the broadcast buffer behind every engine stream
    pub stream_capacity: usize,
    /// How long an async service lookup waits for registration
    pub service_lookup_timeout_ms: u64,
    /// Tracing filter directive used by the binary
    pub log_filter: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            views_root: "views".to_string(),
            stream_capacity: 256,
            service_lookup_timeout_ms: 5000,
            log_filter: "info".to_string(),
        }
    }
}

impl EngineConfig {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from file, falling back to defaults when absent
    pub async fn load_from_file(path: &Path) -> UiResult<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = tokio::fs::read_to_string(path).await?;
        let config = Self::from_toml(&content)?;
        Ok(config)
    }

    /// Parse and validate a TOML document
    pub fn from_toml(content: &str) -> UiResult<Self> {
        let config: EngineConfig = toml::from_str(content)
            .map_err(|e| UiError::config(format!("Failed to parse config: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration settings
    pub fn validate(&self) -> UiResult<()> {
        if self.views_root.trim().is_empty() {
            return Err(UiError::config("views_root must not be empty"));
        }

        if self.stream_capacity == 0 {
            return Err(UiError::config("stream_capacity must be greater than 0"));
        }

        Ok(())
    }

    /// Service lookup timeout as a duration
    pub fn service_lookup_timeout(&self) -> Duration {
        Duration::from_millis(self.service_lookup_timeout_ms)
    }
}

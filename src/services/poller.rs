//! Pollers: recurring re-issue of a service request

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

/// `{ name, interval_seconds | interval_milliseconds }`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PollerSettings {
    pub name: String,
    #[serde(default)]
    pub interval_seconds: Option<f64>,
    #[serde(default)]
    pub interval_milliseconds: Option<u64>,
}

impl PollerSettings {
    /// Parse the `poller` entry of operation operands
    pub fn from_operands(operands: &Value) -> Option<Self> {
        let settings: Self = serde_json::from_value(operands.get("poller")?.clone()).ok()?;
        (!settings.name.is_empty() && settings.interval().is_some()).then_some(settings)
    }

    /// Seconds win over milliseconds when both are given
    ///
    /// Seconds that do not fit a `Duration` are no interval at all.
    pub fn interval(&self) -> Option<Duration> {
        match (self.interval_seconds, self.interval_milliseconds) {
            (Some(seconds), _) if seconds > 0.0 => Duration::try_from_secs_f64(seconds).ok(),
            (_, Some(ms)) if ms > 0 => Some(Duration::from_millis(ms)),
            _ => None,
        }
    }
}

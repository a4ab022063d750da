//! Name, type and settings of a component

use crate::error::{UiError, UiResult};
use serde_json::Value;
use tracing::{info_span, Span};

/// Who a component is
#[derive(Debug, Clone)]
pub struct Identity {
    name: String,
    kind: String,
    settings: Value,
    span: Span,
}

impl Identity {
    /// Read `name` and `type` from component settings
    pub fn from_settings(settings: Value) -> UiResult<Self> {
        if !settings.is_object() {
            return Err(UiError::precondition("component settings must be an object"));
        }
        let name = settings
            .get("name")
            .and_then(Value::as_str)
            .filter(|name| !name.is_empty())
            .ok_or_else(|| UiError::precondition("component settings without a name"))?
            .to_string();
        let kind = settings
            .get("type")
            .and_then(Value::as_str)
            .filter(|kind| !kind.is_empty())
            .ok_or_else(|| {
                UiError::precondition(format!("component {} settings without a type", name))
            })?
            .to_string();

        let span = info_span!("component", name = %name, kind = %kind);
        Ok(Self {
            name,
            kind,
            settings,
            span,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn settings(&self) -> &Value {
        &self.settings
    }

    /// Span every queued step of the component runs in
    pub fn span(&self) -> &Span {
        &self.span
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_identity_from_settings() {
        let identity = Identity::from_settings(json!({"name": "home", "type": "container"})).unwrap();
        assert_eq!(identity.name(), "home");
        assert_eq!(identity.kind(), "container");
        assert_eq!(identity.settings()["name"], "home");
    }

    #[test]
    fn test_bad_settings_are_preconditions() {
        assert!(Identity::from_settings(json!("home")).unwrap_err().is_precondition());
        assert!(Identity::from_settings(json!({"type": "container"}))
            .unwrap_err()
            .is_precondition());
        assert!(Identity::from_settings(json!({"name": "home"}))
            .unwrap_err()
            .is_precondition());
    }
}

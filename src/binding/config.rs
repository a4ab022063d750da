//! Binding declarations
//!
//! Bindings are declared in component state under four lists. The raw
//! entries are loosely shaped; they are normalized into a [`BindingSpec`]
//! right at the boundary so the rest of the engine matches on an explicit
//! [`BindingKind`] and [`BindingSource`].

use crate::error::{UiError, UiResult};
use crate::stream::Stream;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// Kind of binding source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BindingKind {
    Service,
    Stream,
    EmitterJquery,
    EmitterDom,
    Timeline,
}

impl BindingKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BindingKind::Service => "service",
            BindingKind::Stream => "stream",
            BindingKind::EmitterJquery => "emitter_jquery",
            BindingKind::EmitterDom => "emitter_dom",
            BindingKind::Timeline => "timeline",
        }
    }

    pub fn is_emitter(&self) -> bool {
        matches!(self, BindingKind::EmitterJquery | BindingKind::EmitterDom)
    }
}

impl fmt::Display for BindingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BindingKind {
    type Err = UiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "service" => Ok(BindingKind::Service),
            "stream" => Ok(BindingKind::Stream),
            "emitter_jquery" => Ok(BindingKind::EmitterJquery),
            "emitter_dom" => Ok(BindingKind::EmitterDom),
            "timeline" => Ok(BindingKind::Timeline),
            other => Err(UiError::precondition(format!("unknown binding type {}", other))),
        }
    }
}

/// Declaration list a binding comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingList {
    Services,
    Streams,
    EmitterJquery,
    EmitterDom,
}

impl BindingList {
    pub const ALL: [BindingList; 4] = [
        BindingList::Services,
        BindingList::Streams,
        BindingList::EmitterJquery,
        BindingList::EmitterDom,
    ];

    /// Key of the list under `bindings`
    pub fn key(&self) -> &'static str {
        match self {
            BindingList::Services => "services",
            BindingList::Streams => "streams",
            BindingList::EmitterJquery => "emitter_jquery",
            BindingList::EmitterDom => "emitter_dom",
        }
    }
}

/// One fan-out handler of an emitter binding
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawHandler {
    #[serde(default)]
    pub targets: Option<Vec<String>>,
    #[serde(default)]
    pub target_method: Option<String>,
    #[serde(default)]
    pub options: Option<Value>,
}

/// A binding entry as declared in state
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawBindingConfig {
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub service: Option<String>,
    #[serde(default)]
    pub method: Option<String>,
    #[serde(default)]
    pub source_stream: Option<String>,
    #[serde(default)]
    pub source_type: Option<String>,
    #[serde(default)]
    pub source_selector: Option<String>,
    #[serde(default)]
    pub dom_selector: Option<String>,
    #[serde(default)]
    pub dom_event: Option<String>,
    #[serde(default)]
    pub timeline: Option<String>,
    #[serde(default)]
    pub targets: Option<Vec<String>>,
    #[serde(default)]
    pub target_method: Option<String>,
    #[serde(default)]
    pub options: Option<Value>,
    #[serde(default)]
    pub state_path: Option<Value>,
    #[serde(default)]
    pub handlers: Option<Vec<RawHandler>>,
}

impl RawBindingConfig {
    pub fn from_value(value: &Value) -> UiResult<Self> {
        serde_json::from_value(value.clone())
            .map_err(|e| UiError::precondition(format!("malformed binding declaration: {}", e)))
    }

    /// Type of a `services` entry when none is declared
    pub fn inferred_kind(&self) -> BindingKind {
        if self.timeline.is_some() {
            BindingKind::Timeline
        } else if self.dom_event.is_some() {
            BindingKind::EmitterJquery
        } else {
            BindingKind::Service
        }
    }
}

/// Where binding values come from
#[derive(Debug, Clone)]
pub enum BindingSource {
    Service {
        service: String,
        method: String,
    },
    Timeline {
        service: String,
        method: String,
        timeline: String,
    },
    Stream {
        name: String,
        source_type: Option<String>,
        source_selector: Option<String>,
        resolved: Option<Stream>,
    },
    Emitter {
        selector: String,
        event: String,
    },
}

/// Target component names, method and static options
#[derive(Debug, Clone, PartialEq)]
pub struct TargetSpec {
    pub targets: Vec<String>,
    pub method: String,
    pub options: Value,
}

impl TargetSpec {
    /// Operands handed to a service operation (`options.method`)
    pub fn method_operands(&self) -> Option<Value> {
        self.options.get("method").cloned()
    }
}

/// Normalized binding declaration
#[derive(Debug, Clone)]
pub struct BindingSpec {
    pub kind: BindingKind,
    pub source: BindingSource,
    pub target: TargetSpec,
    pub handlers: Vec<TargetSpec>,
    pub state_path: Option<Value>,
}

impl BindingSpec {
    /// Normalize a raw entry of `list` declared on component `owner`
    ///
    /// Missing targets default to the owner. Empty names are kept as they
    /// are: `build` is where they are rejected.
    pub fn normalize(raw: RawBindingConfig, list: BindingList, owner: &str) -> UiResult<Self> {
        let kind = match list {
            BindingList::Services => match raw.kind.as_deref() {
                Some(kind) => kind.parse()?,
                None => raw.inferred_kind(),
            },
            BindingList::Streams => BindingKind::Stream,
            BindingList::EmitterJquery => BindingKind::EmitterJquery,
            BindingList::EmitterDom => BindingKind::EmitterDom,
        };

        let source = match kind {
            BindingKind::Service => BindingSource::Service {
                service: raw.service.clone().unwrap_or_default(),
                method: raw.method.clone().unwrap_or_default(),
            },
            BindingKind::Timeline => BindingSource::Timeline {
                service: raw.service.clone().unwrap_or_default(),
                method: raw.method.clone().unwrap_or_default(),
                timeline: raw.timeline.clone().unwrap_or_default(),
            },
            BindingKind::Stream => BindingSource::Stream {
                name: raw.source_stream.clone().unwrap_or_default(),
                source_type: raw.source_type.clone(),
                source_selector: raw.source_selector.clone(),
                resolved: None,
            },
            BindingKind::EmitterJquery | BindingKind::EmitterDom => BindingSource::Emitter {
                selector: raw.dom_selector.clone().unwrap_or_default(),
                event: raw.dom_event.clone().unwrap_or_default(),
            },
        };

        let default_targets = || vec![owner.to_string()];
        let target = TargetSpec {
            targets: raw.targets.clone().unwrap_or_else(default_targets),
            method: raw.target_method.clone().unwrap_or_default(),
            options: raw.options.clone().unwrap_or(Value::Null),
        };

        let handlers = raw
            .handlers
            .unwrap_or_default()
            .into_iter()
            .map(|handler| TargetSpec {
                targets: handler.targets.unwrap_or_else(|| target.targets.clone()),
                method: handler.target_method.unwrap_or_else(|| target.method.clone()),
                options: handler.options.unwrap_or_else(|| target.options.clone()),
            })
            .collect();

        Ok(Self {
            kind,
            source,
            target,
            handlers,
            state_path: raw.state_path,
        })
    }

    /// Attach the live stream a `stream` binding resolved to
    pub fn with_stream(mut self, stream: Stream) -> Self {
        if let BindingSource::Stream { resolved, .. } = &mut self.source {
            *resolved = Some(stream);
        }
        self
    }
}

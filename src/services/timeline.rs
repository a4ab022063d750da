//! Timelines: bounded, interval-debounced sample history of a stream
//!
//! Each accepted sample republishes the whole history on the timeline's own
//! stream, so a UI binding to a timeline always receives the full series.

use crate::stream::{Stream, Subscription};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::VecDeque;
use std::sync::Arc;
use tracing::debug;

/// One extracted field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSpec {
    pub name: String,
    pub path: String,
}

/// How a sample value is extracted from a raw stream value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Transform {
    /// Field name (dotted path)
    Field(String),
    /// Numeric field name or array index
    Index(u64),
    /// Explicit field list; `single` returns the first field's value
    Fields {
        result_type: String,
        fields: Vec<FieldSpec>,
    },
}

impl Transform {
    pub fn apply(&self, value: &Value) -> Value {
        match self {
            Transform::Field(path) => lookup(value, path),
            Transform::Index(index) => lookup(value, &index.to_string()),
            Transform::Fields {
                result_type,
                fields,
            } => {
                if result_type == "single" {
                    return fields
                        .first()
                        .map(|field| lookup(value, &field.path))
                        .unwrap_or(Value::Null);
                }
                let record: Map<String, Value> = fields
                    .iter()
                    .map(|field| (field.name.clone(), lookup(value, &field.path)))
                    .collect();
                Value::Object(record)
            }
        }
    }
}

fn lookup(value: &Value, path: &str) -> Value {
    path.split('.')
        .filter(|part| !part.is_empty())
        .try_fold(value, |node, part| match node {
            Value::Object(map) => map.get(part),
            Value::Array(items) => part.parse::<usize>().ok().and_then(|i| items.get(i)),
            _ => None,
        })
        .cloned()
        .unwrap_or(Value::Null)
}

/// Timeline settings as declared on a service operation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineSettings {
    pub name: String,
    pub transform: Transform,
    pub max: usize,
    pub interval_seconds: f64,
}

impl TimelineSettings {
    /// Parse settings, rejecting entries missing a field
    pub fn from_value(value: &Value) -> Option<Self> {
        let settings: Self = serde_json::from_value(value.clone()).ok()?;
        (settings.max > 0 && !settings.name.is_empty()).then_some(settings)
    }

    /// One settings object or an array of them
    pub fn list_from_value(value: &Value) -> Vec<Self> {
        match value {
            Value::Array(items) => items.iter().filter_map(Self::from_value).collect(),
            other => Self::from_value(other).into_iter().collect(),
        }
    }
}

/// One timeline entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineSample {
    pub ts: i64,
    pub value: Value,
}

struct TimelineData {
    samples: VecDeque<TimelineSample>,
    previous: Option<DateTime<Utc>>,
}

/// Bounded ring of `{ts, value}` samples
pub struct Timeline {
    settings: TimelineSettings,
    data: Mutex<TimelineData>,
    stream: Stream,
}

impl Timeline {
    pub fn new(settings: TimelineSettings, stream_capacity: usize) -> Self {
        let stream = Stream::with_replay(format!("timeline:{}", settings.name), stream_capacity);
        Self {
            data: Mutex::new(TimelineData {
                samples: VecDeque::with_capacity(settings.max + 1),
                previous: None,
            }),
            settings,
            stream,
        }
    }

    pub fn name(&self) -> &str {
        &self.settings.name
    }

    pub fn settings(&self) -> &TimelineSettings {
        &self.settings
    }

    /// Stream of full sample arrays
    pub fn stream(&self) -> Stream {
        self.stream.clone()
    }

    pub fn samples(&self) -> Vec<TimelineSample> {
        self.data.lock().samples.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.data.lock().samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Record a raw value observed at `at`
    ///
    /// The first value is always kept; later ones only when more than
    /// `interval_seconds` passed since the last kept one. Returns whether the
    /// value was kept.
    pub fn record(&self, raw: &Value, at: DateTime<Utc>) -> bool {
        let value = raw.get("datas").unwrap_or(raw);
        let extracted = self.settings.transform.apply(value);
        let min_gap_ms = (self.settings.interval_seconds * 1000.0) as i64;

        let snapshot = {
            let mut data = self.data.lock();
            if let Some(previous) = data.previous {
                if (at - previous).num_milliseconds() <= min_gap_ms {
                    return false;
                }
            }

            data.previous = Some(at);
            data.samples.push_back(TimelineSample {
                ts: at.timestamp_millis(),
                value: extracted,
            });
            while data.samples.len() > self.settings.max {
                data.samples.pop_front();
            }
            serde_json::to_value(&data.samples).unwrap_or(Value::Null)
        };

        debug!("Timeline {} recorded a sample", self.settings.name);
        self.stream.push(snapshot);
        true
    }

    /// Feed every value of `source` into the timeline
    pub fn attach(self: &Arc<Self>, source: &Stream) -> Subscription {
        let timeline = self.clone();
        source.subscribe(move |value| {
            timeline.record(&value, Utc::now());
        })
    }
}

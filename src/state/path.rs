//! Path addressing into the JSON state tree

use crate::error::{UiError, UiResult};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// One step of a state path
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PathKey {
    Index(usize),
    Key(String),
}

impl From<&str> for PathKey {
    fn from(key: &str) -> Self {
        PathKey::Key(key.to_string())
    }
}

impl From<String> for PathKey {
    fn from(key: String) -> Self {
        PathKey::Key(key)
    }
}

impl From<usize> for PathKey {
    fn from(index: usize) -> Self {
        PathKey::Index(index)
    }
}

impl fmt::Display for PathKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathKey::Index(i) => write!(f, "{}", i),
            PathKey::Key(k) => write!(f, "{}", k),
        }
    }
}

/// Ordered sequence of keys and indices
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StatePath(Vec<PathKey>);

impl StatePath {
    pub fn new(keys: Vec<PathKey>) -> Self {
        Self(keys)
    }

    /// Parse a path from JSON input
    ///
    /// Only a non-empty array of strings and non-negative integers is a
    /// path; anything else yields `None`.
    pub fn from_value(value: &Value) -> Option<Self> {
        let items = value.as_array()?;
        if items.is_empty() {
            return None;
        }

        items
            .iter()
            .map(|item| match item {
                Value::String(key) => Some(PathKey::Key(key.clone())),
                Value::Number(n) => n.as_u64().map(|i| PathKey::Index(i as usize)),
                _ => None,
            })
            .collect::<Option<Vec<_>>>()
            .map(StatePath)
    }

    pub fn keys(&self) -> &[PathKey] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// New path with `key` appended
    pub fn child(&self, key: impl Into<PathKey>) -> Self {
        let mut keys = self.0.clone();
        keys.push(key.into());
        Self(keys)
    }

    pub fn to_value(&self) -> Value {
        Value::Array(
            self.0
                .iter()
                .map(|key| match key {
                    PathKey::Index(i) => Value::from(*i),
                    PathKey::Key(k) => Value::String(k.clone()),
                })
                .collect(),
        )
    }
}

impl<K: Into<PathKey>> FromIterator<K> for StatePath {
    fn from_iter<I: IntoIterator<Item = K>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

impl fmt::Display for StatePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.0.iter().map(|k| k.to_string()).collect();
        write!(f, "[{}]", parts.join(", "))
    }
}

/// Read the node at `path`
pub fn get_in<'a>(root: &'a Value, path: &[PathKey]) -> Option<&'a Value> {
    path.iter().try_fold(root, |node, key| match key {
        PathKey::Key(k) => node.as_object()?.get(k),
        PathKey::Index(i) => node.as_array()?.get(*i),
    })
}

/// Copy of `root` with the node at `path` replaced by `value`
///
/// Missing intermediate nodes are created: objects for string keys, arrays
/// for indices. A scalar in the way is replaced. An index may address an
/// existing element or append one; anything past the end is refused.
pub fn set_in(root: &Value, path: &[PathKey], value: Value) -> UiResult<Value> {
    let mut updated = root.clone();
    write_in(&mut updated, path, value)?;
    Ok(updated)
}

fn write_in(node: &mut Value, path: &[PathKey], value: Value) -> UiResult<()> {
    let Some((head, rest)) = path.split_first() else {
        *node = value;
        return Ok(());
    };

    match head {
        PathKey::Key(key) => {
            if !node.is_object() {
                *node = Value::Object(Map::new());
            }
            match node {
                Value::Object(map) => {
                    let slot = map.entry(key.clone()).or_insert(Value::Null);
                    write_in(slot, rest, value)
                }
                _ => Ok(()),
            }
        }
        PathKey::Index(index) => {
            if !node.is_array() {
                *node = Value::Array(Vec::new());
            }
            let Value::Array(items) = node else {
                return Ok(());
            };
            if *index > items.len() {
                return Err(UiError::InvalidPath(format!(
                    "index {} past the end of an array of {}",
                    index,
                    items.len()
                )));
            }
            if *index == items.len() {
                items.push(Value::Null);
            }
            write_in(&mut items[*index], rest, value)
        }
    }
}

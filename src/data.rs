//! Structured values extracted from, or formatted into, paths

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Placeholder values keyed by the first segment of their name
pub type Data = BTreeMap<String, Value>;

/// A leaf string or a nested mapping
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    String(String),
    Map(Data),
}

impl Value {
    /// Build a nested mapping from key/value pairs
    pub fn map<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        Value::Map(data(entries))
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            Value::Map(_) => None,
        }
    }

    pub fn as_map(&self) -> Option<&Data> {
        match self {
            Value::String(_) => None,
            Value::Map(map) => Some(map),
        }
    }
}

// Debug output stays close to the data itself since it is echoed in error messages.
impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::String(s) => fmt::Debug::fmt(s, f),
            Value::Map(map) => fmt::Debug::fmt(map, f),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<Data> for Value {
    fn from(map: Data) -> Self {
        Value::Map(map)
    }
}

/// Build [`Data`] from key/value pairs
///
/// ```rust
/// use path_template::{data, Value};
///
/// let job = data([("job", Value::map([("code", "monty")])), ("lod", "high".into())]);
/// assert_eq!(job["lod"].as_str(), Some("high"));
/// ```
pub fn data<I, K, V>(entries: I) -> Data
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<Value>,
{
    entries
        .into_iter()
        .map(|(key, value)| (key.into(), value.into()))
        .collect()
}

/// Store `value` under the dotted key path, creating mappings on the way
pub(crate) fn insert_nested<'k>(
    data: &mut Data,
    parents: impl Iterator<Item = &'k str>,
    leaf: &str,
    value: &str,
) {
    let mut target = data;
    for key in parents {
        let entry = target
            .entry(key.to_string())
            .or_insert_with(|| Value::Map(Data::new()));
        if let Value::String(_) = entry {
            *entry = Value::Map(Data::new());
        }
        target = match entry {
            Value::Map(map) => map,
            Value::String(_) => return,
        };
    }
    target.insert(leaf.to_string(), Value::from(value));
}

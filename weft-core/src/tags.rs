//! Key/value tag sets.

use crate::config::IgnoreConfig;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, btree_map};

/// An ordered set of `key = value` tags.
///
/// Equality between two tags is key *and* value equality; keys are
/// case-sensitive.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KeyValueTags {
    tags: BTreeMap<String, String>,
}

impl KeyValueTags {
    /// Create an empty tag set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a tag set from a state or configuration value.
    ///
    /// `null` and non-object values yield an empty set. Null entries are
    /// skipped; non-string scalars are stringified.
    pub fn from_value(value: Option<&Value>) -> Self {
        let Some(Value::Object(map)) = value else {
            return Self::new();
        };

        map.iter()
            .filter_map(|(k, v)| match v {
                Value::Null => None,
                Value::String(s) => Some((k.clone(), s.clone())),
                other => Some((k.clone(), other.to_string())),
            })
            .collect()
    }

    /// Render as a JSON object suitable for [`ResourceState::set`](crate::ResourceState::set).
    pub fn to_value(&self) -> Value {
        Value::Object(
            self.tags
                .iter()
                .map(|(k, v)| (k.clone(), Value::String(v.clone())))
                .collect(),
        )
    }

    /// Insert a tag, returning the previous value for the key.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.tags.insert(key.into(), value.into())
    }

    /// Look up the value for `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.tags.get(key).map(String::as_str)
    }

    /// Whether `key` is present with exactly `value`.
    pub fn contains(&self, key: &str, value: &str) -> bool {
        self.get(key) == Some(value)
    }

    /// Whether `key` is present.
    pub fn contains_key(&self, key: &str) -> bool {
        self.tags.contains_key(key)
    }

    /// Iterate over `(key, value)` pairs in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.tags.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Iterate over keys in order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.tags.keys().map(String::as_str)
    }

    /// Number of tags.
    pub fn len(&self) -> usize {
        self.tags.len()
    }

    /// Whether the set is empty.
    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    /// Tags of `self` overridden by `other`.
    pub fn merge(&self, other: &KeyValueTags) -> KeyValueTags {
        let mut merged = self.clone();
        merged
            .tags
            .extend(other.tags.iter().map(|(k, v)| (k.clone(), v.clone())));
        merged
    }

    /// Tags of `self` whose key and value are not both present in `other`.
    pub fn difference(&self, other: &KeyValueTags) -> KeyValueTags {
        self.iter()
            .filter(|(k, v)| !other.contains(k, v))
            .collect()
    }

    /// Remove tags whose key starts with any of the system prefixes.
    pub fn ignore_system(&self, prefixes: &[&str]) -> KeyValueTags {
        self.iter()
            .filter(|(k, _)| !prefixes.iter().any(|p| k.starts_with(p)))
            .collect()
    }

    /// Remove tags matched by the ignore rules.
    pub fn ignore_config(&self, ignore: &IgnoreConfig) -> KeyValueTags {
        self.iter().filter(|(k, _)| !ignore.ignores(k)).collect()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for KeyValueTags {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self {
            tags: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl IntoIterator for KeyValueTags {
    type Item = (String, String);
    type IntoIter = btree_map::IntoIter<String, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.tags.into_iter()
    }
}

//! A map-backed [`ResourceState`].

use serde_json::{Map, Value};
use std::collections::BTreeSet;
use weft_core::{ResourceState, StateError};

/// In-memory resource state.
///
/// Attributes start out as a copy of the planned state. An optional schema
/// restricts which attribute names may be set.
#[derive(Debug, Clone, Default)]
pub struct ResourceData {
    id: String,
    attributes: Map<String, Value>,
    schema: Option<BTreeSet<String>>,
    raw_config: Value,
    raw_state: Value,
    raw_plan: Value,
}

impl ResourceData {
    /// Create state for the resource `id`.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    /// Restrict settable attributes to `keys`.
    pub fn with_schema<I, T>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.schema = Some(keys.into_iter().map(Into::into).collect());
        self
    }

    /// Set the user's raw configuration.
    pub fn with_config(mut self, config: Value) -> Self {
        self.raw_config = config;
        self
    }

    /// Set the prior state.
    pub fn with_prior_state(mut self, state: Value) -> Self {
        self.raw_state = state;
        self
    }

    /// Set the planned state; current attributes are reset to it.
    pub fn with_plan(mut self, plan: Value) -> Self {
        self.attributes = match &plan {
            Value::Object(map) => map.clone(),
            _ => Map::new(),
        };
        self.raw_plan = plan;
        self
    }

    /// All current attributes.
    pub fn attributes(&self) -> &Map<String, Value> {
        &self.attributes
    }
}

impl ResourceState for ResourceData {
    fn id(&self) -> &str {
        &self.id
    }

    fn set_id(&mut self, id: &str) {
        self.id = id.to_owned();
    }

    fn get(&self, key: &str) -> Option<&Value> {
        self.attributes.get(key)
    }

    fn set(&mut self, key: &str, value: Value) -> Result<(), StateError> {
        if let Some(schema) = &self.schema {
            if !schema.contains(key) {
                return Err(StateError::UnknownAttribute(key.to_owned()));
            }
        }
        self.attributes.insert(key.to_owned(), value);
        Ok(())
    }

    fn raw_config(&self) -> &Value {
        &self.raw_config
    }

    fn raw_state(&self) -> &Value {
        &self.raw_state
    }

    fn raw_plan(&self) -> &Value {
        &self.raw_plan
    }
}

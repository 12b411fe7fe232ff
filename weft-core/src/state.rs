//! The resource state handle capability set.

use crate::error::StateError;
use serde_json::Value;

/// Mutable view over one resource instance's state during an invocation.
///
/// This is a capability interface: the dispatcher and the standard
/// interceptors only ever go through these methods, so any object satisfying
/// it can be dispatched.
pub trait ResourceState: Send + Sync + 'static {
    /// The resource identifier; empty when the resource does not exist.
    fn id(&self) -> &str;

    /// Replace the resource identifier.
    fn set_id(&mut self, id: &str);

    /// Current value of an attribute.
    fn get(&self, key: &str) -> Option<&Value>;

    /// Set an attribute.
    fn set(&mut self, key: &str, value: Value) -> Result<(), StateError>;

    /// The configuration exactly as the user wrote it.
    fn raw_config(&self) -> &Value;

    /// The last-known state before this operation.
    fn raw_state(&self) -> &Value;

    /// The planned state.
    fn raw_plan(&self) -> &Value;

    /// `get` narrowed to a non-empty string.
    fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
    }
}

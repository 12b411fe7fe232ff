//! Error types for Weft.
//!
//! Runtime failures inside an invocation are reported as
//! [`Diagnostics`](crate::Diagnostics); the types here cover the boundaries
//! where a typed error is more useful:
//!
//! - [`StateError`] - Writing to a resource state handle
//! - [`TagError`] - Service tag listing and updating
//! - [`ConfigError`] - Provider tag configuration

use thiserror::Error;

/// A boxed error type for dynamic error handling.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors raised by a [`ResourceState`](crate::ResourceState) implementation.
#[derive(Error, Debug)]
pub enum StateError {
    /// The attribute is not part of the resource's schema.
    #[error("unknown attribute: {0}")]
    UnknownAttribute(String),

    /// The value does not fit the attribute's type.
    #[error("invalid value for attribute {key}: {reason}")]
    InvalidValue {
        /// Attribute name.
        key: String,
        /// Why the value was rejected.
        reason: String,
    },

    /// A custom state error.
    #[error(transparent)]
    Custom(BoxError),
}

/// Errors returned by service tagging collaborators.
#[derive(Error, Debug)]
pub enum TagError {
    /// The partition does not support tagging for this resource.
    ///
    /// Tag reconciliation downgrades this to a warning.
    #[error("tagging is not supported in partition {partition}")]
    UnsupportedInPartition {
        /// Partition identifier.
        partition: String,
    },

    /// The resource to tag could not be found.
    #[error("resource not found: {0}")]
    NotFound(String),

    /// Any other API failure.
    #[error(transparent)]
    Api(BoxError),
}

impl TagError {
    /// Whether this error should be reported as a warning instead of an error.
    pub fn is_unsupported(&self) -> bool {
        matches!(self, TagError::UnsupportedInPartition { .. })
    }
}

impl From<BoxError> for TagError {
    fn from(err: BoxError) -> Self {
        TagError::Api(err)
    }
}

impl From<BoxError> for StateError {
    fn from(err: BoxError) -> Self {
        StateError::Custom(err)
    }
}

/// Errors raised while assembling the provider tag configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A tag policy severity outside `error`, `warning` and `disabled`.
    #[error("invalid tag policy severity {value:?} from {source_name}: must be one of \"error\", \"warning\", or \"disabled\"")]
    InvalidSeverity {
        /// The rejected value.
        value: String,
        /// Where the value came from (attribute path or environment variable).
        source_name: String,
    },

    /// The configuration block could not be decoded.
    #[error("decoding tag configuration: {0}")]
    Decode(#[from] serde_json::Error),
}

//! Optional per-service capabilities.
//!
//! Services expose tagging through explicit capability accessors on
//! [`ServicePackage`]. A `None` answer means the service does not support
//! tagging and reconciliation silently does nothing.

use crate::{context::Context, error::TagError, tags::KeyValueTags};
use async_trait::async_trait;

/// Tag keys with this prefix are reserved by the cloud platform.
pub const DEFAULT_SYSTEM_TAG_PREFIX: &str = "aws:";

/// Fetches the authoritative tag list of a remote object.
#[async_trait]
pub trait ListTags<M: Sync>: Send + Sync {
    /// List the tags of `identifier`.
    async fn list_tags(
        &self,
        ctx: &Context,
        meta: &M,
        identifier: &str,
        resource_type: Option<&str>,
    ) -> Result<KeyValueTags, TagError>;
}

/// Applies a tag diff to a remote object.
#[async_trait]
pub trait UpdateTags<M: Sync>: Send + Sync {
    /// Remove `to_remove` and then add `to_add` on `identifier`.
    async fn update_tags(
        &self,
        ctx: &Context,
        meta: &M,
        identifier: &str,
        resource_type: Option<&str>,
        to_remove: &KeyValueTags,
        to_add: &KeyValueTags,
    ) -> Result<(), TagError>;
}

/// A group of resources backed by one cloud service client.
pub trait ServicePackage<M: Sync>: Send + Sync {
    /// Service package name, e.g. `sqs`.
    fn name(&self) -> &str;

    /// Tag listing capability.
    fn list_tags(&self) -> Option<&dyn ListTags<M>> {
        None
    }

    /// Tag updating capability.
    fn update_tags(&self) -> Option<&dyn UpdateTags<M>> {
        None
    }

    /// Key prefixes of tags the platform manages itself.
    fn system_tag_prefixes(&self) -> &[&str] {
        &[DEFAULT_SYSTEM_TAG_PREFIX]
    }
}

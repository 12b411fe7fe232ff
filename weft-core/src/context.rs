//! Per-invocation execution context.
//!
//! A [`Context`] is threaded explicitly through the bootstrap step, every
//! interceptor and the core handler. Interceptors receive it by value and
//! hand back a possibly-updated copy; cloning is cheap.

use crate::{config::TagsConfig, tags::KeyValueTags};
use serde_json::Value;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Identity of the resource type being operated on.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResourceContext {
    /// Name of the owning service package.
    pub service_package: String,
    /// Human readable resource name.
    pub resource_name: String,
    /// Type name, e.g. `example_queue`.
    pub type_name: String,
    /// Region override read from the resource's `region` attribute.
    pub override_region: Option<String>,
}

/// Execution context for one invocation.
#[derive(Debug, Clone, Default)]
pub struct Context {
    cancellation: CancellationToken,
    resource: Option<Arc<ResourceContext>>,
    tags_config: Option<Arc<TagsConfig>>,
    tags_in: Option<Arc<KeyValueTags>>,
    user_agent: Vec<String>,
    provider_meta: Option<Arc<Value>>,
}

impl Context {
    /// A fresh context that is never cancelled unless its token is.
    pub fn new() -> Self {
        Self::default()
    }

    /// Use an externally owned cancellation token.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = token;
        self
    }

    /// The cancellation token carried by this context.
    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancellation
    }

    /// Whether the invocation has been cancelled or its deadline passed.
    pub fn is_cancelled(&self) -> bool {
        self.cancellation.is_cancelled()
    }

    /// Attach the resource identity.
    pub fn with_resource(mut self, resource: ResourceContext) -> Self {
        self.resource = Some(Arc::new(resource));
        self
    }

    /// Resource identity, once bootstrapped.
    pub fn resource(&self) -> Option<&ResourceContext> {
        self.resource.as_deref()
    }

    /// Attach the provider-wide tag configuration.
    pub fn with_tags_config(mut self, config: Arc<TagsConfig>) -> Self {
        self.tags_config = Some(config);
        self
    }

    /// Provider-wide tag configuration, once bootstrapped.
    pub fn tags_config(&self) -> Option<&Arc<TagsConfig>> {
        self.tags_config.as_ref()
    }

    /// Attach the merged tags the core handler should create the resource with.
    pub fn with_tags_in(mut self, tags: KeyValueTags) -> Self {
        self.tags_in = Some(Arc::new(tags));
        self
    }

    /// Merged configured tags, set before Create and Update.
    pub fn tags_in(&self) -> Option<&KeyValueTags> {
        self.tags_in.as_deref()
    }

    /// Append user agent products.
    pub fn with_user_agent<I, T>(mut self, products: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.user_agent.extend(products.into_iter().map(Into::into));
        self
    }

    /// Extra user agent products for outgoing API calls.
    pub fn user_agent(&self) -> &[String] {
        &self.user_agent
    }

    /// Attach the raw `provider_meta` block supplied by the framework.
    pub fn with_provider_meta(mut self, value: Value) -> Self {
        self.provider_meta = Some(Arc::new(value));
        self
    }

    /// Raw `provider_meta` block, if the framework supplied one.
    pub fn provider_meta(&self) -> Option<&Value> {
        self.provider_meta.as_deref()
    }
}

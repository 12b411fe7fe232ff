//! Per-invocation context bootstrapping.
//!
//! Bootstrapping runs before any interceptor and is not part of the `BEFORE`
//! phase: interceptors cannot skip it, and every interceptor and the core
//! handler observe the context it produced.

use serde::Deserialize;
use thiserror::Error;
use weft_core::{Context, ProviderMeta, ResourceContext, ResourceState};
use weft_std::names::ATTR_REGION;

/// Errors raised while bootstrapping a context.
#[derive(Error, Debug)]
pub enum BootstrapError {
    /// The `provider_meta` block could not be decoded.
    #[error("getting provider_meta: {0}")]
    ProviderMeta(#[source] serde_json::Error),
}

/// Derives the per-invocation context for one resource type.
///
/// `state` is `None` when no resource state exists yet, as during state
/// upgrades.
pub trait Bootstrap<S: ResourceState, M: ProviderMeta>: Send + Sync + 'static {
    /// Populate `ctx` for this invocation.
    fn bootstrap(
        &self,
        ctx: Context,
        state: Option<&S>,
        meta: &M,
    ) -> Result<Context, BootstrapError>;
}

/// The `provider_meta` block resources may set in configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ProviderMetaData {
    /// Extra user agent products.
    #[serde(default)]
    pub user_agent: Vec<String>,
}

/// The bootstrap every wrapped resource uses.
///
/// Attaches the resource identity, the provider tag configuration, the
/// region override read from the `region` attribute and the user agent
/// products from `provider_meta`.
#[derive(Debug, Clone, Default)]
pub struct StandardBootstrap {
    service_package: String,
    resource_name: String,
    type_name: String,
    region_override: bool,
}

impl StandardBootstrap {
    /// Bootstrap for `type_name` owned by `service_package`.
    pub fn new(
        service_package: impl Into<String>,
        resource_name: impl Into<String>,
        type_name: impl Into<String>,
    ) -> Self {
        Self {
            service_package: service_package.into(),
            resource_name: resource_name.into(),
            type_name: type_name.into(),
            region_override: false,
        }
    }

    /// Read the region override from the `region` attribute.
    pub fn with_region_override(mut self) -> Self {
        self.region_override = true;
        self
    }
}

impl<S: ResourceState, M: ProviderMeta> Bootstrap<S, M> for StandardBootstrap {
    fn bootstrap(
        &self,
        ctx: Context,
        state: Option<&S>,
        meta: &M,
    ) -> Result<Context, BootstrapError> {
        let override_region = if self.region_override {
            state
                .and_then(|state| state.get_str(ATTR_REGION))
                .map(str::to_owned)
        } else {
            None
        };

        let mut ctx = ctx
            .with_resource(ResourceContext {
                service_package: self.service_package.clone(),
                resource_name: self.resource_name.clone(),
                type_name: self.type_name.clone(),
                override_region,
            })
            .with_tags_config(meta.tags_config());

        let provider_meta = ctx
            .provider_meta()
            .map(ProviderMetaData::deserialize)
            .transpose()
            .map_err(BootstrapError::ProviderMeta)?;
        if let Some(data) = provider_meta {
            ctx = ctx.with_user_agent(data.user_agent);
        }
        Ok(ctx)
    }
}

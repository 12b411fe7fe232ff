//! The wrapping layer.
//!
//! [`WrappedResource`] and [`WrappedDataSource`] expose one entry point per
//! operation. Each entry point bootstraps the context, filters the registry
//! for the operation and hands off to [`invoke`].

use crate::{
    bootstrap::Bootstrap,
    resource::{Resource, StateUpgrade},
};
use serde_json::Value;
use std::sync::Arc;
use tracing::{Instrument, info_span};
use weft_core::{Context, Diagnostics, DynCrudHandler, Noop, ProviderMeta, ResourceState, Why};
use weft_std::{Interceptors, invoke};

/// The parts shared by wrapped resources and data sources.
struct Wrapper<S: ResourceState, M: ProviderMeta> {
    type_name: String,
    bootstrap: Arc<dyn Bootstrap<S, M>>,
    interceptors: Interceptors<S, M>,
}

impl<S: ResourceState, M: ProviderMeta> Wrapper<S, M> {
    /// Bootstrap, then dispatch `handler` for `why`.
    async fn run(
        &self,
        handler: &dyn DynCrudHandler<S, M>,
        why: Why,
        ctx: Context,
        state: &mut S,
        meta: &M,
    ) -> Diagnostics {
        let span = info_span!("invoke", resource = %self.type_name, operation = %why);
        async move {
            let ctx = match self.bootstrap.bootstrap(ctx, Some(&*state), meta) {
                Ok(ctx) => ctx,
                Err(err) => return Diagnostics::from_error("bootstrapping context", err),
            };
            let filtered = self.interceptors.for_operation(why);
            let (_, diags) = invoke(ctx, &filtered, handler, why, state, meta).await;
            diags
        }
        .instrument(span)
        .await
    }
}

fn missing_handler(type_name: &str, why: Why) -> Diagnostics {
    let mut diags = Diagnostics::new();
    diags.add_error(
        format!("{type_name}: no {why} handler"),
        "the resource does not implement this operation",
    );
    diags
}

/// A resource type with bootstrap and interceptors applied to its handlers.
pub struct WrappedResource<S: ResourceState, M: ProviderMeta> {
    inner: Wrapper<S, M>,
    handlers: Resource<S, M>,
}

impl<S: ResourceState, M: ProviderMeta> WrappedResource<S, M> {
    /// Wrap `handlers` with `bootstrap` and `interceptors`.
    pub fn new(
        type_name: impl Into<String>,
        bootstrap: impl Bootstrap<S, M>,
        handlers: Resource<S, M>,
        interceptors: Interceptors<S, M>,
    ) -> Self {
        Self {
            inner: Wrapper {
                type_name: type_name.into(),
                bootstrap: Arc::new(bootstrap),
                interceptors,
            },
            handlers,
        }
    }

    /// Type name.
    pub fn type_name(&self) -> &str {
        &self.inner.type_name
    }

    /// The full interceptor registry, global interceptors first.
    pub fn interceptors(&self) -> &Interceptors<S, M> {
        &self.inner.interceptors
    }

    async fn dispatch(
        &self,
        handler: Option<&dyn DynCrudHandler<S, M>>,
        why: Why,
        ctx: Context,
        state: &mut S,
        meta: &M,
    ) -> Diagnostics {
        match handler {
            Some(handler) => self.inner.run(handler, why, ctx, state, meta).await,
            None => missing_handler(&self.inner.type_name, why),
        }
    }

    /// Create the resource.
    pub async fn create(&self, ctx: Context, state: &mut S, meta: &M) -> Diagnostics {
        let handler = self.handlers.create.as_deref();
        self.dispatch(handler, Why::CREATE, ctx, state, meta).await
    }

    /// Refresh the resource.
    pub async fn read(&self, ctx: Context, state: &mut S, meta: &M) -> Diagnostics {
        let handler = self.handlers.read.as_deref();
        self.dispatch(handler, Why::READ, ctx, state, meta).await
    }

    /// Update the resource. Without an Update handler only the interceptors
    /// run, which is how tag-only resources apply tag changes.
    pub async fn update(&self, ctx: Context, state: &mut S, meta: &M) -> Diagnostics {
        let handler = self.handlers.update.as_deref().unwrap_or(&Noop);
        self.dispatch(Some(handler), Why::UPDATE, ctx, state, meta).await
    }

    /// Delete the resource.
    pub async fn delete(&self, ctx: Context, state: &mut S, meta: &M) -> Diagnostics {
        let handler = self.handlers.delete.as_deref();
        self.dispatch(handler, Why::DELETE, ctx, state, meta).await
    }

    /// Customize the planned state. Plan-time interceptors run even without
    /// a CustomizeDiff handler.
    pub async fn customize_diff(&self, ctx: Context, state: &mut S, meta: &M) -> Diagnostics {
        let handler = self.handlers.customize_diff.as_deref().unwrap_or(&Noop);
        self.dispatch(Some(handler), Why::CUSTOMIZE_DIFF, ctx, state, meta).await
    }

    /// Import an existing resource by ID. Without an Import handler the ID is
    /// taken as is, after the import interceptors have run.
    pub async fn import(&self, ctx: Context, state: &mut S, meta: &M) -> Diagnostics {
        let handler = self.handlers.import.as_deref().unwrap_or(&Noop);
        self.dispatch(Some(handler), Why::IMPORT, ctx, state, meta).await
    }

    /// Upgrade `raw_state` written at schema `version` to the current schema.
    ///
    /// Only the bootstrap applies; no interceptor runs during state upgrades.
    pub async fn upgrade_state(
        &self,
        ctx: Context,
        version: u32,
        raw_state: Value,
        meta: &M,
    ) -> Result<Value, Diagnostics> {
        let ctx = self
            .inner
            .bootstrap
            .bootstrap(ctx, None, meta)
            .map_err(|err| Diagnostics::from_error("bootstrapping context", err))?;

        let mut upgrades: Vec<&StateUpgrade<M>> = self
            .handlers
            .state_upgraders
            .iter()
            .filter(|upgrade| upgrade.version >= version)
            .collect();
        upgrades.sort_by_key(|upgrade| upgrade.version);

        let mut raw_state = raw_state;
        for upgrade in upgrades {
            raw_state = upgrade
                .upgrader
                .upgrade(&ctx, raw_state, meta)
                .instrument(info_span!(
                    "upgrade_state",
                    resource = %self.inner.type_name,
                    version = upgrade.version
                ))
                .await
                .map_err(|err| {
                    Diagnostics::from_error(
                        format!("upgrading state from version {}", upgrade.version),
                        err,
                    )
                })?;
        }
        Ok(raw_state)
    }
}

/// A data source type with bootstrap and interceptors applied to its Read
/// handler.
pub struct WrappedDataSource<S: ResourceState, M: ProviderMeta> {
    inner: Wrapper<S, M>,
    read: Arc<dyn DynCrudHandler<S, M>>,
}

impl<S: ResourceState, M: ProviderMeta> WrappedDataSource<S, M> {
    /// Wrap `read` with `bootstrap` and `interceptors`.
    pub fn new(
        type_name: impl Into<String>,
        bootstrap: impl Bootstrap<S, M>,
        read: Arc<dyn DynCrudHandler<S, M>>,
        interceptors: Interceptors<S, M>,
    ) -> Self {
        Self {
            inner: Wrapper {
                type_name: type_name.into(),
                bootstrap: Arc::new(bootstrap),
                interceptors,
            },
            read,
        }
    }

    /// Type name.
    pub fn type_name(&self) -> &str {
        &self.inner.type_name
    }

    /// The full interceptor registry, global interceptors first.
    pub fn interceptors(&self) -> &Interceptors<S, M> {
        &self.inner.interceptors
    }

    /// Read the data source.
    pub async fn read(&self, ctx: Context, state: &mut S, meta: &M) -> Diagnostics {
        self.inner
            .run(self.read.as_ref(), Why::READ, ctx, state, meta)
            .await
    }
}

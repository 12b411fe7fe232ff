//! Resource and data source declarations.
//!
//! A service package declares each resource type once: its core handlers,
//! whether it takes part in tagging and region override, and any interceptors
//! of its own. The provider turns declarations into wrapped handlers when it
//! is built.

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use weft_core::{
    BoxError, Context, CrudHandler, DynCrudHandler, Interceptor, ProviderMeta, ResourceState,
    When, Why,
};
use weft_std::{Interceptors, tags::TagsSpec};

/// Migrates raw state written by an older schema version.
#[async_trait]
pub trait StateUpgrader<M: Sync>: Send + Sync {
    /// Upgrade `raw_state` by one schema version.
    async fn upgrade(&self, ctx: &Context, raw_state: Value, meta: &M) -> Result<Value, BoxError>;
}

/// A [`StateUpgrader`] applying to state written at `version`.
pub struct StateUpgrade<M: Sync> {
    /// Schema version the upgrader reads.
    pub version: u32,
    /// The upgrader.
    pub upgrader: Arc<dyn StateUpgrader<M>>,
}

impl<M: Sync> Clone for StateUpgrade<M> {
    fn clone(&self) -> Self {
        Self {
            version: self.version,
            upgrader: Arc::clone(&self.upgrader),
        }
    }
}

/// Region override support of a resource type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegionSpec {
    /// The resource carries a `region` attribute.
    pub override_enabled: bool,
    /// Reject regions outside the provider's partition at plan time.
    pub validate_override_in_partition: bool,
}

impl Default for RegionSpec {
    fn default() -> Self {
        Self {
            override_enabled: true,
            validate_override_in_partition: true,
        }
    }
}

impl RegionSpec {
    /// Region override without partition validation.
    pub fn without_validation() -> Self {
        Self {
            validate_override_in_partition: false,
            ..Self::default()
        }
    }
}

type Handler<S, M> = Arc<dyn DynCrudHandler<S, M>>;

/// The core handlers of one resource type.
pub struct Resource<S: ResourceState, M: ProviderMeta> {
    pub(crate) create: Option<Handler<S, M>>,
    pub(crate) read: Option<Handler<S, M>>,
    pub(crate) update: Option<Handler<S, M>>,
    pub(crate) delete: Option<Handler<S, M>>,
    pub(crate) customize_diff: Option<Handler<S, M>>,
    pub(crate) import: Option<Handler<S, M>>,
    pub(crate) state_upgraders: Vec<StateUpgrade<M>>,
}

impl<S: ResourceState, M: ProviderMeta> Default for Resource<S, M> {
    fn default() -> Self {
        Self {
            create: None,
            read: None,
            update: None,
            delete: None,
            customize_diff: None,
            import: None,
            state_upgraders: Vec::new(),
        }
    }
}

impl<S: ResourceState, M: ProviderMeta> Clone for Resource<S, M> {
    fn clone(&self) -> Self {
        Self {
            create: self.create.clone(),
            read: self.read.clone(),
            update: self.update.clone(),
            delete: self.delete.clone(),
            customize_diff: self.customize_diff.clone(),
            import: self.import.clone(),
            state_upgraders: self.state_upgraders.clone(),
        }
    }
}

impl<S: ResourceState, M: ProviderMeta> Resource<S, M> {
    /// A resource without handlers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the Create handler.
    pub fn create(mut self, handler: impl CrudHandler<S, M>) -> Self {
        self.create = Some(Arc::new(handler));
        self
    }

    /// Set the Read handler.
    pub fn read(mut self, handler: impl CrudHandler<S, M>) -> Self {
        self.read = Some(Arc::new(handler));
        self
    }

    /// Set the Update handler.
    pub fn update(mut self, handler: impl CrudHandler<S, M>) -> Self {
        self.update = Some(Arc::new(handler));
        self
    }

    /// Set the Delete handler.
    pub fn delete(mut self, handler: impl CrudHandler<S, M>) -> Self {
        self.delete = Some(Arc::new(handler));
        self
    }

    /// Set the CustomizeDiff handler.
    pub fn customize_diff(mut self, handler: impl CrudHandler<S, M>) -> Self {
        self.customize_diff = Some(Arc::new(handler));
        self
    }

    /// Set the Import handler.
    pub fn import(mut self, handler: impl CrudHandler<S, M>) -> Self {
        self.import = Some(Arc::new(handler));
        self
    }

    /// Add a state upgrader for state written at `version`.
    pub fn state_upgrader(
        mut self,
        version: u32,
        upgrader: impl StateUpgrader<M> + 'static,
    ) -> Self {
        self.state_upgraders.push(StateUpgrade {
            version,
            upgrader: Arc::new(upgrader),
        });
        self
    }

    /// Whether a Read handler is set.
    pub fn has_read(&self) -> bool {
        self.read.is_some()
    }
}

/// Declaration of a managed resource type.
pub struct ResourceSpec<S: ResourceState, M: ProviderMeta> {
    /// Type name, e.g. `aws_sqs_queue`.
    pub type_name: String,
    /// Human readable name, e.g. `Queue`.
    pub name: String,
    /// Tagging support.
    pub tags: Option<TagsSpec>,
    /// Region override support.
    pub region: Option<RegionSpec>,
    /// Core handlers.
    pub handlers: Resource<S, M>,
    /// Interceptors specific to this resource type.
    pub interceptors: Interceptors<S, M>,
}

impl<S: ResourceState, M: ProviderMeta> ResourceSpec<S, M> {
    /// Declare `type_name` with the given handlers.
    pub fn new(
        type_name: impl Into<String>,
        name: impl Into<String>,
        handlers: Resource<S, M>,
    ) -> Self {
        Self {
            type_name: type_name.into(),
            name: name.into(),
            tags: None,
            region: None,
            handlers,
            interceptors: Interceptors::new(),
        }
    }

    /// Enable transparent tagging.
    pub fn with_tags(mut self, tags: TagsSpec) -> Self {
        self.tags = Some(tags);
        self
    }

    /// Enable region override.
    pub fn with_region(mut self, region: RegionSpec) -> Self {
        self.region = Some(region);
        self
    }

    /// Register an interceptor for this resource type only.
    pub fn with_interceptor<I: Interceptor<S, M>>(
        mut self,
        when: When,
        why: Why,
        interceptor: I,
    ) -> Self {
        self.interceptors.append(when, why, interceptor);
        self
    }
}

/// Declaration of a data source type.
pub struct DataSourceSpec<S: ResourceState, M: ProviderMeta> {
    /// Type name, e.g. `aws_sqs_queue`.
    pub type_name: String,
    /// Human readable name.
    pub name: String,
    /// Tagging support.
    pub tags: Option<TagsSpec>,
    /// Region override support.
    pub region: Option<RegionSpec>,
    /// The Read handler.
    pub read: Arc<dyn DynCrudHandler<S, M>>,
    /// Interceptors specific to this data source type.
    pub interceptors: Interceptors<S, M>,
}

impl<S: ResourceState, M: ProviderMeta> DataSourceSpec<S, M> {
    /// Declare `type_name` read by `read`.
    pub fn new(
        type_name: impl Into<String>,
        name: impl Into<String>,
        read: impl CrudHandler<S, M>,
    ) -> Self {
        Self {
            type_name: type_name.into(),
            name: name.into(),
            tags: None,
            region: None,
            read: Arc::new(read),
            interceptors: Interceptors::new(),
        }
    }

    /// Enable tag listing.
    pub fn with_tags(mut self, tags: TagsSpec) -> Self {
        self.tags = Some(tags);
        self
    }

    /// Enable region override.
    pub fn with_region(mut self, region: RegionSpec) -> Self {
        self.region = Some(region);
        self
    }

    /// Register an interceptor for this data source type only.
    pub fn with_interceptor<I: Interceptor<S, M>>(
        mut self,
        when: When,
        why: Why,
        interceptor: I,
    ) -> Self {
        self.interceptors.append(when, why, interceptor);
        self
    }
}

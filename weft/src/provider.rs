//! Provider initialization.
//!
//! [`ProviderBuilder`] collects global interceptors and the resource and data
//! source declarations of every service package, then builds one immutable
//! [`Provider`]. Registries are assembled here once; invocations only read
//! them.

use crate::{
    bootstrap::StandardBootstrap,
    resource::{DataSourceSpec, ResourceSpec},
    wrap::{WrappedDataSource, WrappedResource},
};
use serde_json::Value;
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::debug;
use weft_core::{ConfigError, Interceptor, ProviderMeta, ResourceState, TagsConfig, When, Why};
use weft_std::{
    Interceptors,
    region::{DefaultRegion, ImportRegion, SetRegionInState, ValidateRegion},
    tags::{
        DataSourceTags, SetTagsAll, TagReader, TagWriter, TagsIn, TagsSpec, ValidateRequiredTags,
    },
};

/// A problem with one declaration, found while building the provider.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InitError {
    /// Two resources share a type name.
    #[error("duplicate resource: {0}")]
    DuplicateResource(String),

    /// Two data sources share a type name.
    #[error("duplicate data source: {0}")]
    DuplicateDataSource(String),

    /// A resource cannot be refreshed.
    #[error("resource {0} has no Read handler")]
    MissingRead(String),
}

/// Every problem found while building the provider.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("provider initialization failed: {}", join(.0))]
pub struct InitErrors(pub Vec<InitError>);

fn join(errors: &[InitError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Decode the provider's tag configuration block and overlay the process
/// environment.
pub fn configure_tags(block: Value) -> Result<TagsConfig, ConfigError> {
    TagsConfig::from_json(block)?.with_process_env()
}

/// Builds a [`Provider`].
///
/// # Example
///
/// ```rust,ignore
/// let provider = ProviderBuilder::new()
///     .interceptor(When::all(), Why::all(), LoggingInterceptor)
///     .resource("sqs", ResourceSpec::new("aws_sqs_queue", "Queue", queue_handlers())
///         .with_tags(TagsSpec::new())
///         .with_region(RegionSpec::default()))
///     .build()?;
/// ```
pub struct ProviderBuilder<S: ResourceState, M: ProviderMeta> {
    global: Interceptors<S, M>,
    resources: Vec<(String, ResourceSpec<S, M>)>,
    data_sources: Vec<(String, DataSourceSpec<S, M>)>,
}

impl<S: ResourceState, M: ProviderMeta> Default for ProviderBuilder<S, M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: ResourceState, M: ProviderMeta> ProviderBuilder<S, M> {
    /// Create an empty builder.
    pub fn new() -> Self {
        Self {
            global: Interceptors::new(),
            resources: Vec::new(),
            data_sources: Vec::new(),
        }
    }

    /// Register an interceptor for every resource and data source.
    ///
    /// Global interceptors come before any per-type interceptor, so they enter
    /// first and exit last.
    pub fn interceptor<I: Interceptor<S, M>>(
        mut self,
        when: When,
        why: Why,
        interceptor: I,
    ) -> Self {
        self.global.append(when, why, interceptor);
        self
    }

    /// Declare a resource owned by `service_package`.
    pub fn resource(
        mut self,
        service_package: impl Into<String>,
        spec: ResourceSpec<S, M>,
    ) -> Self {
        self.resources.push((service_package.into(), spec));
        self
    }

    /// Declare a data source owned by `service_package`.
    pub fn data_source(
        mut self,
        service_package: impl Into<String>,
        spec: DataSourceSpec<S, M>,
    ) -> Self {
        self.data_sources.push((service_package.into(), spec));
        self
    }

    /// Wrap every declaration.
    ///
    /// All problems are reported together rather than stopping at the first.
    pub fn build(self) -> Result<Provider<S, M>, InitErrors> {
        let mut errors = Vec::new();
        let mut resources = BTreeMap::new();
        let mut data_sources = BTreeMap::new();

        for (service_package, spec) in self.resources {
            if resources.contains_key(&spec.type_name) {
                errors.push(InitError::DuplicateResource(spec.type_name));
                continue;
            }
            if !spec.handlers.has_read() {
                errors.push(InitError::MissingRead(spec.type_name));
                continue;
            }
            let wrapped = wrap_resource(&self.global, service_package, spec);
            resources.insert(wrapped.type_name().to_owned(), wrapped);
        }

        for (service_package, spec) in self.data_sources {
            if data_sources.contains_key(&spec.type_name) {
                errors.push(InitError::DuplicateDataSource(spec.type_name));
                continue;
            }
            let wrapped = wrap_data_source(&self.global, service_package, spec);
            data_sources.insert(wrapped.type_name().to_owned(), wrapped);
        }

        if !errors.is_empty() {
            return Err(InitErrors(errors));
        }
        debug!(
            resources = resources.len(),
            data_sources = data_sources.len(),
            "provider initialized"
        );
        Ok(Provider {
            resources,
            data_sources,
        })
    }
}

fn wrap_resource<S, M>(
    global: &Interceptors<S, M>,
    service_package: String,
    spec: ResourceSpec<S, M>,
) -> WrappedResource<S, M>
where
    S: ResourceState,
    M: ProviderMeta,
{
    let mut registry = global.clone();
    let mut bootstrap = StandardBootstrap::new(service_package, &spec.name, &spec.type_name);

    if let Some(region) = spec.region.filter(|region| region.override_enabled) {
        bootstrap = bootstrap.with_region_override();
        if region.validate_override_in_partition {
            registry.append(When::BEFORE, Why::CUSTOMIZE_DIFF, ValidateRegion);
        }
        registry.append(When::BEFORE, Why::CUSTOMIZE_DIFF, DefaultRegion);
        registry.append(When::AFTER, Why::READ, SetRegionInState);
        registry.append(When::BEFORE, Why::IMPORT, ImportRegion);
    }

    if let Some(tags) = spec.tags {
        tag_interceptors(&mut registry, tags);
    }

    registry.extend(spec.interceptors.iter().cloned());
    WrappedResource::new(spec.type_name, bootstrap, spec.handlers, registry)
}

fn tag_interceptors<S, M>(registry: &mut Interceptors<S, M>, tags: TagsSpec)
where
    S: ResourceState,
    M: ProviderMeta,
{
    let writes = if tags.apply_on_create {
        Why::CREATE | Why::UPDATE
    } else {
        Why::UPDATE
    };
    registry.append(When::BEFORE, Why::CREATE | Why::UPDATE, TagsIn);
    registry.append(
        When::AFTER,
        Why::CREATE | Why::READ | Why::UPDATE,
        TagReader::new(tags.clone()),
    );
    registry.append(When::FINALLY, writes, TagWriter::new(tags));
    registry.append(When::BEFORE, Why::CUSTOMIZE_DIFF, SetTagsAll);
    registry.append(When::BEFORE, Why::CUSTOMIZE_DIFF, ValidateRequiredTags);
}

fn wrap_data_source<S, M>(
    global: &Interceptors<S, M>,
    service_package: String,
    spec: DataSourceSpec<S, M>,
) -> WrappedDataSource<S, M>
where
    S: ResourceState,
    M: ProviderMeta,
{
    let mut registry = global.clone();
    let mut bootstrap = StandardBootstrap::new(service_package, &spec.name, &spec.type_name);

    if let Some(region) = spec.region.filter(|region| region.override_enabled) {
        bootstrap = bootstrap.with_region_override();
        if region.validate_override_in_partition {
            registry.append(When::BEFORE, Why::READ, ValidateRegion);
        }
        registry.append(When::AFTER, Why::READ, SetRegionInState);
    }

    if let Some(tags) = spec.tags {
        registry.append(When::AFTER, Why::READ, DataSourceTags::new(tags));
    }

    registry.extend(spec.interceptors.iter().cloned());
    WrappedDataSource::new(spec.type_name, bootstrap, spec.read, registry)
}

/// The initialized provider: every wrapped resource and data source by type
/// name.
pub struct Provider<S: ResourceState, M: ProviderMeta> {
    resources: BTreeMap<String, WrappedResource<S, M>>,
    data_sources: BTreeMap<String, WrappedDataSource<S, M>>,
}

impl<S: ResourceState, M: ProviderMeta> Provider<S, M> {
    /// Start building a provider.
    pub fn builder() -> ProviderBuilder<S, M> {
        ProviderBuilder::new()
    }

    /// The resource named `type_name`.
    pub fn resource(&self, type_name: &str) -> Option<&WrappedResource<S, M>> {
        self.resources.get(type_name)
    }

    /// The data source named `type_name`.
    pub fn data_source(&self, type_name: &str) -> Option<&WrappedDataSource<S, M>> {
        self.data_sources.get(type_name)
    }

    /// All resource type names, sorted.
    pub fn resource_types(&self) -> impl Iterator<Item = &str> {
        self.resources.keys().map(String::as_str)
    }

    /// All data source type names, sorted.
    pub fn data_source_types(&self) -> impl Iterator<Item = &str> {
        self.data_sources.keys().map(String::as_str)
    }
}

//! Testing utilities for Weft.
//!
//! # Features
//!
//! - [`RecordingInterceptor`]: Records every phase it runs at
//! - [`FailingInterceptor`]: Appends a fixed error or warning
//! - [`CountingHandler`]: A core handler that counts invocations
//! - [`TestMeta`]: An in-memory [`ProviderMeta`]
//! - [`TestServicePackage`] / [`TestTagService`]: A service with in-memory tags

use async_trait::async_trait;
use std::{
    collections::BTreeMap,
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
};
use weft_core::{
    Context, CrudHandler, Diagnostic, Diagnostics, Interceptor, InterceptorParams, KeyValueTags,
    ListTags, Partition, ProviderMeta, ResourceState, ServicePackage, TagError,
    TagsConfig, UpdateTags,
};

/// Shared log written by [`RecordingInterceptor`].
pub type CallLog = Arc<Mutex<Vec<String>>>;

// ============================================================================
// Interceptors
// ============================================================================

/// An interceptor that appends `"{id}:{when}"` to a shared log.
///
/// # Example
///
/// ```rust,ignore
/// let log = CallLog::default();
/// let registry = Interceptors::new()
///     .with(When::BEFORE | When::AFTER, Why::CREATE, RecordingInterceptor::new("a", &log));
///
/// // dispatch...
/// assert_eq!(*log.lock().unwrap(), ["a:BEFORE", "a:AFTER"]);
/// ```
pub struct RecordingInterceptor {
    id: String,
    log: CallLog,
}

impl RecordingInterceptor {
    /// Create a recording interceptor writing to `log`.
    pub fn new(id: impl Into<String>, log: &CallLog) -> Self {
        Self {
            id: id.into(),
            log: Arc::clone(log),
        }
    }
}

impl<S: ResourceState, M: ProviderMeta> Interceptor<S, M> for RecordingInterceptor {
    async fn run(
        &self,
        ctx: Context,
        params: InterceptorParams<'_, S, M>,
        diags: Diagnostics,
    ) -> (Context, Diagnostics) {
        self.log
            .lock()
            .unwrap()
            .push(format!("{}:{}", self.id, params.when));
        (ctx, diags)
    }
}

/// An interceptor that appends one fixed diagnostic every time it runs.
pub struct FailingInterceptor {
    diagnostic: Diagnostic,
}

impl FailingInterceptor {
    /// Append an error with `summary`.
    pub fn new(summary: impl Into<String>) -> Self {
        Self {
            diagnostic: Diagnostic::error(summary, ""),
        }
    }

    /// Append a warning with `summary`.
    pub fn warning(summary: impl Into<String>) -> Self {
        Self {
            diagnostic: Diagnostic::warning(summary, ""),
        }
    }
}

impl<S: ResourceState, M: ProviderMeta> Interceptor<S, M> for FailingInterceptor {
    async fn run(
        &self,
        ctx: Context,
        _params: InterceptorParams<'_, S, M>,
        mut diags: Diagnostics,
    ) -> (Context, Diagnostics) {
        diags.push(self.diagnostic.clone());
        (ctx, diags)
    }
}

// ============================================================================
// Counting Handler
// ============================================================================

/// A core handler that counts invocations.
///
/// Clones share the counter, so keep one clone for assertions.
#[derive(Clone, Default)]
pub struct CountingHandler {
    count: Arc<AtomicUsize>,
    failure: Option<String>,
    assign_id: Option<String>,
    tags_in: Arc<Mutex<Option<KeyValueTags>>>,
}

impl CountingHandler {
    /// A handler that always succeeds.
    pub fn new() -> Self {
        Self::default()
    }

    /// A handler that always reports an error with `summary`.
    pub fn failing(summary: impl Into<String>) -> Self {
        Self {
            failure: Some(summary.into()),
            ..Self::default()
        }
    }

    /// Assign `id` to the resource, as a Create handler would.
    pub fn assigning_id(mut self, id: impl Into<String>) -> Self {
        self.assign_id = Some(id.into());
        self
    }

    /// Number of calls so far.
    pub fn count(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }

    /// The merged tags the last call received through the context.
    pub fn last_tags_in(&self) -> Option<KeyValueTags> {
        self.tags_in.lock().unwrap().clone()
    }
}

impl<S: ResourceState, M: ProviderMeta> CrudHandler<S, M> for CountingHandler {
    async fn call(&self, ctx: &Context, state: &mut S, _meta: &M) -> Diagnostics {
        self.count.fetch_add(1, Ordering::SeqCst);
        *self.tags_in.lock().unwrap() = ctx.tags_in().cloned();

        let mut diags = Diagnostics::new();
        if let Some(summary) = &self.failure {
            diags.add_error(summary.clone(), "");
            return diags;
        }
        if let Some(id) = &self.assign_id {
            state.set_id(id);
        }
        diags
    }
}

// ============================================================================
// Tagging service
// ============================================================================

/// A recorded call against [`TestTagService`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TagCall {
    /// `list_tags(identifier)`.
    List(String),
    /// `update_tags(identifier, to_remove, to_add)`.
    Update {
        /// Identifier.
        identifier: String,
        /// Removed tags.
        to_remove: KeyValueTags,
        /// Added tags.
        to_add: KeyValueTags,
    },
}

/// A failure [`TestTagService`] can be told to return.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagFailure {
    /// `TagError::UnsupportedInPartition`.
    Unsupported,
    /// `TagError::Api`.
    Api,
}

/// In-memory tags keyed by identifier.
#[derive(Debug, Default)]
pub struct TestTagService {
    tags: Mutex<BTreeMap<String, KeyValueTags>>,
    calls: Mutex<Vec<TagCall>>,
    list_failure: Mutex<Option<TagFailure>>,
    update_failure: Mutex<Option<TagFailure>>,
}

impl TestTagService {
    /// Create an empty service.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the remote tags of `identifier`.
    pub fn with_tags(self, identifier: impl Into<String>, tags: KeyValueTags) -> Self {
        self.tags.lock().unwrap().insert(identifier.into(), tags);
        self
    }

    /// Make every following call fail.
    pub fn fail_with(&self, failure: TagFailure) {
        self.fail_listing_with(failure);
        *self.update_failure.lock().unwrap() = Some(failure);
    }

    /// Make every following `list_tags` call fail; updates still succeed.
    pub fn fail_listing_with(&self, failure: TagFailure) {
        *self.list_failure.lock().unwrap() = Some(failure);
    }

    /// Current remote tags of `identifier`.
    pub fn tags_of(&self, identifier: &str) -> KeyValueTags {
        self.tags
            .lock()
            .unwrap()
            .get(identifier)
            .cloned()
            .unwrap_or_default()
    }

    /// All calls so far.
    pub fn calls(&self) -> Vec<TagCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Number of `update_tags` calls so far.
    pub fn update_count(&self) -> usize {
        self.calls()
            .iter()
            .filter(|call| matches!(call, TagCall::Update { .. }))
            .count()
    }

    fn check_failure(failure: &Mutex<Option<TagFailure>>) -> Result<(), TagError> {
        match *failure.lock().unwrap() {
            None => Ok(()),
            Some(TagFailure::Unsupported) => Err(TagError::UnsupportedInPartition {
                partition: "aws-iso".to_owned(),
            }),
            Some(TagFailure::Api) => Err(TagError::Api("throttled".into())),
        }
    }
}

#[async_trait]
impl<M: Sync> ListTags<M> for TestTagService {
    async fn list_tags(
        &self,
        _ctx: &Context,
        _meta: &M,
        identifier: &str,
        _resource_type: Option<&str>,
    ) -> Result<KeyValueTags, TagError> {
        self.calls
            .lock()
            .unwrap()
            .push(TagCall::List(identifier.to_owned()));
        Self::check_failure(&self.list_failure)?;
        Ok(self.tags_of(identifier))
    }
}

#[async_trait]
impl<M: Sync> UpdateTags<M> for TestTagService {
    async fn update_tags(
        &self,
        _ctx: &Context,
        _meta: &M,
        identifier: &str,
        _resource_type: Option<&str>,
        to_remove: &KeyValueTags,
        to_add: &KeyValueTags,
    ) -> Result<(), TagError> {
        self.calls.lock().unwrap().push(TagCall::Update {
            identifier: identifier.to_owned(),
            to_remove: to_remove.clone(),
            to_add: to_add.clone(),
        });
        Self::check_failure(&self.update_failure)?;

        let mut tags = self.tags.lock().unwrap();
        let current = tags.entry(identifier.to_owned()).or_default();
        let mut updated: KeyValueTags = current
            .iter()
            .filter(|(k, _)| !to_remove.contains_key(k))
            .collect();
        for (k, v) in to_add.iter() {
            updated.insert(k, v);
        }
        *current = updated;
        Ok(())
    }
}

/// A service package, optionally backed by a [`TestTagService`].
pub struct TestServicePackage {
    name: String,
    tags: Option<Arc<TestTagService>>,
}

impl TestServicePackage {
    /// A service that does not support tagging.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tags: None,
        }
    }

    /// A service whose tagging goes to `service`.
    pub fn tagged(name: impl Into<String>, service: &Arc<TestTagService>) -> Self {
        Self {
            name: name.into(),
            tags: Some(Arc::clone(service)),
        }
    }
}

impl<M: Sync> ServicePackage<M> for TestServicePackage {
    fn name(&self) -> &str {
        &self.name
    }

    fn list_tags(&self) -> Option<&dyn ListTags<M>> {
        self.tags.as_deref().map(|service| service as &dyn ListTags<M>)
    }

    fn update_tags(&self) -> Option<&dyn UpdateTags<M>> {
        self.tags.as_deref().map(|service| service as &dyn UpdateTags<M>)
    }
}

// ============================================================================
// Provider meta
// ============================================================================

/// An in-memory provider meta.
///
/// Region `us-west-2` in partition `aws` (`us-east-1`, `us-west-2`,
/// `eu-west-1`), no default or ignored tags.
pub struct TestMeta {
    region: String,
    partition: Partition,
    tags_config: Arc<TagsConfig>,
    packages: BTreeMap<String, Arc<dyn ServicePackage<TestMeta>>>,
}

impl Default for TestMeta {
    fn default() -> Self {
        Self::new()
    }
}

impl TestMeta {
    /// Create the default test meta.
    pub fn new() -> Self {
        Self {
            region: "us-west-2".to_owned(),
            partition: Partition::new("aws", ["us-east-1", "us-west-2", "eu-west-1"]),
            tags_config: Arc::new(TagsConfig::default()),
            packages: BTreeMap::new(),
        }
    }

    /// Replace the tag configuration.
    pub fn with_tags_config(mut self, config: TagsConfig) -> Self {
        self.tags_config = Arc::new(config);
        self
    }

    /// Register a service package.
    pub fn with_service_package(mut self, package: TestServicePackage) -> Self {
        let name = package.name.clone();
        self.packages.insert(name, Arc::new(package));
        self
    }
}

impl ProviderMeta for TestMeta {
    fn region(&self) -> &str {
        &self.region
    }

    fn partition(&self) -> &Partition {
        &self.partition
    }

    fn tags_config(&self) -> Arc<TagsConfig> {
        Arc::clone(&self.tags_config)
    }

    fn service_package(&self, name: &str) -> Option<Arc<dyn ServicePackage<Self>>> {
        self.packages.get(name).cloned()
    }
}


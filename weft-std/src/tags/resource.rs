//! Resource tag interceptors.

use super::{
    TagDiff, TagViews, TagsSpec, configured_tags, merged_configured, resolve_duplicates,
    resolve_views, service_package, set_views, system_prefixes, tags_config, type_name,
};
use crate::names::ATTR_TAGS_ALL;
use tracing::{debug, warn};
use weft_core::{
    Context, Diagnostics, Interceptor, InterceptorParams, KeyValueTags, ProviderMeta,
    ResourceState, TagError,
};

/// Thread the merged configured tags to the core handler.
///
/// Runs at `BEFORE` for `CREATE | UPDATE`. The core handler reads the result
/// from [`Context::tags_in`] to tag on create.
#[derive(Debug, Clone, Default)]
pub struct TagsIn;

impl<S: ResourceState, M: ProviderMeta> Interceptor<S, M> for TagsIn {
    async fn run(
        &self,
        ctx: Context,
        params: InterceptorParams<'_, S, M>,
        diags: Diagnostics,
    ) -> (Context, Diagnostics) {
        let package = service_package(&ctx, params.meta);
        let config = tags_config(&ctx, params.meta);
        let merged = merged_configured(
            &configured_tags(&*params.state),
            &config,
            system_prefixes(package.as_deref()),
        );
        (ctx.with_tags_in(merged), diags)
    }
}

/// Refresh `tags` and `tags_all` from the remote tag list.
///
/// Runs at `AFTER` for `CREATE | READ | UPDATE`.
#[derive(Debug, Clone, Default)]
pub struct TagReader {
    spec: TagsSpec,
}

impl TagReader {
    /// Create a reader for resources tagged as described by `spec`.
    pub fn new(spec: TagsSpec) -> Self {
        Self { spec }
    }
}

impl<S: ResourceState, M: ProviderMeta> Interceptor<S, M> for TagReader {
    async fn run(
        &self,
        ctx: Context,
        params: InterceptorParams<'_, S, M>,
        mut diags: Diagnostics,
    ) -> (Context, Diagnostics) {
        let Some(identifier) = self.spec.identifier(&*params.state) else {
            return (ctx, diags);
        };
        let Some(package) = service_package(&ctx, params.meta) else {
            return (ctx, diags);
        };
        let Some(lister) = package.list_tags() else {
            return (ctx, diags);
        };
        if ctx.is_cancelled() {
            diags.add_warning(
                format!("skipped listing tags for {} ({identifier})", type_name(&ctx)),
                "operation cancelled",
            );
            return (ctx, diags);
        }

        let remote = match lister
            .list_tags(
                &ctx,
                params.meta,
                &identifier,
                self.spec.resource_type.as_deref(),
            )
            .await
        {
            Ok(remote) => remote,
            Err(err) if err.is_unsupported() => {
                warn!(resource = type_name(&ctx), %identifier, error = %err, "tag listing unsupported");
                diags.add_warning(
                    format!("listing tags for {} ({identifier})", type_name(&ctx)),
                    err.to_string(),
                );
                KeyValueTags::new()
            }
            Err(err) => {
                diags.add_error(
                    format!("listing tags for {} ({identifier})", type_name(&ctx)),
                    err.to_string(),
                );
                return (ctx, diags);
            }
        };

        let config = tags_config(&ctx, params.meta);
        let views = resolve_views(
            &remote,
            &configured_tags(&*params.state),
            &config,
            package.system_tag_prefixes(),
        );
        debug!(resource = type_name(&ctx), %identifier, tags = views.tags_all.len(), "read tags");
        set_views(params.state, &views, &mut diags);
        (ctx, diags)
    }
}

/// Apply the difference between stored and configured tags.
///
/// Runs at `FINALLY` for `UPDATE` (and `CREATE` when
/// [`TagsSpec::apply_on_create`] is set). Skipped when the core handler
/// failed; errors from other interceptors, such as a failed tag listing, do
/// not stop the update.
#[derive(Debug, Clone, Default)]
pub struct TagWriter {
    spec: TagsSpec,
}

impl TagWriter {
    /// Create a writer for resources tagged as described by `spec`.
    pub fn new(spec: TagsSpec) -> Self {
        Self { spec }
    }
}

impl<S: ResourceState, M: ProviderMeta> Interceptor<S, M> for TagWriter {
    async fn run(
        &self,
        ctx: Context,
        params: InterceptorParams<'_, S, M>,
        mut diags: Diagnostics,
    ) -> (Context, Diagnostics) {
        if params.handler_failed {
            return (ctx, diags);
        }
        let Some(identifier) = self.spec.identifier(&*params.state) else {
            return (ctx, diags);
        };
        let Some(package) = service_package(&ctx, params.meta) else {
            return (ctx, diags);
        };
        let Some(updater) = package.update_tags() else {
            return (ctx, diags);
        };

        let config = tags_config(&ctx, params.meta);
        let prefixes = package.system_tag_prefixes();
        let configured = configured_tags(&*params.state);
        let stored = KeyValueTags::from_value(params.state.raw_state().get(ATTR_TAGS_ALL))
            .ignore_system(prefixes)
            .ignore_config(&config.ignore_tags);
        let desired = merged_configured(&configured, &config, prefixes);

        let diff = TagDiff::between(&stored, &desired);
        if diff.is_empty() {
            debug!(resource = type_name(&ctx), %identifier, "tags unchanged");
            return (ctx, diags);
        }
        if ctx.is_cancelled() {
            diags.add_warning(
                format!("skipped updating tags for {} ({identifier})", type_name(&ctx)),
                "operation cancelled",
            );
            return (ctx, diags);
        }

        let result = updater
            .update_tags(
                &ctx,
                params.meta,
                &identifier,
                self.spec.resource_type.as_deref(),
                &diff.to_remove,
                &diff.to_add,
            )
            .await;
        match result {
            Ok(()) => {
                debug!(
                    resource = type_name(&ctx),
                    %identifier,
                    added = diff.to_add.len(),
                    removed = diff.to_remove.len(),
                    "updated tags"
                );
                let views = TagViews {
                    tags: resolve_duplicates(&desired, &config.default_tags, &configured),
                    tags_all: desired,
                };
                set_views(params.state, &views, &mut diags);
            }
            Err(err) => report_update_failure(&ctx, &identifier, err, &mut diags),
        }
        (ctx, diags)
    }
}

fn report_update_failure(ctx: &Context, identifier: &str, err: TagError, diags: &mut Diagnostics) {
    let summary = format!("updating tags for {} ({identifier})", type_name(ctx));
    if err.is_unsupported() {
        warn!(resource = type_name(ctx), %identifier, error = %err, "tag update unsupported");
        diags.add_warning(summary, err.to_string());
    } else {
        diags.add_error(summary, err.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        state::ResourceData,
        testing::{TagCall, TagFailure, TestMeta, TestServicePackage, TestTagService},
    };
    use serde_json::json;
    use std::sync::Arc;
    use weft_core::{ResourceContext, TagsConfig, When, Why};

    fn tags(pairs: &[(&str, &str)]) -> KeyValueTags {
        pairs.iter().copied().collect()
    }

    fn meta_with(service: &Arc<TestTagService>, config: TagsConfig) -> TestMeta {
        TestMeta::new()
            .with_tags_config(config)
            .with_service_package(TestServicePackage::tagged("sqs", service))
    }

    fn queue_context() -> Context {
        Context::new().with_resource(ResourceContext {
            service_package: "sqs".to_owned(),
            resource_name: "Queue".to_owned(),
            type_name: "aws_sqs_queue".to_owned(),
            override_region: None,
        })
    }

    fn defaults(pairs: &[(&str, &str)]) -> TagsConfig {
        let mut config = TagsConfig::default();
        config.default_tags.tags = tags(pairs);
        config
    }

    async fn run<I: Interceptor<ResourceData, TestMeta>>(
        interceptor: &I,
        ctx: Context,
        state: &mut ResourceData,
        meta: &TestMeta,
        when: When,
        why: Why,
        diags: Diagnostics,
    ) -> (Context, Diagnostics) {
        let params = InterceptorParams::new(state, meta, when, why);
        interceptor.run(ctx, params, diags).await
    }

    #[tokio::test]
    async fn test_tags_in_merges_defaults() {
        let service = Arc::new(TestTagService::new());
        let meta = meta_with(&service, defaults(&[("Team", "infra")]));
        let mut state =
            ResourceData::new("").with_config(json!({"tags": {"Name": "q", "aws:owner": "x"}}));

        let (ctx, diags) = run(
            &TagsIn,
            queue_context(),
            &mut state,
            &meta,
            When::BEFORE,
            Why::CREATE,
            Diagnostics::new(),
        )
        .await;

        assert!(diags.is_empty());
        assert_eq!(
            ctx.tags_in(),
            Some(&tags(&[("Name", "q"), ("Team", "infra")]))
        );
    }

    #[tokio::test]
    async fn test_reader_hides_default_tags() {
        let service = Arc::new(
            TestTagService::new()
                .with_tags("q-1", tags(&[("Team", "infra"), ("Name", "q"), ("aws:cf", "s")])),
        );
        let meta = meta_with(&service, defaults(&[("Team", "infra")]));
        let mut state = ResourceData::new("q-1").with_config(json!({"tags": {"Name": "q"}}));

        let (_, diags) = run(
            &TagReader::default(),
            queue_context(),
            &mut state,
            &meta,
            When::AFTER,
            Why::READ,
            Diagnostics::new(),
        )
        .await;

        assert!(diags.is_empty());
        assert_eq!(state.get("tags"), Some(&json!({"Name": "q"})));
        assert_eq!(
            state.get("tags_all"),
            Some(&json!({"Name": "q", "Team": "infra"}))
        );
    }

    #[tokio::test]
    async fn test_reader_unsupported_is_warning() {
        let service = Arc::new(TestTagService::new().with_tags("q-1", tags(&[("A", "1")])));
        service.fail_with(TagFailure::Unsupported);
        let meta = meta_with(&service, TagsConfig::default());
        let mut state = ResourceData::new("q-1");

        let (_, diags) = run(
            &TagReader::default(),
            queue_context(),
            &mut state,
            &meta,
            When::AFTER,
            Why::READ,
            Diagnostics::new(),
        )
        .await;

        assert!(!diags.has_error());
        assert_eq!(diags.warnings().count(), 1);
        assert_eq!(state.get("tags_all"), Some(&json!({})));
    }

    #[tokio::test]
    async fn test_reader_api_failure_is_error() {
        let service = Arc::new(TestTagService::new());
        service.fail_with(TagFailure::Api);
        let meta = meta_with(&service, TagsConfig::default());
        let mut state = ResourceData::new("q-1");

        let (_, diags) = run(
            &TagReader::default(),
            queue_context(),
            &mut state,
            &meta,
            When::AFTER,
            Why::READ,
            Diagnostics::new(),
        )
        .await;

        assert!(diags.has_error());
        assert_eq!(
            diags.errors().next().map(|d| d.summary.as_str()),
            Some("listing tags for aws_sqs_queue (q-1)")
        );
        assert_eq!(state.get("tags"), None);
    }

    #[tokio::test]
    async fn test_reader_without_service_is_noop() {
        let meta = TestMeta::new().with_service_package(TestServicePackage::new("sqs"));
        let mut state = ResourceData::new("q-1");

        let (_, diags) = run(
            &TagReader::default(),
            queue_context(),
            &mut state,
            &meta,
            When::AFTER,
            Why::READ,
            Diagnostics::new(),
        )
        .await;

        assert!(diags.is_empty());
        assert_eq!(state.get("tags"), None);
    }

    #[tokio::test]
    async fn test_writer_applies_diff() {
        let service = Arc::new(
            TestTagService::new().with_tags("q-1", tags(&[("A", "1"), ("B", "2")])),
        );
        let meta = meta_with(&service, TagsConfig::default());
        let mut state = ResourceData::new("q-1")
            .with_prior_state(json!({"tags_all": {"A": "1", "B": "2"}}))
            .with_config(json!({"tags": {"B": "2", "C": "3"}}));

        let (_, diags) = run(
            &TagWriter::default(),
            queue_context(),
            &mut state,
            &meta,
            When::FINALLY,
            Why::UPDATE,
            Diagnostics::new(),
        )
        .await;

        assert!(diags.is_empty());
        assert_eq!(
            service.calls(),
            [TagCall::Update {
                identifier: "q-1".to_owned(),
                to_remove: tags(&[("A", "1")]),
                to_add: tags(&[("C", "3")]),
            }]
        );
        assert_eq!(service.tags_of("q-1"), tags(&[("B", "2"), ("C", "3")]));
        assert_eq!(state.get("tags_all"), Some(&json!({"B": "2", "C": "3"})));
    }

    #[tokio::test]
    async fn test_writer_skips_when_unchanged() {
        let service = Arc::new(TestTagService::new());
        let meta = meta_with(&service, TagsConfig::default());
        let mut state = ResourceData::new("q-1")
            .with_prior_state(json!({"tags_all": {"A": "1"}}))
            .with_config(json!({"tags": {"A": "1"}}));

        let (_, diags) = run(
            &TagWriter::default(),
            queue_context(),
            &mut state,
            &meta,
            When::FINALLY,
            Why::UPDATE,
            Diagnostics::new(),
        )
        .await;

        assert!(diags.is_empty());
        assert_eq!(service.update_count(), 0);
    }

    #[tokio::test]
    async fn test_writer_skips_after_core_failure() {
        let service = Arc::new(TestTagService::new());
        let meta = meta_with(&service, TagsConfig::default());
        let mut state = ResourceData::new("q-1").with_config(json!({"tags": {"A": "1"}}));
        let mut failed = Diagnostics::new();
        failed.add_error("updating queue", "boom");

        let params = InterceptorParams::new(&mut state, &meta, When::FINALLY, Why::UPDATE)
            .with_handler_failed(true);
        let (_, diags) = TagWriter::default().run(queue_context(), params, failed).await;

        assert_eq!(diags.len(), 1);
        assert_eq!(service.update_count(), 0);
    }

    #[tokio::test]
    async fn test_writer_runs_despite_interceptor_errors() {
        let service = Arc::new(TestTagService::new());
        let meta = meta_with(&service, TagsConfig::default());
        let mut state = ResourceData::new("q-1")
            .with_prior_state(json!({"tags_all": {"Env": "dev"}}))
            .with_config(json!({"tags": {"Env": "prod"}}));
        let mut earlier = Diagnostics::new();
        earlier.add_error("listing tags for aws_sqs_queue (q-1)", "throttled");

        let (_, diags) = run(
            &TagWriter::default(),
            queue_context(),
            &mut state,
            &meta,
            When::FINALLY,
            Why::UPDATE,
            earlier,
        )
        .await;

        assert_eq!(diags.errors().count(), 1);
        assert_eq!(service.update_count(), 1);
        assert_eq!(service.tags_of("q-1"), tags(&[("Env", "prod")]));
        assert_eq!(state.get("tags_all"), Some(&json!({"Env": "prod"})));
    }

    #[tokio::test]
    async fn test_writer_observes_cancellation() {
        let service = Arc::new(TestTagService::new());
        let meta = meta_with(&service, TagsConfig::default());
        let mut state = ResourceData::new("q-1").with_config(json!({"tags": {"A": "1"}}));
        let ctx = queue_context();
        ctx.cancellation().cancel();

        let (_, diags) = run(
            &TagWriter::default(),
            ctx,
            &mut state,
            &meta,
            When::FINALLY,
            Why::UPDATE,
            Diagnostics::new(),
        )
        .await;

        assert!(!diags.has_error());
        assert_eq!(diags.warnings().count(), 1);
        assert_eq!(service.update_count(), 0);
    }

    #[tokio::test]
    async fn test_writer_unsupported_is_warning() {
        let service = Arc::new(TestTagService::new());
        service.fail_with(TagFailure::Unsupported);
        let meta = meta_with(&service, TagsConfig::default());
        let mut state = ResourceData::new("q-1").with_config(json!({"tags": {"A": "1"}}));

        let (_, diags) = run(
            &TagWriter::default(),
            queue_context(),
            &mut state,
            &meta,
            When::FINALLY,
            Why::UPDATE,
            Diagnostics::new(),
        )
        .await;

        assert!(!diags.has_error());
        assert_eq!(diags.warnings().count(), 1);
    }

    #[tokio::test]
    async fn test_writer_uses_identifier_attribute() {
        let service = Arc::new(TestTagService::new());
        let meta = meta_with(&service, TagsConfig::default());
        let mut state = ResourceData::new("q-1")
            .with_plan(json!({"arn": "arn:aws:sqs:us-west-2:1:q"}))
            .with_config(json!({"tags": {"A": "1"}}));
        let writer = TagWriter::new(TagsSpec::new().identifier_attribute("arn"));

        let (_, diags) = run(
            &writer,
            queue_context(),
            &mut state,
            &meta,
            When::FINALLY,
            Why::UPDATE,
            Diagnostics::new(),
        )
        .await;

        assert!(diags.is_empty());
        assert_eq!(service.tags_of("arn:aws:sqs:us-west-2:1:q"), tags(&[("A", "1")]));
    }
}

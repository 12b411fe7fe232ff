//! Data source tag interceptor.

use super::{TagsSpec, service_package, tags_config, type_name};
use crate::names::ATTR_TAGS;
use weft_core::{
    Context, Diagnostics, Interceptor, InterceptorParams, ProviderMeta, ResourceState,
};

/// Set `tags` of a data source from the remote tag list.
///
/// Runs at `AFTER` for `READ`. Data sources have no configured or default
/// tags to reconcile against; only system and ignored keys are removed.
#[derive(Debug, Clone, Default)]
pub struct DataSourceTags {
    spec: TagsSpec,
}

impl DataSourceTags {
    /// Create an interceptor for data sources tagged as described by `spec`.
    pub fn new(spec: TagsSpec) -> Self {
        Self { spec }
    }
}

impl<S: ResourceState, M: ProviderMeta> Interceptor<S, M> for DataSourceTags {
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
        let Some(lister) = package.list_tags() else {
            return (ctx, diags);
        };

        let remote = lister
            .list_tags(
                &ctx,
                params.meta,
                &identifier,
                self.spec.resource_type.as_deref(),
            )
            .await;
        let summary = format!("listing tags for {} ({identifier})", type_name(&ctx));
        let tags = match remote {
            Ok(tags) => tags,
            Err(err) if err.is_unsupported() => {
                diags.add_warning(summary, err.to_string());
                return (ctx, diags);
            }
            Err(err) => {
                diags.add_error(summary, err.to_string());
                return (ctx, diags);
            }
        };

        let config = tags_config(&ctx, params.meta);
        let tags = tags
            .ignore_system(package.system_tag_prefixes())
            .ignore_config(&config.ignore_tags);
        if let Err(err) = params.state.set(ATTR_TAGS, tags.to_value()) {
            diags.add_error("setting tags", err.to_string());
        }
        (ctx, diags)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        state::ResourceData,
        testing::{TestMeta, TestServicePackage, TestTagService},
    };
    use serde_json::json;
    use std::sync::Arc;
    use weft_core::{KeyValueTags, ResourceContext, TagsConfig, When, Why};

    #[tokio::test]
    async fn test_sets_filtered_tags() {
        let remote: KeyValueTags = [("Name", "q"), ("aws:cf", "s"), ("internal", "1")]
            .into_iter()
            .collect();
        let service = Arc::new(TestTagService::new().with_tags("q-1", remote));
        let mut config = TagsConfig::default();
        config.ignore_tags.keys.insert("internal".to_owned());
        let meta = TestMeta::new()
            .with_tags_config(config)
            .with_service_package(TestServicePackage::tagged("sqs", &service));
        let ctx = Context::new().with_resource(ResourceContext {
            service_package: "sqs".to_owned(),
            resource_name: "Queue".to_owned(),
            type_name: "aws_sqs_queue".to_owned(),
            override_region: None,
        });
        let mut state = ResourceData::new("q-1");

        let params = InterceptorParams::new(&mut state, &meta, When::AFTER, Why::READ);
        let (_, diags) = DataSourceTags::default()
            .run(ctx, params, Diagnostics::new())
            .await;

        assert!(diags.is_empty());
        assert_eq!(state.get("tags"), Some(&json!({"Name": "q"})));
        assert_eq!(state.get("tags_all"), None);
    }
}

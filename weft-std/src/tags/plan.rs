//! Plan-time tag interceptors.

use super::{
    configured_tags, merged_configured, service_package, system_prefixes, tags_config, type_name,
};
use crate::names::ATTR_TAGS_ALL;
use weft_core::{
    Context, Diagnostics, Interceptor, InterceptorParams, PolicySeverity, ProviderMeta,
    ResourceState,
};

/// Plan `tags_all` as the default tags merged with the configured tags.
///
/// Runs at `BEFORE` for `CUSTOMIZE_DIFF`.
#[derive(Debug, Clone, Default)]
pub struct SetTagsAll;

impl<S: ResourceState, M: ProviderMeta> Interceptor<S, M> for SetTagsAll {
    async fn run(
        &self,
        ctx: Context,
        params: InterceptorParams<'_, S, M>,
        mut diags: Diagnostics,
    ) -> (Context, Diagnostics) {
        let package = service_package(&ctx, params.meta);
        let config = tags_config(&ctx, params.meta);
        let planned = merged_configured(
            &configured_tags(&*params.state),
            &config,
            system_prefixes(package.as_deref()),
        );
        if let Err(err) = params.state.set(ATTR_TAGS_ALL, planned.to_value()) {
            diags.add_error("setting tags_all", err.to_string());
        }
        (ctx, diags)
    }
}

/// Enforce the required keys of the provider tag policy.
///
/// Runs at `BEFORE` for `CUSTOMIZE_DIFF`. Default tags count towards the
/// required keys.
#[derive(Debug, Clone, Default)]
pub struct ValidateRequiredTags;

impl<S: ResourceState, M: ProviderMeta> Interceptor<S, M> for ValidateRequiredTags {
    async fn run(
        &self,
        ctx: Context,
        params: InterceptorParams<'_, S, M>,
        mut diags: Diagnostics,
    ) -> (Context, Diagnostics) {
        let config = tags_config(&ctx, params.meta);
        let Some(policy) = &config.tag_policy else {
            return (ctx, diags);
        };
        let severity = policy.effective_severity();
        if severity == PolicySeverity::Disabled || policy.required_keys.is_empty() {
            return (ctx, diags);
        }

        let tags = config
            .default_tags
            .merge_tags(&configured_tags(&*params.state));
        let missing: Vec<&str> = policy
            .required_keys
            .iter()
            .map(String::as_str)
            .filter(|key| !tags.contains_key(key))
            .collect();
        if missing.is_empty() {
            return (ctx, diags);
        }

        let summary = "Missing Required Tags";
        let detail = format!(
            "An organizational tag policy requires the following tags for {}: {}",
            type_name(&ctx),
            missing.join(", ")
        );
        match severity {
            PolicySeverity::Error => diags.add_error(summary, detail),
            _ => diags.add_warning(summary, detail),
        }
        (ctx, diags)
    }
}

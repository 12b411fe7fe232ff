//! Per-resource region override interceptors.
//!
//! Resources that can live in a region other than the provider's carry a
//! `region` attribute. These interceptors default it, validate it against
//! the provider's partition, keep it in state and accept it during import.

use crate::names::ATTR_REGION;
use serde_json::Value;
use weft_core::{
    Context, Diagnostics, Interceptor, InterceptorParams, ProviderMeta, ResourceContext,
    ResourceState,
};

fn requested_region<'a, S: ResourceState>(ctx: &'a Context, state: &'a S) -> Option<&'a str> {
    state.get_str(ATTR_REGION).or_else(|| {
        ctx.resource()
            .and_then(|resource| resource.override_region.as_deref())
    })
}

/// Reject a `region` outside the provider's partition.
///
/// Runs at `BEFORE`, for `CUSTOMIZE_DIFF` on resources and `READ` on data
/// sources.
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidateRegion;

impl<S: ResourceState, M: ProviderMeta> Interceptor<S, M> for ValidateRegion {
    async fn run(
        &self,
        ctx: Context,
        params: InterceptorParams<'_, S, M>,
        mut diags: Diagnostics,
    ) -> (Context, Diagnostics) {
        if let Some(region) = requested_region(&ctx, &*params.state) {
            let partition = params.meta.partition();
            if !partition.contains_region(region) {
                diags.add_error(
                    "invalid Region value",
                    format!(
                        "region {region:?} is not in partition {:?}",
                        partition.id()
                    ),
                );
            }
        }
        (ctx, diags)
    }
}

/// Default an unset `region` to the provider's region.
///
/// Runs at `BEFORE` for `CUSTOMIZE_DIFF`.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultRegion;

impl<S: ResourceState, M: ProviderMeta> Interceptor<S, M> for DefaultRegion {
    async fn run(
        &self,
        ctx: Context,
        params: InterceptorParams<'_, S, M>,
        mut diags: Diagnostics,
    ) -> (Context, Diagnostics) {
        if params.state.get_str(ATTR_REGION).is_none() {
            let region = Value::String(params.meta.region().to_owned());
            if let Err(err) = params.state.set(ATTR_REGION, region) {
                diags.add_error("setting region", err.to_string());
            }
        }
        (ctx, diags)
    }
}

/// Store the effective region after a read.
///
/// Runs at `AFTER` for `READ`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SetRegionInState;

impl<S: ResourceState, M: ProviderMeta> Interceptor<S, M> for SetRegionInState {
    async fn run(
        &self,
        ctx: Context,
        params: InterceptorParams<'_, S, M>,
        mut diags: Diagnostics,
    ) -> (Context, Diagnostics) {
        let region = ctx
            .resource()
            .and_then(|resource| resource.override_region.as_deref())
            .unwrap_or_else(|| params.meta.region());
        if let Err(err) = params.state.set(ATTR_REGION, Value::String(region.to_owned())) {
            diags.add_error("setting region", err.to_string());
        }
        (ctx, diags)
    }
}

/// Accept import IDs of the form `<id>@<region>`.
///
/// Runs at `BEFORE` for `IMPORT`. The suffix becomes both the `region`
/// attribute and the context's override region; IDs without `@` import into
/// the provider's region.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImportRegion;

impl<S: ResourceState, M: ProviderMeta> Interceptor<S, M> for ImportRegion {
    async fn run(
        &self,
        ctx: Context,
        params: InterceptorParams<'_, S, M>,
        mut diags: Diagnostics,
    ) -> (Context, Diagnostics) {
        let (id, region) = match params.state.id().rsplit_once('@') {
            Some((id, region)) if !id.is_empty() && !region.is_empty() => {
                (id.to_owned(), region.to_owned())
            }
            Some(_) => {
                diags.add_error(
                    "unexpected format for import ID",
                    format!("{:?}: expected <id>@<region>", params.state.id()),
                );
                return (ctx, diags);
            }
            None => (
                params.state.id().to_owned(),
                params.meta.region().to_owned(),
            ),
        };

        params.state.set_id(&id);
        if let Err(err) = params.state.set(ATTR_REGION, Value::String(region.clone())) {
            diags.add_error("setting region", err.to_string());
            return (ctx, diags);
        }

        let resource = ResourceContext {
            override_region: Some(region),
            ..ctx.resource().cloned().unwrap_or_default()
        };
        (ctx.with_resource(resource), diags)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{state::ResourceData, testing::TestMeta};
    use serde_json::json;
    use weft_core::{When, Why};

    async fn run<I: Interceptor<ResourceData, TestMeta>>(
        interceptor: I,
        ctx: Context,
        state: &mut ResourceData,
        when: When,
        why: Why,
    ) -> (Context, Diagnostics) {
        let meta = TestMeta::new();
        let params = InterceptorParams::new(state, &meta, when, why);
        interceptor.run(ctx, params, Diagnostics::new()).await
    }

    #[tokio::test]
    async fn test_validate_region_in_partition() {
        let mut state = ResourceData::new("").with_plan(json!({"region": "eu-west-1"}));
        let (_, diags) = run(
            ValidateRegion,
            Context::new(),
            &mut state,
            When::BEFORE,
            Why::CUSTOMIZE_DIFF,
        )
        .await;
        assert!(diags.is_empty());
    }

    #[tokio::test]
    async fn test_validate_region_outside_partition() {
        let mut state = ResourceData::new("").with_plan(json!({"region": "cn-north-1"}));
        let (_, diags) = run(
            ValidateRegion,
            Context::new(),
            &mut state,
            When::BEFORE,
            Why::CUSTOMIZE_DIFF,
        )
        .await;
        assert!(diags.has_error());
    }

    #[tokio::test]
    async fn test_default_region_only_when_unset() {
        let mut unset = ResourceData::new("");
        run(DefaultRegion, Context::new(), &mut unset, When::BEFORE, Why::CUSTOMIZE_DIFF).await;
        assert_eq!(unset.get_str("region"), Some("us-west-2"));

        let mut set = ResourceData::new("").with_plan(json!({"region": "eu-west-1"}));
        run(DefaultRegion, Context::new(), &mut set, When::BEFORE, Why::CUSTOMIZE_DIFF).await;
        assert_eq!(set.get_str("region"), Some("eu-west-1"));
    }

    #[tokio::test]
    async fn test_set_region_prefers_override() {
        let ctx = Context::new().with_resource(ResourceContext {
            override_region: Some("eu-west-1".to_owned()),
            ..ResourceContext::default()
        });
        let mut state = ResourceData::new("q-1");
        run(SetRegionInState, ctx, &mut state, When::AFTER, Why::READ).await;
        assert_eq!(state.get_str("region"), Some("eu-west-1"));
    }

    #[tokio::test]
    async fn test_import_region_suffix() {
        let mut state = ResourceData::new("q-1@eu-west-1");
        let (ctx, diags) =
            run(ImportRegion, Context::new(), &mut state, When::BEFORE, Why::IMPORT).await;

        assert!(diags.is_empty());
        assert_eq!(state.id(), "q-1");
        assert_eq!(state.get_str("region"), Some("eu-west-1"));
        assert_eq!(
            ctx.resource().and_then(|r| r.override_region.as_deref()),
            Some("eu-west-1")
        );
    }

    #[tokio::test]
    async fn test_import_without_region() {
        let mut state = ResourceData::new("q-1");
        let (_, diags) =
            run(ImportRegion, Context::new(), &mut state, When::BEFORE, Why::IMPORT).await;

        assert!(diags.is_empty());
        assert_eq!(state.id(), "q-1");
        assert_eq!(state.get_str("region"), Some("us-west-2"));
    }

    #[tokio::test]
    async fn test_import_rejects_empty_parts() {
        let mut state = ResourceData::new("q-1@");
        let (_, diags) =
            run(ImportRegion, Context::new(), &mut state, When::BEFORE, Why::IMPORT).await;
        assert!(diags.has_error());
    }
}

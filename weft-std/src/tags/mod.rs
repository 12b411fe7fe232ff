//! Transparent tag reconciliation.
//!
//! Resources opt in with a [`TagsSpec`]; the provider then registers:
//!
//! | interceptor             | when      | why                      |
//! |-------------------------|-----------|--------------------------|
//! | [`TagsIn`]              | `BEFORE`  | `CREATE \| UPDATE`       |
//! | [`TagReader`]           | `AFTER`   | `CREATE \| READ \| UPDATE` |
//! | [`TagWriter`]           | `FINALLY` | `UPDATE` (and `CREATE`)  |
//! | [`SetTagsAll`]          | `BEFORE`  | `CUSTOMIZE_DIFF`         |
//! | [`ValidateRequiredTags`]| `BEFORE`  | `CUSTOMIZE_DIFF`         |
//!
//! Data sources use [`DataSourceTags`] at `AFTER`/`READ`.
//!
//! Services without tagging capabilities make every one of these a no-op.

mod data_source;
mod plan;
mod reconcile;
mod resource;

pub use data_source::DataSourceTags;
pub use plan::{SetTagsAll, ValidateRequiredTags};
pub use reconcile::{TagDiff, TagViews, merged_configured, resolve_duplicates, resolve_views};
pub use resource::{TagReader, TagWriter, TagsIn};

use crate::names::{ATTR_ID, ATTR_TAGS, ATTR_TAGS_ALL};
use std::sync::Arc;
use weft_core::{
    Context, DEFAULT_SYSTEM_TAG_PREFIX, Diagnostics, KeyValueTags, ProviderMeta, ResourceState,
    ServicePackage, TagsConfig,
};

const DEFAULT_SYSTEM_PREFIXES: &[&str] = &[DEFAULT_SYSTEM_TAG_PREFIX];

/// How a resource type participates in tagging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagsSpec {
    /// Attribute holding the tagging identifier; `id` means the resource ID.
    pub identifier_attribute: String,
    /// Resource type passed through to the tagging collaborators.
    pub resource_type: Option<String>,
    /// Also apply tag changes after Create, for services that cannot tag on create.
    pub apply_on_create: bool,
}

impl Default for TagsSpec {
    fn default() -> Self {
        Self {
            identifier_attribute: ATTR_ID.to_owned(),
            resource_type: None,
            apply_on_create: false,
        }
    }
}

impl TagsSpec {
    /// Tag by resource ID.
    pub fn new() -> Self {
        Self::default()
    }

    /// Tag by the value of `attribute` instead of the resource ID.
    pub fn identifier_attribute(mut self, attribute: impl Into<String>) -> Self {
        self.identifier_attribute = attribute.into();
        self
    }

    /// Pass `resource_type` to the tagging collaborators.
    pub fn resource_type(mut self, resource_type: impl Into<String>) -> Self {
        self.resource_type = Some(resource_type.into());
        self
    }

    /// Apply tags after Create as well as Update.
    pub fn apply_on_create(mut self) -> Self {
        self.apply_on_create = true;
        self
    }

    /// The tagging identifier of `state`, if it has one.
    pub fn identifier<S: ResourceState>(&self, state: &S) -> Option<String> {
        if self.identifier_attribute == ATTR_ID {
            Some(state.id()).filter(|id| !id.is_empty()).map(str::to_owned)
        } else {
            state.get_str(&self.identifier_attribute).map(str::to_owned)
        }
    }
}

fn service_package<M: ProviderMeta>(
    ctx: &Context,
    meta: &M,
) -> Option<Arc<dyn ServicePackage<M>>> {
    let resource = ctx.resource()?;
    meta.service_package(&resource.service_package)
}

fn tags_config<M: ProviderMeta>(ctx: &Context, meta: &M) -> Arc<TagsConfig> {
    ctx.tags_config()
        .cloned()
        .unwrap_or_else(|| meta.tags_config())
}

fn configured_tags<S: ResourceState>(state: &S) -> KeyValueTags {
    KeyValueTags::from_value(state.raw_config().get(ATTR_TAGS))
}

fn type_name(ctx: &Context) -> &str {
    ctx.resource()
        .map(|resource| resource.type_name.as_str())
        .unwrap_or("resource")
}

fn system_prefixes<M: ProviderMeta>(package: Option<&dyn ServicePackage<M>>) -> &[&str] {
    package.map_or(DEFAULT_SYSTEM_PREFIXES, |package| package.system_tag_prefixes())
}

fn set_views<S: ResourceState>(state: &mut S, views: &TagViews, diags: &mut Diagnostics) {
    if let Err(err) = state.set(ATTR_TAGS, views.tags.to_value()) {
        diags.add_error("setting tags", err.to_string());
        return;
    }
    if let Err(err) = state.set(ATTR_TAGS_ALL, views.tags_all.to_value()) {
        diags.add_error("setting tags_all", err.to_string());
    }
}

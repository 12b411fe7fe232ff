//! Pure tag reconciliation algorithms.
//!
//! Everything here is free of I/O so the interceptors in this module only
//! have to fetch, call and store.

use weft_core::{DefaultConfig, KeyValueTags, TagsConfig};

/// The two user-visible projections of a resource's tags.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagViews {
    /// `tags`: without ignored, system or purely default-contributed tags.
    pub tags: KeyValueTags,
    /// `tags_all`: the full effective set, without ignored or system tags.
    pub tags_all: KeyValueTags,
}

/// Project the authoritative remote tag list into `tags` and `tags_all`.
///
/// `configured` is the resource's `tags` as written in configuration. A tag
/// that exactly matches a default tag is hidden from `tags` unless the user
/// wrote that same `key = value` explicitly.
pub fn resolve_views(
    remote: &KeyValueTags,
    configured: &KeyValueTags,
    config: &TagsConfig,
    system_prefixes: &[&str],
) -> TagViews {
    let tags_all = remote
        .ignore_system(system_prefixes)
        .ignore_config(&config.ignore_tags);
    let tags = resolve_duplicates(&tags_all, &config.default_tags, configured);
    TagViews { tags, tags_all }
}

/// Drop tags contributed purely by default tags.
pub fn resolve_duplicates(
    tags: &KeyValueTags,
    defaults: &DefaultConfig,
    configured: &KeyValueTags,
) -> KeyValueTags {
    tags.iter()
        .filter(|(k, v)| !defaults.contains(k, v) || configured.contains(k, v))
        .collect()
}

/// Default tags overridden by `configured`, without system or ignored tags.
pub fn merged_configured(
    configured: &KeyValueTags,
    config: &TagsConfig,
    system_prefixes: &[&str],
) -> KeyValueTags {
    config
        .default_tags
        .merge_tags(configured)
        .ignore_system(system_prefixes)
        .ignore_config(&config.ignore_tags)
}

/// The changes needed to turn a stored tag set into a configured one.
///
/// Tags compare by key and value, so a changed value shows up twice: the old
/// value in `to_remove` and the new one in `to_add`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagDiff {
    /// Tags to add or overwrite.
    pub to_add: KeyValueTags,
    /// Tags to remove.
    pub to_remove: KeyValueTags,
}

impl TagDiff {
    /// Compute `configured - stored` and `stored - configured`.
    pub fn between(stored: &KeyValueTags, configured: &KeyValueTags) -> Self {
        Self {
            to_add: configured.difference(stored),
            to_remove: stored.difference(configured),
        }
    }

    /// Whether no remote call is needed.
    pub fn is_empty(&self) -> bool {
        self.to_add.is_empty() && self.to_remove.is_empty()
    }
}

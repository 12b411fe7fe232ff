//! Well-known attribute names.

/// Resource identifier.
pub const ATTR_ID: &str = "id";
/// Region override.
pub const ATTR_REGION: &str = "region";
/// User-visible tags.
pub const ATTR_TAGS: &str = "tags";
/// Effective tags including provider defaults.
pub const ATTR_TAGS_ALL: &str = "tags_all";

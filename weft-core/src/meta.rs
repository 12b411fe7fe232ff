//! Provider-wide client bundle ("meta") seen by every invocation.

use crate::{config::TagsConfig, service::ServicePackage};
use std::{collections::BTreeSet, sync::Arc};

/// A set of regions sharing an isolated control plane.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Partition {
    id: String,
    regions: BTreeSet<String>,
}

impl Partition {
    /// Create a partition from its identifier and regions.
    pub fn new<I, T>(id: impl Into<String>, regions: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        Self {
            id: id.into(),
            regions: regions.into_iter().map(Into::into).collect(),
        }
    }

    /// Partition identifier.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Whether `region` belongs to this partition.
    pub fn contains_region(&self, region: &str) -> bool {
        self.regions.contains(region)
    }
}

/// The opaque meta value handed to interceptors and core handlers.
///
/// Standard interceptors use it to find the provider region and partition,
/// the shared tag configuration and the per-service tagging capabilities.
pub trait ProviderMeta: Send + Sync + Sized + 'static {
    /// The provider's configured region.
    fn region(&self) -> &str;

    /// The partition the provider operates in.
    fn partition(&self) -> &Partition;

    /// Immutable tag configuration, set once at provider configuration.
    fn tags_config(&self) -> Arc<TagsConfig>;

    /// Look up a service package by name.
    fn service_package(&self, name: &str) -> Option<Arc<dyn ServicePackage<Self>>>;
}

//! # weft - Request-Lifecycle Middleware for Cloud Resource Handlers
//!
//! `weft` weaves cross-cutting behavior (tag reconciliation, region override,
//! logging, validation) through generated CRUD handlers without touching
//! them. Each resource type gets an immutable registry of interceptors, each
//! bound to one or more lifecycle phases ([`When`]) and operations ([`Why`]).
//!
//! ## Lifecycle
//!
//! ```text
//! bootstrap -> BEFORE (in order) -> core handler -> AFTER | ON_ERROR (reversed) -> FINALLY (reversed)
//! ```
//!
//! An error in the `BEFORE` phase skips everything after it, `FINALLY`
//! included.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use weft::prelude::*;
//!
//! let provider = ProviderBuilder::new()
//!     .interceptor(When::all(), Why::all(), LoggingInterceptor)
//!     .resource(
//!         "sqs",
//!         ResourceSpec::new("aws_sqs_queue", "Queue", Resource::new()
//!             .create(CreateQueue)
//!             .read(ReadQueue)
//!             .delete(DeleteQueue))
//!         .with_tags(TagsSpec::new()),
//!     )
//!     .build()?;
//!
//! let queue = provider.resource("aws_sqs_queue").unwrap();
//! let diags = queue.create(Context::new(), &mut state, &meta).await;
//! ```

#![deny(clippy::wildcard_imports)]
#![warn(missing_docs)]

pub mod bootstrap;
pub mod provider;
pub mod resource;
pub mod wrap;

pub use weft_core::{
    // Errors
    BoxError,
    ConfigError,
    // Context
    Context,
    // Handlers
    CrudHandler,
    // Tag configuration
    DefaultConfig,
    // Diagnostics
    Diagnostic,
    Diagnostics,
    DynCrudHandler,
    // Interceptors
    DynInterceptor,
    IgnoreConfig,
    Interceptor,
    InterceptorParams,
    KeyValueTags,
    // Service capabilities
    ListTags,
    Noop,
    // Provider meta
    Partition,
    PolicySeverity,
    ProviderMeta,
    ResourceContext,
    // State
    ResourceState,
    ServicePackage,
    Severity,
    StateError,
    TagError,
    TagPolicyConfig,
    TagsConfig,
    UpdateTags,
    // Flags
    When,
    Why,
};

pub use weft_std::{InterceptorInvocation, Interceptors, invoke};

pub use bootstrap::{Bootstrap, BootstrapError, ProviderMetaData, StandardBootstrap};
pub use provider::{InitError, InitErrors, Provider, ProviderBuilder, configure_tags};
pub use resource::{
    DataSourceSpec, RegionSpec, Resource, ResourceSpec, StateUpgrade, StateUpgrader,
};
pub use wrap::{WrappedDataSource, WrappedResource};

/// Standard interceptors.
pub mod hooks {
    pub use weft_std::hooks::{Instrumented, LoggingInterceptor};
}

/// Region override interceptors.
pub mod region {
    pub use weft_std::region::{DefaultRegion, ImportRegion, SetRegionInState, ValidateRegion};
}

/// Tag reconciliation.
pub mod tags {
    pub use weft_std::tags::{
        DataSourceTags, SetTagsAll, TagDiff, TagReader, TagViews, TagWriter, TagsIn, TagsSpec,
        ValidateRequiredTags, merged_configured, resolve_duplicates, resolve_views,
    };
}

/// State implementations.
pub mod state {
    pub use weft_std::state::ResourceData;
}

/// Testing utilities.
pub mod testing {
    #![allow(clippy::wildcard_imports)]
    pub use weft_std::testing::*;
}

/// Prelude module - common imports for Weft.
///
/// # Usage
///
/// ```rust,ignore
/// use weft::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{
        Context,
        CrudHandler,
        DataSourceSpec,
        Diagnostics,
        Interceptor,
        InterceptorParams,
        KeyValueTags,
        Provider,
        ProviderBuilder,
        ProviderMeta,
        RegionSpec,
        Resource,
        ResourceSpec,
        ResourceState,
        ServicePackage,
        When,
        Why,
        hooks::LoggingInterceptor,
        tags::TagsSpec,
    };
}

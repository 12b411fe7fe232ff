//! # weft-core
//!
//! Core traits and value types for the Weft interceptor framework.
//!
//! This crate has minimal dependencies and is meant to be imported by
//! service packages that only need to implement handlers, interceptors or
//! tagging capabilities, without pulling in the dispatcher.
//!
//! # Building Blocks
//!
//! - [`When`] / [`Why`] - Phase and operation bit flags
//! - [`Diagnostics`] - Append-only warning/error log with a has-error predicate
//! - [`Context`] - Per-invocation context, threaded explicitly
//! - [`ResourceState`] - Capability interface over one resource instance
//! - [`Interceptor`] / [`CrudHandler`] - The two kinds of handlers a dispatch runs
//! - [`ProviderMeta`] / [`ServicePackage`] - Provider-wide client bundle and
//!   optional per-service tagging capabilities
//! - [`KeyValueTags`] / [`TagsConfig`] - Tag sets and provider tag configuration
//!
//! # Error Types
//!
//! - [`StateError`] - State handle write failures
//! - [`TagError`] - Tagging collaborator failures
//! - [`ConfigError`] - Tag configuration failures

#![deny(clippy::wildcard_imports)]
#![warn(missing_docs)]

mod config;
mod context;
mod diag;
mod error;
mod flags;
mod handler;
mod interceptor;
mod meta;
mod service;
mod state;
mod tags;

// Re-exports
pub use config::{
    DEFAULT_TAGS_ENV_PREFIX, DefaultConfig, IGNORE_TAGS_KEY_PREFIXES_ENV, IGNORE_TAGS_KEYS_ENV,
    IgnoreConfig, PolicySeverity, TAG_POLICY_COMPLIANCE_ENV, TagPolicyConfig, TagsConfig,
};
pub use context::{Context, ResourceContext};
pub use diag::{Diagnostic, Diagnostics, Severity};
pub use error::{BoxError, ConfigError, StateError, TagError};
pub use flags::{When, Why};
pub use handler::{CrudHandler, DynCrudHandler, Noop};
pub use interceptor::{DynInterceptor, Interceptor, InterceptorParams};
pub use meta::{Partition, ProviderMeta};
pub use service::{DEFAULT_SYSTEM_TAG_PREFIX, ListTags, ServicePackage, UpdateTags};
pub use state::ResourceState;
pub use tags::KeyValueTags;

//! # weft-std
//!
//! Standard implementations for the Weft interceptor framework.
//!
//! This crate provides:
//! - **Registry**: [`Interceptors`], an append-only list of
//!   `(when, why, interceptor)` records filtered per operation
//! - **Dispatch**: [`invoke`], the Before / core / After-or-OnError / Finally
//!   state machine
//! - **Tagging**: transparent tag reconciliation in [`tags`]
//! - **Regions**: per-resource region override in [`region`]
//! - **Standard hooks**: Logging, tracing spans
//! - **State**: [`ResourceData`](state::ResourceData), a map-backed resource state

#![deny(clippy::wildcard_imports)]
#![warn(missing_docs)]

// Re-export core traits
pub use weft_core;

// Modules
pub mod dispatch;
pub mod hooks;
pub mod names;
pub mod region;
pub mod registry;
pub mod state;
pub mod tags;
pub mod testing;

pub use dispatch::invoke;
pub use registry::{InterceptorInvocation, Interceptors};

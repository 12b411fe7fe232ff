//! # Interceptors
//!
//! An interceptor observes or mutates the execution context, the resource
//! state and the diagnostics accumulator at one lifecycle phase of one
//! operation. Interceptors are registered once, never mutated, and shared by
//! every invocation of a resource type.
//!
//! # Static vs Dynamic Dispatch
//!
//! [`Interceptor`] uses native `async fn` so concrete interceptors are
//! zero-cost. Registries store them behind [`DynInterceptor`], which every
//! `Interceptor` implements automatically.

use crate::{
    context::Context,
    diag::Diagnostics,
    flags::{When, Why},
    meta::ProviderMeta,
    state::ResourceState,
};
use futures::future::BoxFuture;
use std::future::Future;

/// Everything an interceptor may look at besides the context and diagnostics.
pub struct InterceptorParams<'a, S, M> {
    /// The resource state handle.
    pub state: &'a mut S,
    /// The provider meta.
    pub meta: &'a M,
    /// The single phase currently executing.
    pub when: When,
    /// The operation being dispatched.
    pub why: Why,
    /// Whether the core handler reported an error. Always `false` during
    /// `BEFORE`; interceptor errors never set it.
    pub handler_failed: bool,
}

impl<'a, S, M> InterceptorParams<'a, S, M> {
    /// Parameters for `when` of `why`, before the core handler has failed.
    pub fn new(state: &'a mut S, meta: &'a M, when: When, why: Why) -> Self {
        Self {
            state,
            meta,
            when,
            why,
            handler_failed: false,
        }
    }

    /// Record the core handler's outcome.
    pub fn with_handler_failed(mut self, failed: bool) -> Self {
        self.handler_failed = failed;
        self
    }
}

/// A handler run around the core CRUD handler.
///
/// Interceptors never fail by returning `Err`; they append to the
/// diagnostics they were given and return them. Appending an error during the
/// `BEFORE` phase aborts the invocation.
#[diagnostic::on_unimplemented(
    message = "`{Self}` is not an interceptor for state `{S}`",
    label = "missing `Interceptor` implementation",
    note = "Interceptors must implement `run` for the state and meta types in use."
)]
pub trait Interceptor<S: ResourceState, M: ProviderMeta>: Send + Sync + 'static {
    /// Run at `params.when` for `params.why`.
    fn run(
        &self,
        ctx: Context,
        params: InterceptorParams<'_, S, M>,
        diags: Diagnostics,
    ) -> impl Future<Output = (Context, Diagnostics)> + Send;
}

/// Dynamic object-safe version of [`Interceptor`].
pub trait DynInterceptor<S: ResourceState, M: ProviderMeta>: Send + Sync + 'static {
    /// Run at `params.when` for `params.why` (dynamic dispatch version).
    fn run_dyn<'a>(
        &'a self,
        ctx: Context,
        params: InterceptorParams<'a, S, M>,
        diags: Diagnostics,
    ) -> BoxFuture<'a, (Context, Diagnostics)>;
}

// Blanket implementation: Any type implementing Interceptor implements DynInterceptor automatically.
impl<S, M, T> DynInterceptor<S, M> for T
where
    S: ResourceState,
    M: ProviderMeta,
    T: Interceptor<S, M>,
{
    fn run_dyn<'a>(
        &'a self,
        ctx: Context,
        params: InterceptorParams<'a, S, M>,
        diags: Diagnostics,
    ) -> BoxFuture<'a, (Context, Diagnostics)> {
        Box::pin(self.run(ctx, params, diags))
    }
}

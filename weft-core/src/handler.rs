//! # Core Handlers
//!
//! The innermost CRUD operation wrapped by the dispatcher. The framework is
//! agnostic to what a handler does; it only looks at whether the returned
//! diagnostics contain an error.

use crate::{context::Context, diag::Diagnostics, meta::ProviderMeta, state::ResourceState};
use futures::future::BoxFuture;
use std::future::Future;

/// A Create, Read, Update, Delete, CustomizeDiff or Import implementation.
#[diagnostic::on_unimplemented(
    message = "`{Self}` cannot handle state `{S}`",
    label = "missing `CrudHandler` implementation",
    note = "Core handlers must implement `call` for the state and meta types in use."
)]
pub trait CrudHandler<S: ResourceState, M: ProviderMeta>: Send + Sync + 'static {
    /// Perform the operation.
    fn call(
        &self,
        ctx: &Context,
        state: &mut S,
        meta: &M,
    ) -> impl Future<Output = Diagnostics> + Send;
}

/// Dynamic object-safe version of [`CrudHandler`].
pub trait DynCrudHandler<S: ResourceState, M: ProviderMeta>: Send + Sync + 'static {
    /// Perform the operation (dynamic dispatch version).
    fn call_dyn<'a>(
        &'a self,
        ctx: &'a Context,
        state: &'a mut S,
        meta: &'a M,
    ) -> BoxFuture<'a, Diagnostics>;
}

impl<S, M, T> DynCrudHandler<S, M> for T
where
    S: ResourceState,
    M: ProviderMeta,
    T: CrudHandler<S, M>,
{
    fn call_dyn<'a>(
        &'a self,
        ctx: &'a Context,
        state: &'a mut S,
        meta: &'a M,
    ) -> BoxFuture<'a, Diagnostics> {
        Box::pin(self.call(ctx, state, meta))
    }
}

/// A handler that does nothing and reports nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct Noop;

impl<S: ResourceState, M: ProviderMeta> CrudHandler<S, M> for Noop {
    async fn call(&self, _ctx: &Context, _state: &mut S, _meta: &M) -> Diagnostics {
        Diagnostics::new()
    }
}

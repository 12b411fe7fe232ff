//! The interceptor dispatcher.
//!
//! [`invoke`] runs one operation through its interceptors:
//!
//! 1. `BEFORE` interceptors in registration order. The first error
//!    short-circuits the invocation: the core handler and every exit-phase
//!    interceptor (including `FINALLY`) are skipped.
//! 2. The core handler, exactly once.
//! 3. `ON_ERROR` interceptors if the core handler reported an error,
//!    otherwise `AFTER` interceptors; never both. Reverse registration order.
//! 4. `FINALLY` interceptors, reverse registration order.
//!
//! The dispatcher itself is strictly sequential and never looks at the
//! cancellation token; the context is handed through every phase untouched
//! so interceptors can observe cancellation themselves.

use crate::registry::InterceptorInvocation;
use tracing::debug;
use weft_core::{
    Context, Diagnostics, DynCrudHandler, InterceptorParams, ProviderMeta, ResourceState, When,
    Why,
};

/// Run `handler` for operation `why` surrounded by `interceptors`.
///
/// `interceptors` is expected to be pre-filtered for `why`, see
/// [`Interceptors::for_operation`](crate::Interceptors::for_operation). An
/// empty slice degrades to calling the handler directly.
pub async fn invoke<S, M>(
    ctx: Context,
    interceptors: &[&InterceptorInvocation<S, M>],
    handler: &dyn DynCrudHandler<S, M>,
    why: Why,
    state: &mut S,
    meta: &M,
) -> (Context, Diagnostics)
where
    S: ResourceState,
    M: ProviderMeta,
{
    let mut ctx = ctx;
    let mut diags = Diagnostics::new();

    // Before interceptors are run first to last.
    for invocation in interceptors
        .iter()
        .filter(|invocation| invocation.when.intersects(When::BEFORE))
    {
        let params = InterceptorParams::new(&mut *state, meta, When::BEFORE, why);
        (ctx, diags) = run_phase(invocation, params, ctx, diags).await;

        // Short circuit if any Before interceptor errors.
        if diags.has_error() {
            debug!(operation = %why, errors = diags.errors().count(), "before phase failed, skipping handler");
            return (ctx, diags);
        }
    }

    diags.append(handler.call_dyn(&ctx, state, meta).await);

    // All other interceptors are run last to first.
    let reversed: Vec<_> = interceptors.iter().rev().collect();

    let failed = diags.has_error();
    let exit = if failed {
        When::ON_ERROR
    } else {
        When::AFTER
    };
    debug!(operation = %why, phase = %exit, "handler finished");

    for invocation in reversed
        .iter()
        .filter(|invocation| invocation.when.intersects(exit))
    {
        let params = InterceptorParams::new(&mut *state, meta, exit, why)
            .with_handler_failed(failed);
        (ctx, diags) = run_phase(invocation, params, ctx, diags).await;
    }

    for invocation in reversed
        .iter()
        .filter(|invocation| invocation.when.intersects(When::FINALLY))
    {
        let params = InterceptorParams::new(&mut *state, meta, When::FINALLY, why)
            .with_handler_failed(failed);
        (ctx, diags) = run_phase(invocation, params, ctx, diags).await;
    }

    (ctx, diags)
}

async fn run_phase<S, M>(
    invocation: &InterceptorInvocation<S, M>,
    params: InterceptorParams<'_, S, M>,
    ctx: Context,
    diags: Diagnostics,
) -> (Context, Diagnostics)
where
    S: ResourceState,
    M: ProviderMeta,
{
    invocation.interceptor.run_dyn(ctx, params, diags).await
}

//! Logging and tracing interceptors.

use tracing::{Instrument, debug, info, warn};
use weft_core::{
    Context, Diagnostics, Interceptor, InterceptorParams, ProviderMeta, ResourceState, When,
};

/// An interceptor that logs every phase it is registered for.
///
/// Usually registered as a global interceptor for all phases, so it is the
/// first to enter and the last to exit.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingInterceptor;

impl<S: ResourceState, M: ProviderMeta> Interceptor<S, M> for LoggingInterceptor {
    async fn run(
        &self,
        ctx: Context,
        params: InterceptorParams<'_, S, M>,
        diags: Diagnostics,
    ) -> (Context, Diagnostics) {
        let resource = ctx
            .resource()
            .map(|resource| resource.type_name.as_str())
            .unwrap_or_default();
        let id = params.state.id();
        let errors = diags.errors().count();
        let warnings = diags.warnings().count();

        if params.when == When::BEFORE {
            info!(resource, id, operation = %params.why, "starting");
        } else if params.when == When::ON_ERROR {
            warn!(resource, id, operation = %params.why, errors, "failed");
        } else if params.when == When::FINALLY {
            info!(resource, id, operation = %params.why, errors, warnings, "finished");
        } else {
            debug!(resource, id, operation = %params.why, phase = %params.when, warnings, "succeeded");
        }
        (ctx, diags)
    }
}

/// Wraps an interceptor so each of its runs happens inside a `tracing` span.
pub struct Instrumented<I> {
    inner: I,
    name: &'static str,
}

impl<I> Instrumented<I> {
    /// Create a new wrapper; `name` identifies the interceptor in the span.
    pub const fn new(inner: I, name: &'static str) -> Self {
        Self { inner, name }
    }
}

impl<I: Clone> Clone for Instrumented<I> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            name: self.name,
        }
    }
}

impl<S, M, I> Interceptor<S, M> for Instrumented<I>
where
    S: ResourceState,
    M: ProviderMeta,
    I: Interceptor<S, M>,
{
    async fn run(
        &self,
        ctx: Context,
        params: InterceptorParams<'_, S, M>,
        diags: Diagnostics,
    ) -> (Context, Diagnostics) {
        let span = tracing::debug_span!(
            "interceptor",
            interceptor = %self.name,
            phase = %params.when,
            operation = %params.why,
        );
        self.inner.run(ctx, params, diags).instrument(span).await
    }
}

//! Interceptor registry.
//!
//! An [`Interceptors`] value is built once per resource type when the
//! provider starts and is only read afterwards, so it can be shared across
//! concurrent invocations without locking.

use std::sync::Arc;
use weft_core::{DynInterceptor, Interceptor, ProviderMeta, ResourceState, When, Why};

/// One registered interceptor together with its phase and operation masks.
pub struct InterceptorInvocation<S: ResourceState, M: ProviderMeta> {
    /// Phases the interceptor runs at.
    pub when: When,
    /// Operations the interceptor applies to.
    pub why: Why,
    /// The interceptor.
    pub interceptor: Arc<dyn DynInterceptor<S, M>>,
}

impl<S: ResourceState, M: ProviderMeta> InterceptorInvocation<S, M> {
    /// Create an invocation record.
    pub fn new<I: Interceptor<S, M>>(when: When, why: Why, interceptor: I) -> Self {
        Self {
            when,
            why,
            interceptor: Arc::new(interceptor),
        }
    }
}

impl<S: ResourceState, M: ProviderMeta> Clone for InterceptorInvocation<S, M> {
    fn clone(&self) -> Self {
        Self {
            when: self.when,
            why: self.why,
            interceptor: Arc::clone(&self.interceptor),
        }
    }
}

impl<S: ResourceState, M: ProviderMeta> std::fmt::Debug for InterceptorInvocation<S, M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InterceptorInvocation")
            .field("when", &self.when)
            .field("why", &self.why)
            .finish_non_exhaustive()
    }
}

/// An ordered sequence of interceptor invocations.
///
/// Insertion order matters: the `BEFORE` phase runs in this order and the
/// exit phases run in reverse. Duplicates are allowed.
pub struct Interceptors<S: ResourceState, M: ProviderMeta> {
    invocations: Vec<InterceptorInvocation<S, M>>,
}

impl<S: ResourceState, M: ProviderMeta> Default for Interceptors<S, M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: ResourceState, M: ProviderMeta> Clone for Interceptors<S, M> {
    fn clone(&self) -> Self {
        Self {
            invocations: self.invocations.clone(),
        }
    }
}

impl<S: ResourceState, M: ProviderMeta> std::fmt::Debug for Interceptors<S, M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(&self.invocations).finish()
    }
}

impl<S: ResourceState, M: ProviderMeta> Interceptors<S, M> {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            invocations: Vec::new(),
        }
    }

    /// Append an interceptor to the end of the sequence.
    pub fn append<I: Interceptor<S, M>>(&mut self, when: When, why: Why, interceptor: I) {
        self.push(InterceptorInvocation::new(when, why, interceptor));
    }

    /// Builder-style [`Interceptors::append`].
    pub fn with<I: Interceptor<S, M>>(mut self, when: When, why: Why, interceptor: I) -> Self {
        self.append(when, why, interceptor);
        self
    }

    /// Append an already built invocation record.
    pub fn push(&mut self, invocation: InterceptorInvocation<S, M>) {
        self.invocations.push(invocation);
    }

    /// The ordered records whose operation mask intersects `why`.
    pub fn for_operation(&self, why: Why) -> Vec<&InterceptorInvocation<S, M>> {
        self.invocations
            .iter()
            .filter(|invocation| invocation.why.intersects(why))
            .collect()
    }

    /// Iterate over all records in registration order.
    pub fn iter(&self) -> std::slice::Iter<'_, InterceptorInvocation<S, M>> {
        self.invocations.iter()
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.invocations.len()
    }

    /// Whether nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.invocations.is_empty()
    }
}

impl<S: ResourceState, M: ProviderMeta> Extend<InterceptorInvocation<S, M>> for Interceptors<S, M> {
    fn extend<T: IntoIterator<Item = InterceptorInvocation<S, M>>>(&mut self, iter: T) {
        self.invocations.extend(iter);
    }
}

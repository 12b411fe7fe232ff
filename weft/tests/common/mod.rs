#![allow(dead_code)]

use std::sync::{Arc, Once};
use tokio_util::sync::CancellationToken;
use weft::{
    Context, CrudHandler, Diagnostics, Interceptor, InterceptorParams, KeyValueTags, ProviderMeta,
    ResourceState, TagsConfig,
    state::ResourceData,
    testing::{TestMeta, TestServicePackage, TestTagService},
};

// ============================================================================
// Tracing
// ============================================================================

static TRACING: Once = Once::new();

/// Route `tracing` output through the test harness; `RUST_LOG` filters it.
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

// ============================================================================
// Fixtures
// ============================================================================

pub const SERVICE: &str = "sqs";
pub const QUEUE: &str = "aws_sqs_queue";

pub fn tags(pairs: &[(&str, &str)]) -> KeyValueTags {
    pairs.iter().copied().collect()
}

pub fn defaults(pairs: &[(&str, &str)]) -> TagsConfig {
    let mut config = TagsConfig::default();
    config.default_tags.tags = tags(pairs);
    config
}

/// A meta whose `sqs` package tags through `service`.
pub fn tagged_meta(service: &Arc<TestTagService>, config: TagsConfig) -> TestMeta {
    TestMeta::new()
        .with_tags_config(config)
        .with_service_package(TestServicePackage::tagged(SERVICE, service))
}

// ============================================================================
// Interceptors and Handlers
// ============================================================================

/// Rejects resources whose `name` attribute is empty or missing.
pub struct RejectIfNameEmpty;

impl<S: ResourceState, M: ProviderMeta> Interceptor<S, M> for RejectIfNameEmpty {
    async fn run(
        &self,
        ctx: Context,
        params: InterceptorParams<'_, S, M>,
        mut diags: Diagnostics,
    ) -> (Context, Diagnostics) {
        if params.state.get_str("name").is_none() {
            diags.add_error("name must not be empty", "");
        }
        (ctx, diags)
    }
}

/// A core handler that cancels the invocation's token and then succeeds.
pub struct CancellingHandler {
    pub token: CancellationToken,
}

impl CrudHandler<ResourceData, TestMeta> for CancellingHandler {
    async fn call(
        &self,
        _ctx: &Context,
        _state: &mut ResourceData,
        _meta: &TestMeta,
    ) -> Diagnostics {
        self.token.cancel();
        Diagnostics::new()
    }
}

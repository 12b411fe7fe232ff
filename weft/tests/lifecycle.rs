//! Lifecycle ordering through wrapped resources.

use serde_json::json;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use weft::{
    Context, ProviderBuilder, Resource, ResourceSpec, ResourceState, When, Why,
    region::ValidateRegion,
    state::ResourceData,
    tags::{TagWriter, TagsSpec},
    testing::{
        CallLog, CountingHandler, FailingInterceptor, RecordingInterceptor, TestMeta,
        TestTagService,
    },
};

mod common;
use common::{CancellingHandler, QUEUE, RejectIfNameEmpty, SERVICE, init_tracing, tagged_meta};

type Builder = ProviderBuilder<ResourceData, TestMeta>;

#[tokio::test]
async fn test_validate_region_then_tag_update() {
    init_tracing();
    let service = Arc::new(TestTagService::new());
    let meta = tagged_meta(&service, Default::default());
    let handler = CountingHandler::new().assigning_id("q-1");

    let provider = Builder::new()
        .resource(
            SERVICE,
            ResourceSpec::new(
                QUEUE,
                "Queue",
                Resource::new().create(handler.clone()).read(CountingHandler::new()),
            )
            .with_interceptor(When::BEFORE, Why::CREATE, ValidateRegion)
            .with_interceptor(When::FINALLY, Why::CREATE, TagWriter::new(TagsSpec::new())),
        )
        .build()
        .unwrap();

    let mut state = ResourceData::new("")
        .with_config(json!({"region": "us-east-1", "tags": {"Env": "prod"}}))
        .with_plan(json!({"region": "us-east-1"}));
    let diags = provider
        .resource(QUEUE)
        .unwrap()
        .create(Context::new(), &mut state, &meta)
        .await;

    assert!(diags.is_empty(), "{diags:?}");
    assert_eq!(handler.count(), 1);
    assert_eq!(service.update_count(), 1);
    assert_eq!(state.id(), "q-1");
}

#[tokio::test]
async fn test_reject_if_name_empty() {
    init_tracing();
    let meta = TestMeta::new();
    let handler = CountingHandler::new();

    let provider = Builder::new()
        .resource(
            SERVICE,
            ResourceSpec::new(
                QUEUE,
                "Queue",
                Resource::new().create(handler.clone()).read(CountingHandler::new()),
            )
            .with_interceptor(When::BEFORE, Why::CREATE, RejectIfNameEmpty),
        )
        .build()
        .unwrap();

    let mut state = ResourceData::new("").with_plan(json!({"name": ""}));
    let diags = provider
        .resource(QUEUE)
        .unwrap()
        .create(Context::new(), &mut state, &meta)
        .await;

    assert_eq!(diags.len(), 1);
    assert!(diags.has_error());
    assert_eq!(handler.count(), 0);
}

#[tokio::test]
async fn test_global_interceptors_wrap_resource_interceptors() {
    init_tracing();
    let log = CallLog::default();
    let phases = When::BEFORE | When::AFTER | When::FINALLY;

    let provider = Builder::new()
        .interceptor(phases, Why::all(), RecordingInterceptor::new("global", &log))
        .resource(
            SERVICE,
            ResourceSpec::new(QUEUE, "Queue", Resource::new().read(CountingHandler::new()))
                .with_interceptor(phases, Why::READ, RecordingInterceptor::new("local", &log)),
        )
        .build()
        .unwrap();

    let mut state = ResourceData::new("q-1");
    let diags = provider
        .resource(QUEUE)
        .unwrap()
        .read(Context::new(), &mut state, &TestMeta::new())
        .await;

    assert!(diags.is_empty());
    assert_eq!(
        *log.lock().unwrap(),
        [
            "global:BEFORE",
            "local:BEFORE",
            "local:AFTER",
            "global:AFTER",
            "local:FINALLY",
            "global:FINALLY",
        ]
    );
}

#[tokio::test]
async fn test_after_and_on_error_are_exclusive() {
    init_tracing();
    let all = When::AFTER | When::ON_ERROR | When::FINALLY;

    for (handler, expected) in [
        (CountingHandler::new(), ["x:AFTER", "x:FINALLY"]),
        (
            CountingHandler::failing("delete failed"),
            ["x:ON_ERROR", "x:FINALLY"],
        ),
    ] {
        let log = CallLog::default();
        let provider = Builder::new()
            .resource(
                SERVICE,
                ResourceSpec::new(
                    QUEUE,
                    "Queue",
                    Resource::new().read(CountingHandler::new()).delete(handler),
                )
                .with_interceptor(all, Why::DELETE, RecordingInterceptor::new("x", &log)),
            )
            .build()
            .unwrap();

        let mut state = ResourceData::new("q-1");
        provider
            .resource(QUEUE)
            .unwrap()
            .delete(Context::new(), &mut state, &TestMeta::new())
            .await;

        assert_eq!(*log.lock().unwrap(), expected);
    }
}

#[tokio::test]
async fn test_finally_error_keeps_core_diagnostics() {
    init_tracing();
    let provider = Builder::new()
        .resource(
            SERVICE,
            ResourceSpec::new(
                QUEUE,
                "Queue",
                Resource::new()
                    .read(CountingHandler::new())
                    .update(CountingHandler::failing("update failed")),
            )
            .with_interceptor(
                When::FINALLY,
                Why::UPDATE,
                FailingInterceptor::new("cleanup failed"),
            ),
        )
        .build()
        .unwrap();

    let mut state = ResourceData::new("q-1");
    let diags = provider
        .resource(QUEUE)
        .unwrap()
        .update(Context::new(), &mut state, &TestMeta::new())
        .await;

    let summaries: Vec<_> = diags.errors().map(|d| d.summary.as_str()).collect();
    assert_eq!(summaries, ["update failed", "cleanup failed"]);
}

#[tokio::test]
async fn test_missing_create_handler_is_an_error() {
    let provider = Builder::new()
        .resource(
            SERVICE,
            ResourceSpec::new(QUEUE, "Queue", Resource::new().read(CountingHandler::new())),
        )
        .build()
        .unwrap();

    let mut state = ResourceData::new("");
    let diags = provider
        .resource(QUEUE)
        .unwrap()
        .create(Context::new(), &mut state, &TestMeta::new())
        .await;
    assert!(diags.has_error());

    // A missing Update handler only runs the interceptors.
    let diags = provider
        .resource(QUEUE)
        .unwrap()
        .update(Context::new(), &mut state, &TestMeta::new())
        .await;
    assert!(diags.is_empty());
}

#[tokio::test]
async fn test_cancellation_reaches_finally() {
    init_tracing();
    let service = Arc::new(TestTagService::new());
    let meta = tagged_meta(&service, Default::default());
    let token = CancellationToken::new();
    let log = CallLog::default();

    let provider = Builder::new()
        .interceptor(When::FINALLY, Why::all(), RecordingInterceptor::new("cleanup", &log))
        .resource(
            SERVICE,
            ResourceSpec::new(
                QUEUE,
                "Queue",
                Resource::new()
                    .read(CountingHandler::new())
                    .update(CancellingHandler {
                        token: token.clone(),
                    }),
            )
            .with_tags(TagsSpec::new()),
        )
        .build()
        .unwrap();

    let mut state = ResourceData::new("q-1")
        .with_prior_state(json!({"tags_all": {"Env": "dev"}}))
        .with_config(json!({"tags": {"Env": "prod"}}));
    let diags = provider
        .resource(QUEUE)
        .unwrap()
        .update(Context::new().with_cancellation(token), &mut state, &meta)
        .await;

    assert!(!diags.has_error());
    assert_eq!(diags.warnings().count(), 2);
    assert_eq!(service.update_count(), 0);
    assert_eq!(*log.lock().unwrap(), ["cleanup:FINALLY"]);
}

mod common;

use common::{ms, next_terminal, start, start_with};
use resource_orchestrator::effects::RecordingSink;
use resource_orchestrator::model::{Payload, RecordId, RequestKind};
use resource_orchestrator::runtime::EngineConfig;
use resource_orchestrator::transport::mock::{MockTransport, RecordedCall};
use resource_orchestrator::transport::TransportResponse;
use serde_json::json;

fn ids(values: &[i64]) -> Vec<RecordId> {
    values.iter().copied().map(RecordId::from).collect()
}

fn requested_ids(call: &RecordedCall) -> Vec<RecordId> {
    match &call.payload {
        Payload::GetMany { ids } => ids.clone(),
        other => panic!("expected GET_MANY, got {:?}", other),
    }
}

/// Batches arriving inside one quiet window end up in one request.
#[tokio::test(start_paused = true)]
async fn test_bursts_are_coalesced_into_one_get_many() {
    let mock = MockTransport::new();
    mock.expect(RequestKind::GetMany, "posts").return_ok(TransportResponse::data(json!([
        { "id": 1 }, { "id": 2 }, { "id": 3 }
    ])));

    let sink = RecordingSink::new();
    let engine = start(&mock, &sink);
    let mut events = engine.subscribe();
    let posts = engine.resource("posts");

    posts.get_many_accumulate(ids(&[1, 2])).await.unwrap();
    tokio::time::sleep(ms(10)).await;
    posts.get_many_accumulate(ids(&[2, 3])).await.unwrap();

    next_terminal(&mut events, RequestKind::GetMany).await;

    let calls = mock.calls_of(RequestKind::GetMany);
    assert_eq!(calls.len(), 1);
    assert_eq!(requested_ids(&calls[0]), ids(&[1, 2, 3]));
    assert_eq!(posts.records(ids(&[1, 2, 3])).await.unwrap().len(), 3);

    mock.verify();
    drop(posts);
    engine.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_resources_accumulate_independently() {
    let mock = MockTransport::new();
    mock.expect(RequestKind::GetMany, "posts")
        .return_ok(TransportResponse::data(json!([{ "id": 1 }])));
    mock.expect(RequestKind::GetMany, "tags")
        .return_ok(TransportResponse::data(json!([{ "id": 1 }, { "id": 2 }])));

    let sink = RecordingSink::new();
    let engine = start(&mock, &sink);
    let mut events = engine.subscribe();
    let posts = engine.resource("posts");
    let tags = engine.resource("tags");

    posts.get_many_accumulate(ids(&[1])).await.unwrap();
    tags.get_many_accumulate(ids(&[1])).await.unwrap();
    tags.get_many_accumulate(ids(&[2])).await.unwrap();

    next_terminal(&mut events, RequestKind::GetMany).await;
    next_terminal(&mut events, RequestKind::GetMany).await;

    let calls = mock.calls_of(RequestKind::GetMany);
    assert_eq!(calls.len(), 2);
    for call in &calls {
        match call.resource.as_str() {
            "posts" => assert_eq!(requested_ids(call), ids(&[1])),
            "tags" => assert_eq!(requested_ids(call), ids(&[1, 2])),
            other => panic!("unexpected resource {other}"),
        }
    }
    // Same id, different resources: both cached.
    assert!(posts.record(1).await.unwrap().is_some());
    assert!(tags.record(1).await.unwrap().is_some());

    mock.verify();
    drop(posts);
    drop(tags);
    engine.shutdown().await.unwrap();
}

/// A resource that never goes quiet still flushes once `max_wait` is reached.
#[tokio::test(start_paused = true)]
async fn test_continuous_requests_flush_at_max_wait() {
    let mock = MockTransport::new();
    mock.expect(RequestKind::GetMany, "posts")
        .return_ok(TransportResponse::data(json!([])));
    mock.expect(RequestKind::GetMany, "posts")
        .return_ok(TransportResponse::data(json!([])));

    let sink = RecordingSink::new();
    let config = EngineConfig {
        quiescence_ms: 50,
        max_accumulation_ms: Some(200),
        ..EngineConfig::default()
    };
    let engine = start_with(&mock, &sink, config);
    let mut events = engine.subscribe();
    let posts = engine.resource("posts");

    // One id every 30ms keeps the quiet timer from ever running out.
    for id in 1..=10 {
        posts.get_many_accumulate(ids(&[id])).await.unwrap();
        tokio::time::sleep(ms(30)).await;
    }
    next_terminal(&mut events, RequestKind::GetMany).await;
    next_terminal(&mut events, RequestKind::GetMany).await;

    let calls = mock.calls_of(RequestKind::GetMany);
    assert_eq!(calls.len(), 2);
    let first = requested_ids(&calls[0]);
    let second = requested_ids(&calls[1]);
    assert_eq!(first[0], RecordId::from(1));
    assert!(first.len() < 10);

    // Nothing lost, nothing requested twice.
    let all: Vec<RecordId> = first.into_iter().chain(second).collect();
    assert_eq!(all, ids(&[1, 2, 3, 4, 5, 6, 7, 8, 9, 10]));

    mock.verify();
    drop(posts);
    engine.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_flushes_pending_ids() {
    let mock = MockTransport::new();
    mock.expect(RequestKind::GetMany, "posts")
        .return_ok(TransportResponse::data(json!([{ "id": 4 }])));

    let sink = RecordingSink::new();
    let config = EngineConfig {
        quiescence_ms: 60_000,
        max_accumulation_ms: None,
        ..EngineConfig::default()
    };
    let engine = start_with(&mock, &sink, config);
    let posts = engine.resource("posts");

    posts.get_many_accumulate(ids(&[4])).await.unwrap();
    drop(posts);
    engine.shutdown().await.unwrap();

    let calls = mock.calls_of(RequestKind::GetMany);
    assert_eq!(calls.len(), 1);
    assert_eq!(requested_ids(&calls[0]), ids(&[4]));
    mock.verify();
}

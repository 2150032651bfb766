//! Processing Tests
//!
//! Engine + processor against a real HTTP backend (wiremock) and SQLite store.

use offline_queue_core::application::{
    shutdown_channel, PassOutcome, ProcessingWorker, QueueEngine, QueueProcessor,
};
use offline_queue_core::domain::{EnqueueSpec, HttpMethod, Priority, QueueConfig};
use offline_queue_core::port::connectivity::mocks::StaticConnectivity;
use offline_queue_core::port::id_provider::UuidProvider;
use offline_queue_core::port::time_provider::SystemTimeProvider;
use offline_queue_core::port::ConnectivityOracle;
use offline_queue_infra_net::{ConnectivitySwitch, HttpExecutorConfig, HttpRequestExecutor};
use offline_queue_infra_sqlite::{create_pool, run_migrations, SqliteKeyValueStore};
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn setup(
    server: &MockServer,
    connectivity: Arc<dyn ConnectivityOracle>,
) -> (Arc<QueueEngine>, Arc<QueueProcessor>) {
    let pool = create_pool("sqlite::memory:").await.unwrap();
    run_migrations(&pool).await.unwrap();
    let time_provider = Arc::new(SystemTimeProvider);

    let engine = Arc::new(QueueEngine::new(
        Arc::new(SqliteKeyValueStore::new(pool, time_provider.clone())),
        Arc::new(UuidProvider),
        time_provider.clone(),
        QueueConfig::default(),
    ));
    engine.initialize().await;

    let executor = HttpRequestExecutor::new(
        HttpExecutorConfig::new(server.uri())
            .with_auth_token("test-token")
            .with_timeout(Duration::from_secs(2)),
        time_provider,
    )
    .unwrap();

    let processor = Arc::new(QueueProcessor::new(
        engine.clone(),
        connectivity,
        Arc::new(executor),
    ));
    (engine, processor)
}

async fn received_paths(server: &MockServer) -> Vec<String> {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .map(|r| r.url.path().to_string())
        .collect()
}

/// Delivery follows priority order, then age; delivered requests leave the queue
#[tokio::test]
async fn test_delivers_in_priority_order() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(header("Authorization", "Bearer test-token"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let (engine, processor) = setup(&server, Arc::new(StaticConnectivity::online())).await;
    for (endpoint, priority) in [
        ("/low", Priority::Low),
        ("/high", Priority::High),
        ("/critical", Priority::Critical),
        ("/high-later", Priority::High),
    ] {
        engine
            .enqueue(EnqueueSpec::new(endpoint, HttpMethod::Post).with_priority(priority))
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(2)).await;
    }

    let report = processor.process_queue().await;

    assert_eq!(report.outcome, PassOutcome::Completed);
    assert_eq!(report.delivered, 4);
    assert_eq!(engine.get_queue_size().await, 0);
    assert_eq!(
        received_paths(&server).await,
        vec!["/critical", "/high", "/high-later", "/low"]
    );
}

/// A request the server keeps rejecting is abandoned on its fourth failed attempt
#[tokio::test]
async fn test_rejected_request_abandoned_after_retries() {
    let server = MockServer::start().await;
    Mock::given(path("/flaky"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    Mock::given(path("/ok"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;

    let (engine, processor) = setup(&server, Arc::new(StaticConnectivity::online())).await;
    let flaky = engine
        .enqueue(EnqueueSpec::new("/flaky", HttpMethod::Patch))
        .await
        .unwrap();
    engine
        .enqueue(EnqueueSpec::new("/ok", HttpMethod::Delete))
        .await
        .unwrap();

    for expected_retries in 1..=3u32 {
        let report = processor.process_queue().await;
        assert_eq!(report.retried, 1);

        let queue = engine.get_queue().await;
        assert_eq!(queue.len(), 1);
        assert_eq!(queue[0].id, flaky);
        assert_eq!(queue[0].retry_count, expected_retries);
    }

    let report = processor.process_queue().await;
    assert_eq!(report.abandoned, 1);
    assert_eq!(engine.get_queue_size().await, 0);

    let flaky_calls = received_paths(&server)
        .await
        .into_iter()
        .filter(|p| p == "/flaky")
        .count();
    assert_eq!(flaky_calls, 4);
}

/// Offline: no HTTP traffic and no retry accounting
#[tokio::test]
async fn test_offline_pass_touches_nothing() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let (engine, processor) = setup(&server, Arc::new(StaticConnectivity::offline())).await;
    engine
        .enqueue(EnqueueSpec::new("/a", HttpMethod::Post))
        .await
        .unwrap();

    let report = processor.process_queue().await;

    assert_eq!(report.outcome, PassOutcome::Offline);
    let queue = engine.get_queue().await;
    assert_eq!(queue.len(), 1);
    assert_eq!(queue[0].retry_count, 0);
}

/// Unauthenticated requests go out without a token; GET bodies are never sent
#[tokio::test]
async fn test_get_without_auth() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/public/status"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let (engine, processor) = setup(&server, Arc::new(StaticConnectivity::online())).await;
    engine
        .enqueue(
            EnqueueSpec::new("/public/status", HttpMethod::Get)
                .with_requires_auth(false)
                .with_payload(serde_json::json!({"ignored": true})),
        )
        .await
        .unwrap();

    let report = processor.process_queue().await;
    assert_eq!(report.delivered, 1);

    let requests = server.received_requests().await.unwrap_or_default();
    assert!(requests[0].body.is_empty());
    assert!(requests[0].headers.get("authorization").is_none());
}

/// The worker drains the queue as soon as connectivity comes back
#[tokio::test]
async fn test_worker_delivers_on_reconnect() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let switch = Arc::new(ConnectivitySwitch::new(false));
    let (engine, processor) = setup(&server, switch.clone()).await;

    let (shutdown_tx, shutdown_rx) = shutdown_channel();
    let worker = ProcessingWorker::new(processor, Duration::from_secs(3600))
        .with_connectivity_changes(switch.subscribe());
    let handle = tokio::spawn(worker.run(shutdown_rx));

    engine
        .enqueue(EnqueueSpec::new("/queued-while-offline", HttpMethod::Post))
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(received_paths(&server).await.is_empty());

    switch.set_online(true);

    let drained = tokio::time::timeout(Duration::from_secs(2), async {
        while engine.get_queue_size().await > 0 {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await;
    assert!(drained.is_ok(), "queue drained after reconnect");
    assert_eq!(received_paths(&server).await, vec!["/queued-while-offline"]);

    shutdown_tx.shutdown();
    handle.await.unwrap();
}

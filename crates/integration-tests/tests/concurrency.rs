//! Concurrency Tests
//!
//! Producers and the processing loop share one engine instance.

use futures::future::join_all;
use offline_queue_core::application::{PassOutcome, QueueEngine, QueueProcessor};
use offline_queue_core::domain::{EnqueueSpec, HttpMethod, QueueConfig};
use offline_queue_core::port::connectivity::mocks::StaticConnectivity;
use offline_queue_core::port::id_provider::UuidProvider;
use offline_queue_core::port::request_executor::mocks::MockRequestExecutor;
use offline_queue_core::port::time_provider::SystemTimeProvider;
use offline_queue_infra_sqlite::{create_pool, run_migrations, SqliteKeyValueStore};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

async fn sqlite_engine(config: QueueConfig) -> (Arc<QueueEngine>, Arc<SqliteKeyValueStore>) {
    let pool = create_pool("sqlite::memory:").await.unwrap();
    run_migrations(&pool).await.unwrap();
    let time_provider = Arc::new(SystemTimeProvider);
    let store = Arc::new(SqliteKeyValueStore::new(pool, time_provider.clone()));
    let engine = Arc::new(QueueEngine::new(
        store.clone(),
        Arc::new(UuidProvider),
        time_provider,
        config,
    ));
    (engine, store)
}

/// Concurrent producers: every id unique, every request persisted
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_enqueues() {
    let (engine, store) = sqlite_engine(QueueConfig::default()).await;

    let tasks = (0..50).map(|i| {
        let engine = engine.clone();
        async move {
            engine
                .enqueue(EnqueueSpec::new(format!("/items/{}", i), HttpMethod::Post))
                .await
                .unwrap()
        }
    });
    let ids = join_all(tasks).await;

    let unique: HashSet<_> = ids.iter().collect();
    assert_eq!(unique.len(), 50);
    assert_eq!(engine.get_queue_size().await, 50);

    // The last persisted snapshot holds all of them
    let restored = QueueEngine::new(
        store,
        Arc::new(UuidProvider),
        Arc::new(SystemTimeProvider),
        QueueConfig::default(),
    );
    assert_eq!(restored.initialize().await, 50);
}

/// Concurrent producers past capacity never exceed the bound
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_capacity_bound_under_contention() {
    let (engine, _store) = sqlite_engine(QueueConfig::new("offline_queue", 10, 3)).await;

    let tasks = (0..40).map(|i| {
        let engine = engine.clone();
        tokio::spawn(async move {
            engine
                .enqueue(EnqueueSpec::new(format!("/burst/{}", i), HttpMethod::Put))
                .await
                .unwrap();
            engine.get_queue_size().await
        })
    });

    for size in join_all(tasks).await {
        assert!(size.unwrap() <= 10);
    }
    assert_eq!(engine.get_queue_size().await, 10);
}

/// Producers keep enqueuing while a slow pass is in flight; a second trigger is rejected
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_enqueue_during_slow_pass() {
    let (engine, _store) = sqlite_engine(QueueConfig::default()).await;
    let executor = Arc::new(MockRequestExecutor::new_success());
    executor.set_delay(Duration::from_millis(100));
    let processor = Arc::new(QueueProcessor::new(
        engine.clone(),
        Arc::new(StaticConnectivity::online()),
        executor.clone(),
    ));

    engine
        .enqueue(EnqueueSpec::new("/first", HttpMethod::Post))
        .await
        .unwrap();

    let pass = tokio::spawn({
        let processor = processor.clone();
        async move { processor.process_queue().await }
    });
    tokio::time::sleep(Duration::from_millis(20)).await;

    // Not blocked by the in-flight call
    let late = tokio::time::timeout(
        Duration::from_millis(50),
        engine.enqueue(EnqueueSpec::new("/late", HttpMethod::Post)),
    )
    .await
    .expect("enqueue does not wait for the executor")
    .unwrap();

    let overlapping = processor.process_queue().await;
    assert_eq!(overlapping.outcome, PassOutcome::AlreadyRunning);

    let report = pass.await.unwrap();
    assert_eq!(report.delivered, 1);

    let remaining: Vec<_> = engine.get_queue().await.into_iter().map(|r| r.id).collect();
    assert_eq!(remaining, vec![late]);
    assert_eq!(executor.call_count(), 1);
}

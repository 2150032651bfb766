//! Offline Queue Daemon - Main Entry Point
//! Hosts the queue engine, its background workers and the JSON-RPC server

mod logging;
mod settings;

use anyhow::{Context, Result};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

// Import workspace crates
use offline_queue_api_rpc::{RpcServer, RpcServerConfig};
use offline_queue_core::application::{
    shutdown_channel, CleanupScheduler, ProcessingWorker, QueueEngine, QueueProcessor,
};
use offline_queue_core::domain::QueueConfig;
use offline_queue_core::port::id_provider::UuidProvider;
use offline_queue_core::port::time_provider::SystemTimeProvider;
use offline_queue_core::port::ConnectivityOracle;
use offline_queue_infra_net::{
    ConnectivitySwitch, HttpExecutorConfig, HttpRequestExecutor, TcpConnectivityProbe,
};
use offline_queue_infra_sqlite::{create_pool, run_migrations, SqliteKeyValueStore};

use crate::settings::Settings;

const VERSION: &str = env!("CARGO_PKG_VERSION");
const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Load configuration
    let settings = Settings::load()?;

    // 2. Initialize logging
    let _log_guard = logging::init(&settings.log_format, settings.log_dir.as_deref())?;

    info!("Offline Queue v{} starting...", VERSION);

    // 3. Initialize database
    let db_path = settings.expanded_db_path();
    if let Some(parent) = Path::new(&db_path).parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }

    info!(db_path = %db_path, "Initializing database...");
    let pool = create_pool(&format!("sqlite://{}", db_path))
        .await
        .context("DB pool creation failed")?;
    run_migrations(&pool).await.context("Migration failed")?;

    // 4. Setup dependencies (DI wiring)
    let time_provider = Arc::new(SystemTimeProvider);
    let store = Arc::new(SqliteKeyValueStore::new(pool, time_provider.clone()));

    let engine = Arc::new(QueueEngine::new(
        store,
        Arc::new(UuidProvider),
        time_provider.clone(),
        QueueConfig::new(
            settings.storage_key.clone(),
            settings.max_queue_size,
            settings.max_retries,
        ),
    ));
    let restored = engine.initialize().await;
    info!(restored = restored, "Queue restored from previous session");

    let mut executor_config = HttpExecutorConfig::new(settings.api_base_url.clone())
        .with_timeout(settings.request_timeout());
    if let Some(token) = &settings.api_token {
        executor_config = executor_config.with_auth_token(token.clone());
    }
    let executor = Arc::new(
        HttpRequestExecutor::new(executor_config, time_provider.clone())
            .context("HTTP executor setup failed")?,
    );

    // Connectivity: the probe is polled, the switch turns answers into change events
    let probe: Arc<dyn ConnectivityOracle> = Arc::new(TcpConnectivityProbe::new(
        settings.probe_host.clone(),
        settings.probe_port,
        settings.probe_timeout(),
    ));
    let initially_online = probe.should_attempt_network_operation().await;
    let connectivity = Arc::new(ConnectivitySwitch::new(initially_online));
    info!(online = initially_online, "Initial connectivity");

    let processor = Arc::new(QueueProcessor::new(
        engine.clone(),
        connectivity.clone(),
        executor,
    ));

    let (shutdown_tx, shutdown_rx) = shutdown_channel();

    // 5. Start JSON-RPC server
    info!("Starting JSON-RPC server...");
    let rpc_config = RpcServerConfig {
        host: settings.rpc_host.clone(),
        port: settings.rpc_port,
    };
    let (rpc_addr, rpc_handle) = RpcServer::new(rpc_config, engine.clone(), processor.clone())
        .start()
        .await
        .context("RPC server start failed")?;

    // 6. Start background loops
    let follower_handle = tokio::spawn(connectivity.clone().follow(
        probe,
        settings.probe_interval(),
        shutdown_rx.clone(),
    ));

    info!("Starting processing worker...");
    let worker = ProcessingWorker::new(processor, settings.process_interval())
        .with_connectivity_changes(connectivity.subscribe());
    let worker_handle = tokio::spawn(worker.run(shutdown_rx.clone()));

    info!("Starting cleanup scheduler...");
    let cleanup = CleanupScheduler::new(
        engine.clone(),
        settings.max_request_age(),
        settings.cleanup_interval(),
    );
    let cleanup_handle = tokio::spawn(cleanup.run(shutdown_rx));

    info!(rpc = %rpc_addr, "System ready. Press Ctrl+C to shutdown");

    // 7. Wait for shutdown signal
    tokio::signal::ctrl_c().await?;

    info!("Shutdown signal received. Exiting gracefully...");

    // 8. Graceful shutdown
    shutdown_tx.shutdown();
    if let Err(e) = rpc_handle.stop() {
        warn!(error = %e, "RPC server was already stopped");
    }

    let joined = tokio::time::timeout(SHUTDOWN_GRACE, async {
        let _ = tokio::join!(worker_handle, cleanup_handle, follower_handle);
    })
    .await;
    if joined.is_err() {
        warn!("Background tasks did not stop within {:?}", SHUTDOWN_GRACE);
    }

    info!(pending = engine.get_queue_size().await, "Shutdown complete.");

    Ok(())
}

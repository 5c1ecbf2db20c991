use leadrouter::bootstrap;
use leadrouter::config::Config;
use leadrouter::infrastructure::observability;
use leadrouter::infrastructure::persistence::Database;
use leadrouter::infrastructure::workers::SweepWorker;
use std::time::Duration;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config = Config::from_env()?;

    // Initialize tracing and the Prometheus exporter
    let _observability = observability::init(&config)
        .map_err(|e| anyhow::anyhow!("Failed to initialize observability: {}", e))?;
    tracing::info!("Configuration loaded");

    // Initialize database connection
    let db = Database::connect(&config.database_url).await?;
    tracing::info!("Database connection established");

    // Run migrations
    db.run_migrations().await?;
    tracing::info!("Database migrations applied");

    // Build engine services
    let state = bootstrap::build_app_state(db);

    // Start the queue maintenance worker
    let worker = SweepWorker::new(
        state.queue_service.clone(),
        Duration::from_secs(config.sweep_interval_seconds),
    );
    let worker_handle = tokio::spawn(async move { worker.run().await });

    tracing::info!("Queue maintenance daemon running; press Ctrl-C to stop");
    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutdown signal received");
    worker_handle.abort();

    Ok(())
}

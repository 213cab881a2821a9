//! Batch ingestion API server: POST /ingest, GET /status/{ingestion_id}.

use ingest_api::{config::AppConfig, server};
use ingest_scheduler::InMemoryScheduler;
use ingest_service::IngestionService;
use ingest_types::{BatchStore, FetchWorker, UuidIdSource};
use ingest_worker::{HttpFetcher, SimulatedFetcher};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::from_env()?;
    let store = open_store(&config)?;
    let worker: Arc<dyn FetchWorker> = match HttpFetcher::from_env() {
        Some(http) => Arc::new(http),
        None => {
            let sim = SimulatedFetcher::from_env();
            tracing::info!(latency_ms = sim.latency().as_millis() as u64, "using simulated fetcher");
            Arc::new(sim)
        }
    };
    let scheduler = Arc::new(InMemoryScheduler::new(
        Arc::clone(&store),
        worker,
        config.scheduler.clone(),
    ));
    let service = Arc::new(IngestionService::new(
        store,
        scheduler,
        Arc::new(UuidIdSource),
        config.service.clone(),
    ));
    service.recover().await?;

    let app = server::router(Arc::new(server::AppState { service }));
    tracing::info!(
        batch_size = config.service.batch_size,
        batch_delay_ms = config.scheduler.batch_delay.as_millis() as u64,
        "ingestion API listening on {}",
        config.listen
    );
    axum::serve(
        tokio::net::TcpListener::bind(config.listen).await?,
        app.into_make_service(),
    )
    .await?;
    Ok(())
}

#[cfg(feature = "sqlite")]
fn open_store(
    config: &AppConfig,
) -> Result<Arc<dyn BatchStore>, Box<dyn std::error::Error + Send + Sync>> {
    match config.sqlite_path {
        Some(ref path) => {
            tracing::info!(path = %path, "using sqlite store");
            Ok(Arc::new(ingest_store::SqliteBatchStore::new(path)?))
        }
        None => Ok(Arc::new(ingest_store::InMemoryBatchStore::new())),
    }
}

#[cfg(not(feature = "sqlite"))]
fn open_store(
    config: &AppConfig,
) -> Result<Arc<dyn BatchStore>, Box<dyn std::error::Error + Send + Sync>> {
    if config.sqlite_path.is_some() {
        tracing::warn!("INGEST_SQLITE_PATH set but built without the sqlite feature; using memory");
    }
    Ok(Arc::new(ingest_store::InMemoryBatchStore::new()))
}

use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer,
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use learning_assistant_api::{
    ai,
    config::Config,
    db::{self, DocumentStore, InMemoryDocumentStore, PgDocumentStore},
    routes,
    state::AppState,
    storage::{BlobStore, LocalBlobStore, S3BlobStore},
    views::Views,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing/logging
    init_tracing();

    tracing::info!("Starting learning assistant API server...");

    // Load configuration
    let config = Config::from_env()?;
    tracing::info!(
        "Loaded configuration: server={}:{} ingestion_mode={:?}",
        config.server.host,
        config.server.port,
        config.ingestion.mode
    );

    let store = build_store(&config).await?;

    // Any documents in "processing" state when the server starts are orphaned from a crashed run
    let stale_count = store.fail_interrupted().await?;
    if stale_count > 0 {
        tracing::warn!(
            "Marked {} stale processing documents as failed on startup",
            stale_count
        );
    }

    let blobs: Arc<dyn BlobStore> = if config.uses_object_storage() {
        tracing::info!("Initializing S3-compatible object storage");
        Arc::new(S3BlobStore::new(&config.storage)?)
    } else {
        tracing::warn!(
            "Object storage credentials not found - storing uploads under {}",
            config.storage.upload_dir
        );
        Arc::new(LocalBlobStore::new(&config.storage.upload_dir))
    };

    // One HTTP client shared by every AI provider
    let http_client = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.server.http_timeout_seconds))
        .build()
        .context("Failed to build HTTP client")?;

    let embedder = ai::build_embedder(&config.ai, http_client.clone())?;
    let generator = ai::build_generator(&config.ai, http_client)?;
    let views = Views::new()?;

    let addr = config.server_address();
    let state = AppState::new(config, store, blobs, embedder, generator, views);

    // Build router with middleware
    let app = routes::create_router(state).layer(
        ServiceBuilder::new()
            // Logging layer
            .layer(
                TraceLayer::new_for_http()
                    .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                    .on_response(DefaultOnResponse::new().level(Level::INFO)),
            )
            .layer(CorsLayer::permissive())
            .layer(CompressionLayer::new()),
    );

    // Start server
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("Server listening on http://{}", addr);
    tracing::info!("Health check available at http://{}/health", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Postgres + pgvector when a database is configured, otherwise process memory
async fn build_store(config: &Config) -> Result<Arc<dyn DocumentStore>> {
    match &config.database.url {
        Some(url) => {
            let pool = db::create_pool(url, config.database.max_connections).await?;
            db::run_migrations(&pool).await?;
            Ok(Arc::new(PgDocumentStore::new(pool, config.database.distance)))
        }
        None => {
            tracing::warn!("DATABASE_URL not set - documents and embeddings are kept in memory only");
            Ok(Arc::new(InMemoryDocumentStore::new(config.database.distance)))
        }
    }
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "learning_assistant_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

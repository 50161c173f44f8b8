pub mod memory;
pub mod postgres;

pub use memory::InMemoryDocumentStore;
pub use postgres::PgDocumentStore;

use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;
use uuid::Uuid;

use crate::config::DistanceMetric;
use crate::errors::Result;
use crate::ingestion::EmbeddedChunk;
use crate::models::{Document, DocumentStatus, RetrievedChunk};

pub type DbPool = PgPool;

/// Metadata and vector store for uploaded documents
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Distance used by `nearest_chunks`
    fn distance(&self) -> DistanceMetric;

    async fn insert_document(&self, doc: &Document) -> Result<()>;

    async fn get_document(&self, id: Uuid) -> Result<Option<Document>>;

    async fn update_status(
        &self,
        id: Uuid,
        status: DocumentStatus,
        error_message: Option<&str>,
    ) -> Result<()>;

    /// Write every chunk of a document atomically and mark it processed.
    /// Returns the number of chunks stored.
    async fn store_chunks(&self, id: Uuid, chunks: &[EmbeddedChunk]) -> Result<usize>;

    /// The `limit` stored chunks of one document nearest to `embedding`, closest first
    async fn nearest_chunks(
        &self,
        id: Uuid,
        embedding: &[f32],
        limit: usize,
    ) -> Result<Vec<RetrievedChunk>>;

    /// Chunk texts of a document in sequence order
    async fn chunk_texts(&self, id: Uuid, limit: usize) -> Result<Vec<String>>;

    async fn count_chunks(&self, id: Uuid) -> Result<i64>;

    /// Mark documents stuck in `processing` as failed. Returns how many changed.
    async fn fail_interrupted(&self) -> Result<u64>;

    async fn health_check(&self) -> Result<()>;
}

/// Creates a PostgreSQL connection pool with optimized settings
pub async fn create_pool(database_url: &str, max_connections: u32) -> std::result::Result<DbPool, sqlx::Error> {
    tracing::info!(
        "Connecting to database with max_connections={}",
        max_connections
    );

    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .min_connections(1)
        .acquire_timeout(Duration::from_secs(5))
        .idle_timeout(Duration::from_secs(600))
        .max_lifetime(Duration::from_secs(1800))
        .connect(database_url)
        .await?;

    // Test the connection
    sqlx::query("SELECT 1").execute(&pool).await?;

    tracing::info!("Database connection pool created successfully");

    Ok(pool)
}

/// Apply the bundled schema migrations
pub async fn run_migrations(pool: &DbPool) -> Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    tracing::info!("Database migrations applied");
    Ok(())
}

/// Format an embedding as a pgvector literal: `[1,2,3]`
pub(crate) fn vector_literal(embedding: &[f32]) -> String {
    format!(
        "[{}]",
        embedding
            .iter()
            .map(|x| x.to_string())
            .collect::<Vec<_>>()
            .join(",")
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vector_literal() {
        assert_eq!(vector_literal(&[1.0, -0.5, 0.25]), "[1,-0.5,0.25]");
        assert_eq!(vector_literal(&[]), "[]");
    }
}

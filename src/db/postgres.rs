use async_trait::async_trait;
use uuid::Uuid;

use super::{vector_literal, DbPool, DocumentStore};
use crate::config::DistanceMetric;
use crate::errors::Result;
use crate::ingestion::EmbeddedChunk;
use crate::models::{Document, DocumentStatus, RetrievedChunk};

/// Postgres + pgvector backed store
#[derive(Clone)]
pub struct PgDocumentStore {
    pool: DbPool,
    distance: DistanceMetric,
}

impl PgDocumentStore {
    pub fn new(pool: DbPool, distance: DistanceMetric) -> Self {
        Self { pool, distance }
    }

    /// pgvector operator for the configured metric
    fn distance_operator(&self) -> &'static str {
        match self.distance {
            DistanceMetric::Euclidean => "<->",
            DistanceMetric::Cosine => "<=>",
        }
    }
}

/// Postgres rejects negative limits, so saturate instead of wrapping
fn sql_limit(limit: usize) -> i64 {
    i64::try_from(limit).unwrap_or(i64::MAX)
}

#[async_trait]
impl DocumentStore for PgDocumentStore {
    fn distance(&self) -> DistanceMetric {
        self.distance
    }

    async fn insert_document(&self, doc: &Document) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO documents
                (id, user_id, file_name, storage_path, page_count, status, chunk_count, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(doc.id)
        .bind(&doc.user_id)
        .bind(&doc.file_name)
        .bind(&doc.storage_path)
        .bind(doc.page_count)
        .bind(doc.status)
        .bind(doc.chunk_count)
        .bind(doc.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get_document(&self, id: Uuid) -> Result<Option<Document>> {
        let doc = sqlx::query_as::<_, Document>(
            r#"
            SELECT id, user_id, file_name, storage_path, page_count, status,
                   error_message, chunk_count, created_at, processed_at
            FROM documents
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(doc)
    }

    async fn update_status(
        &self,
        id: Uuid,
        status: DocumentStatus,
        error_message: Option<&str>,
    ) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE documents
            SET status = $2, error_message = $3
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(status)
        .bind(error_message)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn store_chunks(&self, id: Uuid, chunks: &[EmbeddedChunk]) -> Result<usize> {
        let mut tx = self.pool.begin().await?;

        // A re-run replaces the previous pass rather than adding to it
        sqlx::query("DELETE FROM embeddings WHERE document_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        for embedded in chunks {
            sqlx::query(
                r#"
                INSERT INTO embeddings (document_id, chunk_index, content, embedding)
                VALUES ($1, $2, $3, $4::vector)
                "#,
            )
            .bind(id)
            .bind(embedded.chunk.index as i32)
            .bind(&embedded.chunk.content)
            .bind(vector_literal(&embedded.embedding))
            .execute(&mut *tx)
            .await?;
        }

        sqlx::query(
            r#"
            UPDATE documents
            SET status = 'processed', chunk_count = $2, processed_at = NOW(), error_message = NULL
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(chunks.len() as i32)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(chunks.len())
    }

    async fn nearest_chunks(
        &self,
        id: Uuid,
        embedding: &[f32],
        limit: usize,
    ) -> Result<Vec<RetrievedChunk>> {
        let query = format!(
            r#"
            SELECT chunk_index, content, (embedding {op} $2::vector)::float8 AS distance
            FROM embeddings
            WHERE document_id = $1
            ORDER BY embedding {op} $2::vector
            LIMIT $3
            "#,
            op = self.distance_operator()
        );

        let results = sqlx::query_as::<_, RetrievedChunk>(&query)
            .bind(id)
            .bind(vector_literal(embedding))
            .bind(sql_limit(limit))
            .fetch_all(&self.pool)
            .await?;

        Ok(results)
    }

    async fn chunk_texts(&self, id: Uuid, limit: usize) -> Result<Vec<String>> {
        let rows: Vec<(String,)> = sqlx::query_as(
            r#"
            SELECT content FROM embeddings
            WHERE document_id = $1
            ORDER BY chunk_index
            LIMIT $2
            "#,
        )
        .bind(id)
        .bind(sql_limit(limit))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|(content,)| content).collect())
    }

    async fn count_chunks(&self, id: Uuid) -> Result<i64> {
        let count: (i64,) = sqlx::query_as(
            r#"
            SELECT COUNT(*) FROM embeddings
            WHERE document_id = $1
            "#,
        )
        .bind(id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count.0)
    }

    async fn fail_interrupted(&self) -> Result<u64> {
        let affected = sqlx::query(
            r#"
            UPDATE documents
            SET status = 'failed',
                error_message = 'Processing interrupted by server restart'
            WHERE status = 'processing'
            "#,
        )
        .execute(&self.pool)
        .await?
        .rows_affected();

        Ok(affected)
    }

    async fn health_check(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

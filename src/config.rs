use anyhow::{Context, Result};
use serde::Deserialize;
use std::env;
use std::str::FromStr;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub storage: StorageConfig,
    pub ai: AiConfig,
    pub ingestion: IngestionConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub max_upload_size_mb: usize,
    pub http_timeout_seconds: u64,
    /// Owner recorded on uploaded documents until real accounts exist
    pub default_user_id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: Option<String>,
    pub max_connections: u32,
    pub distance: DistanceMetric,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    pub upload_dir: String,
    pub s3_bucket: Option<String>,
    pub s3_endpoint: Option<String>,
    pub s3_region: String,
    pub s3_access_key_id: Option<String>,
    pub s3_secret_access_key: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AiConfig {
    pub llm_provider: LlmProvider,
    pub embedding_provider: EmbeddingProvider,
    pub gemini_api_key: Option<String>,
    pub gemini_base_url: String,
    pub gemini_model: String,
    pub openai_api_key: Option<String>,
    pub openai_base_url: String,
    pub openai_model: String,
    pub embedding_model: Option<String>,
    pub embedding_dimension: Option<usize>,
    pub embedding_call_delay_ms: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct IngestionConfig {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    pub top_k: usize,
    pub mode: IngestionMode,
}

/// Which generative-text backend answers prompts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LlmProvider {
    Gemini,
    /// Any OpenAI-compatible chat completions API (Groq, OpenAI, vLLM, ...)
    OpenAi,
    Mock,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingProvider {
    Gemini,
    OpenAi,
    /// On-device sentence-transformer (fastembed), no rate limit
    Local,
    /// Deterministic byte-hash vectors for offline development and tests; not semantic
    Hash,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IngestionMode {
    /// Upload returns immediately, the pipeline runs in a spawned task
    Background,
    /// Upload blocks until extraction, embedding and storage finish
    Inline,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DistanceMetric {
    Euclidean,
    Cosine,
}

impl FromStr for LlmProvider {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "gemini" => Ok(LlmProvider::Gemini),
            "openai" | "groq" => Ok(LlmProvider::OpenAi),
            "mock" => Ok(LlmProvider::Mock),
            other => anyhow::bail!("Unknown LLM provider '{}'", other),
        }
    }
}

impl FromStr for EmbeddingProvider {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "gemini" => Ok(EmbeddingProvider::Gemini),
            "openai" => Ok(EmbeddingProvider::OpenAi),
            "local" => Ok(EmbeddingProvider::Local),
            "hash" => Ok(EmbeddingProvider::Hash),
            other => anyhow::bail!("Unknown embedding provider '{}'", other),
        }
    }
}

impl FromStr for IngestionMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "background" => Ok(IngestionMode::Background),
            "inline" => Ok(IngestionMode::Inline),
            other => anyhow::bail!("Unknown ingestion mode '{}'", other),
        }
    }
}

impl FromStr for DistanceMetric {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "euclidean" | "l2" => Ok(DistanceMetric::Euclidean),
            "cosine" => Ok(DistanceMetric::Cosine),
            other => anyhow::bail!("Unknown vector distance '{}'", other),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 8080,
                max_upload_size_mb: 50,
                http_timeout_seconds: 60,
                default_user_id: "temp_user_id_123".to_string(),
            },
            database: DatabaseConfig {
                url: None,
                max_connections: 10,
                distance: DistanceMetric::Euclidean,
            },
            storage: StorageConfig {
                upload_dir: "data".to_string(),
                s3_bucket: None,
                s3_endpoint: None,
                s3_region: "auto".to_string(),
                s3_access_key_id: None,
                s3_secret_access_key: None,
            },
            ai: AiConfig {
                llm_provider: LlmProvider::Mock,
                embedding_provider: EmbeddingProvider::Local,
                gemini_api_key: None,
                gemini_base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
                gemini_model: "gemini-2.5-pro".to_string(),
                openai_api_key: None,
                openai_base_url: "https://api.groq.com/openai/v1".to_string(),
                openai_model: "llama-3.1-8b-instant".to_string(),
                embedding_model: None,
                embedding_dimension: None,
                embedding_call_delay_ms: None,
            },
            ingestion: IngestionConfig {
                chunk_size: 1000,
                chunk_overlap: 100,
                top_k: 5,
                mode: IngestionMode::Background,
            },
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        // Load .env file if it exists (for local development)
        dotenvy::dotenv().ok();

        let defaults = Config::default();

        let mut llm_provider = parse_or("LLM_PROVIDER", defaults.ai.llm_provider)?;
        if env::var("USE_MOCK_AI").map(|v| v.eq_ignore_ascii_case("true")).unwrap_or(false) {
            llm_provider = LlmProvider::Mock;
        }

        let config = Config {
            server: ServerConfig {
                host: env::var("HOST").unwrap_or(defaults.server.host),
                port: parse_or("PORT", defaults.server.port)?,
                max_upload_size_mb: parse_or(
                    "MAX_UPLOAD_SIZE_MB",
                    defaults.server.max_upload_size_mb,
                )?,
                http_timeout_seconds: parse_or(
                    "HTTP_TIMEOUT_SECONDS",
                    defaults.server.http_timeout_seconds,
                )?,
                default_user_id: env::var("DEFAULT_USER_ID")
                    .unwrap_or(defaults.server.default_user_id),
            },
            database: DatabaseConfig {
                url: env::var("DATABASE_URL")
                    .or_else(|_| env::var("SUPABASE_DB_URL"))
                    .ok(),
                max_connections: parse_or(
                    "DATABASE_MAX_CONNECTIONS",
                    defaults.database.max_connections,
                )?,
                distance: parse_or("VECTOR_DISTANCE", defaults.database.distance)?,
            },
            storage: StorageConfig {
                upload_dir: env::var("UPLOAD_DIR").unwrap_or(defaults.storage.upload_dir),
                s3_bucket: env::var("S3_BUCKET").ok(),
                s3_endpoint: env::var("S3_ENDPOINT").ok(),
                s3_region: env::var("S3_REGION").unwrap_or(defaults.storage.s3_region),
                s3_access_key_id: env::var("S3_ACCESS_KEY_ID").ok(),
                s3_secret_access_key: env::var("S3_SECRET_ACCESS_KEY").ok(),
            },
            ai: AiConfig {
                llm_provider,
                embedding_provider: parse_or(
                    "EMBEDDING_PROVIDER",
                    defaults.ai.embedding_provider,
                )?,
                gemini_api_key: env::var("GEMINI_API_KEY").ok(),
                gemini_base_url: env::var("GEMINI_BASE_URL")
                    .unwrap_or(defaults.ai.gemini_base_url),
                gemini_model: env::var("GEMINI_MODEL").unwrap_or(defaults.ai.gemini_model),
                openai_api_key: env::var("OPENAI_API_KEY")
                    .or_else(|_| env::var("GROQ_API_KEY"))
                    .ok(),
                openai_base_url: env::var("OPENAI_BASE_URL")
                    .or_else(|_| env::var("GROQ_BASE_URL"))
                    .unwrap_or(defaults.ai.openai_base_url),
                openai_model: env::var("OPENAI_MODEL").unwrap_or(defaults.ai.openai_model),
                embedding_model: env::var("EMBEDDING_MODEL").ok(),
                embedding_dimension: parse_optional("EMBEDDING_DIMENSION")?,
                embedding_call_delay_ms: parse_optional("EMBEDDING_CALL_DELAY_MS")?,
            },
            ingestion: IngestionConfig {
                chunk_size: parse_or("CHUNK_SIZE", defaults.ingestion.chunk_size)?,
                chunk_overlap: parse_or("CHUNK_OVERLAP", defaults.ingestion.chunk_overlap)?,
                top_k: parse_or("RETRIEVAL_TOP_K", defaults.ingestion.top_k)?,
                mode: parse_or("INGESTION_MODE", defaults.ingestion.mode)?,
            },
        };

        config.validate()?;

        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.ingestion.chunk_size == 0 {
            anyhow::bail!("CHUNK_SIZE must be greater than zero");
        }
        if self.ingestion.chunk_overlap >= self.ingestion.chunk_size {
            anyhow::bail!("CHUNK_OVERLAP must be smaller than CHUNK_SIZE");
        }
        if self.ingestion.top_k == 0 {
            anyhow::bail!("RETRIEVAL_TOP_K must be greater than zero");
        }
        Ok(())
    }

    /// True when every setting needed to talk to S3-compatible storage is present
    pub fn uses_object_storage(&self) -> bool {
        self.storage.s3_bucket.is_some()
            && self.storage.s3_access_key_id.is_some()
            && self.storage.s3_secret_access_key.is_some()
    }

    pub fn max_upload_bytes(&self) -> usize {
        self.server.max_upload_size_mb * 1024 * 1024
    }

    pub fn server_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

fn parse_or<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|e| anyhow::anyhow!("{}", e))
            .with_context(|| format!("Failed to parse {}", key)),
        Err(_) => Ok(default),
    }
}

fn parse_optional<T>(key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|e| anyhow::anyhow!("{}", e))
            .with_context(|| format!("Failed to parse {}", key)),
        Err(_) => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.ingestion.chunk_size, 1000);
        assert_eq!(config.ingestion.chunk_overlap, 100);
        assert_eq!(config.ingestion.top_k, 5);
        assert_eq!(config.ai.embedding_provider, EmbeddingProvider::Local);
        assert!(!config.uses_object_storage());
    }

    #[test]
    fn test_overlap_must_be_smaller_than_size() {
        let mut config = Config::default();
        config.ingestion.chunk_overlap = 1000;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_provider_parsing() {
        assert_eq!("groq".parse::<LlmProvider>().unwrap(), LlmProvider::OpenAi);
        assert_eq!("Gemini".parse::<LlmProvider>().unwrap(), LlmProvider::Gemini);
        assert_eq!("local".parse::<EmbeddingProvider>().unwrap(), EmbeddingProvider::Local);
        assert_eq!("hash".parse::<EmbeddingProvider>().unwrap(), EmbeddingProvider::Hash);
        assert_eq!("l2".parse::<DistanceMetric>().unwrap(), DistanceMetric::Euclidean);
        assert_eq!("inline".parse::<IngestionMode>().unwrap(), IngestionMode::Inline);
        assert!("bogus".parse::<LlmProvider>().is_err());
    }
}

pub mod gemini;
pub mod local;
pub mod openai;

use anyhow::{Context, Result};
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;

use crate::config::{AiConfig, EmbeddingProvider, LlmProvider};
use crate::ingestion::{Embedder, HashEmbedder};
use crate::llm::{SimulatedLLM, TextGenerator};
use gemini::{GeminiClient, GeminiEmbedder, GeminiGenerator};
use local::LocalEmbedder;
use openai::{OpenAiClient, OpenAiEmbedder, OpenAiGenerator};

/// Build the embedder selected by configuration
pub fn build_embedder(config: &AiConfig, http_client: Client) -> Result<Arc<dyn Embedder>> {
    let embedder: Arc<dyn Embedder> = match config.embedding_provider {
        EmbeddingProvider::Gemini => {
            let api_key = config
                .gemini_api_key
                .clone()
                .context("GEMINI_API_KEY must be set for the gemini embedding provider")?;
            let client = GeminiClient::new(http_client, api_key, config.gemini_base_url.clone());
            Arc::new(GeminiEmbedder::new(
                client,
                config
                    .embedding_model
                    .clone()
                    .unwrap_or_else(|| gemini::DEFAULT_EMBEDDING_MODEL.to_string()),
                config
                    .embedding_dimension
                    .unwrap_or(gemini::DEFAULT_EMBEDDING_DIMENSION),
                config
                    .embedding_call_delay_ms
                    .map(Duration::from_millis)
                    .unwrap_or(gemini::DEFAULT_EMBEDDING_DELAY),
            ))
        }
        EmbeddingProvider::OpenAi => {
            let api_key = config
                .openai_api_key
                .clone()
                .context("OPENAI_API_KEY must be set for the openai embedding provider")?;
            let client = OpenAiClient::new(http_client, api_key, config.openai_base_url.clone());
            Arc::new(OpenAiEmbedder::new(
                client,
                config
                    .embedding_model
                    .clone()
                    .unwrap_or_else(|| openai::DEFAULT_EMBEDDING_MODEL.to_string()),
                config
                    .embedding_dimension
                    .unwrap_or(openai::DEFAULT_EMBEDDING_DIMENSION),
            ))
        }
        EmbeddingProvider::Local => Arc::new(LocalEmbedder::new(
            config
                .embedding_model
                .as_deref()
                .unwrap_or(local::DEFAULT_MODEL),
            config
                .embedding_dimension
                .unwrap_or(local::DEFAULT_DIMENSION),
        )?),
        EmbeddingProvider::Hash => {
            tracing::warn!("Using hash embedder; retrieval is lexical, not semantic");
            Arc::new(HashEmbedder::new(
                config
                    .embedding_dimension
                    .unwrap_or(HashEmbedder::DEFAULT_DIMENSION),
            ))
        }
    };

    tracing::info!(
        embedder = embedder.name(),
        dimension = embedder.dimension(),
        "Embedding provider ready"
    );

    Ok(embedder)
}

/// Build the text generator selected by configuration
pub fn build_generator(config: &AiConfig, http_client: Client) -> Result<Arc<dyn TextGenerator>> {
    let generator: Arc<dyn TextGenerator> = match config.llm_provider {
        LlmProvider::Gemini => {
            let api_key = config
                .gemini_api_key
                .clone()
                .context("GEMINI_API_KEY must be set for the gemini LLM provider")?;
            let client = GeminiClient::new(http_client, api_key, config.gemini_base_url.clone());
            Arc::new(GeminiGenerator::new(client, config.gemini_model.clone()))
        }
        LlmProvider::OpenAi => {
            let api_key = config
                .openai_api_key
                .clone()
                .context("OPENAI_API_KEY or GROQ_API_KEY must be set for the openai LLM provider")?;
            let client = OpenAiClient::new(http_client, api_key, config.openai_base_url.clone());
            Arc::new(OpenAiGenerator::new(client, config.openai_model.clone()))
        }
        LlmProvider::Mock => {
            tracing::warn!("Using simulated LLM; answers are canned");
            Arc::new(SimulatedLLM::new())
        }
    };

    tracing::info!(generator = generator.name(), "LLM provider ready");

    Ok(generator)
}

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::ingestion::Embedder;
use crate::llm::{GenerationRequest, TextGenerator};

pub const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-004";
pub const DEFAULT_EMBEDDING_DIMENSION: usize = 768;
/// Free-tier embedding quota is per minute; space calls out
pub const DEFAULT_EMBEDDING_DELAY: Duration = Duration::from_millis(200);

/// Thin client for the Gemini REST API
#[derive(Clone)]
pub struct GeminiClient {
    http_client: Client,
    api_key: String,
    base_url: String,
}

impl GeminiClient {
    pub fn new(http_client: Client, api_key: String, base_url: String) -> Self {
        Self {
            http_client,
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub async fn generate_content(&self, model: &str, system: &str, prompt: &str) -> Result<String> {
        let url = format!("{}/models/{}:generateContent", self.base_url, model);

        let request_body = GenerateContentRequest {
            system_instruction: Content {
                role: None,
                parts: vec![Part {
                    text: system.to_string(),
                }],
            },
            contents: vec![Content {
                role: Some("user".to_string()),
                parts: vec![Part {
                    text: prompt.to_string(),
                }],
            }],
        };

        let response = self
            .http_client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&request_body)
            .send()
            .await
            .context("Failed to call Gemini generateContent API")?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            anyhow::bail!(
                "Gemini generateContent API failed with status {}: {}",
                status,
                error_text
            );
        }

        let content_response: GenerateContentResponse = response
            .json()
            .await
            .context("Failed to parse Gemini generateContent response")?;

        let text = content_response
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|c| {
                c.parts
                    .into_iter()
                    .map(|p| p.text)
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default();

        if text.trim().is_empty() {
            anyhow::bail!("Gemini returned an empty response");
        }

        Ok(text)
    }

    pub async fn embed_content(&self, model: &str, text: &str) -> Result<Vec<f32>> {
        let url = format!("{}/models/{}:embedContent", self.base_url, model);

        let request_body = EmbedContentRequest {
            model: format!("models/{}", model),
            content: Content {
                role: None,
                parts: vec![Part {
                    text: text.to_string(),
                }],
            },
        };

        let response = self
            .http_client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&request_body)
            .send()
            .await
            .context("Failed to call Gemini embedContent API")?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            anyhow::bail!(
                "Gemini embedContent API failed with status {}: {}",
                status,
                error_text
            );
        }

        let embed_response: EmbedContentResponse = response
            .json()
            .await
            .context("Failed to parse Gemini embedding response")?;

        Ok(embed_response.embedding.values)
    }
}

/// Gemini chat model as a [`TextGenerator`]
#[derive(Clone)]
pub struct GeminiGenerator {
    client: GeminiClient,
    model: String,
}

impl GeminiGenerator {
    pub fn new(client: GeminiClient, model: String) -> Self {
        Self { client, model }
    }
}

#[async_trait]
impl TextGenerator for GeminiGenerator {
    fn name(&self) -> &str {
        &self.model
    }

    async fn generate(&self, request: &GenerationRequest) -> Result<String> {
        tracing::debug!(
            model = %self.model,
            prompt_chars = request.prompt.len(),
            "Calling Gemini"
        );
        self.client
            .generate_content(&self.model, &request.system, &request.prompt)
            .await
    }
}

#[derive(Clone)]
pub struct GeminiEmbedder {
    client: GeminiClient,
    model: String,
    dimension: usize,
    call_delay: Duration,
}

impl GeminiEmbedder {
    pub fn new(client: GeminiClient, model: String, dimension: usize, call_delay: Duration) -> Self {
        Self {
            client,
            model,
            dimension,
            call_delay,
        }
    }
}

#[async_trait]
impl Embedder for GeminiEmbedder {
    fn name(&self) -> &str {
        &self.model
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn call_delay(&self) -> Duration {
        self.call_delay
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.client.embed_content(&self.model, text).await
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    system_instruction: Content,
    contents: Vec<Content>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Debug, Serialize)]
struct EmbedContentRequest {
    model: String,
    content: Content,
}

#[derive(Debug, Deserialize)]
struct EmbedContentResponse {
    embedding: EmbeddingValues,
}

#[derive(Debug, Deserialize)]
struct EmbeddingValues {
    values: Vec<f32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_request_shape() {
        let body = GenerateContentRequest {
            system_instruction: Content {
                role: None,
                parts: vec![Part {
                    text: "sys".to_string(),
                }],
            },
            contents: vec![Content {
                role: Some("user".to_string()),
                parts: vec![Part {
                    text: "hi".to_string(),
                }],
            }],
        };
        let json = serde_json::to_value(&body).unwrap();

        assert_eq!(json["systemInstruction"]["parts"][0]["text"], "sys");
        assert!(json["systemInstruction"].get("role").is_none());
        assert_eq!(json["contents"][0]["role"], "user");
    }

    #[test]
    fn test_parse_generate_response() {
        let raw = r#"{"candidates":[{"content":{"role":"model","parts":[{"text":"Hello "},{"text":"world"}]}}]}"#;
        let parsed: GenerateContentResponse = serde_json::from_str(raw).unwrap();
        let parts = &parsed.candidates[0].content.as_ref().unwrap().parts;
        assert_eq!(parts.len(), 2);
        assert_eq!(parts[1].text, "world");
    }

    #[test]
    fn test_parse_embedding_response() {
        let raw = r#"{"embedding":{"values":[0.1,0.2,0.3]}}"#;
        let parsed: EmbedContentResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.embedding.values.len(), 3);
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let client = GeminiClient::new(Client::new(), "key".to_string(), "http://x/v1beta/".to_string());
        assert_eq!(client.base_url, "http://x/v1beta");
    }
}

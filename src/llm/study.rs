use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, warn};

use super::prompts::{self, NO_RELEVANT_INFORMATION};
use super::{GenerationRequest, GenerationTask, TextGenerator};
use crate::errors::{AppError, Result};
use crate::models::{Flashcard, RetrievedChunk};

pub const FLASHCARD_ERROR_QUESTION: &str = "Error generating flashcards";

/// First `[` to last `]`, across newlines
static JSON_ARRAY_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)\[.*\]").unwrap());

/// Summarise a document's text. Returns the model's Markdown.
pub async fn summarize(generator: &dyn TextGenerator, text: &str) -> Result<String> {
    let request = GenerationRequest::new(GenerationTask::Summary, prompts::summary_prompt(text));

    generator
        .generate(&request)
        .await
        .map_err(|e| AppError::Upstream(format!("{:#}", e)))
}

/// Produce study cards from document text.
///
/// Never fails: any problem (no text, provider error, unparseable reply)
/// becomes a single card describing the error.
pub async fn generate_flashcards(
    generator: &dyn TextGenerator,
    text: Option<&str>,
) -> Vec<Flashcard> {
    let text = match text.map(str::trim).filter(|t| !t.is_empty()) {
        Some(text) => text,
        None => return vec![error_card("Failed to extract text from the PDF.")],
    };

    let request =
        GenerationRequest::new(GenerationTask::Flashcards, prompts::flashcards_prompt(text));

    let reply = match generator.generate(&request).await {
        Ok(reply) => reply,
        Err(e) => {
            warn!(provider = generator.name(), error = ?e, "Flashcard generation failed");
            return vec![error_card(&format!("{:#}", e))];
        }
    };

    match parse_flashcards(&reply) {
        Ok(cards) => {
            debug!(count = cards.len(), "Parsed flashcards");
            cards
        }
        Err(message) => {
            warn!(error = %message, "Model returned unusable flashcards");
            vec![error_card(&message)]
        }
    }
}

/// Pull a `[{question, answer}, ...]` array out of a model reply.
///
/// Code fences are stripped first, then everything from the first `[` to the
/// last `]` is parsed.
pub fn parse_flashcards(reply: &str) -> std::result::Result<Vec<Flashcard>, String> {
    let cleaned = reply.replace("```json", "").replace("```", "");

    let array = JSON_ARRAY_REGEX
        .find(&cleaned)
        .ok_or_else(|| "No JSON array found in model output".to_string())?;

    let cards: Vec<Flashcard> = serde_json::from_str(array.as_str())
        .map_err(|e| format!("Invalid flashcard JSON: {}", e))?;

    if cards.is_empty() {
        return Err("Model returned no flashcards".to_string());
    }

    Ok(cards)
}

fn error_card(message: &str) -> Flashcard {
    Flashcard::new(FLASHCARD_ERROR_QUESTION, message)
}

/// Answer a question from retrieved chunks. Returns the model's Markdown.
///
/// With no chunks the canned "no relevant information" reply is returned and
/// the generator is not called.
pub async fn answer_question(
    generator: &dyn TextGenerator,
    question: &str,
    chunks: &[RetrievedChunk],
) -> Result<String> {
    if chunks.is_empty() {
        return Ok(NO_RELEVANT_INFORMATION.to_string());
    }

    let request = GenerationRequest::new(
        GenerationTask::Answer,
        prompts::answer_prompt(question, chunks),
    );

    generator
        .generate(&request)
        .await
        .map_err(|e| AppError::Upstream(format!("{:#}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FixedReply {
        reply: std::result::Result<String, String>,
        calls: AtomicUsize,
    }

    impl FixedReply {
        fn ok(reply: &str) -> Self {
            Self {
                reply: Ok(reply.to_string()),
                calls: AtomicUsize::new(0),
            }
        }

        fn failing(message: &str) -> Self {
            Self {
                reply: Err(message.to_string()),
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl TextGenerator for FixedReply {
        fn name(&self) -> &str {
            "fixed"
        }

        async fn generate(&self, _request: &GenerationRequest) -> anyhow::Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.reply.clone().map_err(|e| anyhow::anyhow!(e))
        }
    }

    #[test]
    fn test_parse_fenced_json() {
        let reply = "Here you go:\n```json\n[{\"question\": \"Q1\", \"answer\": \"A1\"}]\n```";
        let cards = parse_flashcards(reply).unwrap();
        assert_eq!(cards, vec![Flashcard::new("Q1", "A1")]);
    }

    #[test]
    fn test_parse_multiline_array() {
        let reply = "[\n  {\"question\": \"Q1\", \"answer\": \"A1\"},\n  {\"question\": \"Q2\", \"answer\": \"A2\"}\n]";
        assert_eq!(parse_flashcards(reply).unwrap().len(), 2);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(parse_flashcards("no cards today").is_err());
        assert!(parse_flashcards("[not json]").is_err());
        assert!(parse_flashcards("[]").is_err());
    }

    #[tokio::test]
    async fn test_malformed_reply_gives_single_error_card() {
        let generator = FixedReply::ok("[{\"question\": \"Q1\"");
        let cards = generate_flashcards(&generator, Some("some text")).await;

        assert_eq!(cards.len(), 1);
        assert_eq!(cards[0].question, FLASHCARD_ERROR_QUESTION);
    }

    #[tokio::test]
    async fn test_provider_failure_gives_single_error_card() {
        let generator = FixedReply::failing("quota exceeded");
        let cards = generate_flashcards(&generator, Some("some text")).await;

        assert_eq!(cards.len(), 1);
        assert!(cards[0].answer.contains("quota exceeded"));
    }

    #[tokio::test]
    async fn test_missing_text_skips_generator() {
        let generator = FixedReply::ok("[]");
        let cards = generate_flashcards(&generator, Some("   ")).await;

        assert_eq!(cards.len(), 1);
        assert_eq!(generator.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_answer_without_chunks_is_canned() {
        let generator = FixedReply::ok("should not be used");
        let answer = answer_question(&generator, "Why?", &[]).await.unwrap();

        assert_eq!(answer, NO_RELEVANT_INFORMATION);
        assert_eq!(generator.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_answer_provider_failure_is_upstream() {
        let generator = FixedReply::failing("boom");
        let chunks = vec![RetrievedChunk {
            chunk_index: 0,
            content: "context".to_string(),
            distance: 0.0,
        }];

        let result = answer_question(&generator, "Why?", &chunks).await;
        assert!(matches!(result, Err(AppError::Upstream(_))));
    }
}

use async_trait::async_trait;

use super::{GenerationRequest, GenerationTask, TextGenerator};

/// Offline generator returning canned, task-shaped replies.
///
/// Selected with `LLM_PROVIDER=mock` or `USE_MOCK_AI=true`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SimulatedLLM;

impl SimulatedLLM {
    pub fn new() -> Self {
        Self
    }

    fn generate_response(request: &GenerationRequest) -> String {
        match request.task {
            GenerationTask::Summary => format!(
                "## Summary\n\nThis is a mock summary of a {}-character document. \
                 Configure an LLM provider to get a real one.",
                request.prompt.len()
            ),
            GenerationTask::Flashcards => serde_json::json!([
                {"question": "What is the capital of France?", "answer": "Paris"},
                {"question": "How many planets are in our solar system?", "answer": "Eight"}
            ])
            .to_string(),
            GenerationTask::Answer => {
                let context_lines = request
                    .prompt
                    .split("\n\n")
                    .filter(|s| !s.trim().is_empty())
                    .count();
                format!(
                    "This is a mock answer built from a prompt with {} context block{}.",
                    context_lines,
                    if context_lines == 1 { "" } else { "s" }
                )
            }
        }
    }
}

#[async_trait]
impl TextGenerator for SimulatedLLM {
    fn name(&self) -> &str {
        "mock"
    }

    async fn generate(&self, request: &GenerationRequest) -> anyhow::Result<String> {
        Ok(Self::generate_response(request))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::parse_flashcards;

    #[test]
    fn test_simulated_llm_creation() {
        let llm = SimulatedLLM::new();
        assert!(std::mem::size_of_val(&llm) == 0); // Zero-sized type
    }

    #[tokio::test]
    async fn test_mock_flashcards_parse() {
        let request = GenerationRequest::new(GenerationTask::Flashcards, "text".to_string());
        let reply = SimulatedLLM::new().generate(&request).await.unwrap();

        let cards = parse_flashcards(&reply).unwrap();
        assert_eq!(cards.len(), 2);
        assert_eq!(cards[0].answer, "Paris");
    }

    #[tokio::test]
    async fn test_mock_summary() {
        let request = GenerationRequest::new(GenerationTask::Summary, "abc".to_string());
        let reply = SimulatedLLM::new().generate(&request).await.unwrap();
        assert!(reply.contains("mock summary"));
    }
}

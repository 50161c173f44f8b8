pub mod prompts;
pub mod simulated;
pub mod study;

pub use simulated::SimulatedLLM;
pub use study::{answer_question, generate_flashcards, parse_flashcards, summarize};

use async_trait::async_trait;

/// What a prompt is for; lets offline generators shape their canned output
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationTask {
    Summary,
    Flashcards,
    Answer,
}

#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub task: GenerationTask,
    pub system: String,
    pub prompt: String,
}

impl GenerationRequest {
    pub fn new(task: GenerationTask, prompt: String) -> Self {
        Self {
            task,
            system: prompts::SYSTEM_PROMPT.to_string(),
            prompt,
        }
    }
}

/// Prompt in, text out
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Short provider/model label for logs
    fn name(&self) -> &str;

    async fn generate(&self, request: &GenerationRequest) -> anyhow::Result<String>;
}

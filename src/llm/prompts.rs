use crate::models::RetrievedChunk;

pub const SYSTEM_PROMPT: &str = "You are a helpful AI learning assistant.";

/// Returned instead of calling the model when retrieval finds nothing
pub const NO_RELEVANT_INFORMATION: &str =
    "I'm sorry, I couldn't find any relevant information in the document to answer that.";

pub const FLASHCARD_COUNT: usize = 8;

pub fn summary_prompt(text: &str) -> String {
    format!(
        "Provide a concise, easy-to-understand summary of the following text:\n\n{}",
        text
    )
}

pub fn flashcards_prompt(text: &str) -> String {
    format!(
        r#"You are an AI that ONLY outputs valid JSON.
DO NOT include explanations, markdown, or extra text.

Task:
Generate {count} flashcards from the text below.

Output format (STRICT):
[
  {{"question": "Q1", "answer": "A1"}},
  {{"question": "Q2", "answer": "A2"}}
]

Text:
{text}
"#,
        count = FLASHCARD_COUNT,
        text = text
    )
}

/// Q&A prompt restricted to the retrieved context
pub fn answer_prompt(question: &str, chunks: &[RetrievedChunk]) -> String {
    let context = chunks
        .iter()
        .map(|c| c.content.as_str())
        .collect::<Vec<_>>()
        .join("\n\n");

    format!(
        r#"Answer the following question based ONLY on the provided context.
If the answer is not in the context, say "I'm sorry, I couldn't find that information in the document."

Context:
{context}

Question:
{question}

Answer:
"#,
        context = context,
        question = question
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_answer_prompt_contains_context_and_question() {
        let chunks = vec![
            RetrievedChunk {
                chunk_index: 0,
                content: "Mitochondria make ATP.".to_string(),
                distance: 0.1,
            },
            RetrievedChunk {
                chunk_index: 3,
                content: "Ribosomes make proteins.".to_string(),
                distance: 0.2,
            },
        ];
        let prompt = answer_prompt("What makes ATP?", &chunks);

        assert!(prompt.contains("Mitochondria make ATP.\n\nRibosomes make proteins."));
        assert!(prompt.contains("Question:\nWhat makes ATP?"));
        assert!(prompt.contains("ONLY on the provided context"));
    }

    #[test]
    fn test_prompts_are_deterministic() {
        assert_eq!(flashcards_prompt("abc"), flashcards_prompt("abc"));
        assert!(flashcards_prompt("abc").contains("Generate 8 flashcards"));
        assert!(summary_prompt("abc").ends_with("abc"));
    }
}

//! Question generation and answer evaluation.
//!
//! The [`QuizEngine`] holds an optional language-model handle. Both of its
//! operations are total: with no handle they answer immediately with a
//! sentinel, and capability failures come back as readable error text
//! rather than as errors.

use rand::seq::IndexedRandom;
use rand::Rng;
use std::sync::Arc;

use crate::config::LlmConfig;
use crate::models::KnowledgeItem;
use crate::traits::{ChatMessage, CompletionRequest, LanguageModel};

/// Feedback returned by [`QuizEngine::evaluate_answer`] when no language
/// model is configured.
pub const NO_CREDENTIAL_FEEDBACK: &str = "Error: No API key configured for the language model.";

const QUESTION_SYSTEM_PROMPT: &str = "You are a demanding law tutor.";
const EVALUATION_SYSTEM_PROMPT: &str = "You are a helpful but rigorous tutor.";

fn question_prompt(context: &str) -> String {
    format!(
        r#"You are a rigorous Oxford Law tutor. Based on the following legal note, generate a challenging oral exam question.

The question should test ONE of the following:
1. Recall of facts.
2. Explanation of the ratio decidendi.
3. Critical analysis of the decision.

Keep the question concise (under 20 words) and direct, as if spoken in a tutorial.
Do NOT include the answer.

Context:
{context}"#
    )
}

fn evaluation_prompt(question: &str, answer: &str, context: &str) -> String {
    format!(
        r#"You are an Oxford Law tutor evaluating a student's oral answer.

Question: "{question}"
Student's Answer: "{answer}"

Source Material (Truth):
{context}

Task:
1. Evaluate if the student is Correct, Partially Correct, or Incorrect.
2. If Incorrect or Partial, explain specifically what they missed based ONLY on the Source Material (and general legal knowledge if the source is sparse).
3. If Correct, briefly affirm and add a deeper insight or "plus" point.

Tone: Encouraging but rigorous. Keep feedback under 100 words to maintain flow."#
    )
}

/// Result of [`QuizEngine::generate_question`].
#[derive(Debug, Clone, PartialEq)]
pub enum GeneratedQuestion {
    /// Empty knowledge base or no language model; nothing was requested.
    Unavailable,
    /// A question about `item`.
    Posed {
        question: String,
        item: KnowledgeItem,
    },
    /// The model call failed. The text is shown in place of a question but
    /// there is no item to grade against.
    Failed(String),
}

impl GeneratedQuestion {
    /// Question text, present for both `Posed` and `Failed`.
    pub fn text(&self) -> Option<&str> {
        match self {
            GeneratedQuestion::Posed { question, .. } => Some(question),
            GeneratedQuestion::Failed(text) => Some(text),
            GeneratedQuestion::Unavailable => None,
        }
    }

    /// The item asked about; only a `Posed` question has one.
    pub fn item(&self) -> Option<&KnowledgeItem> {
        match self {
            GeneratedQuestion::Posed { item, .. } => Some(item),
            _ => None,
        }
    }
}

#[derive(Clone)]
pub struct QuizEngine {
    llm: Option<Arc<dyn LanguageModel>>,
    question_temperature: f32,
    evaluation_temperature: f32,
}

impl QuizEngine {
    pub fn new(llm: Option<Arc<dyn LanguageModel>>, config: &LlmConfig) -> Self {
        Self {
            llm,
            question_temperature: config.question_temperature,
            evaluation_temperature: config.evaluation_temperature,
        }
    }

    pub fn is_available(&self) -> bool {
        self.llm.is_some()
    }

    /// Pick an item uniformly at random and ask the model for a question
    /// about it.
    pub async fn generate_question(&self, knowledge_base: &[KnowledgeItem]) -> GeneratedQuestion {
        let item = {
            let mut rng = rand::rng();
            self.pick(knowledge_base, &mut rng)
        };
        match item {
            Some(item) => self.question_for(item).await,
            None => GeneratedQuestion::Unavailable,
        }
    }

    /// As [`generate_question`](Self::generate_question), with a caller-supplied RNG.
    pub async fn generate_question_with<R: Rng + ?Sized>(
        &self,
        knowledge_base: &[KnowledgeItem],
        rng: &mut R,
    ) -> GeneratedQuestion {
        match self.pick(knowledge_base, rng) {
            Some(item) => self.question_for(item).await,
            None => GeneratedQuestion::Unavailable,
        }
    }

    fn pick<R: Rng + ?Sized>(
        &self,
        knowledge_base: &[KnowledgeItem],
        rng: &mut R,
    ) -> Option<KnowledgeItem> {
        if self.llm.is_none() {
            return None;
        }
        knowledge_base.choose(rng).cloned()
    }

    async fn question_for(&self, item: KnowledgeItem) -> GeneratedQuestion {
        let Some(llm) = &self.llm else {
            return GeneratedQuestion::Unavailable;
        };

        let request = CompletionRequest::new(
            vec![
                ChatMessage::system(QUESTION_SYSTEM_PROMPT),
                ChatMessage::user(question_prompt(&item.to_context())),
            ],
            self.question_temperature,
        );

        match llm.complete(request).await {
            Ok(question) => GeneratedQuestion::Posed { question, item },
            Err(e) => {
                tracing::warn!(item = %item.name, error = %e, "question generation failed");
                GeneratedQuestion::Failed(format!("Error generating question: {}", e))
            }
        }
    }

    /// Grade a free-text answer against the item the question was about.
    ///
    /// Always returns feedback text: [`NO_CREDENTIAL_FEEDBACK`] with no
    /// model, or an error message if the call fails.
    pub async fn evaluate_answer(
        &self,
        question: &str,
        answer: &str,
        item: &KnowledgeItem,
    ) -> String {
        let Some(llm) = &self.llm else {
            return NO_CREDENTIAL_FEEDBACK.to_string();
        };

        let request = CompletionRequest::new(
            vec![
                ChatMessage::system(EVALUATION_SYSTEM_PROMPT),
                ChatMessage::user(evaluation_prompt(question, answer, &item.to_context())),
            ],
            self.evaluation_temperature,
        );

        match llm.complete(request).await {
            Ok(feedback) => feedback,
            Err(e) => {
                tracing::warn!(item = %item.name, error = %e, "answer evaluation failed");
                format!("Error evaluating answer: {}", e)
            }
        }
    }
}

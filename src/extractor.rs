//! Knowledge-item extraction from note chunks.
//!
//! Each chunk is sent to the language model with a fixed instruction
//! asking for a JSON object `{"items": [...]}`, where every item carries
//! `name`, `facts`, `ratio` and `commentary`. Failures are per-chunk: a
//! bad response is logged and yields no items, and the pass carries on.

use serde_json::Value;
use std::sync::Arc;

use crate::error::CapabilityError;
use crate::models::KnowledgeItem;
use crate::traits::{ChatMessage, CompletionRequest, LanguageModel};

const SYSTEM_PROMPT: &str =
    "You are a helpful legal extraction assistant. Output valid JSON.";

fn extraction_prompt(chunk: &str) -> String {
    format!(
        r#"You are a legal expert assistant. Your task is to extract legal cases and legal principles from the following notes.

For each case or distinct legal principle found, extract:
- name: Case name (e.g., "Donoghue v Stevenson") or principle name.
- facts: Brief summary of the material facts.
- ratio: The ratio decidendi or key legal principle established.
- commentary: Any academic commentary, quotes, or critical analysis mentioned.

Return a JSON object with a key "items" containing a list of these objects.
If no cases or principles are found, return {{"items": []}}.

Input Text:
{chunk}"#
    )
}

pub struct Extractor {
    llm: Arc<dyn LanguageModel>,
    temperature: f32,
}

impl Extractor {
    pub fn new(llm: Arc<dyn LanguageModel>, temperature: f32) -> Self {
        Self { llm, temperature }
    }

    /// Extract knowledge items from one chunk.
    ///
    /// Blank chunks return nothing without calling the model. Any failure
    /// (transport, status, malformed JSON, missing `items`) is logged and
    /// returns an empty list.
    pub async fn extract(&self, chunk: &str) -> Vec<KnowledgeItem> {
        if chunk.trim().is_empty() {
            return Vec::new();
        }

        let request = CompletionRequest::new(
            vec![
                ChatMessage::system(SYSTEM_PROMPT),
                ChatMessage::user(extraction_prompt(chunk)),
            ],
            self.temperature,
        )
        .json();

        let content = match self.llm.complete(request).await {
            Ok(c) => c,
            Err(e) => {
                tracing::warn!(error = %e, "extraction request failed");
                return Vec::new();
            }
        };

        match parse_items(&content) {
            Ok(items) => items,
            Err(e) => {
                tracing::warn!(error = %e, "could not parse extraction response");
                Vec::new()
            }
        }
    }
}

/// Parse a `{"items": [...]}` response body.
///
/// Entries that are not objects are dropped individually. Field values
/// are kept as returned, whatever their JSON type.
pub fn parse_items(content: &str) -> Result<Vec<KnowledgeItem>, CapabilityError> {
    let value: Value = serde_json::from_str(content)?;
    let items = value
        .get("items")
        .ok_or_else(|| CapabilityError::Malformed("missing \"items\" key".to_string()))?
        .as_array()
        .ok_or_else(|| CapabilityError::Malformed("\"items\" is not an array".to_string()))?;

    let mut out = Vec::with_capacity(items.len());
    for raw in items {
        if !raw.is_object() {
            tracing::debug!(entry = %raw, "skipping non-object item");
            continue;
        }
        match serde_json::from_value::<KnowledgeItem>(raw.clone()) {
            Ok(item) => out.push(item),
            Err(e) => tracing::debug!(error = %e, "skipping malformed item"),
        }
    }
    Ok(out)
}

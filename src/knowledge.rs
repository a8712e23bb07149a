//! Knowledge-base aggregation and the flat JSON file it lives in.
//!
//! Extraction batches are merged by trimmed `name`: the first item seen
//! for a name is kept and later duplicates are dropped. The merged list is
//! written as a single JSON array, replacing the previous file in full.

use anyhow::{Context, Result};
use std::collections::HashSet;
use std::path::Path;

use crate::models::KnowledgeItem;

/// Flatten extraction batches into a deduplicated list.
///
/// Items are visited in batch order, then item order. An item whose
/// trimmed name is empty is dropped; an item whose trimmed name has
/// already been seen is dropped. Output order is first-insertion order.
pub fn aggregate<I>(batches: I) -> Vec<KnowledgeItem>
where
    I: IntoIterator<Item = Vec<KnowledgeItem>>,
{
    let mut seen: HashSet<String> = HashSet::new();
    let mut unique = Vec::new();

    for item in batches.into_iter().flatten() {
        let key = item.key();
        if key.is_empty() {
            continue;
        }
        if seen.insert(key.to_string()) {
            unique.push(item);
        }
    }

    unique
}

/// Write the knowledge base, creating parent directories as needed.
pub fn save_knowledge_base(path: &Path, items: &[KnowledgeItem]) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }
    }

    let json = serde_json::to_string_pretty(items)?;
    std::fs::write(path, json)
        .with_context(|| format!("Failed to write knowledge base: {}", path.display()))?;
    Ok(())
}

/// Read the knowledge base.
///
/// A missing file is the "nothing parsed yet" state and reads as empty.
/// A file that exists but is not a JSON array of items is an error.
pub fn load_knowledge_base(path: &Path) -> Result<Vec<KnowledgeItem>> {
    if !path.exists() {
        tracing::warn!(path = %path.display(), "no knowledge base found; run `tutor parse` first");
        return Ok(Vec::new());
    }

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read knowledge base: {}", path.display()))?;
    let items: Vec<KnowledgeItem> = serde_json::from_str(&content)
        .with_context(|| format!("Knowledge base is not valid JSON: {}", path.display()))?;
    Ok(items)
}

//! Note parsing pipeline.
//!
//! Coordinates the full parse: scan notes → read → chunk → extract →
//! aggregate → write the knowledge base. Extraction may run several chunks
//! at once, but results are always merged in file-then-chunk order so the
//! first-seen-wins deduplication is reproducible.

use anyhow::Result;
use futures::stream::{self, StreamExt};
use std::sync::Arc;

use crate::chunk::{chunk_text, Chunk};
use crate::config::Config;
use crate::extractor::Extractor;
use crate::knowledge::{aggregate, save_knowledge_base};
use crate::reader::{read_file, scan_notes};
use crate::traits::LanguageModel;

/// Counts from one parse run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParseReport {
    pub files_found: usize,
    pub files_skipped: usize,
    pub chunks: usize,
    pub items_extracted: usize,
    pub items_saved: usize,
    /// Whether the knowledge-base file was (re)written.
    pub written: bool,
}

struct PendingChunk {
    file: String,
    chunk: Chunk,
    of: usize,
}

/// Run the parse pipeline and return its counts.
///
/// With `dry_run` the notes are read and chunked but the model is not
/// called and nothing is written. Without a language model the run stops
/// after chunking and leaves any existing knowledge base in place.
pub async fn parse_notes(
    config: &Config,
    llm: Option<Arc<dyn LanguageModel>>,
    dry_run: bool,
) -> Result<ParseReport> {
    let files = scan_notes(&config.notes)?;
    let mut report = ParseReport {
        files_found: files.len(),
        ..ParseReport::default()
    };
    tracing::info!(files = files.len(), dir = %config.notes.raw_dir.display(), "scanning notes");

    let mut pending = Vec::new();
    for file in &files {
        let text = match read_file(&file.path) {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!(file = %file.relative_path, error = %e, "could not read note");
                report.files_skipped += 1;
                continue;
            }
        };
        if text.is_empty() {
            report.files_skipped += 1;
            continue;
        }

        let chunks = chunk_text(&text, config.chunking.max_chars);
        tracing::info!(file = %file.relative_path, chunks = chunks.len(), "split note");
        let of = chunks.len();
        pending.extend(chunks.into_iter().map(|chunk| PendingChunk {
            file: file.relative_path.clone(),
            chunk,
            of,
        }));
    }
    report.chunks = pending.len();

    if dry_run {
        return Ok(report);
    }

    let Some(llm) = llm else {
        tracing::warn!("no language model configured; knowledge base left unchanged");
        return Ok(report);
    };

    let extractor = Extractor::new(llm, config.extraction.temperature);
    let extractor = &extractor;
    let batches: Vec<_> = stream::iter(pending)
        .map(|p| async move {
            let items = extractor.extract(&p.chunk.text).await;
            tracing::info!(
                file = %p.file,
                chunk = p.chunk.index + 1,
                of = p.of,
                items = items.len(),
                "extracted chunk"
            );
            items
        })
        .buffered(config.extraction.concurrency.max(1))
        .collect()
        .await;

    report.items_extracted = batches.iter().map(Vec::len).sum();

    let unique = aggregate(batches);
    save_knowledge_base(&config.knowledge.path, &unique)?;
    report.items_saved = unique.len();
    report.written = true;

    tracing::info!(
        items = unique.len(),
        path = %config.knowledge.path.display(),
        "saved knowledge base"
    );
    Ok(report)
}

/// `tutor parse`: run the pipeline and print a summary.
pub async fn run_parse(
    config: &Config,
    llm: Option<Arc<dyn LanguageModel>>,
    dry_run: bool,
) -> Result<()> {
    let has_llm = llm.is_some();
    let report = parse_notes(config, llm, dry_run).await?;

    if dry_run {
        println!("parse {} (dry-run)", config.notes.raw_dir.display());
    } else {
        println!("parse {}", config.notes.raw_dir.display());
    }
    println!("  files found: {}", report.files_found);
    println!("  files skipped: {}", report.files_skipped);
    println!("  chunks: {}", report.chunks);

    if dry_run {
        return Ok(());
    }
    if !has_llm {
        println!("  OPENAI_API_KEY not set: extraction skipped, knowledge base unchanged");
        return Ok(());
    }

    println!("  items extracted: {}", report.items_extracted);
    println!("  unique items saved: {}", report.items_saved);
    println!("  knowledge base: {}", config.knowledge.path.display());
    println!("ok");
    Ok(())
}

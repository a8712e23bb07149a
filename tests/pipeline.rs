//! End-to-end tests for the `parse` pipeline with an in-process language
//! model standing in for the provider.

use async_trait::async_trait;
use recall_tutor::config::Config;
use recall_tutor::error::CapabilityError;
use recall_tutor::ingest::parse_notes;
use recall_tutor::knowledge::load_knowledge_base;
use recall_tutor::models::FACTS;
use recall_tutor::traits::{CompletionRequest, LanguageModel};
use serde_json::json;
use std::fs;
use std::io::Write;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

// ─── Stub Model ─────────────────────────────────────────────────────

/// Returns one item per known case name that appears in the prompt. The
/// facts say which chunk the item came from, so tests can tell which
/// duplicate survived.
struct CaseSpotter {
    cases: Vec<&'static str>,
    prompts: Mutex<Vec<String>>,
}

impl CaseSpotter {
    fn new(cases: &[&'static str]) -> Arc<Self> {
        Arc::new(Self {
            cases: cases.to_vec(),
            prompts: Mutex::new(Vec::new()),
        })
    }

    fn calls(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }
}

#[async_trait]
impl LanguageModel for CaseSpotter {
    fn name(&self) -> &str {
        "case-spotter"
    }

    async fn complete(&self, request: CompletionRequest) -> Result<String, CapabilityError> {
        assert!(request.json_output);
        let prompt = request
            .messages
            .last()
            .map(|m| m.content.clone())
            .unwrap_or_default();
        let input = prompt.split("Input Text:").nth(1).unwrap_or("").trim().to_string();
        self.prompts.lock().unwrap().push(input.clone());

        let items: Vec<_> = self
            .cases
            .iter()
            .filter(|name| input.contains(*name))
            .map(|name| json!({"name": name, "facts": format!("from: {}", input)}))
            .collect();
        Ok(json!({ "items": items }).to_string())
    }
}

// ─── Fixtures ───────────────────────────────────────────────────────

fn config_for(tmp: &TempDir) -> Config {
    let mut config = Config::minimal();
    config.notes.raw_dir = tmp.path().join("raw");
    config.knowledge.path = tmp.path().join("processed/knowledge_base.json");
    fs::create_dir_all(&config.notes.raw_dir).unwrap();
    config
}

fn write_docx(path: &Path, paragraphs: &[&str]) {
    let body: String = paragraphs
        .iter()
        .map(|p| format!("<w:p><w:r><w:t>{}</w:t></w:r></w:p>", p))
        .collect();
    let xml = format!(
        "<?xml version=\"1.0\"?><w:document xmlns:w=\"http://schemas.openxmlformats.org/wordprocessingml/2006/main\"><w:body>{}</w:body></w:document>",
        body
    );

    let file = fs::File::create(path).unwrap();
    let mut zip = zip::ZipWriter::new(file);
    zip.start_file("word/document.xml", zip::write::SimpleFileOptions::default())
        .unwrap();
    zip.write_all(xml.as_bytes()).unwrap();
    zip.finish().unwrap();
}

// ─── Tests ──────────────────────────────────────────────────────────

#[tokio::test]
async fn unsupported_files_contribute_nothing() {
    let tmp = TempDir::new().unwrap();
    let config = config_for(&tmp);
    fs::write(
        config.notes.raw_dir.join("tort.txt"),
        "Donoghue v Stevenson established the neighbour principle.",
    )
    .unwrap();
    fs::write(
        config.notes.raw_dir.join("contract.pdf"),
        "%PDF-1.4 Carlill v Carbolic Smoke Ball Co",
    )
    .unwrap();

    let model = CaseSpotter::new(&["Donoghue v Stevenson", "Carlill v Carbolic Smoke Ball Co"]);
    let report = parse_notes(&config, Some(model.clone()), false).await.unwrap();

    assert_eq!(report.files_found, 2);
    assert_eq!(report.files_skipped, 1);
    assert_eq!(report.chunks, 1);
    assert_eq!(model.calls(), 1);

    let kb = load_knowledge_base(&config.knowledge.path).unwrap();
    let names: Vec<_> = kb.iter().map(|i| i.name.as_str()).collect();
    assert_eq!(names, vec!["Donoghue v Stevenson"]);
}

#[tokio::test]
async fn first_seen_wins_across_files() {
    let tmp = TempDir::new().unwrap();
    let config = config_for(&tmp);
    fs::write(config.notes.raw_dir.join("a_tort.md"), "# Week 1\n\nHadley v Baxendale first").unwrap();
    fs::write(config.notes.raw_dir.join("b_contract.txt"), "Hadley v Baxendale again").unwrap();

    let model = CaseSpotter::new(&["Hadley v Baxendale"]);
    let report = parse_notes(&config, Some(model), false).await.unwrap();
    assert_eq!(report.items_extracted, 2);
    assert_eq!(report.items_saved, 1);

    let kb = load_knowledge_base(&config.knowledge.path).unwrap();
    assert_eq!(kb.len(), 1);
    assert_eq!(
        kb[0].field_text(FACTS).as_deref(),
        Some("from: # Week 1\n\nHadley v Baxendale first")
    );
}

#[tokio::test]
async fn concurrent_extraction_keeps_file_then_chunk_order() {
    let tmp = TempDir::new().unwrap();
    let mut config = config_for(&tmp);
    config.chunking.max_chars = 20;
    config.extraction.concurrency = 4;

    let paragraphs: Vec<String> = (0..8).map(|i| format!("R v Case{} notes", i)).collect();
    fs::write(config.notes.raw_dir.join("crime.txt"), paragraphs.join("\n\n")).unwrap();
    fs::write(config.notes.raw_dir.join("more.txt"), "R v Case3 repeated").unwrap();

    let cases = [
        "R v Case0", "R v Case1", "R v Case2", "R v Case3", "R v Case4", "R v Case5",
        "R v Case6", "R v Case7",
    ];
    let model = CaseSpotter::new(&cases);
    let report = parse_notes(&config, Some(model), false).await.unwrap();
    assert_eq!(report.chunks, 9);

    let kb = load_knowledge_base(&config.knowledge.path).unwrap();
    let names: Vec<_> = kb.iter().map(|i| i.name.as_str()).collect();
    assert_eq!(names, cases.to_vec());
    assert_eq!(kb[3].field_text(FACTS).as_deref(), Some("from: R v Case3 notes"));
}

#[tokio::test]
async fn word_documents_are_read() {
    let tmp = TempDir::new().unwrap();
    let config = config_for(&tmp);
    write_docx(
        &config.notes.raw_dir.join("land.docx"),
        &["Tulk v Moxhay", "Restrictive covenants run in equity."],
    );

    let model = CaseSpotter::new(&["Tulk v Moxhay"]);
    parse_notes(&config, Some(model), false).await.unwrap();

    let kb = load_knowledge_base(&config.knowledge.path).unwrap();
    assert_eq!(kb.len(), 1);
    assert_eq!(
        kb[0].field_text(FACTS).as_deref(),
        Some("from: Tulk v Moxhay\nRestrictive covenants run in equity.")
    );
}

#[tokio::test]
async fn hidden_files_are_ignored() {
    let tmp = TempDir::new().unwrap();
    let config = config_for(&tmp);
    fs::write(config.notes.raw_dir.join(".draft.txt"), "R v Brown").unwrap();
    fs::write(config.notes.raw_dir.join("notes.txt"), "R v Ireland").unwrap();

    let model = CaseSpotter::new(&["R v Brown", "R v Ireland"]);
    let report = parse_notes(&config, Some(model), false).await.unwrap();
    assert_eq!(report.files_found, 1);

    let kb = load_knowledge_base(&config.knowledge.path).unwrap();
    assert_eq!(kb.len(), 1);
    assert_eq!(kb[0].name, "R v Ireland");
}

#[tokio::test]
async fn dry_run_calls_nothing_and_writes_nothing() {
    let tmp = TempDir::new().unwrap();
    let config = config_for(&tmp);
    fs::write(config.notes.raw_dir.join("notes.txt"), "R v Brown\n\nR v Ireland").unwrap();

    let model = CaseSpotter::new(&["R v Brown"]);
    let report = parse_notes(&config, Some(model.clone()), true).await.unwrap();
    assert_eq!(report.chunks, 1);
    assert!(!report.written);
    assert_eq!(model.calls(), 0);
    assert!(!config.knowledge.path.exists());
}

#[tokio::test]
async fn missing_model_leaves_existing_base() {
    let tmp = TempDir::new().unwrap();
    let config = config_for(&tmp);
    fs::write(config.notes.raw_dir.join("notes.txt"), "R v Brown").unwrap();
    fs::create_dir_all(config.knowledge.path.parent().unwrap()).unwrap();
    fs::write(&config.knowledge.path, r#"[{"name":"Existing"}]"#).unwrap();

    let report = parse_notes(&config, None, false).await.unwrap();
    assert!(!report.written);

    let kb = load_knowledge_base(&config.knowledge.path).unwrap();
    assert_eq!(kb.len(), 1);
    assert_eq!(kb[0].name, "Existing");
}

#[tokio::test]
async fn rerun_overwrites_base() {
    let tmp = TempDir::new().unwrap();
    let config = config_for(&tmp);
    let note = config.notes.raw_dir.join("notes.txt");

    fs::write(&note, "R v Brown").unwrap();
    let model = CaseSpotter::new(&["R v Brown", "R v Ireland"]);
    parse_notes(&config, Some(model.clone()), false).await.unwrap();

    fs::write(&note, "R v Ireland").unwrap();
    parse_notes(&config, Some(model), false).await.unwrap();

    let kb = load_knowledge_base(&config.knowledge.path).unwrap();
    let names: Vec<_> = kb.iter().map(|i| i.name.as_str()).collect();
    assert_eq!(names, vec!["R v Ireland"]);
}

#[tokio::test]
async fn missing_notes_dir_is_an_error() {
    let tmp = TempDir::new().unwrap();
    let mut config = Config::minimal();
    config.notes.raw_dir = tmp.path().join("nope");
    config.knowledge.path = tmp.path().join("kb.json");
    assert!(parse_notes(&config, None, false).await.is_err());
}

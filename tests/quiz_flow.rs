//! Drives the interactive quiz loop from scripted input with stub
//! capabilities.

use async_trait::async_trait;
use recall_tutor::config::Config;
use recall_tutor::error::CapabilityError;
use recall_tutor::knowledge::save_knowledge_base;
use recall_tutor::models::{AudioClip, KnowledgeItem, Role};
use recall_tutor::quiz_cmd::run_quiz;
use recall_tutor::session::{Phase, SKIP_ANSWER};
use recall_tutor::traits::{
    Capabilities, CompletionRequest, LanguageModel, SpeechSynthesizer, Transcriber,
};
use serde_json::Value;
use std::fs;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tempfile::TempDir;
use tokio::io::BufReader;

// ─── Stubs ──────────────────────────────────────────────────────────

struct Tutor {
    questions: AtomicUsize,
    evaluations: AtomicUsize,
}

#[async_trait]
impl LanguageModel for Tutor {
    fn name(&self) -> &str {
        "tutor"
    }

    async fn complete(&self, request: CompletionRequest) -> Result<String, CapabilityError> {
        let prompt = &request.messages[1].content;
        if prompt.contains("Student's Answer") {
            let n = self.evaluations.fetch_add(1, Ordering::SeqCst) + 1;
            Ok(format!("Feedback {}", n))
        } else {
            let n = self.questions.fetch_add(1, Ordering::SeqCst) + 1;
            Ok(format!("Question {}?", n))
        }
    }
}

struct Speech;

#[async_trait]
impl SpeechSynthesizer for Speech {
    async fn synthesize(&self, text: &str, _voice: &str) -> Result<Vec<u8>, CapabilityError> {
        Ok(text.as_bytes().to_vec())
    }
}

struct Whisper;

#[async_trait]
impl Transcriber for Whisper {
    async fn transcribe(&self, clip: &AudioClip) -> Result<String, CapabilityError> {
        Ok(String::from_utf8_lossy(&clip.bytes).to_string())
    }
}

fn setup(tmp: &TempDir) -> Config {
    let mut config = Config::minimal();
    config.knowledge.path = tmp.path().join("kb.json");
    save_knowledge_base(
        &config.knowledge.path,
        &[KnowledgeItem::new("Donoghue v Stevenson")
            .with_facts("Snail in a bottle")
            .with_ratio("duty of care")],
    )
    .unwrap();
    config
}

fn tutor() -> Arc<Tutor> {
    Arc::new(Tutor {
        questions: AtomicUsize::new(0),
        evaluations: AtomicUsize::new(0),
    })
}

// ─── Tests ──────────────────────────────────────────────────────────

#[tokio::test]
async fn scripted_session_records_every_turn() {
    let tmp = TempDir::new().unwrap();
    let mut config = setup(&tmp);
    config.speech.output_dir = Some(tmp.path().join("audio"));

    let model = tutor();
    let caps = Capabilities {
        llm: Some(model.clone()),
        transcriber: None,
        speech: Some(Arc::new(Speech)),
    };
    let transcript_path = tmp.path().join("transcript.json");

    let input = "\nA duty of care\nstart\n\n:skip\n:quit\nnever read\n";
    let state = run_quiz(
        &config,
        &caps,
        BufReader::new(input.as_bytes()),
        Some(&transcript_path),
    )
    .await
    .unwrap();

    assert_eq!(state.phase(), Phase::FeedbackShown);
    let contents: Vec<_> = state.transcript().iter().map(|t| t.content.as_str()).collect();
    assert_eq!(
        contents,
        vec![
            "Question 1?",
            "A duty of care",
            "Feedback 1",
            "Question 2?",
            SKIP_ANSWER,
            "Feedback 2",
        ]
    );
    assert_eq!(model.questions.load(Ordering::SeqCst), 2);

    let saved = fs::read_dir(tmp.path().join("audio")).unwrap().count();
    assert_eq!(saved, 4);

    let exported: Value =
        serde_json::from_str(&fs::read_to_string(&transcript_path).unwrap()).unwrap();
    let exported = exported.as_array().unwrap();
    assert_eq!(exported.len(), 6);
    assert_eq!(exported[0]["has_audio"], true);
    assert_eq!(exported[1]["role"], "user");
    assert_eq!(exported[1]["has_audio"], false);
}

#[tokio::test]
async fn audio_answer_is_transcribed() {
    let tmp = TempDir::new().unwrap();
    let config = setup(&tmp);
    let recording = tmp.path().join("answer.webm");
    fs::write(&recording, "the neighbour principle").unwrap();

    let caps = Capabilities {
        llm: Some(tutor()),
        transcriber: Some(Arc::new(Whisper)),
        speech: None,
    };
    let input = format!("\n:audio {}\n", recording.display());
    let state = run_quiz(&config, &caps, BufReader::new(input.as_bytes()), None)
        .await
        .unwrap();

    let user: Vec<_> = state
        .transcript()
        .iter()
        .filter(|t| t.role == Role::User)
        .map(|t| t.content.as_str())
        .collect();
    assert_eq!(user, vec!["the neighbour principle"]);
    assert!(state.transcript().iter().all(|t| t.audio.is_none()));
}

#[tokio::test]
async fn missing_audio_file_keeps_question_open() {
    let tmp = TempDir::new().unwrap();
    let config = setup(&tmp);
    let caps = Capabilities {
        llm: Some(tutor()),
        transcriber: Some(Arc::new(Whisper)),
        speech: None,
    };
    let input = "\n:audio /definitely/not/here.wav\n";
    let state = run_quiz(&config, &caps, BufReader::new(input.as_bytes()), None)
        .await
        .unwrap();
    assert_eq!(state.phase(), Phase::AwaitingAnswer);
    assert_eq!(state.transcript().len(), 1);
}

#[tokio::test]
async fn unreadable_input_still_exports_transcript() {
    let tmp = TempDir::new().unwrap();
    let config = setup(&tmp);
    let caps = Capabilities {
        llm: Some(tutor()),
        ..Capabilities::default()
    };
    let transcript_path = tmp.path().join("transcript.json");

    let input: &[u8] = b"\nA duty of care\n\xff\xfe not text\n:skip\n";
    let state = run_quiz(&config, &caps, BufReader::new(input), Some(&transcript_path))
        .await
        .unwrap();

    assert_eq!(state.phase(), Phase::FeedbackShown);
    assert_eq!(state.transcript().len(), 3);
    let exported: Value =
        serde_json::from_str(&fs::read_to_string(&transcript_path).unwrap()).unwrap();
    assert_eq!(exported.as_array().unwrap().len(), 3);
    assert_eq!(exported[1]["content"], "A duty of care");
}

#[tokio::test]
async fn no_language_model_ends_immediately() {
    let tmp = TempDir::new().unwrap();
    let config = setup(&tmp);
    let state = run_quiz(
        &config,
        &Capabilities::default(),
        BufReader::new(&b"\nanswer\n"[..]),
        None,
    )
    .await
    .unwrap();
    assert_eq!(state.phase(), Phase::NotStarted);
    assert!(state.transcript().is_empty());
}

#[tokio::test]
async fn empty_knowledge_base_ends_immediately() {
    let tmp = TempDir::new().unwrap();
    let mut config = Config::minimal();
    config.knowledge.path = tmp.path().join("absent.json");
    let model = tutor();
    let caps = Capabilities {
        llm: Some(model.clone()),
        ..Capabilities::default()
    };
    let state = run_quiz(&config, &caps, BufReader::new(&b"\n"[..]), None)
        .await
        .unwrap();
    assert!(state.transcript().is_empty());
    assert_eq!(model.questions.load(Ordering::SeqCst), 0);
}

//! Exercises the provider clients against an in-process HTTP stub.

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::post;
use axum::{Json, Router};
use recall_tutor::config::{LlmConfig, SpeechConfig, TranscriptionConfig};
use recall_tutor::elevenlabs::ElevenLabsClient;
use recall_tutor::error::CapabilityError;
use recall_tutor::models::AudioClip;
use recall_tutor::openai::OpenAiClient;
use recall_tutor::traits::{
    ChatMessage, CompletionRequest, LanguageModel, SpeechSynthesizer, Transcriber,
};
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;

// ─── Stub Server ────────────────────────────────────────────────────

#[derive(Default)]
struct Recorded {
    chat: Vec<(HeaderMap, Value)>,
    transcription: Vec<(HeaderMap, Bytes)>,
    speech: Vec<(HeaderMap, String, Value)>,
}

type Shared = Arc<Mutex<Recorded>>;

async fn chat(
    State(rec): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Json<Value> {
    rec.lock().unwrap().chat.push((headers, body));
    Json(json!({
        "choices": [{"message": {"role": "assistant", "content": "  What was the ratio?  "}}]
    }))
}

async fn empty_chat() -> Json<Value> {
    Json(json!({ "choices": [] }))
}

async fn broken() -> impl IntoResponse {
    (StatusCode::INTERNAL_SERVER_ERROR, "upstream exploded")
}

async fn transcription(
    State(rec): State<Shared>,
    headers: HeaderMap,
    body: Bytes,
) -> Json<Value> {
    rec.lock().unwrap().transcription.push((headers, body));
    Json(json!({ "text": " a duty of care \n" }))
}

async fn speech(
    State(rec): State<Shared>,
    Path(voice): Path<String>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> impl IntoResponse {
    rec.lock().unwrap().speech.push((headers, voice, body));
    ([("content-type", "audio/mpeg")], vec![0xFF_u8, 0xFB, 0x90])
}

async fn spawn_stub() -> (SocketAddr, Shared) {
    let rec: Shared = Arc::new(Mutex::new(Recorded::default()));
    let app = Router::new()
        .route("/v1/chat/completions", post(chat))
        .route("/v1/audio/transcriptions", post(transcription))
        .route("/v1/text-to-speech/{voice}", post(speech))
        .route("/empty/chat/completions", post(empty_chat))
        .route("/broken/chat/completions", post(broken))
        .route("/broken/v1/text-to-speech/{voice}", post(broken))
        .with_state(rec.clone());

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    tokio::time::sleep(Duration::from_millis(10)).await;

    (addr, rec)
}

fn openai(base_url: String) -> OpenAiClient {
    let llm = LlmConfig {
        base_url,
        timeout_secs: 5,
        ..LlmConfig::default()
    };
    OpenAiClient::new(&llm, &TranscriptionConfig::default(), "sk-test".to_string()).unwrap()
}

fn elevenlabs(base_url: String) -> ElevenLabsClient {
    let config = SpeechConfig {
        base_url,
        ..SpeechConfig::default()
    };
    ElevenLabsClient::new(&config, Duration::from_secs(5), "xi-test".to_string()).unwrap()
}

// ─── Tests ──────────────────────────────────────────────────────────

#[tokio::test]
async fn chat_completion_round_trip() {
    let (addr, rec) = spawn_stub().await;
    let client = openai(format!("http://{}/v1/", addr));

    let request = CompletionRequest::new(
        vec![ChatMessage::system("You are a tutor."), ChatMessage::user("Ask me")],
        0.7,
    )
    .json();
    let reply = client.complete(request).await.unwrap();
    assert_eq!(reply, "What was the ratio?");

    let rec = rec.lock().unwrap();
    let (headers, body) = &rec.chat[0];
    assert_eq!(headers["authorization"], "Bearer sk-test");
    assert_eq!(body["model"], "gpt-4o-mini");
    assert_eq!(body["messages"][0]["role"], "system");
    assert_eq!(body["messages"][1]["content"], "Ask me");
    assert_eq!(body["response_format"]["type"], "json_object");
    assert!((body["temperature"].as_f64().unwrap() - 0.7).abs() < 1e-6);
}

#[tokio::test]
async fn no_choices_is_empty_response() {
    let (addr, _rec) = spawn_stub().await;
    let client = openai(format!("http://{}/empty", addr));
    let err = client
        .complete(CompletionRequest::new(vec![ChatMessage::user("hi")], 0.5))
        .await
        .unwrap_err();
    assert!(matches!(err, CapabilityError::EmptyResponse(_)));
}

#[tokio::test]
async fn error_status_carries_body() {
    let (addr, _rec) = spawn_stub().await;
    let client = openai(format!("http://{}/broken", addr));
    let err = client
        .complete(CompletionRequest::new(vec![ChatMessage::user("hi")], 0.5))
        .await
        .unwrap_err();
    match err {
        CapabilityError::Status { status, body, .. } => {
            assert_eq!(status.as_u16(), 500);
            assert_eq!(body, "upstream exploded");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn unreachable_server_is_http_error() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = openai(format!("http://{}/v1", addr));
    let err = client
        .complete(CompletionRequest::new(vec![ChatMessage::user("hi")], 0.5))
        .await
        .unwrap_err();
    assert!(matches!(err, CapabilityError::Http(_)));
}

#[tokio::test]
async fn transcription_uploads_multipart() {
    let (addr, rec) = spawn_stub().await;
    let client = openai(format!("http://{}/v1", addr));

    let clip = AudioClip::new(b"RIFF....WAVE".to_vec(), "answer.wav");
    let text = client.transcribe(&clip).await.unwrap();
    assert_eq!(text, "a duty of care");

    let rec = rec.lock().unwrap();
    let (headers, body) = &rec.transcription[0];
    let content_type = headers["content-type"].to_str().unwrap();
    assert!(content_type.starts_with("multipart/form-data"));
    let body = String::from_utf8_lossy(body);
    assert!(body.contains("name=\"model\""));
    assert!(body.contains("whisper-1"));
    assert!(body.contains("filename=\"answer.wav\""));
    assert!(body.contains("audio/wav"));
    assert!(body.contains("RIFF....WAVE"));
}

#[tokio::test]
async fn speech_posts_to_voice_path() {
    let (addr, rec) = spawn_stub().await;
    let client = elevenlabs(format!("http://{}", addr));

    let audio = client
        .synthesize("What was the ratio?", "21m00Tcm4TlvDq8ikWAM")
        .await
        .unwrap();
    assert_eq!(audio, vec![0xFF, 0xFB, 0x90]);

    let rec = rec.lock().unwrap();
    let (headers, voice, body) = &rec.speech[0];
    assert_eq!(voice, "21m00Tcm4TlvDq8ikWAM");
    assert_eq!(headers["xi-api-key"], "xi-test");
    assert_eq!(headers["accept"], "audio/mpeg");
    assert_eq!(body["text"], "What was the ratio?");
    assert_eq!(body["model_id"], "eleven_monolingual_v1");
}

#[tokio::test]
async fn speech_error_status() {
    let (addr, _rec) = spawn_stub().await;
    let client = elevenlabs(format!("http://{}/broken", addr));
    let err = client.synthesize("hi", "Rachel").await.unwrap_err();
    assert!(matches!(err, CapabilityError::Status { .. }));
}

//! Capability interfaces for the external services the tutor depends on.
//!
//! The tutor never talks to a provider directly. Extraction, quizzing and
//! the session controller are written against three narrow traits:
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │                 Capabilities                 │
//! │  ┌─────────────┐ ┌───────────┐ ┌───────────┐ │
//! │  │LanguageModel│ │Transcriber│ │  Speech   │ │
//! │  │  (OpenAI)   │ │ (OpenAI)  │ │(ElevenLabs│ │
//! │  └─────────────┘ └───────────┘ └───────────┘ │
//! └──────────────────────┬───────────────────────┘
//!                        ▼
//!      Extractor / QuizEngine / SessionController
//! ```
//!
//! Each handle in [`Capabilities`] is optional. A handle is `None` when
//! its credential is missing, and every consumer checks for that before
//! making a call.
//!
//! # Usage
//!
//! ```rust
//! use recall_tutor::config::{Config, Credentials};
//! use recall_tutor::traits::Capabilities;
//!
//! let caps = Capabilities::from_config(&Config::minimal(), &Credentials::default()).unwrap();
//! assert!(caps.llm.is_none());
//! assert!(caps.speech.is_none());
//! ```

use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

use crate::config::{Config, Credentials};
use crate::elevenlabs::ElevenLabsClient;
use crate::error::CapabilityError;
use crate::models::AudioClip;
use crate::openai::OpenAiClient;

// ═══════════════════════════════════════════════════════════════════════
// Requests
// ═══════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }
}

/// One chat completion request.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
    /// Ask the provider to return a single valid JSON object.
    pub json_output: bool,
}

impl CompletionRequest {
    pub fn new(messages: Vec<ChatMessage>, temperature: f32) -> Self {
        Self {
            messages,
            temperature,
            json_output: false,
        }
    }

    pub fn json(mut self) -> Self {
        self.json_output = true;
        self
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Capability Traits
// ═══════════════════════════════════════════════════════════════════════

/// A chat-style language model.
///
/// # Example
///
/// ```rust
/// use async_trait::async_trait;
/// use recall_tutor::error::CapabilityError;
/// use recall_tutor::traits::{CompletionRequest, LanguageModel};
///
/// struct Echo;
///
/// #[async_trait]
/// impl LanguageModel for Echo {
///     fn name(&self) -> &str { "echo" }
///
///     async fn complete(&self, request: CompletionRequest) -> Result<String, CapabilityError> {
///         Ok(request.messages.last().map(|m| m.content.clone()).unwrap_or_default())
///     }
/// }
/// ```
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Model identifier, for logs.
    fn name(&self) -> &str;

    /// Return the text of a single completion.
    async fn complete(&self, request: CompletionRequest) -> Result<String, CapabilityError>;
}

/// Speech-to-text.
#[async_trait]
pub trait Transcriber: Send + Sync {
    async fn transcribe(&self, clip: &AudioClip) -> Result<String, CapabilityError>;
}

/// Text-to-speech. Returns encoded audio (MP3 for the bundled provider).
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    async fn synthesize(&self, text: &str, voice: &str) -> Result<Vec<u8>, CapabilityError>;
}

// ═══════════════════════════════════════════════════════════════════════
// Capability Bundle
// ═══════════════════════════════════════════════════════════════════════

/// The capability handles available to this process, built once at
/// startup and passed to the components that need them.
#[derive(Clone, Default)]
pub struct Capabilities {
    pub llm: Option<Arc<dyn LanguageModel>>,
    pub transcriber: Option<Arc<dyn Transcriber>>,
    pub speech: Option<Arc<dyn SpeechSynthesizer>>,
}

impl Capabilities {
    /// Build the provider clients for whichever credentials are present.
    ///
    /// The OpenAI key enables both the language model and transcription;
    /// the ElevenLabs key enables speech synthesis.
    pub fn from_config(config: &Config, credentials: &Credentials) -> anyhow::Result<Self> {
        let mut caps = Capabilities::default();

        if let Some(key) = &credentials.openai_api_key {
            let client = Arc::new(OpenAiClient::new(
                &config.llm,
                &config.transcription,
                key.clone(),
            )?);
            caps.llm = Some(client.clone());
            caps.transcriber = Some(client);
        } else {
            tracing::warn!("OPENAI_API_KEY not set; questions, evaluation and transcription disabled");
        }

        if let Some(key) = &credentials.elevenlabs_api_key {
            caps.speech = Some(Arc::new(ElevenLabsClient::new(
                &config.speech,
                Duration::from_secs(config.llm.timeout_secs),
                key.clone(),
            )?));
        } else {
            tracing::info!("ELEVENLABS_API_KEY not set; voice output disabled");
        }

        Ok(caps)
    }
}

impl std::fmt::Debug for Capabilities {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Capabilities")
            .field("llm", &self.llm.as_ref().map(|m| m.name().to_string()))
            .field("transcriber", &self.transcriber.is_some())
            .field("speech", &self.speech.is_some())
            .finish()
    }
}

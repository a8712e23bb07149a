//! Speech input and output for quiz turns.
//!
//! Synthesis is best-effort: a missing provider or a failed call yields no
//! audio and the turn goes ahead as text. Transcription failures are
//! returned to the caller, which aborts the answer.

use std::sync::Arc;

use crate::error::CapabilityError;
use crate::models::AudioClip;
use crate::traits::{Capabilities, SpeechSynthesizer, Transcriber};

#[derive(Clone)]
pub struct VoiceHandler {
    transcriber: Option<Arc<dyn Transcriber>>,
    speech: Option<Arc<dyn SpeechSynthesizer>>,
    voice: String,
}

impl VoiceHandler {
    pub fn new(
        transcriber: Option<Arc<dyn Transcriber>>,
        speech: Option<Arc<dyn SpeechSynthesizer>>,
        voice: impl Into<String>,
    ) -> Self {
        Self {
            transcriber,
            speech,
            voice: voice.into(),
        }
    }

    pub fn from_capabilities(caps: &Capabilities, voice: impl Into<String>) -> Self {
        Self::new(caps.transcriber.clone(), caps.speech.clone(), voice)
    }

    /// Text-only handler.
    pub fn disabled() -> Self {
        Self::new(None, None, "")
    }

    pub fn can_transcribe(&self) -> bool {
        self.transcriber.is_some()
    }

    pub fn can_speak(&self) -> bool {
        self.speech.is_some()
    }

    pub async fn transcribe(&self, clip: &AudioClip) -> Result<String, CapabilityError> {
        let transcriber = self
            .transcriber
            .as_ref()
            .ok_or(CapabilityError::NotConfigured("transcription"))?;
        let text = transcriber.transcribe(clip).await?;
        tracing::debug!(file = %clip.file_name, chars = text.len(), "transcribed answer");
        Ok(text)
    }

    /// Synthesize `text`, or `None` if speech is unavailable or fails.
    pub async fn speak(&self, text: &str) -> Option<Vec<u8>> {
        let speech = self.speech.as_ref()?;
        match speech.synthesize(text, &self.voice).await {
            Ok(audio) => Some(audio),
            Err(e) => {
                tracing::warn!(voice = %self.voice, error = %e, "speech synthesis failed");
                None
            }
        }
    }
}

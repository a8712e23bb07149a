//! ElevenLabs text-to-speech client.
//!
//! Calls `POST {base_url}/v1/text-to-speech/{voice_id}` and returns the
//! MP3 body.

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;

use crate::config::SpeechConfig;
use crate::error::CapabilityError;
use crate::traits::SpeechSynthesizer;

const PROVIDER: &str = "ElevenLabs";

pub struct ElevenLabsClient {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl ElevenLabsClient {
    pub fn new(config: &SpeechConfig, timeout: Duration, api_key: String) -> anyhow::Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key,
            model: config.model.clone(),
        })
    }
}

#[async_trait]
impl SpeechSynthesizer for ElevenLabsClient {
    async fn synthesize(&self, text: &str, voice: &str) -> Result<Vec<u8>, CapabilityError> {
        let url = format!("{}/v1/text-to-speech/{}", self.base_url, voice);
        let payload = SpeechRequest {
            text,
            model_id: &self.model,
        };

        let response = self
            .client
            .post(url)
            .header("xi-api-key", &self.api_key)
            .header("Accept", "audio/mpeg")
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CapabilityError::Status {
                provider: PROVIDER,
                status,
                body,
            });
        }

        let audio = response.bytes().await?;
        if audio.is_empty() {
            return Err(CapabilityError::EmptyResponse(PROVIDER));
        }
        Ok(audio.to_vec())
    }
}

#[derive(Debug, Serialize)]
struct SpeechRequest<'a> {
    text: &'a str,
    model_id: &'a str,
}

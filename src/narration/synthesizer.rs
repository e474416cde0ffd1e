/*!
 * Text-to-speech clients.
 */

use async_trait::async_trait;
use bytes::Bytes;
use log::error;
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;

use crate::app_config::NarrationConfig;
use crate::errors::ProviderError;

/// Turns a line of text into encoded audio
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Synthesize `text` read according to `instructions`; returns MP3 bytes
    async fn synthesize(&self, text: &str, instructions: &str) -> Result<Bytes, ProviderError>;
}

/// Speech request body
#[derive(Debug, Serialize)]
pub struct SpeechRequest<'a> {
    model: &'a str,
    voice: &'a str,
    input: &'a str,
    #[serde(skip_serializing_if = "str::is_empty")]
    instructions: &'a str,
    response_format: &'a str,
}

/// OpenAI `/audio/speech` client
#[derive(Debug)]
pub struct OpenAiSpeech {
    client: Client,
    api_key: String,
    endpoint: String,
    model: String,
    voice: String,
}

impl OpenAiSpeech {
    pub fn new(
        api_key: impl Into<String>,
        endpoint: impl Into<String>,
        model: impl Into<String>,
        voice: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ProviderError::ConnectionError(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_key: api_key.into(),
            endpoint: endpoint.into(),
            model: model.into(),
            voice: voice.into(),
        })
    }

    /// Build from the narration config section and a resolved API key
    pub fn from_config(config: &NarrationConfig, api_key: String) -> Result<Self, ProviderError> {
        Self::new(
            api_key,
            config.endpoint.clone(),
            config.model.clone(),
            config.voice.clone(),
            Duration::from_secs(config.timeout_secs),
        )
    }

    fn api_url(&self) -> String {
        format!("{}/audio/speech", self.endpoint.trim_end_matches('/'))
    }

    pub fn build_request<'a>(&'a self, text: &'a str, instructions: &'a str) -> SpeechRequest<'a> {
        SpeechRequest {
            model: &self.model,
            voice: &self.voice,
            input: text,
            instructions,
            response_format: "mp3",
        }
    }
}

#[async_trait]
impl SpeechSynthesizer for OpenAiSpeech {
    async fn synthesize(&self, text: &str, instructions: &str) -> Result<Bytes, ProviderError> {
        if self.api_key.is_empty() {
            return Err(ProviderError::AuthenticationError(
                "No API key configured for speech synthesis".to_string(),
            ));
        }

        let response = self.client.post(self.api_url())
            .bearer_auth(&self.api_key)
            .json(&self.build_request(text, instructions))
            .send()
            .await
            .map_err(|e| ProviderError::RequestFailed(format!("Failed to send request to speech API: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await
                .unwrap_or_else(|_| "Failed to get error response text".to_string());
            error!("Speech API error ({}): {}", status, error_text);
            return Err(ProviderError::from_status(status.as_u16(), error_text));
        }

        response.bytes().await
            .map_err(|e| ProviderError::ParseError(format!("Failed to read speech audio: {}", e)))
    }
}

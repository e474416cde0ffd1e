use async_trait::async_trait;
use log::error;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

use crate::errors::ProviderError;
use crate::providers::{CompletionRequest, CompletionResponse, Provider};

/// Ollama client for interacting with Ollama API
#[derive(Debug)]
pub struct Ollama {
    /// Base URL of the Ollama API
    base_url: String,
    /// HTTP client for making requests
    client: Client,
    /// Model name
    model: String,
}

/// Chat message object
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Role of the message sender (system, user, assistant, or tool)
    pub role: String,
    /// Content of the message
    pub content: String,
}

/// Generation options for the Ollama API
#[derive(Debug, Serialize, Deserialize)]
pub struct GenerationOptions {
    /// Temperature for generation (default: 0.8)
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    /// Maximum number of tokens to generate
    #[serde(skip_serializing_if = "Option::is_none")]
    num_predict: Option<u32>,
}

/// Chat request for the Ollama API
#[derive(Debug, Serialize)]
pub struct ChatRequest {
    /// Model name to use for generation
    model: String,
    /// Messages of the conversation
    messages: Vec<ChatMessage>,
    /// Additional model parameters
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<GenerationOptions>,
    /// Format to return a response in: "json" or a JSON schema
    #[serde(skip_serializing_if = "Option::is_none")]
    format: Option<Value>,
    /// Whether to stream the response
    stream: bool,
}

/// Chat response from the Ollama API
#[derive(Debug, Deserialize)]
pub struct ChatResponse {
    /// Model name
    pub model: String,
    /// Response message
    pub message: ChatMessage,
    /// Whether the generation is complete
    pub done: bool,
    /// Number of prompt tokens
    #[serde(default)]
    pub prompt_eval_count: Option<u64>,
    /// Number of generated tokens
    #[serde(default)]
    pub eval_count: Option<u64>,
}

impl ChatRequest {
    /// Translate a provider-neutral request; the schema goes into `format`
    pub fn from_completion(model: &str, request: &CompletionRequest) -> Self {
        let mut messages = Vec::with_capacity(2);
        if !request.system.is_empty() {
            messages.push(ChatMessage { role: "system".to_string(), content: request.system.clone() });
        }
        messages.push(ChatMessage { role: "user".to_string(), content: request.user.clone() });

        Self {
            model: model.to_string(),
            messages,
            options: Some(GenerationOptions {
                temperature: request.temperature,
                num_predict: Some(request.max_tokens),
            }),
            format: request.schema.as_ref().map(|s| s.schema.clone()),
            stream: false,
        }
    }
}

impl Ollama {
    /// Create a new Ollama client
    pub fn new(
        base_url: impl Into<String>,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ProviderError::ConnectionError(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            base_url: base_url.into(),
            client,
            model: model.into(),
        })
    }

    /// Send a chat request
    pub async fn chat(&self, request: &ChatRequest) -> Result<ChatResponse, ProviderError> {
        let url = format!("{}/api/chat", self.base_url.trim_end_matches('/'));

        let response = self.client.post(&url)
            .json(request)
            .send()
            .await
            .map_err(|e| ProviderError::ConnectionError(format!("Failed to reach Ollama at {}: {}", url, e)))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await
                .unwrap_or_else(|_| "Failed to get error response text".to_string());
            error!("Ollama API error ({}): {}", status, error_text);
            return Err(ProviderError::from_status(status.as_u16(), error_text));
        }

        response.json::<ChatResponse>().await
            .map_err(|e| ProviderError::ParseError(format!("Failed to parse Ollama response: {}", e)))
    }
}

#[async_trait]
impl Provider for Ollama {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, ProviderError> {
        let body = ChatRequest::from_completion(&self.model, &request);
        let response = self.chat(&body).await?;

        Ok(CompletionResponse {
            text: response.message.content,
            prompt_tokens: response.prompt_eval_count,
            completion_tokens: response.eval_count,
        })
    }

    async fn test_connection(&self) -> Result<(), ProviderError> {
        let url = format!("{}/api/tags", self.base_url.trim_end_matches('/'));
        let response = self.client.get(&url).send().await
            .map_err(|e| ProviderError::ConnectionError(format!("Failed to reach Ollama at {}: {}", url, e)))?;
        if response.status().is_success() {
            Ok(())
        } else {
            Err(ProviderError::from_status(response.status().as_u16(), "Ollama is not ready".to_string()))
        }
    }

    fn name(&self) -> &str {
        "ollama"
    }
}

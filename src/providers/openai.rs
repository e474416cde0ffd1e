use async_trait::async_trait;
use log::error;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::time::Duration;

use crate::errors::ProviderError;
use crate::providers::{CompletionRequest, CompletionResponse, Provider};

/// OpenAI client for the chat completions API.
///
/// Also serves LM Studio, whose local server speaks the same protocol.
#[derive(Debug)]
pub struct OpenAI {
    /// HTTP client for API requests
    client: Client,
    /// API key for authentication (may be empty for local servers)
    api_key: String,
    /// API base URL, e.g. https://api.openai.com/v1
    endpoint: String,
    /// Model name
    model: String,
}

/// Chat completion request body
#[derive(Debug, Serialize)]
pub struct OpenAIRequest {
    /// The model to use
    model: String,
    /// The messages for the conversation
    messages: Vec<OpenAIMessage>,
    /// Temperature for generation
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    /// Maximum number of tokens to generate
    max_tokens: u32,
    /// Structured output format
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<Value>,
}

/// Chat message
#[derive(Debug, Serialize, Deserialize)]
pub struct OpenAIMessage {
    /// Role of the message sender (system, user, assistant)
    pub role: String,
    /// Content of the message
    pub content: String,
}

/// Chat completion response
#[derive(Debug, Deserialize)]
pub struct OpenAIResponse {
    /// Completion choices
    pub choices: Vec<OpenAIChoice>,
    /// Token usage information
    pub usage: Option<OpenAIUsage>,
}

/// A single completion choice
#[derive(Debug, Deserialize)]
pub struct OpenAIChoice {
    /// The generated message
    pub message: OpenAIMessage,
}

/// Token usage information
#[derive(Debug, Deserialize)]
pub struct OpenAIUsage {
    /// Number of prompt tokens
    pub prompt_tokens: u64,
    /// Number of completion tokens
    pub completion_tokens: u64,
}

impl OpenAIRequest {
    /// Translate a provider-neutral request into the chat completions body
    pub fn from_completion(model: &str, request: &CompletionRequest) -> Self {
        let response_format = request.schema.as_ref().map(|schema| {
            json!({
                "type": "json_schema",
                "json_schema": {
                    "name": schema.name,
                    "schema": schema.schema,
                    "strict": true
                }
            })
        });

        Self {
            model: model.to_string(),
            messages: vec![
                OpenAIMessage { role: "system".to_string(), content: request.system.clone() },
                OpenAIMessage { role: "user".to_string(), content: request.user.clone() },
            ],
            temperature: request.temperature,
            max_tokens: request.max_tokens,
            response_format,
        }
    }
}

impl OpenAI {
    /// Create a new OpenAI client
    pub fn new(
        api_key: impl Into<String>,
        endpoint: impl Into<String>,
        model: impl Into<String>,
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
        })
    }

    fn api_url(&self) -> String {
        format!("{}/chat/completions", self.endpoint.trim_end_matches('/'))
    }

    /// Send a raw chat completions request
    pub async fn chat(&self, request: &OpenAIRequest) -> Result<OpenAIResponse, ProviderError> {
        let mut builder = self.client.post(self.api_url())
            .header("Content-Type", "application/json")
            .json(request);
        if !self.api_key.is_empty() {
            builder = builder.bearer_auth(&self.api_key);
        }

        let response = builder.send().await
            .map_err(|e| ProviderError::RequestFailed(format!("Failed to send request to OpenAI API: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await
                .unwrap_or_else(|_| "Failed to get error response text".to_string());
            error!("OpenAI API error ({}): {}", status, error_text);
            return Err(ProviderError::from_status(status.as_u16(), error_text));
        }

        response.json::<OpenAIResponse>().await
            .map_err(|e| ProviderError::ParseError(format!("Failed to parse OpenAI API response: {}", e)))
    }

    /// Extract text from an OpenAI response
    pub fn extract_text_from_response(response: &OpenAIResponse) -> String {
        response.choices.first()
            .map(|c| c.message.content.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl Provider for OpenAI {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, ProviderError> {
        let body = OpenAIRequest::from_completion(&self.model, &request);
        let response = self.chat(&body).await?;

        Ok(CompletionResponse {
            text: Self::extract_text_from_response(&response),
            prompt_tokens: response.usage.as_ref().map(|u| u.prompt_tokens),
            completion_tokens: response.usage.as_ref().map(|u| u.completion_tokens),
        })
    }

    async fn test_connection(&self) -> Result<(), ProviderError> {
        let request = CompletionRequest::new("", "Hello").with_max_tokens(10);
        self.complete(request).await.map(|_| ())
    }

    fn name(&self) -> &str {
        "openai"
    }
}

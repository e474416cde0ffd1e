use async_trait::async_trait;
use log::error;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::errors::ProviderError;
use crate::providers::{CompletionRequest, CompletionResponse, Provider};

/// Anthropic client for interacting with Anthropic API
#[derive(Debug)]
pub struct Anthropic {
    /// HTTP client for API requests
    client: Client,
    /// API key for authentication
    api_key: String,
    /// API endpoint URL (optional, defaults to public API)
    endpoint: String,
    /// Model name
    model: String,
}

/// Anthropic message request
#[derive(Debug, Serialize)]
pub struct AnthropicRequest {
    /// The model to use
    model: String,

    /// The messages for the conversation
    messages: Vec<AnthropicMessage>,

    /// System prompt to guide the AI
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,

    /// Temperature for generation
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,

    /// Maximum number of tokens to generate
    max_tokens: u32,
}

/// Anthropic message format
#[derive(Debug, Serialize, Deserialize)]
pub struct AnthropicMessage {
    /// Role of the message sender (user, assistant)
    pub role: String,

    /// Content of the message
    pub content: String,
}

/// Token usage information
#[derive(Debug, Deserialize)]
pub struct TokenUsage {
    /// Number of input tokens
    pub input_tokens: u32,
    /// Number of output tokens
    pub output_tokens: u32,
}

/// Anthropic response
#[derive(Debug, Deserialize)]
pub struct AnthropicResponse {
    /// The content of the response
    pub content: Vec<AnthropicContent>,
    /// Token usage information
    pub usage: TokenUsage,
}

/// Individual content block in an Anthropic response
#[derive(Debug, Deserialize)]
pub struct AnthropicContent {
    /// The type of content
    #[serde(rename = "type")]
    pub content_type: String,

    /// The actual text content
    #[serde(default)]
    pub text: String,
}

impl AnthropicRequest {
    /// Translate a provider-neutral request.
    ///
    /// The messages API has no schema-constrained output mode, so the schema is
    /// appended to the system prompt and the reply is parsed leniently.
    pub fn from_completion(model: &str, request: &CompletionRequest) -> Self {
        let mut system = request.system.clone();
        if let Some(schema) = &request.schema {
            system.push_str(&format!(
                "\n\nRespond with a single JSON object named {} that follows this JSON schema and nothing else:\n{}",
                schema.name, schema.schema
            ));
        }

        Self {
            model: model.to_string(),
            messages: vec![AnthropicMessage {
                role: "user".to_string(),
                content: request.user.clone(),
            }],
            system: (!system.is_empty()).then_some(system),
            temperature: request.temperature,
            max_tokens: request.max_tokens,
        }
    }
}

impl Anthropic {
    /// Create a new Anthropic client
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

    /// Send a messages request
    pub async fn messages(&self, request: &AnthropicRequest) -> Result<AnthropicResponse, ProviderError> {
        let api_url = if self.endpoint.is_empty() {
            "https://api.anthropic.com/v1/messages".to_string()
        } else {
            format!("{}/v1/messages", self.endpoint.trim_end_matches('/'))
        };

        let response = self.client.post(&api_url)
            .header("Content-Type", "application/json")
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", "2023-06-01")
            .json(request)
            .send()
            .await
            .map_err(|e| ProviderError::RequestFailed(format!("Failed to send request to Anthropic API: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await
                .unwrap_or_else(|_| "Failed to get error response text".to_string());
            error!("Anthropic API error ({}): {}", status, error_text);
            return Err(ProviderError::from_status(status.as_u16(), error_text));
        }

        response.json::<AnthropicResponse>().await
            .map_err(|e| ProviderError::ParseError(format!("Failed to parse Anthropic API response: {}", e)))
    }

    /// Extract text from Anthropic response
    pub fn extract_text_from_response(response: &AnthropicResponse) -> String {
        response.content.iter()
            .filter(|c| c.content_type == "text")
            .map(|c| c.text.clone())
            .collect()
    }
}

#[async_trait]
impl Provider for Anthropic {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, ProviderError> {
        let body = AnthropicRequest::from_completion(&self.model, &request);
        let response = self.messages(&body).await?;

        Ok(CompletionResponse {
            text: Self::extract_text_from_response(&response),
            prompt_tokens: Some(response.usage.input_tokens as u64),
            completion_tokens: Some(response.usage.output_tokens as u64),
        })
    }

    async fn test_connection(&self) -> Result<(), ProviderError> {
        let request = CompletionRequest::new("", "Hello").with_max_tokens(10);
        self.complete(request).await.map(|_| ())
    }

    fn name(&self) -> &str {
        "anthropic"
    }
}

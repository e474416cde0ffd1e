/*!
 * Provider implementations for different language model services.
 *
 * This module contains client implementations for various LLM providers:
 * - OpenAI: OpenAI API integration (also used for LM Studio)
 * - Anthropic: Anthropic API integration
 * - Ollama: Local LLM server
 * - Mock: Scripted provider for tests
 */

use async_trait::async_trait;
use serde_json::Value;
use std::fmt::Debug;
use std::sync::Arc;
use std::time::Duration;

use crate::app_config::{Config, LlmProvider};
use crate::errors::ProviderError;

/// JSON schema the response must follow
#[derive(Debug, Clone)]
pub struct ResponseSchema {
    /// Schema name sent to providers that support named schemas
    pub name: String,
    /// The JSON schema itself
    pub schema: Value,
}

/// A provider-neutral completion request
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    /// System prompt to guide the model
    pub system: String,
    /// User message
    pub user: String,
    /// Structured output schema, if any
    pub schema: Option<ResponseSchema>,
    /// Temperature for generation
    pub temperature: Option<f32>,
    /// Maximum number of tokens to generate
    pub max_tokens: u32,
}

impl CompletionRequest {
    /// Create a new request with a system prompt and a user message
    pub fn new(system: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            system: system.into(),
            user: user.into(),
            schema: None,
            temperature: None,
            max_tokens: 1024,
        }
    }

    /// Require the response to follow a JSON schema
    pub fn with_schema(mut self, name: impl Into<String>, schema: Value) -> Self {
        self.schema = Some(ResponseSchema { name: name.into(), schema });
        self
    }

    /// Set the temperature
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Set the maximum number of generated tokens
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }
}

/// A provider-neutral completion response
#[derive(Debug, Clone)]
pub struct CompletionResponse {
    /// Generated text
    pub text: String,
    /// Prompt tokens reported by the provider
    pub prompt_tokens: Option<u64>,
    /// Completion tokens reported by the provider
    pub completion_tokens: Option<u64>,
}

/// Common trait for all LLM providers
///
/// This trait defines the interface that all provider implementations must follow,
/// allowing them to be used interchangeably by the analyzers.
#[async_trait]
pub trait Provider: Send + Sync + Debug {
    /// Complete a request using this provider
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, ProviderError>;

    /// Test the connection to the provider
    async fn test_connection(&self) -> Result<(), ProviderError>;

    /// Short provider name for logs
    fn name(&self) -> &str;
}

/// Build the configured provider
pub fn create_provider(config: &Config) -> Result<Arc<dyn Provider>, ProviderError> {
    let model = config.get_model();
    let endpoint = config.get_endpoint();
    let api_key = config.get_api_key();
    let timeout = Duration::from_secs(config.get_timeout_secs());

    let provider: Arc<dyn Provider> = match config.provider {
        LlmProvider::OpenAI | LlmProvider::LMStudio => {
            Arc::new(openai::OpenAI::new(api_key, endpoint, model, timeout)?)
        }
        LlmProvider::Anthropic => {
            Arc::new(anthropic::Anthropic::new(api_key, endpoint, model, timeout)?)
        }
        LlmProvider::Ollama => Arc::new(ollama::Ollama::new(endpoint, model, timeout)?),
    };
    Ok(provider)
}

/// Pull the first JSON object out of a model reply.
///
/// Models without native structured output like to wrap JSON in prose or
/// code fences; everything outside the outermost braces is dropped.
pub fn extract_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end >= start).then(|| &text[start..=end])
}

pub mod openai;
pub mod anthropic;
pub mod ollama;
pub mod mock;

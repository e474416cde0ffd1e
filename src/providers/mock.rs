/*!
 * Mock provider implementations for testing.
 *
 * This module provides mock providers that simulate different behaviors:
 * - `MockProvider::working()` - Always succeeds with a canned line analysis
 * - `MockProvider::intermittent(n)` - Fails every nth request
 * - `MockProvider::failing()` - Always fails with an error
 */

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::errors::ProviderError;
use crate::providers::{CompletionRequest, CompletionResponse, Provider};

/// Behavior mode for the mock provider
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MockBehavior {
    /// Always succeeds
    Working,
    /// Fails intermittently (every Nth request)
    Intermittent { fail_every: usize },
    /// Fails only on the given zero-based request
    FailOnce { request: usize },
    /// Always fails with an error
    Failing,
    /// Returns text that is not JSON
    Malformed,
    /// Returns empty response
    Empty,
    /// Simulates slow response
    Slow { delay_ms: u64 },
}

/// Mock provider for testing analysis behavior
#[derive(Debug)]
pub struct MockProvider {
    /// Behavior mode
    behavior: MockBehavior,
    /// Request counter, shared between clones
    request_count: Arc<AtomicUsize>,
    /// Every request received, shared between clones
    requests: Arc<Mutex<Vec<CompletionRequest>>>,
    /// Custom response generator (optional)
    custom_response: Option<fn(&CompletionRequest) -> String>,
}

impl MockProvider {
    /// Create a new mock provider with the specified behavior
    pub fn new(behavior: MockBehavior) -> Self {
        Self {
            behavior,
            request_count: Arc::new(AtomicUsize::new(0)),
            requests: Arc::new(Mutex::new(Vec::new())),
            custom_response: None,
        }
    }

    /// Create a working mock provider that always succeeds
    pub fn working() -> Self {
        Self::new(MockBehavior::Working)
    }

    /// Create an intermittently failing mock provider
    pub fn intermittent(fail_every: usize) -> Self {
        Self::new(MockBehavior::Intermittent { fail_every })
    }

    /// Create a mock that fails only on one request
    pub fn fail_once(request: usize) -> Self {
        Self::new(MockBehavior::FailOnce { request })
    }

    /// Create a failing mock provider that always errors
    pub fn failing() -> Self {
        Self::new(MockBehavior::Failing)
    }

    /// Create a mock that answers with non-JSON text
    pub fn malformed() -> Self {
        Self::new(MockBehavior::Malformed)
    }

    /// Create a mock that returns empty responses
    pub fn empty() -> Self {
        Self::new(MockBehavior::Empty)
    }

    /// Set a custom response generator
    pub fn with_custom_response(mut self, generator: fn(&CompletionRequest) -> String) -> Self {
        self.custom_response = Some(generator);
        self
    }

    /// Number of requests received so far
    pub fn request_count(&self) -> usize {
        self.request_count.load(Ordering::SeqCst)
    }

    /// Snapshot of all requests received so far
    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }

    /// Canned analysis of a narrated, non-dialogue line
    pub fn default_analysis_json() -> String {
        r#"{
            "is_dialogue": "false",
            "character": "Narrator",
            "emotion": "calm",
            "intensity": "4",
            "pause_after": "1.0",
            "voice_instructions": "Steady, even narration.",
            "is_scene_transition": "false",
            "is_action": "false",
            "sound_effects": []
        }"#.to_string()
    }

    fn success(&self, request: &CompletionRequest) -> CompletionResponse {
        let text = match self.custom_response {
            Some(generator) => generator(request),
            None => Self::default_analysis_json(),
        };
        CompletionResponse {
            prompt_tokens: Some(request.user.len() as u64),
            completion_tokens: Some((text.len() / 4) as u64),
            text,
        }
    }
}

impl Clone for MockProvider {
    fn clone(&self) -> Self {
        Self {
            behavior: self.behavior,
            request_count: Arc::clone(&self.request_count),
            requests: Arc::clone(&self.requests),
            custom_response: self.custom_response,
        }
    }
}

#[async_trait]
impl Provider for MockProvider {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, ProviderError> {
        let count = self.request_count.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request.clone());
        }

        match self.behavior {
            MockBehavior::Working => Ok(self.success(&request)),

            MockBehavior::Intermittent { fail_every } => {
                if fail_every > 0 && count % fail_every == fail_every - 1 {
                    Err(ProviderError::ApiError {
                        message: format!("Simulated intermittent failure (request #{})", count + 1),
                        status_code: 503,
                    })
                } else {
                    Ok(self.success(&request))
                }
            }

            MockBehavior::FailOnce { request: failing } => {
                if count == failing {
                    Err(ProviderError::ApiError {
                        message: format!("Simulated failure on request #{}", count + 1),
                        status_code: 500,
                    })
                } else {
                    Ok(self.success(&request))
                }
            }

            MockBehavior::Failing => Err(ProviderError::ApiError {
                message: "Simulated provider failure".to_string(),
                status_code: 500,
            }),

            MockBehavior::Malformed => Ok(CompletionResponse {
                text: "I think this line is rather sad.".to_string(),
                prompt_tokens: Some(10),
                completion_tokens: Some(8),
            }),

            MockBehavior::Empty => Ok(CompletionResponse {
                text: String::new(),
                prompt_tokens: Some(0),
                completion_tokens: Some(0),
            }),

            MockBehavior::Slow { delay_ms } => {
                tokio::time::sleep(tokio::time::Duration::from_millis(delay_ms)).await;
                Ok(self.success(&request))
            }
        }
    }

    async fn test_connection(&self) -> Result<(), ProviderError> {
        match self.behavior {
            MockBehavior::Failing => Err(ProviderError::ConnectionError("Simulated outage".to_string())),
            _ => Ok(()),
        }
    }

    fn name(&self) -> &str {
        "mock"
    }
}

/*!
 * Normalization of free-form sound effect descriptions into library search terms.
 */

use std::sync::Arc;

use async_trait::async_trait;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::errors::AnalysisError;
use crate::providers::{extract_json_object, CompletionRequest, Provider};

/// Category given to descriptions that could not be normalized
pub const UNCATEGORIZED: &str = "uncategorized";

/// A description mapped to a library search term
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedEffect {
    /// The description as it appears in the script
    pub original: String,
    /// Concise search term
    pub normalized: String,
    /// General category (ambient, action, technology...)
    pub category: String,
    /// What to look for in a library
    #[serde(default)]
    pub description: String,
    /// Other terms worth searching for
    #[serde(default)]
    pub alternative_search_terms: Vec<String>,
}

impl NormalizedEffect {
    /// Pass-through normalization used when the normalizer fails
    pub fn identity(original: &str) -> Self {
        Self {
            original: original.to_string(),
            normalized: original.to_string(),
            category: UNCATEGORIZED.to_string(),
            description: original.to_string(),
            alternative_search_terms: Vec::new(),
        }
    }
}

/// Turns a batch of descriptions into search terms
#[async_trait]
pub trait EffectNormalizer: Send + Sync {
    async fn normalize(&self, batch: &[String]) -> Result<Vec<NormalizedEffect>, AnalysisError>;
}

pub const NORMALIZATION_SYSTEM_PROMPT: &str = "You're a sound design expert helping normalize sound effect descriptions for searching in professional sound libraries.";

pub const NORMALIZATION_SCHEMA_NAME: &str = "sound_effect_normalization";

#[derive(Deserialize)]
struct NormalizationReply {
    normalized_effects: Vec<NormalizedEffect>,
}

/// Normalizer backed by a language model provider
#[derive(Debug, Clone)]
pub struct LlmEffectNormalizer {
    provider: Arc<dyn Provider>,
    temperature: f32,
}

impl LlmEffectNormalizer {
    pub fn new(provider: Arc<dyn Provider>, temperature: f32) -> Self {
        Self { provider, temperature }
    }

    pub fn build_user_prompt(batch: &[String]) -> String {
        let list = batch.iter().map(|effect| format!("- {}", effect)).collect::<Vec<_>>().join("\n");
        format!(
            "Please normalize these sound effect descriptions into standard search terms that would work well \
             in a sound effect library. For each term, provide a normalized version that's concise but specific \
             enough to find good matches. Here are the descriptions:\n\n{}",
            list
        )
    }

    pub fn response_schema() -> Value {
        json!({
            "type": "object",
            "additionalProperties": false,
            "properties": {
                "normalized_effects": {
                    "type": "array",
                    "items": {
                        "type": "object",
                        "additionalProperties": false,
                        "properties": {
                            "original": { "type": "string", "description": "The original sound effect description" },
                            "normalized": { "type": "string", "description": "The normalized search term for sound libraries" },
                            "category": { "type": "string", "description": "General category of the sound (ambient, action, technology, body, transition, etc.)" },
                            "description": { "type": "string", "description": "Brief description of what to look for in a sound library" },
                            "alternative_search_terms": {
                                "type": "array",
                                "items": { "type": "string" },
                                "description": "Alternative search terms that might yield good results"
                            }
                        },
                        "required": ["original", "normalized", "category", "description", "alternative_search_terms"]
                    }
                }
            },
            "required": ["normalized_effects"]
        })
    }

    /// Parse a reply, keeping only entries for descriptions of this batch
    pub fn parse_response(text: &str, batch: &[String]) -> Result<Vec<NormalizedEffect>, AnalysisError> {
        let json = extract_json_object(text)
            .ok_or_else(|| AnalysisError::MalformedResponse("no JSON object in normalization reply".to_string()))?;
        let reply: NormalizationReply = serde_json::from_str(json)
            .map_err(|e| AnalysisError::MalformedResponse(e.to_string()))?;

        let (known, unknown): (Vec<_>, Vec<_>) = reply
            .normalized_effects
            .into_iter()
            .partition(|effect| batch.contains(&effect.original));
        for effect in unknown {
            warn!("Ignoring normalization for unknown description {:?}", effect.original);
        }
        Ok(known)
    }
}

#[async_trait]
impl EffectNormalizer for LlmEffectNormalizer {
    async fn normalize(&self, batch: &[String]) -> Result<Vec<NormalizedEffect>, AnalysisError> {
        let request = CompletionRequest::new(NORMALIZATION_SYSTEM_PROMPT, Self::build_user_prompt(batch))
            .with_schema(NORMALIZATION_SCHEMA_NAME, Self::response_schema())
            .with_temperature(self.temperature)
            .with_max_tokens(4096);

        let response = self.provider.complete(request).await?;
        debug!("{} normalized a batch of {} descriptions", self.provider.name(), batch.len());
        Self::parse_response(&response.text, batch)
    }
}

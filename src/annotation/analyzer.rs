/*!
 * Line analyzers.
 *
 * The annotator only sees the `LineAnalyzer` trait; the language model backed
 * implementation turns a line and its context into a completion request and
 * parses the structured reply.
 */

use std::collections::BTreeSet;
use std::sync::Arc;

use async_trait::async_trait;
use log::debug;
use serde_json::{json, Value};

use super::context::ContextWindow;
use super::models::LineAnalysis;
use crate::errors::AnalysisError;
use crate::providers::{extract_json_object, CompletionRequest, Provider};

/// Produces the analysis of a single line
#[async_trait]
pub trait LineAnalyzer: Send + Sync {
    async fn analyze(
        &self,
        line: &str,
        context: &ContextWindow,
        seen_speakers: &BTreeSet<String>,
    ) -> Result<LineAnalysis, AnalysisError>;
}

/// System prompt for line analysis
pub const ANALYSIS_SYSTEM_PROMPT: &str = "You are a script analysis assistant specializing in dramatic readings. \
Analyze the emotional context of the provided line within its surrounding context. \
Identify dialogue, characters, emotions, and suggest appropriate voice modulation and sound effects.";

/// Name of the structured output schema
pub const ANALYSIS_SCHEMA_NAME: &str = "line_analysis";

/// Analyzer backed by a language model provider
#[derive(Debug, Clone)]
pub struct LlmLineAnalyzer {
    provider: Arc<dyn Provider>,
    temperature: f32,
}

impl LlmLineAnalyzer {
    pub fn new(provider: Arc<dyn Provider>, temperature: f32) -> Self {
        Self { provider, temperature }
    }

    /// User prompt for one line
    pub fn build_user_prompt(context: &ContextWindow, seen_speakers: &BTreeSet<String>) -> String {
        let speakers = seen_speakers.iter().map(String::as_str).collect::<Vec<_>>().join(", ");
        format!(
            "Here's a segment from a story, with the current line marked as [CURRENT LINE]:\n\n\
             {}\n\n\
             Analyze the current line for: dialogue detection, character identification (who is speaking?), \
             emotional content, appropriate pause length after this line, and sound effect suggestions. \
             We've seen these characters so far: {}. \
             If there is no character, Narrator is the character. \
             Provide a detailed analysis in JSON format.",
            context.render(),
            speakers
        )
    }

    /// JSON schema of the expected reply
    pub fn response_schema() -> Value {
        let text = |description: &str| json!({ "type": "string", "description": description });
        json!({
            "type": "object",
            "properties": {
                "is_dialogue": text("Whether this line contains dialogue, true or false"),
                "character": text("The character speaking, if identified"),
                "emotion": text("The primary emotion in this line (fear, anger, sadness, joy, tension, excitement, mystery, surprise, calm, neutral, etc.)"),
                "intensity": text("Emotional intensity on a scale from 1-10"),
                "pause_after": text("Recommended pause after this line in seconds (0.5-3.0)"),
                "voice_instructions": text("Detailed instructions for voice modulation"),
                "is_scene_transition": text("Whether this line indicates a scene transition"),
                "is_action": text("Whether this line describes action"),
                "sound_effects": {
                    "type": "array",
                    "items": { "type": "string" },
                    "description": "Suggested sound effects that would enhance this line"
                }
            },
            "required": [
                "is_dialogue", "emotion", "intensity", "pause_after", "voice_instructions",
                "sound_effects", "is_action", "is_scene_transition", "character"
            ],
            "additionalProperties": false
        })
    }

    /// Parse a reply into an analysis
    pub fn parse_response(text: &str) -> Result<LineAnalysis, AnalysisError> {
        let json = extract_json_object(text)
            .ok_or_else(|| AnalysisError::MalformedResponse(format!("no JSON object in reply: {:?}", truncate(text, 80))))?;
        serde_json::from_str(json)
            .map_err(|e| AnalysisError::MalformedResponse(e.to_string()))
    }
}

#[async_trait]
impl LineAnalyzer for LlmLineAnalyzer {
    async fn analyze(
        &self,
        _line: &str,
        context: &ContextWindow,
        seen_speakers: &BTreeSet<String>,
    ) -> Result<LineAnalysis, AnalysisError> {
        let request = CompletionRequest::new(
            ANALYSIS_SYSTEM_PROMPT,
            Self::build_user_prompt(context, seen_speakers),
        )
        .with_schema(ANALYSIS_SCHEMA_NAME, Self::response_schema())
        .with_temperature(self.temperature);

        let response = self.provider.complete(request).await?;
        debug!(
            "{} replied for line {} ({:?} prompt / {:?} completion tokens)",
            self.provider.name(),
            context.current_index() + 1,
            response.prompt_tokens,
            response.completion_tokens
        );
        Self::parse_response(&response.text)
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

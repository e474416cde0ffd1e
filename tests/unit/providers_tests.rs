/*!
 * Tests for provider implementations and the analyzers built on them
 */

use std::collections::BTreeSet;
use std::sync::Arc;

use storycast::annotation::analyzer::ANALYSIS_SCHEMA_NAME;
use storycast::annotation::{ContextWindow, LineAnalyzer, LlmLineAnalyzer};
use storycast::app_config::{Config, LlmProvider};
use storycast::effects::{EffectNormalizer, LlmEffectNormalizer};
use storycast::errors::{AnalysisError, ProviderError};
use storycast::providers::mock::MockProvider;
use storycast::providers::openai::OpenAIRequest;
use storycast::providers::{create_provider, CompletionRequest, Provider};

fn story() -> Vec<String> {
    vec![
        "The rain had not stopped for days.".to_string(),
        "Ana: Close the window.".to_string(),
        "Thunder rolled over the hills.".to_string(),
    ]
}

/// The analyzer sends the marked window with a schema and parses loose values
#[tokio::test]
async fn test_llmLineAnalyzer_withMockProvider_shouldParseCannedAnalysis() {
    let provider = MockProvider::working();
    let analyzer = LlmLineAnalyzer::new(Arc::new(provider.clone()), 0.3);
    let lines = story();
    let window = ContextWindow::build(&lines, 1, 5, 6).unwrap();
    let seen: BTreeSet<String> = ["Ben".to_string()].into_iter().collect();

    let analysis = analyzer.analyze(&lines[1], &window, &seen).await.unwrap();

    assert!(!analysis.is_dialogue);
    assert_eq!(analysis.character.as_deref(), Some("Narrator"));
    assert_eq!(analysis.intensity, 4.0);
    assert_eq!(analysis.pause_after, 1.0);

    let requests = provider.requests();
    assert_eq!(requests.len(), 1);
    assert!(requests[0].user.contains("[CURRENT LINE]: Ana: Close the window."));
    assert!(requests[0].user.contains("Ben"));
    assert_eq!(requests[0].schema.as_ref().map(|s| s.name.as_str()), Some(ANALYSIS_SCHEMA_NAME));
    assert_eq!(requests[0].temperature, Some(0.3));
}

/// Prose instead of JSON is a malformed response
#[tokio::test]
async fn test_llmLineAnalyzer_withMalformedReply_shouldFail() {
    let analyzer = LlmLineAnalyzer::new(Arc::new(MockProvider::malformed()), 0.3);
    let lines = story();
    let window = ContextWindow::build(&lines, 0, 5, 6).unwrap();

    let result = analyzer.analyze(&lines[0], &window, &BTreeSet::new()).await;
    assert!(matches!(result, Err(AnalysisError::MalformedResponse(_))));
}

/// Provider failures surface as provider errors
#[tokio::test]
async fn test_llmLineAnalyzer_withFailingProvider_shouldReturnProviderError() {
    let analyzer = LlmLineAnalyzer::new(Arc::new(MockProvider::failing()), 0.3);
    let lines = story();
    let window = ContextWindow::build(&lines, 2, 5, 6).unwrap();

    let result = analyzer.analyze(&lines[2], &window, &BTreeSet::new()).await;
    assert!(matches!(result, Err(AnalysisError::Provider(ProviderError::ApiError { .. }))));
}

/// Analysis values arrive as strings, numbers or noise and are all accepted
#[test]
fn test_parseResponse_withLooseTypes_shouldCoerce() {
    let reply = r#"Sure! {"is_dialogue": "yes", "character": " ", "emotion": "fear",
        "intensity": "8/10", "pause_after": 2, "voice_instructions": "Hushed.",
        "is_scene_transition": true, "is_action": "0", "sound_effects": ["thunder"]}"#;

    let analysis = LlmLineAnalyzer::parse_response(reply).unwrap();
    assert!(analysis.is_dialogue);
    assert_eq!(analysis.speaker(), None);
    assert_eq!(analysis.intensity, 8.0);
    assert_eq!(analysis.pause_after, 2.0);
    assert!(analysis.is_scene_transition);
    assert!(!analysis.is_action);
    assert_eq!(analysis.sound_effects, vec!["thunder"]);
}

/// The effect normalizer keeps only entries for its own batch
#[tokio::test]
async fn test_llmEffectNormalizer_shouldDropUnknownOriginals() {
    let provider = MockProvider::working().with_custom_response(|_| {
        r#"{"normalized_effects": [
            {"original": "heavy rain", "normalized": "rain heavy", "category": "ambient",
             "description": "Steady downpour", "alternative_search_terms": ["downpour"]},
            {"original": "invented", "normalized": "x", "category": "y",
             "description": "z", "alternative_search_terms": []}
        ]}"#
        .to_string()
    });
    let normalizer = LlmEffectNormalizer::new(Arc::new(provider.clone()), 0.3);
    let batch = vec!["heavy rain".to_string(), "distant thunder".to_string()];

    let effects = normalizer.normalize(&batch).await.unwrap();

    assert_eq!(effects.len(), 1);
    assert_eq!(effects[0].normalized, "rain heavy");
    assert!(provider.requests()[0].user.contains("- heavy rain\n- distant thunder"));
}

/// The OpenAI body uses strict JSON schema output
#[test]
fn test_openAIRequest_withSchema_shouldSerializeResponseFormat() {
    let request = CompletionRequest::new("system", "user")
        .with_schema("line_analysis", serde_json::json!({"type": "object"}))
        .with_max_tokens(256);

    let body = serde_json::to_value(OpenAIRequest::from_completion("gpt-4o", &request)).unwrap();
    assert_eq!(body["model"], "gpt-4o");
    assert_eq!(body["max_tokens"], 256);
    assert_eq!(body["response_format"]["type"], "json_schema");
    assert_eq!(body["response_format"]["json_schema"]["strict"], true);
    assert!(body.get("temperature").is_none());
}

/// Each configured provider type builds a client
#[test]
fn test_createProvider_shouldBuildConfiguredProvider() {
    let mut config = Config::default();
    for (provider, name) in [
        (LlmProvider::Ollama, "ollama"),
        (LlmProvider::LMStudio, "openai"),
        (LlmProvider::Anthropic, "anthropic"),
    ] {
        config.provider = provider;
        config.active_provider_config_mut().api_key = "key".to_string();
        config.active_provider_config_mut().timeout_secs = 1;
        let client = create_provider(&config).unwrap();
        assert_eq!(client.name(), name);
    }
}

use anyhow::{anyhow, Context, Result};
use log::warn;
use serde::{Deserialize, Serialize};
use std::default::Default;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use url::Url;

/// Application configuration module
/// This module handles the application configuration including loading,
/// validating and saving configuration settings.
/// Represents the application configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    /// Language model provider used for annotation and effect normalization
    #[serde(default)]
    pub provider: LlmProvider,

    /// Available provider configurations
    #[serde(default = "default_available_providers")]
    pub available_providers: Vec<ProviderConfig>,

    /// Line annotation settings
    #[serde(default)]
    pub annotation: AnnotationConfig,

    /// Sound effect cataloging settings
    #[serde(default)]
    pub effects: EffectsConfig,

    /// Speech synthesis settings
    #[serde(default)]
    pub narration: NarrationConfig,

    /// Silence trimming defaults
    #[serde(default)]
    pub trim: TrimConfig,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// Language model provider type
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LlmProvider {
    // @provider: OpenAI
    #[default]
    OpenAI,
    // @provider: Anthropic
    Anthropic,
    // @provider: Ollama
    Ollama,
    // @provider: LM Studio (OpenAI-compatible local server)
    LMStudio,
}

impl LlmProvider {
    // @returns: Capitalized provider name
    pub fn display_name(&self) -> &str {
        match self {
            Self::OpenAI => "OpenAI",
            Self::Anthropic => "Anthropic",
            Self::Ollama => "Ollama",
            Self::LMStudio => "LM Studio",
        }
    }

    // @returns: Lowercase provider identifier
    pub fn to_lowercase_string(&self) -> String {
        match self {
            Self::OpenAI => "openai".to_string(),
            Self::Anthropic => "anthropic".to_string(),
            Self::Ollama => "ollama".to_string(),
            Self::LMStudio => "lmstudio".to_string(),
        }
    }

    // @returns: Environment variable consulted when no API key is configured
    pub fn api_key_env_var(&self) -> Option<&'static str> {
        match self {
            Self::OpenAI => Some("OPENAI_API_KEY"),
            Self::Anthropic => Some("ANTHROPIC_API_KEY"),
            Self::Ollama | Self::LMStudio => None,
        }
    }
}

impl std::fmt::Display for LlmProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_lowercase_string())
    }
}

impl std::str::FromStr for LlmProvider {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "openai" => Ok(Self::OpenAI),
            "anthropic" => Ok(Self::Anthropic),
            "ollama" => Ok(Self::Ollama),
            "lmstudio" => Ok(Self::LMStudio),
            _ => Err(anyhow!("Invalid provider type: {}", s)),
        }
    }
}

/// Provider configuration wrapper
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ProviderConfig {
    // @field: Provider type identifier
    #[serde(rename = "type")]
    pub provider_type: String,

    // @field: Model name
    #[serde(default = "String::new")]
    pub model: String,

    // @field: API key
    #[serde(default = "String::new")]
    pub api_key: String,

    // @field: Service URL
    #[serde(default = "String::new")]
    pub endpoint: String,

    // @field: Timeout seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl ProviderConfig {
    // @param provider_type: Provider enum
    // @returns: Provider config with defaults
    pub fn new(provider_type: LlmProvider) -> Self {
        Self {
            provider_type: provider_type.to_lowercase_string(),
            model: default_model(&provider_type),
            api_key: String::new(),
            endpoint: default_endpoint(&provider_type),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Line annotation settings
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AnnotationConfig {
    /// Lines of context before the current line
    #[serde(default = "default_context_before")]
    pub context_before: usize,

    /// Lines of context after the current line
    #[serde(default = "default_context_after")]
    pub context_after: usize,

    /// Delay in milliseconds after each analyzer call
    #[serde(default = "default_rate_limit_delay_ms")]
    pub rate_limit_delay_ms: u64,

    /// Temperature parameter for text generation (0.0 to 1.0)
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Checkpoint file written after every line
    #[serde(default = "default_progress_file")]
    pub progress_file: String,

    /// Human-readable annotated script
    #[serde(default = "default_output_text")]
    pub output_text: String,

    /// Machine-readable annotated script
    #[serde(default = "default_output_json")]
    pub output_json: String,
}

impl Default for AnnotationConfig {
    fn default() -> Self {
        Self {
            context_before: default_context_before(),
            context_after: default_context_after(),
            rate_limit_delay_ms: default_rate_limit_delay_ms(),
            temperature: default_temperature(),
            progress_file: default_progress_file(),
            output_text: default_output_text(),
            output_json: default_output_json(),
        }
    }
}

/// Sound effect cataloging and library settings
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct EffectsConfig {
    /// Number of descriptions normalized per request
    #[serde(default = "default_effects_batch_size")]
    pub batch_size: usize,

    /// Delay in milliseconds after each normalization request
    #[serde(default = "default_rate_limit_delay_ms")]
    pub rate_limit_delay_ms: u64,

    /// Directory receiving the catalog files
    #[serde(default = "default_catalog_dir")]
    pub catalog_dir: String,

    /// Directory holding downloaded sound files
    #[serde(default = "default_library_dir")]
    pub library_dir: String,

    /// Description to file mapping
    #[serde(default = "default_mapping_file")]
    pub mapping_file: String,

    /// Script copy carrying the matched sound files
    #[serde(default = "default_script_with_sounds")]
    pub script_with_sounds: String,
}

impl Default for EffectsConfig {
    fn default() -> Self {
        Self {
            batch_size: default_effects_batch_size(),
            rate_limit_delay_ms: default_rate_limit_delay_ms(),
            catalog_dir: default_catalog_dir(),
            library_dir: default_library_dir(),
            mapping_file: default_mapping_file(),
            script_with_sounds: default_script_with_sounds(),
        }
    }
}

/// Speech synthesis settings
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct NarrationConfig {
    /// Text-to-speech model
    #[serde(default = "default_tts_model")]
    pub model: String,

    /// Voice preset
    #[serde(default = "default_tts_voice")]
    pub voice: String,

    /// API key, falls back to the OpenAI provider key and then OPENAI_API_KEY
    #[serde(default = "String::new")]
    pub api_key: String,

    /// Service endpoint URL
    #[serde(default = "default_openai_endpoint")]
    pub endpoint: String,

    /// Directory receiving per-line audio
    #[serde(default = "default_narration_output_dir")]
    pub output_dir: String,

    /// Delay in milliseconds after each synthesis call
    #[serde(default = "default_rate_limit_delay_ms")]
    pub rate_limit_delay_ms: u64,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for NarrationConfig {
    fn default() -> Self {
        Self {
            model: default_tts_model(),
            voice: default_tts_voice(),
            api_key: String::new(),
            endpoint: default_openai_endpoint(),
            output_dir: default_narration_output_dir(),
            rate_limit_delay_ms: default_rate_limit_delay_ms(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Silence trimming defaults
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TrimConfig {
    /// Silence threshold in dB relative to the track loudness (negative)
    #[serde(default = "default_silence_threshold_db")]
    pub silence_threshold_db: f64,

    /// Minimum silence duration in seconds
    #[serde(default = "default_silence_duration_secs")]
    pub silence_duration_secs: f64,

    /// Comma separated list of extensions to include
    #[serde(default = "default_trim_extensions")]
    pub extensions: String,
}

impl Default for TrimConfig {
    fn default() -> Self {
        Self {
            silence_threshold_db: default_silence_threshold_db(),
            silence_duration_secs: default_silence_duration_secs(),
            extensions: default_trim_extensions(),
        }
    }
}

impl TrimConfig {
    /// Minimum silence duration in whole milliseconds
    pub fn min_silence_ms(&self) -> u64 {
        (self.silence_duration_secs * 1000.0).round() as u64
    }

    /// Validate the trim settings
    pub fn validate(&self) -> Result<()> {
        if !self.silence_threshold_db.is_finite() || self.silence_threshold_db >= 0.0 {
            return Err(anyhow!(
                "Silence threshold must be a negative dB value, got {}",
                self.silence_threshold_db
            ));
        }
        if !self.silence_duration_secs.is_finite() || self.min_silence_ms() == 0 {
            return Err(anyhow!(
                "Silence duration must be positive, got {}",
                self.silence_duration_secs
            ));
        }
        if self.extensions.split(',').all(|e| e.trim().trim_start_matches('.').is_empty()) {
            return Err(anyhow!("At least one file extension is required"));
        }
        Ok(())
    }
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

fn default_available_providers() -> Vec<ProviderConfig> {
    vec![
        ProviderConfig::new(LlmProvider::OpenAI),
        ProviderConfig::new(LlmProvider::Anthropic),
        ProviderConfig::new(LlmProvider::Ollama),
        ProviderConfig::new(LlmProvider::LMStudio),
    ]
}

fn default_model(provider: &LlmProvider) -> String {
    match provider {
        LlmProvider::OpenAI => "gpt-4o".to_string(),
        LlmProvider::Anthropic => "claude-3-5-haiku-latest".to_string(),
        LlmProvider::Ollama => "llama3.2:3b".to_string(),
        // Placeholder; users should set to the loaded model name in LM Studio
        LlmProvider::LMStudio => "local-model".to_string(),
    }
}

fn default_endpoint(provider: &LlmProvider) -> String {
    match provider {
        LlmProvider::OpenAI => default_openai_endpoint(),
        LlmProvider::Anthropic => "https://api.anthropic.com".to_string(),
        LlmProvider::Ollama => "http://localhost:11434".to_string(),
        LlmProvider::LMStudio => "http://localhost:1234/v1".to_string(),
    }
}

fn default_openai_endpoint() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_timeout_secs() -> u64 {
    60
}

fn default_context_before() -> usize {
    5
}

fn default_context_after() -> usize {
    6
}

fn default_rate_limit_delay_ms() -> u64 {
    500 // 500ms default delay between requests
}

fn default_temperature() -> f32 {
    0.3
}

fn default_progress_file() -> String {
    "analysis_progress/progress.json".to_string()
}

fn default_output_text() -> String {
    "enhanced_script.txt".to_string()
}

fn default_output_json() -> String {
    "enhanced_script.json".to_string()
}

fn default_effects_batch_size() -> usize {
    20
}

fn default_catalog_dir() -> String {
    "sound_effects_catalog".to_string()
}

fn default_library_dir() -> String {
    "downloaded_sound_effects".to_string()
}

fn default_mapping_file() -> String {
    "sound_effect_mapping.json".to_string()
}

fn default_script_with_sounds() -> String {
    "enhanced_script_with_sounds.json".to_string()
}

fn default_tts_model() -> String {
    "gpt-4o-mini-tts".to_string()
}

fn default_tts_voice() -> String {
    "fable".to_string()
}

fn default_narration_output_dir() -> String {
    "audio_output".to_string()
}

fn default_silence_threshold_db() -> f64 {
    -50.0
}

fn default_silence_duration_secs() -> f64 {
    1.0
}

fn default_trim_extensions() -> String {
    ".mp3,.wav,.flac,.ogg,.m4a".to_string()
}

impl Config {
    /// Load the configuration file, writing a default one when it is missing
    pub fn load_or_create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            return Self::load(path);
        }

        warn!("Config file not found at '{}', creating default config.", path.display());
        let config = Config::default();
        let config_json = serde_json::to_string_pretty(&config)
            .context("Failed to serialize default config to JSON")?;
        std::fs::write(path, config_json)
            .with_context(|| format!("Failed to write default config to file: {}", path.display()))?;
        Ok(config)
    }

    /// Load the configuration file if present, defaults otherwise
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Config::default())
        }
    }

    /// Load an existing configuration file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)
            .with_context(|| format!("Failed to open config file: {}", path.display()))?;
        let reader = BufReader::new(file);
        serde_json::from_reader(reader)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Validate the settings needed to talk to the language model
    pub fn validate(&self) -> Result<()> {
        let endpoint = self.get_endpoint();
        Url::parse(&endpoint)
            .with_context(|| format!("Invalid endpoint for {}: {}", self.provider.display_name(), endpoint))?;

        if self.provider.api_key_env_var().is_some() && self.get_api_key().is_empty() {
            return Err(anyhow!(
                "API key is required for {} provider",
                self.provider.display_name()
            ));
        }

        if self.annotation.temperature < 0.0 || self.annotation.temperature > 2.0 {
            return Err(anyhow!("Temperature must be between 0.0 and 2.0"));
        }

        if self.effects.batch_size == 0 {
            return Err(anyhow!("Effect batch size must be at least 1"));
        }

        Ok(())
    }

    /// Get the active provider configuration from the available_providers array
    pub fn get_active_provider_config(&self) -> Option<&ProviderConfig> {
        self.get_provider_config(&self.provider)
    }

    /// Get a specific provider configuration by type
    pub fn get_provider_config(&self, provider_type: &LlmProvider) -> Option<&ProviderConfig> {
        let provider_str = provider_type.to_lowercase_string();
        self.available_providers.iter()
            .find(|p| p.provider_type == provider_str)
    }

    /// Mutable access to the active provider configuration, inserting a default one
    pub fn active_provider_config_mut(&mut self) -> &mut ProviderConfig {
        let provider_str = self.provider.to_lowercase_string();
        let position = self.available_providers.iter()
            .position(|p| p.provider_type == provider_str);
        let index = match position {
            Some(index) => index,
            None => {
                self.available_providers.push(ProviderConfig::new(self.provider.clone()));
                self.available_providers.len() - 1
            }
        };
        &mut self.available_providers[index]
    }

    /// Get the model for the active provider
    pub fn get_model(&self) -> String {
        self.get_active_provider_config()
            .map(|p| p.model.clone())
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| default_model(&self.provider))
    }

    /// Get the API key for the active provider, falling back to the environment
    pub fn get_api_key(&self) -> String {
        let configured = self.get_active_provider_config()
            .map(|p| p.api_key.clone())
            .unwrap_or_default();
        if !configured.is_empty() {
            return configured;
        }

        self.provider.api_key_env_var()
            .and_then(|var| std::env::var(var).ok())
            .unwrap_or_default()
    }

    /// Get the endpoint for the active provider
    pub fn get_endpoint(&self) -> String {
        self.get_active_provider_config()
            .map(|p| p.endpoint.clone())
            .filter(|e| !e.is_empty())
            .unwrap_or_else(|| default_endpoint(&self.provider))
    }

    /// Get the request timeout for the active provider
    pub fn get_timeout_secs(&self) -> u64 {
        self.get_active_provider_config()
            .map(|p| p.timeout_secs)
            .filter(|t| *t > 0)
            .unwrap_or_else(default_timeout_secs)
    }

    /// Get the API key for speech synthesis
    pub fn get_narration_api_key(&self) -> String {
        if !self.narration.api_key.is_empty() {
            return self.narration.api_key.clone();
        }
        let openai_key = self.get_provider_config(&LlmProvider::OpenAI)
            .map(|p| p.api_key.clone())
            .unwrap_or_default();
        if !openai_key.is_empty() {
            return openai_key;
        }
        std::env::var("OPENAI_API_KEY").unwrap_or_default()
    }
}

/// Default implementation for Config
impl Default for Config {
    fn default() -> Self {
        Config {
            provider: LlmProvider::default(),
            available_providers: default_available_providers(),
            annotation: AnnotationConfig::default(),
            effects: EffectsConfig::default(),
            narration: NarrationConfig::default(),
            trim: TrimConfig::default(),
            log_level: LogLevel::default(),
        }
    }
}

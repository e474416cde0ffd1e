/*!
 * Data model for annotated story lines.
 *
 * Language models return flags and numbers as JSON strings about as often as
 * native values ("true", "7", "1.5 seconds"), so the analysis fields are
 * parsed leniently.
 */

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};

/// Voice direction used when no analysis is available
pub const DEFAULT_VOICE_INSTRUCTIONS: &str = "Read in a natural, clear voice.";

/// First decimal number inside a string such as "7/10" or "1.5 seconds"
static NUMBER_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"-?\d+(?:\.\d+)?").expect("Invalid number regex")
});

/// What the analyzer reports for one line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineAnalysis {
    /// Whether the line contains spoken dialogue
    #[serde(default, deserialize_with = "deserialize_flag")]
    pub is_dialogue: bool,

    /// Speaker label, if the analyzer identified one
    #[serde(default, deserialize_with = "deserialize_label")]
    pub character: Option<String>,

    /// Primary emotion label
    #[serde(default = "default_emotion")]
    pub emotion: String,

    /// Emotional intensity on a 1-10 scale
    #[serde(default = "default_intensity", deserialize_with = "deserialize_number")]
    pub intensity: f64,

    /// Recommended pause after the line, in seconds
    #[serde(default = "default_pause_after", deserialize_with = "deserialize_number")]
    pub pause_after: f64,

    /// Voice direction for narration
    #[serde(default = "default_voice_instructions")]
    pub voice_instructions: String,

    /// Whether the line marks a change of scene
    #[serde(default, deserialize_with = "deserialize_flag")]
    pub is_scene_transition: bool,

    /// Whether the line describes action
    #[serde(default, deserialize_with = "deserialize_flag")]
    pub is_action: bool,

    /// Suggested sound effects, in the order given
    #[serde(default)]
    pub sound_effects: Vec<String>,
}

/// The safe default record body used when analysis fails
impl Default for LineAnalysis {
    fn default() -> Self {
        Self {
            is_dialogue: false,
            character: None,
            emotion: default_emotion(),
            intensity: default_intensity(),
            pause_after: default_pause_after(),
            voice_instructions: default_voice_instructions(),
            is_scene_transition: false,
            is_action: false,
            sound_effects: Vec::new(),
        }
    }
}

impl LineAnalysis {
    /// Speaker label if it is present and not blank
    pub fn speaker(&self) -> Option<&str> {
        self.character
            .as_deref()
            .map(str::trim)
            .filter(|label| !label.is_empty())
    }
}

/// One line of the story together with its analysis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotationRecord {
    #[serde(flatten)]
    pub analysis: LineAnalysis,

    /// The input line, verbatim
    pub original_text: String,

    /// Token count of the input line
    #[serde(default)]
    pub token_count: usize,
}

impl AnnotationRecord {
    pub fn new(analysis: LineAnalysis, original_text: impl Into<String>, token_count: usize) -> Self {
        Self {
            analysis,
            original_text: original_text.into(),
            token_count,
        }
    }

    /// Record with the safe default analysis
    pub fn fallback(original_text: impl Into<String>, token_count: usize) -> Self {
        Self::new(LineAnalysis::default(), original_text, token_count)
    }
}

/// Totals over a record sequence
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScriptSummary {
    pub total_lines: usize,
    pub total_tokens: usize,
}

impl ScriptSummary {
    pub fn from_records<'a, I>(records: I) -> Self
    where
        I: IntoIterator<Item = &'a AnnotationRecord>,
    {
        records.into_iter().fold(Self::default(), |summary, record| Self {
            total_lines: summary.total_lines + 1,
            total_tokens: summary.total_tokens + record.token_count,
        })
    }
}

fn default_emotion() -> String {
    "neutral".to_string()
}

fn default_intensity() -> f64 {
    5.0
}

fn default_pause_after() -> f64 {
    1.0
}

fn default_voice_instructions() -> String {
    DEFAULT_VOICE_INSTRUCTIONS.to_string()
}

#[derive(Deserialize)]
#[serde(untagged)]
enum FlagRepr {
    Bool(bool),
    Number(f64),
    Text(String),
    Null(()),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberRepr {
    Number(f64),
    Text(String),
}

/// Parse a loosely typed string flag
pub fn parse_flag(text: &str) -> bool {
    matches!(
        text.trim().to_lowercase().as_str(),
        "true" | "yes" | "y" | "1"
    )
}

/// Parse the first number found in a loosely typed string
pub fn parse_number(text: &str) -> Option<f64> {
    NUMBER_PATTERN
        .find(text)
        .and_then(|m| m.as_str().parse::<f64>().ok())
}

fn deserialize_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match FlagRepr::deserialize(deserializer)? {
        FlagRepr::Bool(value) => value,
        FlagRepr::Number(value) => value != 0.0,
        FlagRepr::Text(text) => parse_flag(&text),
        FlagRepr::Null(()) => false,
    })
}

fn deserialize_number<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    match NumberRepr::deserialize(deserializer)? {
        NumberRepr::Number(value) => Ok(value),
        NumberRepr::Text(text) => parse_number(&text)
            .ok_or_else(|| serde::de::Error::custom(format!("expected a number, got {:?}", text))),
    }
}

fn deserialize_label<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let label = Option::<String>::deserialize(deserializer)?;
    Ok(label.filter(|l| !l.trim().is_empty()))
}

/*!
 * The annotated script document shared by the later pipeline stages.
 *
 * Each line is an annotation record plus optional bookkeeping that the
 * effects and narration stages add. Fields a stage does not set are left out
 * of the JSON so an untouched script round-trips unchanged.
 */

use std::path::Path;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::annotation::models::{AnnotationRecord, ScriptSummary};
use crate::file_utils::FileManager;

/// One line of the script
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScriptLine {
    #[serde(flatten)]
    pub record: AnnotationRecord,

    /// Generated narration for this line
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio_file: Option<String>,

    /// Whether narration must be (re)generated; absent means yes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub needs_regeneration: Option<bool>,

    /// Library files matched to `sound_effects`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sound_effect_files: Option<Vec<String>>,
}

impl ScriptLine {
    pub fn text(&self) -> &str {
        &self.record.original_text
    }

    pub fn voice_instructions(&self) -> &str {
        &self.record.analysis.voice_instructions
    }

    pub fn sound_effects(&self) -> &[String] {
        &self.record.analysis.sound_effects
    }

    /// Flagged for generation; a line never validated counts as flagged
    pub fn is_flagged(&self) -> bool {
        self.needs_regeneration.unwrap_or(true)
    }

    pub fn has_audio(&self) -> bool {
        self.audio_file.as_deref().is_some_and(|f| !f.is_empty())
    }
}

impl From<AnnotationRecord> for ScriptLine {
    fn from(record: AnnotationRecord) -> Self {
        Self {
            record,
            audio_file: None,
            needs_regeneration: None,
            sound_effect_files: None,
        }
    }
}

/// `{"lines": [...], "total_lines": n, "total_tokens": t}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScriptDocument {
    pub lines: Vec<ScriptLine>,
    #[serde(default)]
    pub total_lines: usize,
    #[serde(default)]
    pub total_tokens: usize,
}

impl ScriptDocument {
    /// Build a document from annotation records, computing the summary
    pub fn from_records(records: Vec<AnnotationRecord>) -> Self {
        let summary = ScriptSummary::from_records(&records);
        Self {
            lines: records.into_iter().map(ScriptLine::from).collect(),
            total_lines: summary.total_lines,
            total_tokens: summary.total_tokens,
        }
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        FileManager::read_json(path)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        FileManager::write_json(path, self)
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Original texts in line order
    pub fn texts(&self) -> Vec<&str> {
        self.lines.iter().map(ScriptLine::text).collect()
    }
}

/*!
 * Annotated script outputs: a readable text version and the JSON script.
 */

use std::fmt::Write as _;
use std::path::Path;

use anyhow::Result;

use super::models::AnnotationRecord;
use crate::file_utils::FileManager;
use crate::script::ScriptDocument;

/// Human-readable annotated script
pub fn render_enhanced_text(records: &[AnnotationRecord]) -> String {
    let mut out = String::from("=== ENHANCED SCRIPT WITH EMOTIONAL AND SOUND CUES ===\n\n");

    for (i, record) in records.iter().enumerate() {
        let analysis = &record.analysis;
        let _ = writeln!(out, "[Line {}]", i + 1);
        let _ = writeln!(out, "TEXT: {}", record.original_text);

        if analysis.is_dialogue {
            out.push_str("DIALOGUE: Yes");
            if let Some(speaker) = analysis.speaker() {
                let _ = write!(out, " (Character: {})", speaker);
            }
            out.push('\n');
        }

        let _ = writeln!(out, "EMOTION: {} (Intensity: {})", analysis.emotion, analysis.intensity);
        let _ = writeln!(out, "VOICE: {}", analysis.voice_instructions);

        if !analysis.sound_effects.is_empty() {
            let _ = writeln!(out, "SOUND EFFECTS: {}", analysis.sound_effects.join(", "));
        }

        let _ = writeln!(out, "PAUSE AFTER: {} seconds", analysis.pause_after);
        out.push('\n');
    }

    out
}

/// Write the readable script
pub fn write_enhanced_text<P: AsRef<Path>>(records: &[AnnotationRecord], path: P) -> Result<()> {
    FileManager::write_to_file(path, &render_enhanced_text(records))
}

/// Write `{lines, total_lines, total_tokens}`
pub fn write_enhanced_json<P: AsRef<Path>>(records: &[AnnotationRecord], path: P) -> Result<()> {
    ScriptDocument::from_records(records.to_vec()).save(path)
}

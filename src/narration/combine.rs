/*!
 * Joining per-line narration into one recording.
 *
 * Each line's audio is followed by its `pause_after` in silence. Lines
 * without audio are skipped and reported.
 */

use std::path::{Path, PathBuf};

use anyhow::{bail, Result};
use log::{info, warn};

use super::project::NarrationProject;
use crate::audio::decode::decode_file;
use crate::audio::export::encode_buffer;
use crate::audio::AudioBuffer;

/// File name of the combined story inside the narration output directory
pub const COMBINED_FILE_NAME: &str = "complete_story.mp3";

/// Result of a combine run
#[derive(Debug, Clone, PartialEq)]
pub struct CombineReport {
    /// Written file
    pub output: PathBuf,
    /// Lines whose audio went into the file
    pub lines_included: usize,
    /// 1-based numbers of lines that had no audio
    pub missing_lines: Vec<usize>,
    /// Length of the combined recording, pauses included
    pub duration_ms: f64,
}

/// Concatenate every line's audio plus its pause and write it to `output`
pub async fn combine_audio(project: &NarrationProject, output: &Path) -> Result<CombineReport> {
    let mut samples: Vec<f32> = Vec::new();
    let mut layout: Option<(u16, u32)> = None;
    let mut lines_included = 0;
    let mut missing_lines = Vec::new();

    for (index, line) in project.document().lines.iter().enumerate() {
        let audio = line.audio_file.as_deref().filter(|f| !f.is_empty() && Path::new(f).exists());
        let Some(audio) = audio else {
            warn!("Missing audio for line {}", index + 1);
            missing_lines.push(index + 1);
            continue;
        };

        let decoded = decode_file(Path::new(audio))?;
        let buffer = decoded.buffer;
        let line_layout = (buffer.channels(), buffer.sample_rate());
        match layout {
            None => layout = Some(line_layout),
            Some(expected) if expected != line_layout => bail!(
                "Line {} audio is {} channels at {} Hz, expected {} channels at {} Hz",
                index + 1,
                line_layout.0,
                line_layout.1,
                expected.0,
                expected.1
            ),
            Some(_) => {}
        }

        samples.extend_from_slice(buffer.samples());
        let pause_ms = (line.record.analysis.pause_after.max(0.0) * 1000.0).round() as u64;
        let pause_frames = buffer.frames_for_ms(pause_ms);
        samples.resize(samples.len() + pause_frames * buffer.channels() as usize, 0.0);
        lines_included += 1;
    }

    let Some((channels, sample_rate)) = layout else {
        bail!("No line has audio to combine");
    };
    if !missing_lines.is_empty() {
        warn!("{} lines are missing audio: {:?}", missing_lines.len(), missing_lines);
    }

    let combined = AudioBuffer::new(samples, channels, sample_rate);
    encode_buffer(&combined, output).await?;
    info!("Exported complete story: {:?}", output);

    Ok(CombineReport {
        output: output.to_path_buf(),
        lines_included,
        missing_lines,
        duration_ms: combined.duration_ms(),
    })
}

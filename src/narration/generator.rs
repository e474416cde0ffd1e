/*!
 * Per-line speech generation.
 */

use std::fs;
use std::sync::Arc;
use std::time::Duration;

use log::{error, info};

use super::project::NarrationProject;
use super::synthesizer::SpeechSynthesizer;

/// Which lines a batch run covers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationMode {
    /// Lines without an audio file
    Missing,
    /// Lines flagged for regeneration (absent flag counts as flagged)
    Flagged,
}

/// Counts for a batch run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GenerationReport {
    pub attempted: usize,
    pub generated: usize,
    pub failed: usize,
}

/// Writes narration audio for the lines of a project
pub struct NarrationGenerator {
    synthesizer: Arc<dyn SpeechSynthesizer>,
    delay: Duration,
}

impl NarrationGenerator {
    pub fn new(synthesizer: Arc<dyn SpeechSynthesizer>, delay: Duration) -> Self {
        Self { synthesizer, delay }
    }

    /// Synthesize one line into `line{index + 1}.mp3` and record it.
    ///
    /// Failures are logged and reported as `false`.
    pub async fn generate_line(&self, project: &mut NarrationProject, index: usize) -> bool {
        let Some(line) = project.line(index) else {
            error!("Line index {} out of range", index + 1);
            return false;
        };
        let text = line.text().to_string();
        let instructions = line.voice_instructions().to_string();
        let path = project.expected_audio_path(index);

        info!("Generating audio for line {}: {}", index + 1, text);

        let audio = match self.synthesizer.synthesize(&text, &instructions).await {
            Ok(audio) => audio,
            Err(e) => {
                error!("Error generating audio for line {}: {}", index + 1, e);
                return false;
            }
        };

        if let Err(e) = fs::write(&path, &audio) {
            error!("Error writing {:?}: {}", path, e);
            return false;
        }
        if let Err(e) = project.record_audio(index, &path) {
            error!("Error saving script after line {}: {}", index + 1, e);
            return false;
        }

        info!("Generated: {:?}", path);
        true
    }

    /// Generate audio for every line without a file
    pub async fn generate_missing<F>(&self, project: &mut NarrationProject, on_line: F) -> GenerationReport
    where
        F: FnMut(usize, bool),
    {
        self.run(project, GenerationMode::Missing, on_line).await
    }

    /// Regenerate every flagged line
    pub async fn regenerate_flagged<F>(&self, project: &mut NarrationProject, on_line: F) -> GenerationReport
    where
        F: FnMut(usize, bool),
    {
        self.run(project, GenerationMode::Flagged, on_line).await
    }

    /// Lines a batch in `mode` would touch
    pub fn select_lines(project: &NarrationProject, mode: GenerationMode) -> Vec<usize> {
        project
            .document()
            .lines
            .iter()
            .enumerate()
            .filter(|(_, line)| match mode {
                GenerationMode::Missing => !line.has_audio(),
                GenerationMode::Flagged => line.is_flagged(),
            })
            .map(|(index, _)| index)
            .collect()
    }

    async fn run<F>(&self, project: &mut NarrationProject, mode: GenerationMode, mut on_line: F) -> GenerationReport
    where
        F: FnMut(usize, bool),
    {
        let selected = Self::select_lines(project, mode);
        let mut report = GenerationReport::default();

        for (position, index) in selected.iter().copied().enumerate() {
            report.attempted += 1;
            let ok = self.generate_line(project, index).await;
            if ok {
                report.generated += 1;
            } else {
                report.failed += 1;
            }
            on_line(index, ok);

            if !self.delay.is_zero() && position + 1 < selected.len() {
                tokio::time::sleep(self.delay).await;
            }
        }

        info!(
            "Batch generation complete: {} generated, {} failed",
            report.generated, report.failed
        );
        report
    }
}

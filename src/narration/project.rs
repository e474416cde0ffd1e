/*!
 * Narration bookkeeping over a script file.
 *
 * The script JSON is the single source of truth for which lines have audio.
 * Every state change is saved back to the same file immediately.
 */

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use log::{info, warn};

use crate::script::{ScriptDocument, ScriptLine};

/// A script file paired with its narration output directory
#[derive(Debug)]
pub struct NarrationProject {
    script_path: PathBuf,
    output_dir: PathBuf,
    document: ScriptDocument,
}

impl NarrationProject {
    /// Load the script and make sure the output directory exists
    pub fn open<P1: AsRef<Path>, P2: AsRef<Path>>(script_path: P1, output_dir: P2) -> Result<Self> {
        let script_path = script_path.as_ref().to_path_buf();
        let output_dir = output_dir.as_ref().to_path_buf();
        fs::create_dir_all(&output_dir)
            .with_context(|| format!("Failed to create output directory: {:?}", output_dir))?;
        let document = ScriptDocument::load(&script_path)?;

        Ok(Self { script_path, output_dir, document })
    }

    pub fn document(&self) -> &ScriptDocument {
        &self.document
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn len(&self) -> usize {
        self.document.len()
    }

    pub fn is_empty(&self) -> bool {
        self.document.is_empty()
    }

    pub fn line(&self, index: usize) -> Option<&ScriptLine> {
        self.document.lines.get(index)
    }

    /// `<output_dir>/line{index + 1}.mp3`
    pub fn expected_audio_path(&self, index: usize) -> PathBuf {
        self.output_dir.join(format!("line{}.mp3", index + 1))
    }

    pub fn save(&self) -> Result<()> {
        self.document.save(&self.script_path)?;
        info!("Updated script saved to {:?}", self.script_path);
        Ok(())
    }

    /// Reconcile recorded audio files with the output directory.
    ///
    /// Returns the number of lines that still need generation.
    pub fn validate_audio_files(&mut self) -> Result<usize> {
        let mut updated = false;

        for index in 0..self.document.lines.len() {
            let expected = self.expected_audio_path(index);
            let line = &mut self.document.lines[index];

            match line.audio_file.take() {
                Some(recorded) => {
                    if Path::new(&recorded).exists() {
                        line.audio_file = Some(recorded);
                    } else {
                        warn!("File not found: {}, marking for regeneration", recorded);
                        line.needs_regeneration = Some(true);
                        updated = true;
                    }
                }
                None => {
                    if expected.exists() {
                        line.audio_file = Some(expected.to_string_lossy().into_owned());
                        line.needs_regeneration = Some(false);
                        updated = true;
                    } else if line.needs_regeneration != Some(true) {
                        line.needs_regeneration = Some(true);
                        updated = true;
                    }
                }
            }
        }

        if updated {
            self.save()?;
        }

        let pending = self.pending_count();
        info!("{} out of {} lines need generation", pending, self.document.len());
        Ok(pending)
    }

    /// Lines flagged for generation
    pub fn pending_count(&self) -> usize {
        self.document.lines.iter().filter(|line| line.is_flagged()).count()
    }

    /// Flag a line for regeneration, optionally replacing its voice direction
    /// and deleting its current audio.
    pub fn mark_for_regeneration(
        &mut self,
        index: usize,
        new_instructions: Option<&str>,
        delete_existing: bool,
    ) -> Result<()> {
        let total = self.document.len();
        let line = self.document.lines.get_mut(index)
            .ok_or_else(|| anyhow!("Line index {} out of range (script has {} lines)", index + 1, total))?;

        line.needs_regeneration = Some(true);

        if let Some(instructions) = new_instructions.filter(|i| !i.trim().is_empty()) {
            line.record.analysis.voice_instructions = instructions.to_string();
            info!("Updated voice instructions for line {}", index + 1);
        }

        if delete_existing {
            if let Some(audio) = line.audio_file.take() {
                if Path::new(&audio).exists() {
                    fs::remove_file(&audio)
                        .with_context(|| format!("Failed to delete audio file: {}", audio))?;
                    info!("Deleted {}", audio);
                }
            }
        }

        self.save()
    }

    /// Record a freshly written audio file for a line and save
    pub fn record_audio(&mut self, index: usize, path: &Path) -> Result<()> {
        let line = self.document.lines.get_mut(index)
            .ok_or_else(|| anyhow!("Line index {} out of range", index + 1))?;
        line.audio_file = Some(path.to_string_lossy().into_owned());
        line.needs_regeneration = Some(false);
        self.save()
    }
}

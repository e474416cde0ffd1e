/*!
 * Batch silence trimming over a directory of audio files.
 */

use log::{debug, error, info};
use std::path::{Path, PathBuf};

use super::decode::decode_file;
use super::export::export_prefix;
use super::silence::SilenceDetector;
use crate::app_config::TrimConfig;
use crate::errors::{AudioError, TrimError};
use crate::file_utils::FileManager;

/// Settings for one trim batch
#[derive(Debug, Clone)]
pub struct TrimOptions {
    /// Where trimmed files go
    pub output_dir: PathBuf,
    /// Silence test
    pub detector: SilenceDetector,
    /// Lowercase extensions without dots
    pub extensions: Vec<String>,
}

impl TrimOptions {
    /// Build options from the config section; the output dir defaults to `<input>/trimmed`
    pub fn from_config(config: &TrimConfig, input_dir: &Path, output_dir: Option<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.unwrap_or_else(|| input_dir.join("trimmed")),
            detector: SilenceDetector::new(config.silence_threshold_db, config.min_silence_ms()),
            extensions: FileManager::parse_extensions(&config.extensions),
        }
    }
}

/// What happened to one file
#[derive(Debug, Clone, PartialEq)]
pub enum TrimOutcome {
    /// Trimmed copy written to this path, cut at this many milliseconds
    Trimmed { output: PathBuf, cut_ms: f64 },
    /// No sustained silence; nothing written
    NoSilence,
}

/// Counts for a finished batch
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrimReport {
    /// Files that matched the extension filter
    pub scanned: usize,
    /// Files written to the output directory
    pub trimmed: usize,
    /// Files that could not be decoded or exported
    pub failed: usize,
    /// Paths of the trimmed copies
    pub outputs: Vec<PathBuf>,
}

/// Trims audio files at their first sustained silence
#[derive(Debug, Clone)]
pub struct SilenceTrimmer {
    options: TrimOptions,
}

impl SilenceTrimmer {
    pub fn new(options: TrimOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &TrimOptions {
        &self.options
    }

    /// Trim one file into the output directory; the input is never touched
    pub async fn trim_file(&self, path: &Path) -> Result<TrimOutcome, AudioError> {
        info!("Processing {:?}", path);
        let output = FileManager::generate_output_path(path, &self.options.output_dir);
        if FileManager::same_location(path, &output) {
            return Err(AudioError::Export {
                path: output,
                reason: "output would overwrite the input file".to_string(),
            });
        }

        let decoded = decode_file(path)?;
        let buffer = &decoded.buffer;
        debug!(
            "{:?}: {:.0} ms, {} Hz, {} channels, {:.1} dBFS",
            path,
            buffer.duration_ms(),
            buffer.sample_rate(),
            buffer.channels(),
            buffer.dbfs()
        );

        let Some(cut_frame) = self.options.detector.find_cut_frame(buffer) else {
            info!("No extended silence found in {:?}", path);
            return Ok(TrimOutcome::NoSilence);
        };

        let cut_ms = buffer.ms_for_frames(cut_frame);
        info!("Found silence at {:.2} seconds", cut_ms / 1000.0);

        let trimmed = buffer.prefix(cut_frame);
        export_prefix(path, &decoded, &trimmed, &output).await?;
        info!("Trimmed file saved to {:?}", output);

        Ok(TrimOutcome::Trimmed { output, cut_ms })
    }

    /// Trim every matching file in `input_dir`.
    ///
    /// A file that fails is logged and counted; the batch carries on.
    pub async fn trim_directory<F>(&self, input_dir: &Path, mut on_file: F) -> Result<TrimReport, TrimError>
    where
        F: FnMut(&Path, &Result<TrimOutcome, AudioError>),
    {
        if !FileManager::dir_exists(input_dir) {
            return Err(TrimError::InputDirectoryMissing(input_dir.to_path_buf()));
        }

        if FileManager::same_location(input_dir, &self.options.output_dir) {
            return Err(TrimError::OutputIsInput(self.options.output_dir.clone()));
        }

        let files = FileManager::find_files_with_extensions(input_dir, &self.options.extensions)
            .map_err(|e| TrimError::Io(std::io::Error::other(e.to_string())))?;
        if files.is_empty() {
            return Err(TrimError::NoMatchingFiles {
                dir: input_dir.to_path_buf(),
                extensions: self.options.extensions.iter()
                    .map(|e| format!(".{}", e))
                    .collect::<Vec<_>>()
                    .join(","),
            });
        }

        std::fs::create_dir_all(&self.options.output_dir)?;
        info!("Found {} audio files to process", files.len());

        let mut report = TrimReport::default();
        for file in &files {
            report.scanned += 1;
            let result = self.trim_file(file).await;
            match &result {
                Ok(TrimOutcome::Trimmed { output, .. }) => {
                    report.trimmed += 1;
                    report.outputs.push(output.clone());
                }
                Ok(TrimOutcome::NoSilence) => {}
                Err(e) => {
                    error!("Error processing {:?}: {}", file, e);
                    report.failed += 1;
                }
            }
            on_file(file, &result);
        }

        info!(
            "Processing complete. Processed {} files, trimmed {} files.",
            report.scanned, report.trimmed
        );
        Ok(report)
    }
}

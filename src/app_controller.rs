use anyhow::{anyhow, Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use log::{info, warn};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::annotation::report::{write_enhanced_json, write_enhanced_text};
use crate::annotation::{Annotator, AnnotatorOptions, LineAnalyzer, LlmLineAnalyzer, ProgressStore, ScriptSummary};
use crate::app_config::Config;
use crate::audio::{SilenceTrimmer, TrimOptions, TrimOutcome, TrimReport};
use crate::effects::catalog::{build_catalog, normalize_all, write_catalog, EffectReferences, SoundEffectCatalog, CATALOG_JSON_FILE};
use crate::effects::library::{apply_mapping, load_mapping, save_mapping, MissingEffect, SoundLibrary, SoundMapping};
use crate::effects::normalizer::{EffectNormalizer, LlmEffectNormalizer};
use crate::file_utils::FileManager;
use crate::narration::{combine_audio, CombineReport, GenerationMode, GenerationReport, NarrationGenerator, NarrationProject, OpenAiSpeech, SpeechSynthesizer, COMBINED_FILE_NAME};
use crate::providers::create_provider;
use crate::script::ScriptDocument;

// @module: Application controller wiring the pipelines to files and progress bars

/// A non-interactive narration step
#[derive(Debug, Clone, PartialEq)]
pub enum NarrateAction {
    /// Synthesize lines without audio
    Generate,
    /// Synthesize lines flagged for regeneration
    Regenerate,
    /// Reconcile recorded audio with the output directory
    Validate,
    /// Flag one line (1-based) for regeneration
    Mark {
        line: usize,
        instructions: Option<String>,
        delete_audio: bool,
    },
}

/// Main application controller
pub struct Controller {
    // @field: App configuration
    config: Config,
}

impl Controller {
    /// Create a new controller for test purposes with default configuration
    pub fn new_for_test() -> Result<Self> {
        Self::with_config(Config::default())
    }

    // @method: Create a new controller with the given configuration
    pub fn with_config(config: Config) -> Result<Self> {
        Ok(Self { config })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Annotate a story file with the configured language model
    pub async fn run_annotate(&self, input_file: &Path) -> Result<ScriptSummary> {
        self.config.validate().context("Configuration validation failed")?;
        let provider = create_provider(&self.config)?;
        info!("Annotating with {} - {}", self.config.provider.display_name(), self.config.get_model());

        let analyzer = Arc::new(LlmLineAnalyzer::new(provider, self.config.annotation.temperature));
        self.annotate_with(input_file, analyzer).await
    }

    /// Annotate a story file with the given analyzer
    pub async fn annotate_with(&self, input_file: &Path, analyzer: Arc<dyn LineAnalyzer>) -> Result<ScriptSummary> {
        let start_time = Instant::now();
        let settings = &self.config.annotation;

        if !FileManager::file_exists(input_file) {
            return Err(anyhow!("Input file does not exist: {:?}", input_file));
        }
        let lines = FileManager::read_story_lines(input_file)?;
        if lines.is_empty() {
            return Err(anyhow!("Input file has no non-blank lines: {:?}", input_file));
        }
        info!("Read {} lines from {:?}", lines.len(), input_file);

        let mut store = ProgressStore::open(&settings.progress_file)?;
        let progress_bar = Self::create_progress_bar(lines.len() as u64, "lines");
        progress_bar.set_position(store.len().min(lines.len()) as u64);
        progress_bar.set_message("Analyzing");

        let mut annotator = Annotator::new(analyzer, AnnotatorOptions::from(settings));
        let pb = progress_bar.clone();
        let records = annotator
            .annotate_all_with_progress(&lines, &mut store, |_, _| pb.inc(1))
            .await?;
        progress_bar.finish_with_message("Analysis complete");

        write_enhanced_text(&records, &settings.output_text)?;
        write_enhanced_json(&records, &settings.output_json)?;

        let summary = ScriptSummary::from_records(&records);
        info!("Enhanced script created: {}", settings.output_text);
        info!("Enhanced script JSON created: {}", settings.output_json);
        info!(
            "Annotated {} lines ({} tokens) in {}",
            summary.total_lines,
            summary.total_tokens,
            Self::format_duration(start_time.elapsed())
        );
        Ok(summary)
    }

    /// Trim every matching audio file in a directory
    pub async fn run_trim(&self, input_dir: &Path, output_dir: Option<PathBuf>) -> Result<TrimReport> {
        self.config.trim.validate().context("Invalid trim settings")?;
        let options = TrimOptions::from_config(&self.config.trim, input_dir, output_dir);
        info!(
            "Trimming at first silence of {:.2}s below {} dB into {:?}",
            self.config.trim.silence_duration_secs, self.config.trim.silence_threshold_db, options.output_dir
        );

        let trimmer = SilenceTrimmer::new(options);
        let progress_bar = ProgressBar::new_spinner();
        let pb = progress_bar.clone();
        let report = trimmer
            .trim_directory(input_dir, |file, result| {
                let name = file.file_name().map(|f| f.to_string_lossy().to_string()).unwrap_or_default();
                match result {
                    Ok(TrimOutcome::Trimmed { .. }) => pb.set_message(format!("Trimmed: {}", name)),
                    Ok(TrimOutcome::NoSilence) => pb.set_message(format!("No silence: {}", name)),
                    Err(_) => pb.set_message(format!("Failed: {}", name)),
                }
                pb.tick();
            })
            .await?;
        progress_bar.finish_and_clear();

        if report.failed > 0 {
            warn!("{} files could not be processed", report.failed);
        }
        Ok(report)
    }

    /// Build the sound effect catalog with the configured language model
    pub async fn run_effects_catalog(&self, script_path: &Path) -> Result<SoundEffectCatalog> {
        self.config.validate().context("Configuration validation failed")?;
        let provider = create_provider(&self.config)?;
        let normalizer = LlmEffectNormalizer::new(provider, self.config.annotation.temperature);
        self.catalog_with(script_path, &normalizer).await
    }

    /// Build the sound effect catalog with the given normalizer
    pub async fn catalog_with(&self, script_path: &Path, normalizer: &dyn EffectNormalizer) -> Result<SoundEffectCatalog> {
        let settings = &self.config.effects;
        let script = ScriptDocument::load(script_path)
            .with_context(|| format!("Error reading enhanced script JSON: {:?}", script_path))?;

        let refs = EffectReferences::extract(&script);
        info!(
            "Found {} sound effect references across {} unique descriptions",
            refs.total_references,
            refs.unique.len()
        );

        let normalized = normalize_all(
            normalizer,
            &refs.unique,
            settings.batch_size,
            Duration::from_millis(settings.rate_limit_delay_ms),
        )
        .await;

        let catalog = build_catalog(&script, &refs, &normalized);
        for path in write_catalog(&catalog, &settings.catalog_dir)? {
            info!("Created {:?}", path);
        }
        info!("Created sound effects catalog with {} unique effects", catalog.total_unique_effects);
        Ok(catalog)
    }

    fn load_catalog(&self) -> Result<SoundEffectCatalog> {
        let path = Path::new(&self.config.effects.catalog_dir).join(CATALOG_JSON_FILE);
        SoundEffectCatalog::load(&path)
            .with_context(|| format!("Failed to load catalog {:?}; run `effects catalog` first", path))
    }

    fn library(&self) -> Result<SoundLibrary> {
        let dir = &self.config.effects.library_dir;
        FileManager::ensure_dir(dir)?;
        Ok(SoundLibrary::new(dir))
    }

    /// List catalog entries without a downloaded file
    pub fn run_effects_missing(&self) -> Result<Vec<MissingEffect>> {
        let missing = self.library()?.list_missing(&self.load_catalog()?);

        if missing.is_empty() {
            info!("All sound effects have been downloaded!");
        } else {
            info!("Missing {} sound effects:", missing.len());
            for (i, sound) in missing.iter().enumerate() {
                info!(
                    "{}. {} ({}) - used {} times, save as {}.mp3",
                    i + 1,
                    sound.normalized,
                    sound.category,
                    sound.occurrences,
                    sound.file_stem
                );
                info!("   Description: {}", sound.description);
                info!("   Alternative search terms: {}", sound.alternative_search_terms.join(", "));
            }
        }
        Ok(missing)
    }

    /// Map catalog descriptions to downloaded files and save the mapping
    pub fn run_effects_map(&self) -> Result<SoundMapping> {
        let mapping = self.library()?.build_mapping(&self.load_catalog()?);
        save_mapping(&mapping, &self.config.effects.mapping_file)?;
        Ok(mapping)
    }

    /// Attach mapped sound files to the script lines
    pub fn run_effects_apply(&self, script_path: &Path) -> Result<PathBuf> {
        let settings = &self.config.effects;
        let mapping = load_mapping(&settings.mapping_file)
            .with_context(|| format!("Failed to load mapping {}; run `effects map` first", settings.mapping_file))?;
        let mut script = ScriptDocument::load(script_path)?;

        let attached = apply_mapping(&mut script, &mapping);
        let output = PathBuf::from(&settings.script_with_sounds);
        script.save(&output)?;
        info!("Enhanced script updated with {} sound effect files: {:?}", attached, output);
        Ok(output)
    }

    /// Run a narration step with the configured speech service
    pub async fn run_narrate(&self, script_path: &Path, output_dir: Option<PathBuf>, action: NarrateAction) -> Result<GenerationReport> {
        let synthesizer = OpenAiSpeech::from_config(&self.config.narration, self.config.get_narration_api_key())?;
        self.narrate_with(script_path, output_dir, action, Arc::new(synthesizer)).await
    }

    /// Run a narration step with the given synthesizer
    pub async fn narrate_with(
        &self,
        script_path: &Path,
        output_dir: Option<PathBuf>,
        action: NarrateAction,
        synthesizer: Arc<dyn SpeechSynthesizer>,
    ) -> Result<GenerationReport> {
        let settings = &self.config.narration;
        let output_dir = output_dir.unwrap_or_else(|| PathBuf::from(&settings.output_dir));
        let mut project = NarrationProject::open(script_path, &output_dir)?;
        project.validate_audio_files()?;

        let generator = NarrationGenerator::new(synthesizer, Duration::from_millis(settings.rate_limit_delay_ms));
        let report = match action {
            NarrateAction::Validate => GenerationReport::default(),
            NarrateAction::Mark { line, instructions, delete_audio } => {
                let index = line.checked_sub(1).ok_or_else(|| anyhow!("Line numbers start at 1"))?;
                project.mark_for_regeneration(index, instructions.as_deref(), delete_audio)?;
                info!("Line {} marked for regeneration", line);
                GenerationReport::default()
            }
            NarrateAction::Generate => {
                let pending = NarrationGenerator::select_lines(&project, GenerationMode::Missing).len();
                let pb = Self::create_progress_bar(pending as u64, "lines");
                let report = generator.generate_missing(&mut project, |_, _| pb.inc(1)).await;
                pb.finish_and_clear();
                report
            }
            NarrateAction::Regenerate => {
                let pending = NarrationGenerator::select_lines(&project, GenerationMode::Flagged).len();
                let pb = Self::create_progress_bar(pending as u64, "lines");
                let report = generator.regenerate_flagged(&mut project, |_, _| pb.inc(1)).await;
                pb.finish_and_clear();
                report
            }
        };

        if report.failed > 0 {
            warn!("{} of {} lines failed to generate", report.failed, report.attempted);
        }
        Ok(report)
    }

    /// Join the narrated lines into one file, `<output_dir>/complete_story.mp3` unless `output` is given
    pub async fn run_combine(
        &self,
        script_path: &Path,
        output_dir: Option<PathBuf>,
        output: Option<PathBuf>,
    ) -> Result<CombineReport> {
        let output_dir = output_dir.unwrap_or_else(|| PathBuf::from(&self.config.narration.output_dir));
        let mut project = NarrationProject::open(script_path, &output_dir)?;
        project.validate_audio_files()?;

        let output = output.unwrap_or_else(|| output_dir.join(COMBINED_FILE_NAME));
        let report = combine_audio(&project, &output)
            .await
            .with_context(|| format!("Failed to combine narration into {:?}", output))?;

        if !report.missing_lines.is_empty() {
            warn!("Combined story skips lines without audio: {:?}", report.missing_lines);
        }
        info!(
            "Combined {} lines into {:?} ({})",
            report.lines_included,
            report.output,
            Self::format_duration(Duration::from_secs_f64(report.duration_ms / 1000.0))
        );
        Ok(report)
    }

    // @creates: Progress bar with the standard template, falling back to a plain one
    fn create_progress_bar(len: u64, unit: &str) -> ProgressBar {
        let progress_bar = ProgressBar::new(len);
        let style = ProgressStyle::default_bar()
            .template(&format!(
                "{{spinner:.green}} [{{elapsed_precise}}] [{{bar:40.cyan/blue}}] {{pos}}/{{len}} {} ({{percent}}%) {{msg}} {{eta}}",
                unit
            ))
            .or_else(|_| ProgressStyle::default_bar().template("{spinner} [{elapsed_precise}] [{bar:40}] {pos}/{len} ({percent}%) {msg}"))
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        progress_bar.set_style(style.progress_chars("█▓▒░"));
        progress_bar
    }

    // Format duration in a human-readable format
    fn format_duration(duration: Duration) -> String {
        let total_seconds = duration.as_secs();
        let hours = total_seconds / 3600;
        let minutes = (total_seconds % 3600) / 60;
        let seconds = total_seconds % 60;

        if hours > 0 {
            format!("{}h {}m {}s", hours, minutes, seconds)
        } else if minutes > 0 {
            format!("{}m {}s", minutes, seconds)
        } else {
            format!("{}.{:03}s", seconds, duration.subsec_millis())
        }
    }
}

// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{Context, Result};
use clap::{Args, CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{generate, Shell};
use log::{info, LevelFilter, Level, Log, Metadata, Record, SetLoggerError};
use std::io::Write;
use std::path::{Path, PathBuf};

use storycast::app_config::{self, Config, LlmProvider};
use storycast::app_controller::{Controller, NarrateAction};

/// CLI Wrapper for LlmProvider to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliProvider {
    Ollama,
    OpenAI,
    Anthropic,
    LMStudio,
}

impl From<CliProvider> for LlmProvider {
    fn from(cli_provider: CliProvider) -> Self {
        match cli_provider {
            CliProvider::Ollama => LlmProvider::Ollama,
            CliProvider::OpenAI => LlmProvider::OpenAI,
            CliProvider::Anthropic => LlmProvider::Anthropic,
            CliProvider::LMStudio => LlmProvider::LMStudio,
        }
    }
}

/// CLI Wrapper for LogLevel to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliLogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<CliLogLevel> for app_config::LogLevel {
    fn from(cli_level: CliLogLevel) -> Self {
        match cli_level {
            CliLogLevel::Error => app_config::LogLevel::Error,
            CliLogLevel::Warn => app_config::LogLevel::Warn,
            CliLogLevel::Info => app_config::LogLevel::Info,
            CliLogLevel::Debug => app_config::LogLevel::Debug,
            CliLogLevel::Trace => app_config::LogLevel::Trace,
        }
    }
}

/// Options shared by every command
#[derive(Args, Debug, Clone)]
struct CommonArgs {
    /// Configuration file path
    #[arg(short, long, default_value = "conf.json", global = true)]
    config_path: String,

    /// Set logging level
    #[arg(short, long, value_enum, global = true)]
    log_level: Option<CliLogLevel>,
}

/// Language model selection
#[derive(Args, Debug, Clone)]
struct ProviderArgs {
    /// Language model provider to use
    #[arg(short, long, value_enum)]
    provider: Option<CliProvider>,

    /// Model name to use
    #[arg(short, long)]
    model: Option<String>,
}

#[derive(Args, Debug)]
struct AnnotateArgs {
    /// Story text file, one line per paragraph or line of dialogue
    #[arg(value_name = "INPUT_TEXT")]
    input: PathBuf,

    #[command(flatten)]
    provider: ProviderArgs,

    /// Checkpoint file (default from config)
    #[arg(long)]
    progress_file: Option<String>,

    /// Readable annotated script (default from config)
    #[arg(long)]
    output_text: Option<String>,

    /// JSON annotated script (default from config)
    #[arg(long)]
    output_json: Option<String>,
}

#[derive(Args, Debug)]
struct TrimArgs {
    /// Directory containing the audio files
    #[arg(value_name = "INPUT_DIR")]
    input_dir: PathBuf,

    /// Output directory (default: <INPUT_DIR>/trimmed)
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Silence threshold in dB relative to the track loudness
    #[arg(long, allow_negative_numbers = true)]
    silence_threshold: Option<f64>,

    /// Minimum silence duration in seconds
    #[arg(long)]
    silence_duration: Option<f64>,

    /// Comma separated list of file extensions to include
    #[arg(long)]
    extensions: Option<String>,
}

#[derive(Subcommand, Debug)]
enum EffectsCommand {
    /// Extract and normalize sound effects into a catalog
    Catalog {
        /// Annotated script JSON (default from config)
        #[arg(value_name = "SCRIPT_JSON")]
        script: Option<PathBuf>,

        #[command(flatten)]
        provider: ProviderArgs,
    },
    /// List catalog entries without a downloaded sound file
    Missing,
    /// Map catalog entries to downloaded sound files
    Map,
    /// Attach mapped sound files to the script lines
    Apply {
        /// Annotated script JSON (default from config)
        #[arg(value_name = "SCRIPT_JSON")]
        script: Option<PathBuf>,
    },
}

#[derive(Subcommand, Debug)]
enum NarrateCommand {
    /// Synthesize every line without audio
    Generate,
    /// Synthesize every line flagged for regeneration
    Regenerate,
    /// Reconcile the script with the audio directory
    Validate,
    /// Join all line audio, with each line's pause, into one file
    Combine {
        /// Combined file (default: complete_story.mp3 in the output directory)
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Flag a line for regeneration
    Mark {
        /// Line number, starting at 1
        line: usize,

        /// New voice instructions for the line
        #[arg(short, long)]
        instructions: Option<String>,

        /// Delete the line's current audio file
        #[arg(long)]
        delete_audio: bool,
    },
}

#[derive(Args, Debug)]
struct NarrateArgs {
    /// Annotated script JSON
    #[arg(value_name = "SCRIPT_JSON")]
    script: PathBuf,

    /// Directory receiving per-line audio (default from config)
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    #[command(subcommand)]
    action: NarrateCommand,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Annotate a story line by line with a language model
    Annotate(AnnotateArgs),

    /// Cut audio files at their first sustained silence
    Trim(TrimArgs),

    /// Sound effect catalog and library
    #[command(subcommand)]
    Effects(EffectsCommand),

    /// Per-line speech synthesis
    Narrate(NarrateArgs),

    /// Generate shell completions for storycast
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// storycast - narrated audio production from plain text stories
#[derive(Parser, Debug)]
#[command(name = "storycast")]
#[command(version = "0.1.0")]
#[command(about = "Turn a text story into an annotated, narrated audio production")]
#[command(long_about = "storycast annotates a story with a language model, catalogs its sound effects,
synthesizes narration per line and trims audio at the first sustained silence.

EXAMPLES:
    storycast annotate story.txt                   # Annotate, resuming if interrupted
    storycast annotate -p ollama -m llama3.2 story.txt
    storycast effects catalog                      # Build the sound effect catalog
    storycast effects missing                      # List sounds still to download
    storycast effects map && storycast effects apply
    storycast narrate enhanced_script.json generate
    storycast narrate enhanced_script.json mark 12 -i \"Slower, with dread\" --delete-audio
    storycast narrate enhanced_script.json combine
    storycast trim ./recordings --silence-threshold -45 --silence-duration 0.8
    storycast completions bash > storycast.bash

CONFIGURATION:
    Configuration is stored in conf.json by default. Commands that talk to a
    language model create a default one when it is missing.")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Commands,

    #[command(flatten)]
    common: CommonArgs,
}

// @struct: Custom logger implementation
struct CustomLogger {
    level: LevelFilter,
}

impl CustomLogger {
    // @creates: New logger with specified level
    fn new(level: LevelFilter) -> Self {
        CustomLogger { level }
    }

    // @initializes: Global logger
    fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
        let logger = Box::new(CustomLogger::new(level));
        log::set_boxed_logger(logger)?;
        log::set_max_level(level);
        Ok(())
    }

    // @returns: ANSI color and emoji for log level
    fn style_for_level(level: Level) -> (&'static str, &'static str) {
        match level {
            Level::Error => ("\x1B[1;31m", "❌ "),
            Level::Warn => ("\x1B[1;33m", "🚧 "),
            Level::Info => ("\x1B[1;32m", " "),
            Level::Debug => ("\x1B[1;36m", "🔍 "),
            Level::Trace => ("\x1B[1;35m", "📋 "),
        }
    }
}

impl Log for CustomLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let now = chrono::Local::now().format("%H:%M:%S.%3f");
            let (color, emoji) = Self::style_for_level(record.level());
            let _ = writeln!(std::io::stderr(), "{}{} {} {}\x1B[0m", color, now, emoji, record.args());
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

fn level_filter(level: &app_config::LogLevel) -> LevelFilter {
    match level {
        app_config::LogLevel::Error => LevelFilter::Error,
        app_config::LogLevel::Warn => LevelFilter::Warn,
        app_config::LogLevel::Info => LevelFilter::Info,
        app_config::LogLevel::Debug => LevelFilter::Debug,
        app_config::LogLevel::Trace => LevelFilter::Trace,
    }
}

/// Load the config and apply the log level, CLI first
fn load_config(common: &CommonArgs, create_missing: bool) -> Result<Config> {
    if let Some(level) = &common.log_level {
        log::set_max_level(level_filter(&level.clone().into()));
    }

    let mut config = if create_missing {
        Config::load_or_create(&common.config_path)?
    } else {
        Config::load_or_default(&common.config_path)?
    };

    match &common.log_level {
        Some(level) => config.log_level = level.clone().into(),
        None => log::set_max_level(level_filter(&config.log_level)),
    }
    Ok(config)
}

fn apply_provider_args(config: &mut Config, args: &ProviderArgs) {
    if let Some(provider) = &args.provider {
        config.provider = provider.clone().into();
    }
    if let Some(model) = &args.model {
        config.active_provider_config_mut().model = model.clone();
    }
}

fn default_script_path(config: &Config) -> PathBuf {
    PathBuf::from(&config.annotation.output_json)
}

#[tokio::main]
async fn main() -> Result<()> {
    // Info by default; updated once the config is loaded
    CustomLogger::init(LevelFilter::Info)?;

    let cli = CommandLineOptions::parse();

    match cli.command {
        Commands::Completions { shell } => {
            let mut cmd = CommandLineOptions::command();
            generate(shell, &mut cmd, "storycast", &mut std::io::stdout());
            Ok(())
        }
        Commands::Annotate(args) => run_annotate(&cli.common, args).await,
        Commands::Trim(args) => run_trim(&cli.common, args).await,
        Commands::Effects(command) => run_effects(&cli.common, command).await,
        Commands::Narrate(args) => run_narrate(&cli.common, args).await,
    }
}

async fn run_annotate(common: &CommonArgs, args: AnnotateArgs) -> Result<()> {
    let mut config = load_config(common, true)?;
    apply_provider_args(&mut config, &args.provider);
    if let Some(path) = args.progress_file {
        config.annotation.progress_file = path;
    }
    if let Some(path) = args.output_text {
        config.annotation.output_text = path;
    }
    if let Some(path) = args.output_json {
        config.annotation.output_json = path;
    }

    let controller = Controller::with_config(config)?;
    controller.run_annotate(&args.input).await?;
    Ok(())
}

async fn run_trim(common: &CommonArgs, args: TrimArgs) -> Result<()> {
    let mut config = load_config(common, false)?;
    if let Some(threshold) = args.silence_threshold {
        config.trim.silence_threshold_db = threshold;
    }
    if let Some(duration) = args.silence_duration {
        config.trim.silence_duration_secs = duration;
    }
    if let Some(extensions) = args.extensions {
        config.trim.extensions = extensions;
    }

    let controller = Controller::with_config(config)?;
    let report = controller
        .run_trim(&args.input_dir, args.output_dir)
        .await
        .with_context(|| format!("Trimming failed for {}", args.input_dir.display()))?;

    info!(
        "Processing complete. Processed {} files, trimmed {} files.",
        report.scanned, report.trimmed
    );
    Ok(())
}

async fn run_effects(common: &CommonArgs, command: EffectsCommand) -> Result<()> {
    let needs_provider = matches!(command, EffectsCommand::Catalog { .. });
    let mut config = load_config(common, needs_provider)?;

    match command {
        EffectsCommand::Catalog { script, provider } => {
            apply_provider_args(&mut config, &provider);
            let script = script.unwrap_or_else(|| default_script_path(&config));
            let controller = Controller::with_config(config)?;
            controller.run_effects_catalog(&script).await?;
        }
        EffectsCommand::Missing => {
            Controller::with_config(config)?.run_effects_missing()?;
        }
        EffectsCommand::Map => {
            Controller::with_config(config)?.run_effects_map()?;
        }
        EffectsCommand::Apply { script } => {
            let script = script.unwrap_or_else(|| default_script_path(&config));
            Controller::with_config(config)?.run_effects_apply(Path::new(&script))?;
        }
    }
    Ok(())
}

async fn run_narrate(common: &CommonArgs, args: NarrateArgs) -> Result<()> {
    let config = load_config(common, false)?;
    let action = match args.action {
        NarrateCommand::Combine { output } => {
            let report = Controller::with_config(config)?
                .run_combine(&args.script, args.output_dir, output)
                .await?;
            info!("Complete story written to {:?}", report.output);
            return Ok(());
        }
        NarrateCommand::Generate => NarrateAction::Generate,
        NarrateCommand::Regenerate => NarrateAction::Regenerate,
        NarrateCommand::Validate => NarrateAction::Validate,
        NarrateCommand::Mark { line, instructions, delete_audio } => NarrateAction::Mark {
            line,
            instructions,
            delete_audio,
        },
    };

    let controller = Controller::with_config(config)?;
    let report = controller.run_narrate(&args.script, args.output_dir, action).await?;
    if report.attempted > 0 {
        info!("Generated {} of {} lines", report.generated, report.attempted);
    }
    Ok(())
}

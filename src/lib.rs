/*!
 * # storycast - narrated audio production from plain text stories
 *
 * A Rust library that turns a story into the material for an audio drama.
 *
 * ## Features
 *
 * - Annotate every line of a story with a language model:
 *   - dialogue and speaker detection
 *   - emotion, intensity and voice direction
 *   - pauses, scene transitions and sound effect suggestions
 *   - checkpointed after every line and resumed on the next run
 * - Catalog the suggested sound effects and match them to a sound library
 * - Synthesize per-line narration with regeneration bookkeeping
 * - Trim audio files at their first sustained silence
 *
 * ## Architecture
 *
 * The library is organized in these main modules:
 * - `app_config`: Configuration management
 * - `annotation`: Resumable line annotation
 * - `effects`: Sound effect catalog and library mapping
 * - `narration`: Speech synthesis per line
 * - `audio`: Silence detection and trimming
 * - `script`: The annotated script document shared by the stages
 * - `file_utils`: File system operations
 * - `app_controller`: Main application controller
 * - `providers`: Client implementations for various LLM providers:
 *   - `providers::ollama`: Ollama API client
 *   - `providers::openai`: OpenAI API client (also LM Studio)
 *   - `providers::anthropic`: Anthropic API client
 *   - `providers::mock`: Scripted provider for tests
 * - `errors`: Custom error types for the application
 *
 * ## License
 *
 * This project is licensed under the MIT License
 */

// Global lints configuration
// These lints will be allowed but not auto-fixed
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]

// Public modules
pub mod app_config;
pub mod file_utils;
pub mod annotation;
pub mod effects;
pub mod narration;
pub mod audio;
pub mod script;
pub mod app_controller;
pub mod providers;
pub mod errors;

// Re-export main types for easier usage
pub use app_config::Config;
pub use annotation::{Annotator, AnnotationRecord, LineAnalysis, LineAnalyzer, ProgressStore};
pub use audio::{trim, AudioBuffer, SilenceDetector, SilenceTrimmer};
pub use script::{ScriptDocument, ScriptLine};
pub use errors::{AnalysisError, AppError, AudioError, ProgressError, ProviderError, TrimError};

/*!
 * Line annotation with checkpointed resume.
 *
 * - `models`: line analysis and annotation records
 * - `context`: the window of lines handed to the analyzer
 * - `analyzer`: the analyzer trait and its language model implementation
 * - `progress`: the on-disk checkpoint
 * - `annotator`: the resumable annotation loop
 * - `report`: text and JSON outputs
 * - `tokens`: token counting
 */

pub mod analyzer;
pub mod annotator;
pub mod context;
pub mod models;
pub mod progress;
pub mod report;
pub mod tokens;

pub use analyzer::{LineAnalyzer, LlmLineAnalyzer};
pub use annotator::{Annotator, AnnotatorOptions, AnnotatorState};
pub use context::ContextWindow;
pub use models::{AnnotationRecord, LineAnalysis, ScriptSummary};
pub use progress::ProgressStore;
pub use tokens::{EstimatedTokenCounter, TokenCounter};

/*!
 * Narration: per-line speech synthesis with regeneration bookkeeping,
 * and joining the lines into one recording.
 */

pub mod combine;
pub mod generator;
pub mod project;
pub mod synthesizer;

pub use combine::{combine_audio, CombineReport, COMBINED_FILE_NAME};
pub use generator::{GenerationMode, GenerationReport, NarrationGenerator};
pub use project::NarrationProject;
pub use synthesizer::{OpenAiSpeech, SpeechSynthesizer};

/*!
 * Audio handling for the silence trimmer.
 *
 * - `buffer`: normalized sample buffer and loudness measurement
 * - `decode`: WAV (hound) and compressed formats (symphonia)
 * - `export`: WAV writer and ffmpeg re-encoding
 * - `silence`: first-sustained-silence scan
 * - `trimmer`: per-file and per-directory trimming
 */

pub mod buffer;
pub mod decode;
pub mod export;
pub mod silence;
pub mod trimmer;

pub use buffer::AudioBuffer;
pub use silence::{trim, SilenceDetector, CHUNK_MS};
pub use trimmer::{SilenceTrimmer, TrimOptions, TrimOutcome, TrimReport};

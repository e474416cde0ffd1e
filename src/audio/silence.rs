/*!
 * Detection of the first sustained silence in a buffer.
 *
 * The buffer is scanned in 10 ms chunks. A chunk counts as silent when its
 * loudness falls below the loudness of the whole track plus a (negative)
 * threshold, so the test is relative to the track rather than absolute.
 * A run of silent chunks is reset by any single non-silent chunk.
 */

use super::buffer::{dbfs, AudioBuffer};

/// Length of one analysis chunk in milliseconds
pub const CHUNK_MS: u64 = 10;

/// Settings for the silence scan
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SilenceDetector {
    /// Drop below the track loudness that counts as silence, in dB (negative)
    pub threshold_db: f64,
    /// Run length at which the scan stops, in milliseconds
    pub min_silence_ms: u64,
}

impl Default for SilenceDetector {
    fn default() -> Self {
        Self {
            threshold_db: -50.0,
            min_silence_ms: 1000,
        }
    }
}

impl SilenceDetector {
    pub fn new(threshold_db: f64, min_silence_ms: u64) -> Self {
        Self { threshold_db, min_silence_ms }
    }

    /// Number of consecutive silent chunks that ends the scan
    fn required_chunks(&self) -> usize {
        self.min_silence_ms.div_ceil(CHUNK_MS).max(1) as usize
    }

    /// Frame range of chunk `index`.
    ///
    /// Chunk boundaries sit at whole multiples of 10 ms rounded to the nearest
    /// frame, so rates where 10 ms is not a whole frame count do not drift.
    fn chunk_bounds(buffer: &AudioBuffer, index: u64) -> (usize, usize) {
        let start = buffer.frames_for_ms(index * CHUNK_MS);
        let end = buffer.frames_for_ms((index + 1) * CHUNK_MS).max(start + 1);
        (start, end)
    }

    /// Frame offset of the first chunk of the first long-enough silent run
    pub fn find_cut_frame(&self, buffer: &AudioBuffer) -> Option<usize> {
        let total_frames = buffer.frames();
        if buffer.sample_rate() == 0 {
            return None;
        }

        let threshold = buffer.dbfs() + self.threshold_db;
        let required = self.required_chunks();

        let mut run_start: Option<usize> = None;
        let mut run_len = 0usize;

        for index in 0.. {
            let (start, end) = Self::chunk_bounds(buffer, index);
            if end > total_frames {
                break;
            }

            let level = dbfs(buffer.frame_slice(start, end - start));
            // Zero energy is silent even when the whole track is silent
            // and the threshold itself is -inf.
            let silent = level == f64::NEG_INFINITY || level < threshold;

            if silent {
                run_start.get_or_insert(start);
                run_len += 1;
            } else {
                run_start = None;
                run_len = 0;
            }

            if run_len >= required {
                return run_start;
            }
        }

        None
    }

    /// Prefix of `buffer` up to the first sustained silence, if there is one
    pub fn trim(&self, buffer: &AudioBuffer) -> Option<AudioBuffer> {
        self.find_cut_frame(buffer).map(|frame| buffer.prefix(frame))
    }
}

/// Cut `buffer` at its first silent run of at least `min_silence_duration_ms`.
///
/// Returns `None` when no such run exists.
pub fn trim(buffer: &AudioBuffer, silence_threshold_db: f64, min_silence_duration_ms: u64) -> Option<AudioBuffer> {
    SilenceDetector::new(silence_threshold_db, min_silence_duration_ms).trim(buffer)
}

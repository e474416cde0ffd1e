/*!
 * In-memory audio buffer used by the silence scan.
 */

/// Interleaved samples normalized to full scale 1.0.
///
/// Buffers are never modified in place; trimming builds a new buffer from a
/// prefix of this one.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioBuffer {
    samples: Vec<f32>,
    channels: u16,
    sample_rate: u32,
}

impl AudioBuffer {
    /// Create a buffer from interleaved samples
    pub fn new(samples: Vec<f32>, channels: u16, sample_rate: u32) -> Self {
        Self {
            samples,
            channels: channels.max(1),
            sample_rate,
        }
    }

    /// Create a mono buffer
    pub fn mono(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self::new(samples, 1, sample_rate)
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn channels(&self) -> u16 {
        self.channels
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Number of frames (one sample per channel)
    pub fn frames(&self) -> usize {
        self.samples.len() / self.channels as usize
    }

    pub fn is_empty(&self) -> bool {
        self.frames() == 0
    }

    /// Duration in milliseconds
    pub fn duration_ms(&self) -> f64 {
        self.ms_for_frames(self.frames())
    }

    /// Frames covering `ms` milliseconds, rounded to the nearest frame
    pub fn frames_for_ms(&self, ms: u64) -> usize {
        ((self.sample_rate as f64 * ms as f64) / 1000.0).round() as usize
    }

    /// Milliseconds covered by `frames` frames
    pub fn ms_for_frames(&self, frames: usize) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        frames as f64 * 1000.0 / self.sample_rate as f64
    }

    /// Interleaved samples of the frame range `start..start + len`, clamped to the buffer
    pub fn frame_slice(&self, start: usize, len: usize) -> &[f32] {
        let channels = self.channels as usize;
        let begin = (start * channels).min(self.samples.len());
        let end = ((start + len) * channels).min(self.samples.len());
        &self.samples[begin..end]
    }

    /// New buffer holding the first `frames` frames
    pub fn prefix(&self, frames: usize) -> AudioBuffer {
        AudioBuffer {
            samples: self.frame_slice(0, frames).to_vec(),
            channels: self.channels,
            sample_rate: self.sample_rate,
        }
    }

    /// Loudness of the whole buffer in dBFS
    pub fn dbfs(&self) -> f64 {
        dbfs(&self.samples)
    }
}

/// Root mean square of normalized samples
pub fn rms(samples: &[f32]) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }

    let sum_of_squares: f64 = samples
        .iter()
        .map(|&s| {
            let s = s as f64;
            s * s
        })
        .sum();

    (sum_of_squares / samples.len() as f64).sqrt()
}

/// Loudness relative to full scale; zero energy is `-inf`
pub fn dbfs(samples: &[f32]) -> f64 {
    let rms = rms(samples);
    if rms == 0.0 {
        return f64::NEG_INFINITY;
    }
    20.0 * rms.log10()
}

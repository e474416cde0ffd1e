/*!
 * Writing trimmed audio back to disk.
 *
 * WAV output is written by hound with the source layout, so a trimmed WAV is
 * sample-for-sample identical to the head of the original. Compressed formats
 * are re-encoded by the ffmpeg binary into the same container.
 * Whole buffers (combined narration) are encoded the same way by extension.
 */

use hound::{SampleFormat, WavSpec, WavWriter};
use log::debug;
use std::path::Path;
use std::time::Duration;
use tokio::process::Command;

use super::buffer::AudioBuffer;
use super::decode::{extension_of, DecodedAudio};
use crate::errors::AudioError;

/// Timeout for a single ffmpeg run
const FFMPEG_TIMEOUT: Duration = Duration::from_secs(120);

/// Export the head of `source` that `trimmed` represents to `output`
pub async fn export_prefix(
    source: &Path,
    decoded: &DecodedAudio,
    trimmed: &AudioBuffer,
    output: &Path,
) -> Result<(), AudioError> {
    if extension_of(output) == "wav" {
        let spec = decoded.wav_spec.unwrap_or_else(|| default_wav_spec(trimmed));
        return write_wav(trimmed, spec, output);
    }

    let seconds = trimmed.duration_ms() / 1000.0;
    ffmpeg_cut(source, seconds, output).await
}

/// 16-bit PCM layout matching the buffer
pub fn default_wav_spec(buffer: &AudioBuffer) -> WavSpec {
    WavSpec {
        channels: buffer.channels(),
        sample_rate: buffer.sample_rate(),
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    }
}

/// Write a buffer as a WAV file with the given layout
pub fn write_wav(buffer: &AudioBuffer, spec: WavSpec, output: &Path) -> Result<(), AudioError> {
    let export_error = |reason: String| AudioError::Export { path: output.to_path_buf(), reason };

    let mut writer = WavWriter::create(output, spec)
        .map_err(|e| export_error(format!("Failed to create WAV file: {}", e)))?;

    match spec.sample_format {
        SampleFormat::Float => {
            for &sample in buffer.samples() {
                writer.write_sample(sample)
                    .map_err(|e| export_error(format!("Failed to write sample: {}", e)))?;
            }
        }
        SampleFormat::Int => {
            let scale = (1i64 << (spec.bits_per_sample - 1)) as f64;
            let (min, max) = (-scale, scale - 1.0);
            for &sample in buffer.samples() {
                let value = (sample as f64 * scale).round().clamp(min, max) as i32;
                writer.write_sample(value)
                    .map_err(|e| export_error(format!("Failed to write sample: {}", e)))?;
            }
        }
    }

    writer.finalize()
        .map_err(|e| export_error(format!("Failed to finalize WAV file: {}", e)))
}

/// Write a whole buffer to `output`, encoding by extension.
///
/// WAV is written directly as 16-bit PCM. Anything else is staged as a WAV
/// next to the output and encoded by ffmpeg.
pub async fn encode_buffer(buffer: &AudioBuffer, output: &Path) -> Result<(), AudioError> {
    if extension_of(output) == "wav" {
        return write_wav(buffer, default_wav_spec(buffer), output);
    }

    let staging = output.with_extension("staging.wav");
    write_wav(buffer, default_wav_spec(buffer), &staging)?;

    let mut command = Command::new("ffmpeg");
    command.args(["-y", "-v", "error", "-i"]).arg(&staging).arg(output);
    let result = run_ffmpeg(command, output).await;

    if let Err(e) = std::fs::remove_file(&staging) {
        debug!("Could not remove staging file {:?}: {}", staging, e);
    }
    result
}

/// Keep the first `seconds` of `input`, re-encoded into `output`'s container
async fn ffmpeg_cut(input: &Path, seconds: f64, output: &Path) -> Result<(), AudioError> {
    let duration = format!("{:.3}", seconds);
    debug!("ffmpeg cut {:?} at {}s -> {:?}", input, duration, output);

    let mut command = Command::new("ffmpeg");
    command
        .args(["-y", "-v", "error", "-i"])
        .arg(input)
        .args(["-t", &duration, "-map_metadata", "0"])
        .arg(output);
    run_ffmpeg(command, output).await
}

/// Run an ffmpeg command under the timeout, reporting failures against `output`
async fn run_ffmpeg(mut command: Command, output: &Path) -> Result<(), AudioError> {
    let export_error = |reason: String| AudioError::Export { path: output.to_path_buf(), reason };

    let result = tokio::select! {
        result = command.output() => result,
        _ = tokio::time::sleep(FFMPEG_TIMEOUT) => {
            return Err(export_error(format!("ffmpeg timed out after {} seconds", FFMPEG_TIMEOUT.as_secs())));
        }
    };

    let output_status = result.map_err(|e| export_error(format!("Failed to run ffmpeg: {}", e)))?;
    if !output_status.status.success() {
        let stderr = String::from_utf8_lossy(&output_status.stderr);
        return Err(export_error(format!("ffmpeg failed: {}", stderr.trim())));
    }

    Ok(())
}

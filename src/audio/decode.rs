/*!
 * Audio file decoding.
 *
 * WAV files are read with hound so integer and float samples come back exactly
 * and the original `WavSpec` can be reused on export. Everything else (MP3, FLAC,
 * OGG/Vorbis, M4A/AAC) goes through symphonia's probe.
 */

use hound::{SampleFormat, WavReader, WavSpec};
use log::{debug, warn};
use std::fs::File;
use std::path::Path;
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use super::buffer::AudioBuffer;
use crate::errors::AudioError;

/// A decoded file together with what is needed to export it again
#[derive(Debug, Clone)]
pub struct DecodedAudio {
    /// Normalized samples
    pub buffer: AudioBuffer,
    /// Original WAV layout, when the source was read by hound
    pub wav_spec: Option<WavSpec>,
}

/// Lowercase extension without the dot
pub fn extension_of(path: &Path) -> String {
    path.extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default()
}

/// Decode any supported audio file
pub fn decode_file(path: &Path) -> Result<DecodedAudio, AudioError> {
    if extension_of(path) == "wav" {
        match decode_wav(path) {
            Ok((buffer, spec)) => return Ok(DecodedAudio { buffer, wav_spec: Some(spec) }),
            Err(e) => warn!("hound could not read {:?} ({}), retrying with symphonia", path, e),
        }
    }

    let buffer = decode_with_symphonia(path)?;
    Ok(DecodedAudio { buffer, wav_spec: None })
}

/// Read a WAV file with hound
pub fn decode_wav(path: &Path) -> Result<(AudioBuffer, WavSpec), AudioError> {
    let decode_error = |reason: String| AudioError::Decode { path: path.to_path_buf(), reason };

    let mut reader = WavReader::open(path)
        .map_err(|e| decode_error(format!("Failed to open WAV file: {}", e)))?;
    let spec = reader.spec();
    debug!("WAV spec for {:?}: {:?}", path, spec);

    let samples: Vec<f32> = match spec.sample_format {
        SampleFormat::Float => reader
            .samples::<f32>()
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| decode_error(format!("Failed to read samples: {}", e)))?,
        SampleFormat::Int => {
            let scale = (1i64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f32 / scale))
                .collect::<Result<Vec<_>, _>>()
                .map_err(|e| decode_error(format!("Failed to read samples: {}", e)))?
        }
    };

    Ok((AudioBuffer::new(samples, spec.channels, spec.sample_rate), spec))
}

/// Container options for symphonia.
///
/// Gapless mode drops encoder delay and padding, the same samples ffmpeg skips
/// when it re-encodes, so a cut frame maps to the same time on export.
pub fn format_options() -> FormatOptions {
    FormatOptions { enable_gapless: true, ..Default::default() }
}

/// Decode a compressed file with symphonia into interleaved samples
pub fn decode_with_symphonia(path: &Path) -> Result<AudioBuffer, AudioError> {
    let decode_error = |reason: String| AudioError::Decode { path: path.to_path_buf(), reason };

    let file = File::open(path)?;
    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    let extension = extension_of(path);
    if !extension.is_empty() {
        hint.with_extension(&extension);
    }

    let probed = symphonia::default::get_probe()
        .format(&hint, mss, &format_options(), &MetadataOptions::default())
        .map_err(|e| decode_error(format!("Unrecognized audio format: {}", e)))?;
    let mut format = probed.format;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(|| decode_error("No audio track found".to_string()))?;
    let track_id = track.id;
    let mut sample_rate = track.codec_params.sample_rate.unwrap_or(0);
    let mut channels = track.codec_params.channels.map(|c| c.count() as u16).unwrap_or(0);

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .map_err(|e| decode_error(format!("Unsupported codec: {}", e)))?;

    let mut samples = Vec::new();
    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => break,
            Err(SymphoniaError::ResetRequired) => break,
            Err(e) => return Err(decode_error(format!("Failed to read packet: {}", e))),
        };

        if packet.track_id() != track_id {
            continue;
        }

        match decoder.decode(&packet) {
            Ok(decoded) => {
                let spec = *decoded.spec();
                sample_rate = spec.rate;
                channels = spec.channels.count() as u16;

                let mut sample_buf = SampleBuffer::<f32>::new(decoded.capacity() as u64, spec);
                sample_buf.copy_interleaved_ref(decoded);
                samples.extend_from_slice(sample_buf.samples());
            }
            Err(SymphoniaError::DecodeError(e)) => {
                warn!("Skipping undecodable packet in {:?}: {}", path, e);
            }
            Err(e) => return Err(decode_error(format!("Decoder failed: {}", e))),
        }
    }

    if sample_rate == 0 || channels == 0 {
        return Err(decode_error("Stream has no sample rate or channel layout".to_string()));
    }

    debug!("Decoded {} samples from {:?} ({} Hz, {} channels)", samples.len(), path, sample_rate, channels);
    Ok(AudioBuffer::new(samples, channels, sample_rate))
}

/*!
 * Tests for first-sustained-silence detection
 */

use storycast::audio::{trim, AudioBuffer, SilenceDetector};
use crate::common::{segment_samples, Segment, FIXTURE_RATE};

fn buffer_of(segments: &[Segment]) -> AudioBuffer {
    let samples = segment_samples(segments)
        .into_iter()
        .map(|s| s as f32 / 32768.0)
        .collect();
    AudioBuffer::mono(samples, FIXTURE_RATE)
}

/// Loud, long pause, loud: the cut lands where the pause starts
#[test]
fn test_trim_withPauseInMiddle_shouldCutAtPauseStart() {
    let buffer = buffer_of(&[Segment::Loud(2000), Segment::Silent(1500), Segment::Loud(2000)]);

    let trimmed = trim(&buffer, -50.0, 1000).expect("silence should be found");
    assert_eq!(trimmed.duration_ms(), 2000.0);
    assert_eq!(trimmed.samples(), buffer.prefix(16_000).samples());
}

/// The result is always a prefix of the input
#[test]
fn test_trim_shouldReturnPrefixOfInput() {
    let buffer = buffer_of(&[Segment::Loud(730), Segment::Silent(1200), Segment::Loud(300)]);

    let trimmed = trim(&buffer, -50.0, 1000).expect("silence should be found");
    assert!(trimmed.frames() <= buffer.frames());
    assert_eq!(trimmed.samples(), &buffer.samples()[..trimmed.samples().len()]);
    assert_eq!(trimmed.sample_rate(), buffer.sample_rate());
}

/// A pause shorter than the minimum is ignored
#[test]
fn test_trim_withShortPause_shouldReturnNone() {
    let buffer = buffer_of(&[Segment::Loud(1000), Segment::Silent(500), Segment::Loud(1000)]);
    assert!(trim(&buffer, -50.0, 1000).is_none());
}

/// A pause just long enough is found
#[test]
fn test_trim_withPauseEqualToMinimum_shouldCut() {
    let buffer = buffer_of(&[Segment::Loud(500), Segment::Silent(1000), Segment::Loud(500)]);
    let trimmed = trim(&buffer, -50.0, 1000).expect("silence should be found");
    assert_eq!(trimmed.duration_ms(), 500.0);
}

/// Trailing silence is cut off as well
#[test]
fn test_trim_withTrailingSilence_shouldCutBeforeIt() {
    let buffer = buffer_of(&[Segment::Loud(1200), Segment::Silent(1100)]);
    let trimmed = trim(&buffer, -50.0, 1000).expect("silence should be found");
    assert_eq!(trimmed.duration_ms(), 1200.0);
}

/// Only the first qualifying pause counts
#[test]
fn test_trim_withTwoPauses_shouldUseTheFirst() {
    let buffer = buffer_of(&[
        Segment::Loud(400),
        Segment::Silent(1500),
        Segment::Loud(400),
        Segment::Silent(3000),
    ]);
    let trimmed = trim(&buffer, -50.0, 1000).expect("silence should be found");
    assert_eq!(trimmed.duration_ms(), 400.0);
}

/// A fully silent track is all silence, so the prefix is empty
#[test]
fn test_trim_withAllSilence_shouldReturnEmptyPrefix() {
    let buffer = buffer_of(&[Segment::Silent(2000)]);
    let trimmed = trim(&buffer, -50.0, 1000).expect("silence should be found");
    assert!(trimmed.is_empty());
}

/// No silence at all leaves nothing to cut
#[test]
fn test_trim_withContinuousSound_shouldReturnNone() {
    let buffer = buffer_of(&[Segment::Loud(3000)]);
    assert!(trim(&buffer, -50.0, 1000).is_none());
}

/// Buffers shorter than one chunk are never cut
#[test]
fn test_trim_withBufferShorterThanChunk_shouldReturnNone() {
    let buffer = AudioBuffer::mono(vec![0.0; 40], FIXTURE_RATE);
    assert!(trim(&buffer, -50.0, 10).is_none());
}

/// The threshold is relative to the track loudness
#[test]
fn test_findCutFrame_withQuietTrack_shouldUseRelativeThreshold() {
    // -26 dB relative to the loud part is not silence at a -50 dB threshold
    let mut samples: Vec<f32> = (0..8000).map(|i| if i % 2 == 0 { 0.5 } else { -0.5 }).collect();
    samples.extend((0..12_000).map(|i| if i % 2 == 0 { 0.025 } else { -0.025 }));
    let buffer = AudioBuffer::mono(samples, FIXTURE_RATE);

    assert_eq!(SilenceDetector::new(-50.0, 1000).find_cut_frame(&buffer), None);
    assert_eq!(SilenceDetector::new(-20.0, 1000).find_cut_frame(&buffer), Some(8000));
}

/// Stereo buffers are measured per frame
#[test]
fn test_findCutFrame_withStereo_shouldReturnFrameOffset() {
    let mut samples = Vec::new();
    for i in 0..4000 {
        let v = if i % 2 == 0 { 0.5 } else { -0.5 };
        samples.push(v);
        samples.push(v);
    }
    samples.extend(std::iter::repeat_n(0.0, 2 * 8000));
    let buffer = AudioBuffer::new(samples, 2, FIXTURE_RATE);

    assert_eq!(SilenceDetector::new(-50.0, 1000).find_cut_frame(&buffer), Some(4000));
}

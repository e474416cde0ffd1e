/*!
 * Tests for trimming a directory of audio files
 */

use std::path::PathBuf;
use anyhow::Result;

use storycast::app_config::TrimConfig;
use storycast::audio::{SilenceTrimmer, TrimOptions, TrimOutcome};
use storycast::errors::{AudioError, TrimError};
use crate::common::{self, Segment};

fn trimmer_for(input_dir: &std::path::Path, output_dir: PathBuf) -> SilenceTrimmer {
    SilenceTrimmer::new(TrimOptions::from_config(&TrimConfig::default(), input_dir, Some(output_dir)))
}

/// The output directory defaults to a subdirectory of the input
#[test]
fn test_trimOptions_fromConfig_withoutOutputDir_shouldUseTrimmedSubdir() {
    let options = TrimOptions::from_config(&TrimConfig::default(), std::path::Path::new("/takes"), None);
    assert_eq!(options.output_dir, PathBuf::from("/takes/trimmed"));
    assert_eq!(options.extensions, vec!["mp3", "wav", "flac", "ogg", "m4a"]);
    assert_eq!(options.detector.min_silence_ms, 1000);
}

/// A missing input directory stops the batch
#[tokio::test]
async fn test_trimDirectory_withMissingDir_shouldFail() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let missing = temp_dir.path().join("nope");
    let trimmer = trimmer_for(&missing, temp_dir.path().join("out"));

    let result = trimmer.trim_directory(&missing, |_, _| {}).await;
    assert!(matches!(result, Err(TrimError::InputDirectoryMissing(_))));
    Ok(())
}

/// A directory without matching files stops the batch
#[tokio::test]
async fn test_trimDirectory_withNoMatchingFiles_shouldFail() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    common::create_test_file(temp_dir.path(), "notes.txt", "not audio")?;
    let trimmer = trimmer_for(temp_dir.path(), temp_dir.path().join("out"));

    let result = trimmer.trim_directory(temp_dir.path(), |_, _| {}).await;
    match result {
        Err(TrimError::NoMatchingFiles { extensions, .. }) => assert!(extensions.contains(".wav")),
        other => panic!("unexpected result: {:?}", other),
    }
    assert!(!temp_dir.path().join("out").exists());
    Ok(())
}

/// A trimmed WAV holds exactly the samples before the pause
#[tokio::test]
async fn test_trimFile_withWav_shouldWriteSampleExactPrefix() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let input = common::create_test_wav(
        temp_dir.path(),
        "take.wav",
        &[Segment::Loud(2000), Segment::Silent(1500), Segment::Loud(2000)],
    )?;
    let output_dir = temp_dir.path().join("trimmed");
    std::fs::create_dir_all(&output_dir)?;
    let trimmer = trimmer_for(temp_dir.path(), output_dir.clone());

    let outcome = trimmer.trim_file(&input).await?;
    let TrimOutcome::Trimmed { output, cut_ms } = outcome else {
        panic!("expected a trimmed file");
    };
    assert_eq!(output, output_dir.join("take.wav"));
    assert_eq!(cut_ms, 2000.0);

    let original = common::read_wav_samples(&input)?;
    let trimmed = common::read_wav_samples(&output)?;
    assert_eq!(trimmed.len(), 16_000);
    assert_eq!(trimmed.as_slice(), &original[..16_000]);
    Ok(())
}

/// Files without a long pause are reported and not written
#[tokio::test]
async fn test_trimFile_withoutPause_shouldReportNoSilence() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let input = common::create_test_wav(temp_dir.path(), "steady.wav", &[Segment::Loud(1500)])?;
    let output_dir = temp_dir.path().join("trimmed");
    let trimmer = trimmer_for(temp_dir.path(), output_dir.clone());

    assert_eq!(trimmer.trim_file(&input).await?, TrimOutcome::NoSilence);
    assert!(!output_dir.join("steady.wav").exists());
    Ok(())
}

/// One broken file does not stop the others
#[tokio::test]
async fn test_trimDirectory_withBrokenFile_shouldContinue() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    common::create_test_file(temp_dir.path(), "a_broken.wav", "this is not a wav file")?;
    common::create_test_wav(temp_dir.path(), "b_pause.wav", &[Segment::Loud(500), Segment::Silent(1200)])?;
    common::create_test_wav(temp_dir.path(), "c_steady.wav", &[Segment::Loud(800)])?;
    let output_dir = temp_dir.path().join("out");
    let trimmer = trimmer_for(temp_dir.path(), output_dir.clone());

    let mut seen = Vec::new();
    let report = trimmer
        .trim_directory(temp_dir.path(), |file, result| {
            seen.push((file.file_name().unwrap().to_string_lossy().to_string(), result.is_ok()));
        })
        .await?;

    assert_eq!(report.scanned, 3);
    assert_eq!(report.trimmed, 1);
    assert_eq!(report.failed, 1);
    assert_eq!(report.outputs, vec![output_dir.join("b_pause.wav")]);
    assert_eq!(
        seen,
        vec![
            ("a_broken.wav".to_string(), false),
            ("b_pause.wav".to_string(), true),
            ("c_steady.wav".to_string(), true),
        ]
    );
    // Inputs are never modified
    assert_eq!(common::read_wav_samples(&temp_dir.path().join("b_pause.wav"))?.len(), 13_600);
    Ok(())
}

/// At 22050 Hz the cut still lands exactly on the pause start
#[tokio::test]
async fn test_trimFile_withWavAt22050_shouldCutOnPauseStart() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let input = common::create_test_wav_at(
        temp_dir.path(),
        "take.wav",
        &[Segment::Loud(2000), Segment::Silent(1500), Segment::Loud(2000)],
        22_050,
    )?;
    let output_dir = temp_dir.path().join("trimmed");
    std::fs::create_dir_all(&output_dir)?;
    let trimmer = trimmer_for(temp_dir.path(), output_dir.clone());

    let TrimOutcome::Trimmed { output, cut_ms } = trimmer.trim_file(&input).await? else {
        panic!("expected a trimmed file");
    };
    assert_eq!(cut_ms, 2000.0);
    assert_eq!(common::read_wav_samples(&output)?.len(), 44_100);
    Ok(())
}

/// Writing trimmed copies into the input directory is refused up front
#[tokio::test]
async fn test_trimDirectory_withOutputDirEqualToInput_shouldFailAndKeepInputs() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let input = common::create_test_wav(temp_dir.path(), "take.wav", &[Segment::Loud(500), Segment::Silent(1200)])?;

    for output_dir in [temp_dir.path().to_path_buf(), temp_dir.path().join(".")] {
        let trimmer = trimmer_for(temp_dir.path(), output_dir);
        let result = trimmer.trim_directory(temp_dir.path(), |_, _| {}).await;
        assert!(matches!(result, Err(TrimError::OutputIsInput(_))));
    }

    assert_eq!(common::read_wav_samples(&input)?.len(), 13_600);
    Ok(())
}

/// A single file whose output path is itself fails without being touched
#[tokio::test]
async fn test_trimFile_withOutputOverInput_shouldFail() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let input = common::create_test_wav(temp_dir.path(), "take.wav", &[Segment::Loud(500), Segment::Silent(1200)])?;
    let trimmer = trimmer_for(temp_dir.path(), temp_dir.path().to_path_buf());

    let result = trimmer.trim_file(&input).await;

    assert!(matches!(result, Err(AudioError::Export { .. })));
    assert_eq!(common::read_wav_samples(&input)?.len(), 13_600);
    Ok(())
}

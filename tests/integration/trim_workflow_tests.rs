/*!
 * Integration tests for the trim workflow
 */

use anyhow::Result;

use storycast::app_config::Config;
use storycast::app_controller::Controller;
use crate::common::{self, Segment};

/// Trimming a directory writes cut copies next to the inputs by default
#[tokio::test]
async fn test_runTrim_withDefaultOutput_shouldWriteTrimmedSubdir() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    common::create_test_wav(temp_dir.path(), "one.wav", &[Segment::Loud(1000), Segment::Silent(2000), Segment::Loud(500)])?;
    common::create_test_wav(temp_dir.path(), "two.wav", &[Segment::Loud(300), Segment::Silent(1000)])?;
    common::create_test_file(temp_dir.path(), "readme.txt", "not audio")?;

    let controller = Controller::new_for_test()?;
    let report = controller.run_trim(temp_dir.path(), None).await?;

    assert_eq!(report.scanned, 2);
    assert_eq!(report.trimmed, 2);
    assert_eq!(report.failed, 0);
    let out = temp_dir.path().join("trimmed");
    assert_eq!(common::read_wav_samples(&out.join("one.wav"))?.len(), 8000);
    assert_eq!(common::read_wav_samples(&out.join("two.wav"))?.len(), 2400);
    Ok(())
}

/// Custom settings change what counts as a pause
#[tokio::test]
async fn test_runTrim_withLongerMinimum_shouldSkipShortPauses() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    common::create_test_wav(temp_dir.path(), "take.wav", &[Segment::Loud(500), Segment::Silent(1500), Segment::Loud(500)])?;
    let out = temp_dir.path().join("custom");

    let mut config = Config::default();
    config.trim.silence_duration_secs = 2.0;
    config.trim.extensions = "wav".to_string();
    let controller = Controller::with_config(config)?;
    let report = controller.run_trim(temp_dir.path(), Some(out.clone())).await?;

    assert_eq!(report.scanned, 1);
    assert_eq!(report.trimmed, 0);
    assert!(!out.join("take.wav").exists());
    Ok(())
}

/// Batch level errors reach the caller
#[tokio::test]
async fn test_runTrim_withMissingDirOrBadSettings_shouldFail() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let controller = Controller::new_for_test()?;
    assert!(controller.run_trim(&temp_dir.path().join("missing"), None).await.is_err());

    let mut config = Config::default();
    config.trim.silence_threshold_db = 10.0;
    let controller = Controller::with_config(config)?;
    assert!(controller.run_trim(temp_dir.path(), None).await.is_err());
    Ok(())
}

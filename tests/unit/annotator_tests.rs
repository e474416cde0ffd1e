/*!
 * Tests for the resumable annotation loop
 */

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;
use anyhow::Result;

use storycast::annotation::{
    AnnotationRecord, Annotator, AnnotatorOptions, AnnotatorState, EstimatedTokenCounter,
    LineAnalysis, ProgressStore, TokenCounter,
};
use storycast::errors::ProgressError;
use crate::common::{self, mock_services::ScriptedAnalyzer};

fn options() -> AnnotatorOptions {
    AnnotatorOptions {
        context_before: 5,
        context_after: 6,
        delay: Duration::ZERO,
    }
}

fn speakers(names: &[&str]) -> BTreeSet<String> {
    names.iter().map(|n| n.to_string()).collect()
}

/// Every line gets one record, in input order
#[tokio::test]
async fn test_annotateAll_withFreshStore_shouldProduceOrderedRecords() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let lines = common::sample_story();
    let analyzer = Arc::new(ScriptedAnalyzer::new());
    let mut store = ProgressStore::open(temp_dir.path().join("progress.json"))?;
    let mut annotator = Annotator::new(analyzer.clone(), options());
    assert_eq!(annotator.state(), AnnotatorState::Idle);

    let records = annotator.annotate_all(&lines, &mut store).await?;

    assert_eq!(records.len(), lines.len());
    for (record, line) in records.iter().zip(&lines) {
        assert_eq!(&record.original_text, line);
        assert_eq!(record.analysis, ScriptedAnalyzer::expected_analysis(line));
        assert_eq!(record.token_count, EstimatedTokenCounter.count(line));
    }
    assert_eq!(annotator.state(), AnnotatorState::Complete);
    assert_eq!(analyzer.calls().len(), lines.len());
    Ok(())
}

/// The analyzer sees the speakers of earlier lines only
#[tokio::test]
async fn test_annotateAll_shouldPassSpeakersSeenSoFar() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let lines = common::sample_story();
    let analyzer = Arc::new(ScriptedAnalyzer::new());
    let mut store = ProgressStore::open(temp_dir.path().join("progress.json"))?;

    Annotator::new(analyzer.clone(), options()).annotate_all(&lines, &mut store).await?;

    let calls = analyzer.calls();
    assert_eq!(calls[0].seen_speakers, speakers(&[]));
    assert_eq!(calls[1].seen_speakers, speakers(&[]));
    assert_eq!(calls[2].seen_speakers, speakers(&["Mara"]));
    assert_eq!(calls[4].seen_speakers, speakers(&["Mara", "Tom"]));
    assert_eq!(calls[6].seen_speakers, speakers(&["Mara", "Tom"]));
    Ok(())
}

/// The context window marks the current line and is clamped at the edges
#[tokio::test]
async fn test_annotateAll_shouldRenderContextAroundEachLine() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let lines = common::sample_story();
    let analyzer = Arc::new(ScriptedAnalyzer::new());
    let mut store = ProgressStore::open(temp_dir.path().join("progress.json"))?;
    let narrow = AnnotatorOptions { context_before: 1, context_after: 1, delay: Duration::ZERO };

    Annotator::new(analyzer.clone(), narrow).annotate_all(&lines, &mut store).await?;

    let calls = analyzer.calls();
    assert_eq!(
        calls[0].rendered_context,
        format!("[CURRENT LINE]: {}\n{}", lines[0], lines[1])
    );
    assert_eq!(
        calls[3].rendered_context,
        format!("{}\n[CURRENT LINE]: {}\n{}", lines[2], lines[3], lines[4])
    );
    assert_eq!(
        calls[6].rendered_context,
        format!("{}\n[CURRENT LINE]: {}", lines[5], lines[6])
    );
    Ok(())
}

/// A failed line gets the safe default and the run continues
#[tokio::test]
async fn test_annotateAll_withFailingLine_shouldUseDefaultRecord() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let lines = common::sample_story();
    let analyzer = Arc::new(ScriptedAnalyzer::failing_on(&[3]));
    let mut store = ProgressStore::open(temp_dir.path().join("progress.json"))?;

    let records = Annotator::new(analyzer.clone(), options()).annotate_all(&lines, &mut store).await?;

    assert_eq!(records.len(), lines.len());
    assert_eq!(records[3].analysis, LineAnalysis::default());
    assert_eq!(records[3].original_text, lines[3]);
    assert_eq!(records[3].analysis.emotion, "neutral");
    assert_eq!(records[3].analysis.intensity, 5.0);
    assert_eq!(records[3].analysis.pause_after, 1.0);
    assert!(records[3].analysis.character.is_none());
    // Tom was never recognized, so later lines do not see him
    assert_eq!(analyzer.calls()[5].seen_speakers, speakers(&["Mara"]));
    assert_eq!(records[4].analysis, ScriptedAnalyzer::expected_analysis(&lines[4]));
    Ok(())
}

/// The store on disk always matches the records produced so far
#[tokio::test]
async fn test_annotateAll_shouldCheckpointEveryLine() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let progress_path = temp_dir.path().join("state").join("progress.json");
    let lines = common::sample_story();
    let mut store = ProgressStore::open(&progress_path)?;

    let mut on_disk = Vec::new();
    let path = progress_path.clone();
    Annotator::new(Arc::new(ScriptedAnalyzer::new()), options())
        .annotate_all_with_progress(&lines, &mut store, |index, _| {
            let reloaded = ProgressStore::open(&path).map(|s| s.len()).unwrap_or(0);
            on_disk.push((index, reloaded));
        })
        .await?;

    let expected: Vec<(usize, usize)> = (0..lines.len()).map(|i| (i, i + 1)).collect();
    assert_eq!(on_disk, expected);
    assert!(!progress_path.with_extension("json.tmp").exists());
    Ok(())
}

/// Interrupting and resuming gives the same records as one uninterrupted run
#[tokio::test]
async fn test_annotateAll_withPartialStore_shouldResumeIdentically() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let lines = common::sample_story();

    // Uninterrupted run
    let mut full_store = ProgressStore::open(temp_dir.path().join("full.json"))?;
    let uninterrupted = Annotator::new(Arc::new(ScriptedAnalyzer::new()), options())
        .annotate_all(&lines, &mut full_store)
        .await?;

    // Run that stopped after three lines
    let resumed_path = temp_dir.path().join("resumed.json");
    {
        let mut partial = ProgressStore::open(&resumed_path)?;
        Annotator::new(Arc::new(ScriptedAnalyzer::new()), options())
            .annotate_all(&lines[..3], &mut partial)
            .await?;
    }

    let analyzer = Arc::new(ScriptedAnalyzer::new());
    let mut store = ProgressStore::open(&resumed_path)?;
    assert_eq!(store.resume_index(), 3);
    let resumed = Annotator::new(analyzer.clone(), options())
        .annotate_all(&lines, &mut store)
        .await?;

    assert_eq!(resumed, uninterrupted);
    let calls = analyzer.calls();
    assert_eq!(calls.first().map(|c| c.index), Some(3));
    assert_eq!(calls.len(), lines.len() - 3);
    // Speakers from the stored records are known on resume
    assert_eq!(calls[0].seen_speakers, speakers(&["Mara"]));
    Ok(())
}

/// A complete store makes the run a no-op
#[tokio::test]
async fn test_annotateAll_withCompleteStore_shouldNotCallAnalyzer() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = temp_dir.path().join("progress.json");
    let lines = common::sample_story();
    let mut store = ProgressStore::open(&path)?;
    let first = Annotator::new(Arc::new(ScriptedAnalyzer::new()), options())
        .annotate_all(&lines, &mut store)
        .await?;

    let analyzer = Arc::new(ScriptedAnalyzer::new());
    let mut store = ProgressStore::open(&path)?;
    let second = Annotator::new(analyzer.clone(), options()).annotate_all(&lines, &mut store).await?;

    assert_eq!(first, second);
    assert!(analyzer.calls().is_empty());
    Ok(())
}

/// A store from a different story is rejected
#[tokio::test]
async fn test_annotateAll_withMismatchedStore_shouldFail() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = temp_dir.path().join("progress.json");
    let mut store = ProgressStore::open(&path)?;
    store.append(AnnotationRecord::fallback("A different opening line.", 5))?;

    let analyzer = Arc::new(ScriptedAnalyzer::new());
    let mut store = ProgressStore::open(&path)?;
    let result = Annotator::new(analyzer.clone(), options())
        .annotate_all(&common::sample_story(), &mut store)
        .await;

    assert!(matches!(result, Err(ProgressError::InputMismatch { index: 0, .. })));
    assert!(analyzer.calls().is_empty());
    Ok(())
}

/// A store longer than the input is rejected
#[tokio::test]
async fn test_annotateAll_withStoreLongerThanInput_shouldFail() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let lines = common::sample_story();
    let mut store = ProgressStore::open(temp_dir.path().join("progress.json"))?;
    Annotator::new(Arc::new(ScriptedAnalyzer::new()), options())
        .annotate_all(&lines, &mut store)
        .await?;

    let result = Annotator::new(Arc::new(ScriptedAnalyzer::new()), options())
        .annotate_all(&lines[..2], &mut store)
        .await;

    assert!(matches!(result, Err(ProgressError::LongerThanInput { stored: 7, lines: 2 })));
    Ok(())
}

/// An unreadable store is reported instead of being overwritten
#[test]
fn test_progressStore_open_withGarbage_shouldFail() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = common::create_test_file(temp_dir.path(), "progress.json", "{ \"analyses\": [ oops")?;

    assert!(matches!(ProgressStore::open(&path), Err(ProgressError::Malformed { .. })));
    assert_eq!(std::fs::read_to_string(&path)?, "{ \"analyses\": [ oops");
    Ok(())
}

/// A custom token counter is used for every record
#[tokio::test]
async fn test_annotateAll_withCustomTokenCounter_shouldUseIt() -> Result<()> {
    struct WordCounter;
    impl TokenCounter for WordCounter {
        fn count(&self, text: &str) -> usize {
            text.split_whitespace().count()
        }
    }

    let temp_dir = common::create_temp_dir()?;
    let lines = common::sample_story();
    let mut store = ProgressStore::open(temp_dir.path().join("progress.json"))?;
    let records = Annotator::new(Arc::new(ScriptedAnalyzer::new()), options())
        .with_token_counter(Box::new(WordCounter))
        .annotate_all(&lines, &mut store)
        .await?;

    assert_eq!(records[1].token_count, 5);
    Ok(())
}

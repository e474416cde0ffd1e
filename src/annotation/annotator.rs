/*!
 * Resumable line-by-line annotation.
 *
 * Lines are annotated strictly in order. Every record is checkpointed before
 * the next line starts, so a run interrupted at any point resumes from the
 * first line without a record.
 */

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use log::{debug, error, info};

use super::analyzer::LineAnalyzer;
use super::context::ContextWindow;
use super::models::{AnnotationRecord, LineAnalysis};
use super::progress::ProgressStore;
use super::tokens::{EstimatedTokenCounter, TokenCounter};
use crate::app_config::AnnotationConfig;
use crate::errors::ProgressError;

/// Where an annotation run is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnnotatorState {
    Idle,
    Resuming { from: usize },
    Processing(usize),
    Complete,
}

impl fmt::Display for AnnotatorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Resuming { from } => write!(f, "resuming at line {}", from + 1),
            Self::Processing(index) => write!(f, "processing line {}", index + 1),
            Self::Complete => write!(f, "complete"),
        }
    }
}

/// Tuning for an annotation run
#[derive(Debug, Clone)]
pub struct AnnotatorOptions {
    /// Lines of context before the current line
    pub context_before: usize,
    /// Lines of context after the current line
    pub context_after: usize,
    /// Pause after each analyzer call
    pub delay: Duration,
}

impl Default for AnnotatorOptions {
    fn default() -> Self {
        Self::from(&AnnotationConfig::default())
    }
}

impl From<&AnnotationConfig> for AnnotatorOptions {
    fn from(config: &AnnotationConfig) -> Self {
        Self {
            context_before: config.context_before,
            context_after: config.context_after,
            delay: Duration::from_millis(config.rate_limit_delay_ms),
        }
    }
}

/// Drives a `LineAnalyzer` over a story, checkpointing into a `ProgressStore`
pub struct Annotator {
    analyzer: Arc<dyn LineAnalyzer>,
    counter: Box<dyn TokenCounter>,
    options: AnnotatorOptions,
    state: AnnotatorState,
}

impl Annotator {
    pub fn new(analyzer: Arc<dyn LineAnalyzer>, options: AnnotatorOptions) -> Self {
        Self {
            analyzer,
            counter: Box::new(EstimatedTokenCounter),
            options,
            state: AnnotatorState::Idle,
        }
    }

    /// Replace the token counter
    pub fn with_token_counter(mut self, counter: Box<dyn TokenCounter>) -> Self {
        self.counter = counter;
        self
    }

    pub fn state(&self) -> AnnotatorState {
        self.state
    }

    fn transition(&mut self, next: AnnotatorState) {
        debug!("Annotator: {} -> {}", self.state, next);
        self.state = next;
    }

    /// Annotate every line without a stored record and return all records
    pub async fn annotate_all(
        &mut self,
        lines: &[String],
        store: &mut ProgressStore,
    ) -> Result<Vec<AnnotationRecord>, ProgressError> {
        self.annotate_all_with_progress(lines, store, |_, _| {}).await
    }

    /// Like `annotate_all`, calling `on_line(index, record)` after each checkpoint
    pub async fn annotate_all_with_progress<F>(
        &mut self,
        lines: &[String],
        store: &mut ProgressStore,
        mut on_line: F,
    ) -> Result<Vec<AnnotationRecord>, ProgressError>
    where
        F: FnMut(usize, &AnnotationRecord),
    {
        store.verify_against(lines)?;

        let start = store.resume_index();
        if start > 0 {
            self.transition(AnnotatorState::Resuming { from: start });
            info!("Resuming analysis from line {} of {}", start + 1, lines.len());
        }
        let mut seen_speakers = store.seen_speakers();

        for index in start..lines.len() {
            self.transition(AnnotatorState::Processing(index));
            let line = &lines[index];
            info!("Analyzing line {} of {}: {}", index + 1, lines.len(), preview(line, 50));

            let record = self.annotate_line(lines, index, &seen_speakers).await;
            if let Some(speaker) = record.analysis.speaker() {
                seen_speakers.insert(speaker.to_string());
            }

            store.append(record)?;
            if let Some(stored) = store.records().last() {
                on_line(index, stored);
            }

            if !self.options.delay.is_zero() && index + 1 < lines.len() {
                tokio::time::sleep(self.options.delay).await;
            }
        }

        self.transition(AnnotatorState::Complete);
        Ok(store.records().to_vec())
    }

    /// Analyze one line; analyzer failures yield the safe default record
    async fn annotate_line(
        &self,
        lines: &[String],
        index: usize,
        seen_speakers: &BTreeSet<String>,
    ) -> AnnotationRecord {
        let line = &lines[index];
        let token_count = self.counter.count(line);

        let analysis = match ContextWindow::build(
            lines,
            index,
            self.options.context_before,
            self.options.context_after,
        ) {
            Some(window) => match self.analyzer.analyze(line, &window, seen_speakers).await {
                Ok(analysis) => analysis,
                Err(e) => {
                    error!("Error analyzing line {}: {}", index + 1, e);
                    LineAnalysis::default()
                }
            },
            None => LineAnalysis::default(),
        };

        AnnotationRecord::new(analysis, line.clone(), token_count)
    }
}

fn preview(line: &str, max_chars: usize) -> String {
    if line.chars().count() <= max_chars {
        return line.to_string();
    }
    let head: String = line.chars().take(max_chars).collect();
    format!("{}...", head)
}

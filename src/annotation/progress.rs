/*!
 * Durable checkpoint of annotation results.
 *
 * The store is a JSON file `{"analyses": [...]}` rewritten after every
 * appended record. Its length is the index of the next line to annotate.
 */

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use log::debug;
use serde::{Deserialize, Serialize};

use super::models::AnnotationRecord;
use crate::errors::ProgressError;

#[derive(Deserialize)]
struct ProgressFile {
    analyses: Vec<AnnotationRecord>,
}

/// Append-only sequence of annotation records backed by a file
#[derive(Debug)]
pub struct ProgressStore {
    path: PathBuf,
    records: Vec<AnnotationRecord>,
}

impl ProgressStore {
    /// Load the store at `path`, or start an empty one if the file is absent
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, ProgressError> {
        let path = path.as_ref().to_path_buf();
        if !path.exists() {
            debug!("No progress file at {:?}, starting fresh", path);
            return Ok(Self { path, records: Vec::new() });
        }

        let content = fs::read_to_string(&path)?;
        let file: ProgressFile = serde_json::from_str(&content).map_err(|e| ProgressError::Malformed {
            path: path.clone(),
            reason: e.to_string(),
        })?;

        debug!("Loaded {} records from {:?}", file.analyses.len(), path);
        Ok(Self { path, records: file.analyses })
    }

    /// Check that the stored records belong to `lines`
    pub fn verify_against(&self, lines: &[String]) -> Result<(), ProgressError> {
        if self.records.len() > lines.len() {
            return Err(ProgressError::LongerThanInput {
                stored: self.records.len(),
                lines: lines.len(),
            });
        }

        for (index, (record, line)) in self.records.iter().zip(lines).enumerate() {
            if record.original_text != *line {
                return Err(ProgressError::InputMismatch {
                    index,
                    stored: record.original_text.clone(),
                    input: line.clone(),
                });
            }
        }
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn records(&self) -> &[AnnotationRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Index of the first line without a record
    pub fn resume_index(&self) -> usize {
        self.records.len()
    }

    /// Non-empty speaker labels of the stored records
    pub fn seen_speakers(&self) -> BTreeSet<String> {
        self.records
            .iter()
            .filter_map(|record| record.analysis.speaker())
            .map(str::to_string)
            .collect()
    }

    /// Append a record and persist the whole store
    pub fn append(&mut self, record: AnnotationRecord) -> Result<(), ProgressError> {
        self.records.push(record);
        self.persist()
    }

    /// Overwrite the file with the current records.
    ///
    /// Writes a sibling temp file first and renames it over the store, so an
    /// interrupted write leaves the previous checkpoint intact.
    pub fn persist(&self) -> Result<(), ProgressError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let file = ProgressFileRef { analyses: &self.records };
        let json = serde_json::to_string_pretty(&file)
            .map_err(|e| ProgressError::Io(std::io::Error::other(e)))?;

        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    pub fn into_records(self) -> Vec<AnnotationRecord> {
        self.records
    }
}

#[derive(Serialize)]
struct ProgressFileRef<'a> {
    analyses: &'a [AnnotationRecord],
}

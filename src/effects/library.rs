/*!
 * Matching catalog entries against a directory of downloaded sound files.
 */

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::Result;
use log::info;
use serde::Serialize;

use super::catalog::SoundEffectCatalog;
use crate::file_utils::FileManager;
use crate::script::ScriptDocument;

/// Extensions recognized in the library, in lookup order
pub const LIBRARY_EXTENSIONS: [&str; 3] = ["mp3", "wav", "ogg"];

/// `original description -> sound file`
pub type SoundMapping = BTreeMap<String, String>;

/// A catalog entry with no downloaded file
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MissingEffect {
    pub normalized: String,
    pub category: String,
    pub description: String,
    pub alternative_search_terms: Vec<String>,
    pub occurrences: usize,
    /// File name stem the library expects
    pub file_stem: String,
}

/// File name stem for a normalized term
pub fn safe_name(normalized: &str) -> String {
    normalized.replace(' ', "_").to_lowercase()
}

/// A directory of sound files named after normalized terms
#[derive(Debug, Clone)]
pub struct SoundLibrary {
    dir: PathBuf,
}

impl SoundLibrary {
    pub fn new<P: Into<PathBuf>>(dir: P) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// First existing file for `normalized`, trying `.mp3`, `.wav`, then `.ogg`
    pub fn find_file(&self, normalized: &str) -> Option<PathBuf> {
        let stem = safe_name(normalized);
        LIBRARY_EXTENSIONS
            .iter()
            .map(|ext| self.dir.join(format!("{}.{}", stem, ext)))
            .find(|path| FileManager::file_exists(path))
    }

    /// Entries without a file, most used first
    pub fn list_missing(&self, catalog: &SoundEffectCatalog) -> Vec<MissingEffect> {
        let mut missing: Vec<MissingEffect> = catalog
            .catalog
            .iter()
            .filter(|entry| self.find_file(&entry.normalized).is_none())
            .map(|entry| MissingEffect {
                normalized: entry.normalized.clone(),
                category: entry.category.clone(),
                description: entry.description.clone(),
                alternative_search_terms: entry.alternative_search_terms.clone(),
                occurrences: entry.occurrences,
                file_stem: safe_name(&entry.normalized),
            })
            .collect();

        missing.sort_by(|a, b| b.occurrences.cmp(&a.occurrences));
        missing
    }

    /// Map each original description that has a file to that file
    pub fn build_mapping(&self, catalog: &SoundEffectCatalog) -> SoundMapping {
        catalog
            .catalog
            .iter()
            .filter_map(|entry| {
                self.find_file(&entry.normalized)
                    .map(|path| (entry.original_description.clone(), path.to_string_lossy().into_owned()))
            })
            .collect()
    }
}

pub fn save_mapping<P: AsRef<Path>>(mapping: &SoundMapping, path: P) -> Result<()> {
    FileManager::write_json(&path, mapping)?;
    info!("Mapped {} sound effects into {:?}", mapping.len(), path.as_ref());
    Ok(())
}

pub fn load_mapping<P: AsRef<Path>>(path: P) -> Result<SoundMapping> {
    FileManager::read_json(path)
}

/// Rewrite every line's `sound_effect_files` from its `sound_effects`.
///
/// Lines without effects are left untouched. Returns the number of files attached.
pub fn apply_mapping(script: &mut ScriptDocument, mapping: &SoundMapping) -> usize {
    let mut attached = 0;
    for line in &mut script.lines {
        if line.sound_effects().is_empty() {
            continue;
        }
        let files: Vec<String> = line
            .sound_effects()
            .iter()
            .filter_map(|effect| mapping.get(effect).cloned())
            .collect();
        attached += files.len();
        line.sound_effect_files = Some(files);
    }
    attached
}

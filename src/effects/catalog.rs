/*!
 * Sound effect catalog built from an annotated script.
 *
 * Every effect reference in the script is grouped under its description,
 * normalized into a search term, and written out as JSON, Markdown and CSV.
 */

use std::collections::HashMap;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Result;
use log::{error, info};
use serde::{Deserialize, Serialize};

use super::normalizer::{EffectNormalizer, NormalizedEffect};
use crate::file_utils::FileManager;
use crate::script::ScriptDocument;

pub const CATALOG_JSON_FILE: &str = "normalized_sound_effects.json";
pub const CATALOG_MARKDOWN_FILE: &str = "sound_effects_catalog.md";
pub const CATALOG_CSV_FILE: &str = "sound_effects_list.csv";

/// Lines of context on each side of a line that uses an effect
const CONTEXT_RADIUS: usize = 2;

/// Example contexts shown per effect in the Markdown catalog
const MARKDOWN_EXAMPLES: usize = 3;

/// Effect references found in a script
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EffectReferences {
    /// Unique descriptions in first-seen order
    pub unique: Vec<String>,
    /// Line indices using each description, in line order
    pub lines_by_effect: HashMap<String, Vec<usize>>,
    /// Number of references, duplicates included
    pub total_references: usize,
}

impl EffectReferences {
    /// Collect every effect reference in line order
    pub fn extract(script: &ScriptDocument) -> Self {
        let mut refs = Self::default();
        for (index, line) in script.lines.iter().enumerate() {
            for effect in line.sound_effects() {
                refs.total_references += 1;
                let indices = refs.lines_by_effect.entry(effect.clone()).or_insert_with(|| {
                    refs.unique.push(effect.clone());
                    Vec::new()
                });
                indices.push(index);
            }
        }
        refs
    }
}

/// Where an effect is used
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EffectContext {
    pub line_index: usize,
    pub line_text: String,
    /// Surrounding lines, the used line included
    pub context: Vec<String>,
    pub emotion: String,
    pub intensity: f64,
}

/// One unique effect description
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub original_description: String,
    pub normalized: String,
    pub category: String,
    pub description: String,
    pub alternative_search_terms: Vec<String>,
    pub occurrences: usize,
    pub line_indices: Vec<usize>,
    pub contexts: Vec<EffectContext>,
}

/// Contents of `normalized_sound_effects.json`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SoundEffectCatalog {
    pub total_unique_effects: usize,
    pub total_effect_references: usize,
    pub catalog: Vec<CatalogEntry>,
}

impl SoundEffectCatalog {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        FileManager::read_json(path)
    }
}

/// Normalize unique descriptions batch by batch.
///
/// A batch that fails falls back to identity normalization for all of its
/// descriptions. Descriptions the normalizer skipped also get identity entries.
pub async fn normalize_all(
    normalizer: &dyn EffectNormalizer,
    unique: &[String],
    batch_size: usize,
    delay: Duration,
) -> HashMap<String, NormalizedEffect> {
    let mut normalized = HashMap::new();
    let batch_size = batch_size.max(1);
    let batches = unique.len().div_ceil(batch_size);

    for (number, batch) in unique.chunks(batch_size).enumerate() {
        info!("Normalizing batch {} of {} ({} descriptions)", number + 1, batches, batch.len());
        match normalizer.normalize(batch).await {
            Ok(effects) => {
                for effect in effects {
                    normalized.insert(effect.original.clone(), effect);
                }
            }
            Err(e) => error!("Error normalizing batch {}: {}", number + 1, e),
        }

        for original in batch {
            normalized
                .entry(original.clone())
                .or_insert_with(|| NormalizedEffect::identity(original));
        }

        if !delay.is_zero() && number + 1 < batches {
            tokio::time::sleep(delay).await;
        }
    }

    normalized
}

/// Assemble and sort the catalog
pub fn build_catalog(
    script: &ScriptDocument,
    refs: &EffectReferences,
    normalized: &HashMap<String, NormalizedEffect>,
) -> SoundEffectCatalog {
    let mut catalog: Vec<CatalogEntry> = refs
        .unique
        .iter()
        .map(|original| {
            let info = normalized
                .get(original)
                .cloned()
                .unwrap_or_else(|| NormalizedEffect::identity(original));
            let line_indices = refs.lines_by_effect.get(original).cloned().unwrap_or_default();
            let contexts = line_indices
                .iter()
                .filter_map(|&index| context_for(script, index))
                .collect();

            CatalogEntry {
                original_description: original.clone(),
                normalized: info.normalized,
                category: info.category,
                description: info.description,
                alternative_search_terms: info.alternative_search_terms,
                occurrences: line_indices.len(),
                line_indices,
                contexts,
            }
        })
        .collect();

    // Stable: ties keep first-seen order
    catalog.sort_by(|a, b| a.category.cmp(&b.category).then(b.occurrences.cmp(&a.occurrences)));

    SoundEffectCatalog {
        total_unique_effects: catalog.len(),
        total_effect_references: refs.total_references,
        catalog,
    }
}

fn context_for(script: &ScriptDocument, index: usize) -> Option<EffectContext> {
    let line = script.lines.get(index)?;
    let start = index.saturating_sub(CONTEXT_RADIUS);
    let end = (index + CONTEXT_RADIUS + 1).min(script.lines.len());

    Some(EffectContext {
        line_index: index,
        line_text: line.text().to_string(),
        context: script.lines[start..end].iter().map(|l| l.text().to_string()).collect(),
        emotion: line.record.analysis.emotion.clone(),
        intensity: line.record.analysis.intensity,
    })
}

/// Markdown catalog grouped by category
pub fn render_markdown(catalog: &SoundEffectCatalog) -> String {
    let mut out = String::from("# Sound Effects Catalog\n\n");
    let _ = writeln!(out, "Total unique sound effects: {}\n", catalog.catalog.len());

    let mut categories: Vec<(&str, Vec<&CatalogEntry>)> = Vec::new();
    for entry in &catalog.catalog {
        match categories.iter_mut().find(|(name, _)| *name == entry.category) {
            Some((_, entries)) => entries.push(entry),
            None => categories.push((&entry.category, vec![entry])),
        }
    }

    for (category, entries) in categories {
        let _ = writeln!(out, "## {} Sounds\n", title_case(category));

        for entry in entries {
            let _ = writeln!(out, "### {}\n", entry.normalized);
            let _ = writeln!(out, "**Original Description:** {}\n", entry.original_description);
            let _ = writeln!(out, "**Description:** {}\n", entry.description);
            let _ = writeln!(out, "**Alternative Search Terms:** {}\n", entry.alternative_search_terms.join(", "));
            let _ = writeln!(out, "**Occurrences:** {}\n", entry.occurrences);

            out.push_str("**Example Contexts:**\n\n");
            for (i, context) in entry.contexts.iter().take(MARKDOWN_EXAMPLES).enumerate() {
                let _ = writeln!(out, "Context {}:", i + 1);
                out.push_str("```\n");
                let start = context.line_index.saturating_sub(CONTEXT_RADIUS);
                for (offset, line) in context.context.iter().enumerate() {
                    if start + offset == context.line_index {
                        let _ = writeln!(out, "> {}", line);
                    } else {
                        let _ = writeln!(out, "{}", line);
                    }
                }
                out.push_str("```\n\n");
            }

            out.push_str("---\n\n");
        }
    }

    out
}

/// CSV list with quoted text fields and `|`-joined alternatives
pub fn render_csv(catalog: &SoundEffectCatalog) -> String {
    let mut out = String::from("Category,Normalized Name,Description,Alternative Search Terms,Occurrences\n");
    for entry in &catalog.catalog {
        let _ = writeln!(
            out,
            "{},{},{},{},{}",
            csv_quote(&entry.category),
            csv_quote(&entry.normalized),
            csv_quote(&entry.description),
            csv_quote(&entry.alternative_search_terms.join("|")),
            entry.occurrences
        );
    }
    out
}

/// Write the three catalog files into `dir`, returning their paths
pub fn write_catalog<P: AsRef<Path>>(catalog: &SoundEffectCatalog, dir: P) -> Result<Vec<PathBuf>> {
    let dir = dir.as_ref();
    FileManager::ensure_dir(dir)?;

    let json_path = dir.join(CATALOG_JSON_FILE);
    let markdown_path = dir.join(CATALOG_MARKDOWN_FILE);
    let csv_path = dir.join(CATALOG_CSV_FILE);

    FileManager::write_json(&json_path, catalog)?;
    FileManager::write_to_file(&markdown_path, &render_markdown(catalog))?;
    FileManager::write_to_file(&csv_path, &render_csv(catalog))?;

    Ok(vec![json_path, markdown_path, csv_path])
}

fn csv_quote(field: &str) -> String {
    format!("\"{}\"", field.replace('"', "\"\""))
}

fn title_case(text: &str) -> String {
    text.split(' ')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

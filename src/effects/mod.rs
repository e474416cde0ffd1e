/*!
 * Sound effects: cataloging the script's effect references and matching
 * them against a local sound library.
 */

pub mod catalog;
pub mod library;
pub mod normalizer;

pub use catalog::{build_catalog, normalize_all, write_catalog, EffectReferences, SoundEffectCatalog};
pub use library::{apply_mapping, SoundLibrary, SoundMapping};
pub use normalizer::{EffectNormalizer, LlmEffectNormalizer, NormalizedEffect};

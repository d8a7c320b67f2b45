//! Heuristic extraction of characters and scenes from script text.
//!
//! Everything here is regex and frequency counting; no completion calls.
//! Cutoffs come from [`ExtractionThresholds`].

pub mod characters;
pub mod nouns;
pub mod scenes;

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use scriptlens_core::ExtractionThresholds;
use scriptlens_store::{CharacterCount, SceneRecord};

pub use characters::{extract_characters, merge_counts};
pub use nouns::{HangulNounAnalyzer, NounAnalyzer};
pub use scenes::extract_scenes;

/// Combined extraction result for a script.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExtractionResult {
    pub characters: Vec<CharacterCount>,
    pub scenes: Vec<SceneRecord>,
}

/// Run character and scene extraction on a text.
pub fn extract_all(
    text: &str,
    thresholds: &ExtractionThresholds,
    exclusions: &HashSet<String>,
    analyzer: &dyn NounAnalyzer,
) -> ExtractionResult {
    ExtractionResult {
        characters: extract_characters(text, thresholds, exclusions, analyzer),
        scenes: extract_scenes(text, thresholds),
    }
}

//! Configuration and data directory management.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Default maximum size (in characters) of a word-packed chunk.
pub const DEFAULT_MAX_CHUNK_SIZE: usize = 8000;

/// Paths to all ScriptLens data files.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataPaths {
    /// Root data directory (e.g., `data/`).
    pub root: PathBuf,
    /// SQLite database file (`data/scripts.db`).
    pub database: PathBuf,
    /// Default directory scanned for PDF scripts (`data/scripts/`).
    pub scripts: PathBuf,
    /// Non-name noun denylist (`data/blacklist.json`).
    pub blacklist_file: PathBuf,
    /// Extraction threshold overrides (`data/extraction.json`).
    pub extraction_file: PathBuf,
    /// LLM configuration (`data/llm-config.json`).
    pub llm_config_file: PathBuf,
    /// Database backups (`data/backups/`), created on first backup.
    pub backups: PathBuf,
}

impl DataPaths {
    /// Create data paths from a root directory. Creates directories if needed.
    pub fn new(root: impl AsRef<Path>) -> std::io::Result<Self> {
        let root = root.as_ref().to_path_buf();
        let paths = Self {
            database: root.join("scripts.db"),
            scripts: root.join("scripts"),
            blacklist_file: root.join("blacklist.json"),
            extraction_file: root.join("extraction.json"),
            llm_config_file: root.join("llm-config.json"),
            backups: root.join("backups"),
            root,
        };
        paths.ensure_dirs()?;
        Ok(paths)
    }

    fn ensure_dirs(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.root)?;
        std::fs::create_dir_all(&self.scripts)?;
        Ok(())
    }
}

/// Occurrence cutoffs and cascade thresholds used by the heuristic extractors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionThresholds {
    /// Minimum count for a "name + title" mention to be kept.
    #[serde(default = "default_title_min_count")]
    pub title_min_count: usize,
    /// Minimum count for a dialogue speaker cue to be kept.
    #[serde(default = "default_speaker_min_count")]
    pub speaker_min_count: usize,
    /// Minimum count for a noun to be kept by the noun-frequency pass.
    #[serde(default = "default_noun_min_count")]
    pub noun_min_count: usize,
    /// Minimum length (in characters) of speaker and noun candidates.
    #[serde(default = "default_min_name_len")]
    pub min_name_len: usize,
    /// Number of merged candidates returned.
    #[serde(default = "default_top_n")]
    pub top_n: usize,
    /// A scene pattern with fewer hits than this falls through to the next one.
    #[serde(default = "default_scene_fallback_min")]
    pub scene_fallback_min: usize,
}

fn default_title_min_count() -> usize {
    100
}
fn default_speaker_min_count() -> usize {
    20
}
fn default_noun_min_count() -> usize {
    100
}
fn default_min_name_len() -> usize {
    2
}
fn default_top_n() -> usize {
    30
}
fn default_scene_fallback_min() -> usize {
    10
}

impl Default for ExtractionThresholds {
    fn default() -> Self {
        Self {
            title_min_count: default_title_min_count(),
            speaker_min_count: default_speaker_min_count(),
            noun_min_count: default_noun_min_count(),
            min_name_len: default_min_name_len(),
            top_n: default_top_n(),
            scene_fallback_min: default_scene_fallback_min(),
        }
    }
}

impl ExtractionThresholds {
    /// Load overrides from a JSON file. Missing fields (or a missing file) use defaults.
    pub fn load(path: &Path) -> Self {
        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(_) => {
                debug!("No threshold overrides at {}", path.display());
                return Self::default();
            }
        };
        match serde_json::from_str(&raw) {
            Ok(thresholds) => thresholds,
            Err(e) => {
                warn!("Ignoring malformed {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    /// Whether a scene pattern with `hits` matches is too sparse to trust.
    pub fn fallback_warranted(&self, hits: usize) -> bool {
        hits < self.scene_fallback_min
    }
}

/// Load the noun denylist: a JSON array of strings. Absent or invalid files give an empty set.
pub fn load_exclusion_list(path: &Path) -> HashSet<String> {
    let raw = match std::fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(_) => return HashSet::new(),
    };
    match serde_json::from_str::<Vec<String>>(&raw) {
        Ok(terms) => terms.into_iter().collect(),
        Err(e) => {
            warn!("Ignoring malformed exclusion list {}: {}", path.display(), e);
            HashSet::new()
        }
    }
}

/// Top-level ScriptLens configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Data directory paths.
    pub data_paths: DataPaths,
    /// Heuristic extraction cutoffs.
    pub thresholds: ExtractionThresholds,
    /// Word-packing chunk size for documents under the sampling threshold.
    pub max_chunk_size: usize,
}

impl AppConfig {
    /// Create configuration from environment and defaults.
    pub fn from_env(data_dir: impl AsRef<Path>) -> std::io::Result<Self> {
        let max_chunk_size = std::env::var("SCRIPTLENS_CHUNK_SIZE")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_MAX_CHUNK_SIZE);

        let data_paths = DataPaths::new(data_dir)?;
        let thresholds = ExtractionThresholds::load(&data_paths.extraction_file);

        Ok(Self {
            data_paths,
            thresholds,
            max_chunk_size,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_thresholds_partial_override() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("extraction.json");
        std::fs::write(&path, r#"{"speaker_min_count": 5, "min_name_len": 1}"#).unwrap();

        let t = ExtractionThresholds::load(&path);
        assert_eq!(t.speaker_min_count, 5);
        assert_eq!(t.min_name_len, 1);
        assert_eq!(t.title_min_count, 100);
        assert_eq!(t.scene_fallback_min, 10);
    }

    #[test]
    fn test_fallback_policy() {
        let t = ExtractionThresholds::default();
        assert!(t.fallback_warranted(9));
        assert!(!t.fallback_warranted(10));
    }

    #[test]
    fn test_exclusion_list_missing_file_is_empty() {
        let dir = TempDir::new().unwrap();
        assert!(load_exclusion_list(&dir.path().join("nope.json")).is_empty());

        let path = dir.path().join("blacklist.json");
        std::fs::write(&path, r#"["사람", "생각"]"#).unwrap();
        let terms = load_exclusion_list(&path);
        assert!(terms.contains("사람"));
        assert_eq!(terms.len(), 2);
    }

    #[test]
    fn test_data_paths_layout() {
        let dir = TempDir::new().unwrap();
        let paths = DataPaths::new(dir.path().join("data")).unwrap();
        assert!(paths.scripts.is_dir());
        assert!(paths.database.ends_with("scripts.db"));
        assert!(paths.backups.starts_with(&paths.root));
        assert!(!paths.backups.exists());
    }
}

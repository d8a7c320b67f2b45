//! Script ingestion pipeline: file → text → characters/scenes → store.

use std::collections::HashSet;
use std::path::Path;
use std::time::UNIX_EPOCH;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::extract::{extract_all, HangulNounAnalyzer, NounAnalyzer};
use crate::file;
use scriptlens_core::{Error, ExtractionThresholds, Result};
use scriptlens_store::{AddMovieOptions, ScriptStore, UpsertReport};

static BRACKETED_TAIL: Lazy<Regex> = Lazy::new(|| Regex::new(r"[\(\)\[\]\{\}].*").unwrap());
static SEPARATORS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[_\-\.]").unwrap());

/// Derive a display title from a script filename.
///
/// The extension and everything from the first bracket on are dropped, and
/// `_`, `-` and `.` become spaces: `기생충_(2019)_final.pdf` → `기생충`.
pub fn extract_movie_title(filename: &str) -> String {
    let stem = match filename.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem,
        _ => filename,
    };
    let stem = BRACKETED_TAIL.replace(stem, "");
    SEPARATORS.replace_all(&stem, " ").trim().to_string()
}

/// Modification time of a file in unix seconds.
pub fn file_mtime(path: &Path) -> Result<f64> {
    let modified = std::fs::metadata(path)?.modified()?;
    let since_epoch = modified
        .duration_since(UNIX_EPOCH)
        .map_err(|e| Error::Storage(format!("mtime before epoch: {}", e)))?;
    Ok(since_epoch.as_secs_f64())
}

/// What ingesting a single script did.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestReport {
    pub movie_id: i64,
    pub title: String,
    pub characters: UpsertReport,
    pub scenes: UpsertReport,
}

/// Outcome of processing one file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum IngestOutcome {
    /// The stored modification time is current; nothing was touched.
    Unchanged,
    Ingested(IngestReport),
}

/// Outcome of processing a directory.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DirectoryReport {
    pub total: usize,
    pub succeeded: usize,
    /// Filename and error message of each failed file.
    pub failed: Vec<(String, String)>,
}

/// Handles script ingestion: text extraction, heuristic extraction and storage.
pub struct Ingester<'a> {
    store: &'a ScriptStore,
    thresholds: ExtractionThresholds,
    exclusions: HashSet<String>,
    analyzer: Box<dyn NounAnalyzer>,
}

impl<'a> Ingester<'a> {
    pub fn new(
        store: &'a ScriptStore,
        thresholds: ExtractionThresholds,
        exclusions: HashSet<String>,
    ) -> Self {
        Self {
            store,
            thresholds,
            exclusions,
            analyzer: Box::new(HangulNounAnalyzer::new()),
        }
    }

    /// Replace the default noun analyzer.
    pub fn with_analyzer(mut self, analyzer: Box<dyn NounAnalyzer>) -> Self {
        self.analyzer = analyzer;
        self
    }

    /// Ingest one PDF unless the stored copy is already current.
    pub fn process_single_file(&self, path: &Path) -> Result<IngestOutcome> {
        if !path.is_file() {
            return Err(Error::NotFound(path.display().to_string()));
        }
        if !file::is_pdf(path) {
            return Err(Error::InvalidInput(format!(
                "not a PDF file: {}",
                path.display()
            )));
        }
        let filename = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| Error::Storage(format!("invalid filename: {}", path.display())))?;

        let mtime = file_mtime(path)?;
        if !self.store.is_file_modified(filename, mtime)? {
            info!("'{}' unchanged, skipping", filename);
            return Ok(IngestOutcome::Unchanged);
        }

        let text = file::extract_text_lossy(path);
        let file_path = path.to_string_lossy();
        let report = self.ingest_text(filename, Some(file_path.as_ref()), Some(mtime), &text)?;
        Ok(IngestOutcome::Ingested(report))
    }

    /// Extract characters and scenes from `text` and store them under `filename`.
    pub fn ingest_text(
        &self,
        filename: &str,
        file_path: Option<&str>,
        mtime: Option<f64>,
        text: &str,
    ) -> Result<IngestReport> {
        let title = extract_movie_title(filename);
        let movie_id = self.store.get_or_create_movie(&AddMovieOptions {
            title: title.clone(),
            filename: filename.to_string(),
            file_path: file_path.map(str::to_string),
            last_modified: mtime,
        })?;

        info!("Analysing '{}' (movie {})", filename, movie_id);
        if text.trim().is_empty() {
            warn!("No text extracted from '{}'", filename);
        }

        let extracted = extract_all(text, &self.thresholds, &self.exclusions, self.analyzer.as_ref());

        let characters = if extracted.characters.is_empty() {
            debug!("No characters found in '{}'", filename);
            UpsertReport::default()
        } else {
            self.store.upsert_characters(movie_id, &extracted.characters)?
        };
        let scenes = if extracted.scenes.is_empty() {
            debug!("No scenes found in '{}'", filename);
            UpsertReport::default()
        } else {
            self.store.upsert_scenes(movie_id, &extracted.scenes)?
        };

        if let Some(mtime) = mtime {
            self.store.update_movie_modified_time(movie_id, mtime)?;
        }

        info!(
            "'{}': {} characters, {} scenes",
            filename,
            extracted.characters.len(),
            extracted.scenes.len()
        );

        Ok(IngestReport {
            movie_id,
            title,
            characters,
            scenes,
        })
    }

    /// Process every `.pdf` file in a directory (non-recursive, in name order).
    /// A failing file is logged and counted; it does not stop the batch.
    pub fn process_directory(&self, dir: &Path) -> Result<DirectoryReport> {
        if !dir.is_dir() {
            return Err(Error::NotFound(dir.display().to_string()));
        }

        let mut pdfs: Vec<_> = std::fs::read_dir(dir)?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|p| p.is_file() && file::is_pdf(p))
            .collect();
        pdfs.sort();

        let mut report = DirectoryReport {
            total: pdfs.len(),
            ..Default::default()
        };
        if pdfs.is_empty() {
            warn!("No PDF files in {}", dir.display());
            return Ok(report);
        }

        info!("Processing {} PDF files in {}", pdfs.len(), dir.display());
        for path in &pdfs {
            match self.process_single_file(path) {
                Ok(_) => report.succeeded += 1,
                Err(e) => {
                    warn!("Failed to ingest {}: {}", path.display(), e);
                    let name = path
                        .file_name()
                        .map(|n| n.to_string_lossy().to_string())
                        .unwrap_or_default();
                    report.failed.push((name, e.to_string()));
                }
            }
        }

        info!("Processed {}/{} files", report.succeeded, report.total);
        Ok(report)
    }
}

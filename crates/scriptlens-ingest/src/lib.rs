//! ScriptLens Ingest: PDF text extraction, chunking, character/scene extraction, ingestion.

pub mod chunking;
pub mod extract;
pub mod file;
pub mod ingest;

pub use chunking::{chunk_text, clean_script_text, sample_windows};
pub use extract::{extract_all, ExtractionResult, HangulNounAnalyzer, NounAnalyzer};
pub use ingest::{extract_movie_title, DirectoryReport, IngestOutcome, IngestReport, Ingester};

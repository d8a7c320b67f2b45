//! ScriptLens Core: errors, configuration, extraction thresholds.

pub mod config;
pub mod error;

pub use config::{AppConfig, DataPaths, ExtractionThresholds};
pub use error::{Error, Result};

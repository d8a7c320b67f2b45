//! Command definitions and argument parsing.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// ScriptLens: analyse PDF movie and drama scripts.
#[derive(Debug, Parser)]
#[command(name = "scriptlens")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Data directory holding the database and configuration files
    #[arg(long, env = "SCRIPTLENS_DATA_DIR", default_value = "data", global = true)]
    pub data_dir: PathBuf,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Create the database schema
    Init {
        /// Back up the database, then drop and recreate every table
        #[arg(long)]
        reset: bool,
    },

    /// Copy the database to a file (defaults to a timestamped file in the backups directory)
    Backup { dest: Option<PathBuf> },

    /// Replace the database with a backup; the current database is backed up first
    Restore { src: PathBuf },

    /// List stored movies, most recently modified first
    List,

    /// Ingest a PDF or every PDF in a directory (defaults to the scripts directory)
    Ingest { path: Option<PathBuf> },

    /// Delete a movie and everything stored for it, by ID or filename
    Delete { target: String },

    /// Show everything stored for a movie
    Show { id: i64 },

    /// Database statistics
    Stats,

    /// Print the stored character relationships as a Mermaid diagram
    Diagram { id: i64 },

    /// Ingest a PDF and run the full LLM analysis on it
    Analyze { pdf: PathBuf },

    /// Answer the fixed question set for a PDF
    Ask { pdf: PathBuf },

    /// Print the analysis chunks of a PDF's text
    Chunk {
        pdf: PathBuf,

        /// Override the configured word-packing chunk size
        #[arg(long)]
        max_chunk_size: Option<usize>,
    },
}

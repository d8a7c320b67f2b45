//! ScriptLens Store: SQLite records for scripts, characters, scenes and analysis.

pub mod graph;
pub mod schema;
pub mod sqlite;
pub mod types;

pub use graph::RelationshipGraph;
pub use sqlite::ScriptStore;
pub use types::*;

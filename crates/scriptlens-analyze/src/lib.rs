//! LLM-backed script analysis (OpenAI/Anthropic/Groq).
//!
//! Summaries, structured tags, character analysis, Mermaid character trees and
//! sentiment, plus the pipeline that persists them to the record store.

pub mod analyzer;
pub mod config;
pub mod parse;
pub mod pipeline;
pub mod providers;
pub mod relations;
pub mod types;

pub use analyzer::{summary_strategy, ScriptAnalyzer, QUESTIONS};
pub use config::LLMConfig;
pub use pipeline::process_ai_analysis;
pub use providers::{CompletionClient, HttpCompletionClient, ScriptedClient};
pub use types::*;

//! Completion request and analysis result types.

use serde::{Deserialize, Serialize};

/// LLM provider identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LLMProvider {
    OpenAI,
    Anthropic,
    Groq,
}

impl std::fmt::Display for LLMProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LLMProvider::OpenAI => write!(f, "openai"),
            LLMProvider::Anthropic => write!(f, "anthropic"),
            LLMProvider::Groq => write!(f, "groq"),
        }
    }
}

/// One chat message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".into(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".into(),
            content: content.into(),
        }
    }
}

/// A non-streaming completion request: a system prompt and a single user turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionRequest {
    pub messages: Vec<ChatMessage>,
    pub temperature: f64,
    pub max_tokens: usize,
}

impl CompletionRequest {
    pub fn new(system: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            messages: vec![ChatMessage::system(system), ChatMessage::user(user)],
            temperature: 0.5,
            max_tokens: 1000,
        }
    }

    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: usize) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// The user turn, for logging and test assertions.
    pub fn user_content(&self) -> &str {
        self.messages
            .iter()
            .rev()
            .find(|m| m.role == "user")
            .map(|m| m.content.as_str())
            .unwrap_or("")
    }
}

/// A reply expected to hold JSON: either the parsed value or the raw reply text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum StructuredOutput {
    Parsed(serde_json::Value),
    Raw(String),
}

impl StructuredOutput {
    pub fn as_value(&self) -> Option<&serde_json::Value> {
        match self {
            Self::Parsed(v) => Some(v),
            Self::Raw(_) => None,
        }
    }

    /// String field of a parsed object.
    pub fn str_field(&self, key: &str) -> Option<&str> {
        self.as_value()?.get(key)?.as_str()
    }

    /// String items of an array field of a parsed object. Non-string items are skipped.
    pub fn string_list(&self, key: &str) -> Vec<String> {
        self.as_value()
            .and_then(|v| v.get(key))
            .and_then(|v| v.as_array())
            .map(|items| {
                items
                    .iter()
                    .filter_map(|i| i.as_str().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// Which summarization strategy was used for a text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SummaryStrategy {
    /// One call over the whole text.
    Single,
    /// Head and tail calls plus a synthesis call.
    HeadTail,
    /// One call over head, middle and tail excerpts.
    Sampled,
}

/// Result of the full analysis of one movie. Failed stages are `None` and
/// described in `diagnostics`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub movie_id: i64,
    pub summary: Option<String>,
    pub structured: Option<StructuredOutput>,
    pub character_analysis: Option<String>,
    pub character_tree: Option<String>,
    pub sentiment: Option<StructuredOutput>,
    pub relationships_saved: usize,
    pub plot_elements_saved: usize,
    pub diagnostics: Vec<String>,
}

impl AnalysisReport {
    pub fn is_complete(&self) -> bool {
        self.diagnostics.is_empty()
    }
}

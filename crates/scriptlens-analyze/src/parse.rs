//! Pulling JSON and Mermaid out of free-form completion replies.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::types::StructuredOutput;

static JSON_FENCE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)```json[ \t]*\r?\n(.*?)\r?\n?```").unwrap());
static MERMAID_FENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)```mermaid[ \t]*\r?\n(.*?)```").unwrap());

/// Diagram used when a reply contains no usable Mermaid code.
pub const FALLBACK_TREE: &str = "graph TD\n  A[Analysis error] --> B[No relationship diagram could be produced]";

/// Parse a reply that should contain JSON.
///
/// The first ```` ```json ```` block is used if present, otherwise the whole
/// reply. Anything that does not parse comes back as [`StructuredOutput::Raw`].
pub fn parse_structured(reply: &str) -> StructuredOutput {
    let candidate = JSON_FENCE
        .captures(reply)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
        .unwrap_or(reply);

    match serde_json::from_str(candidate.trim()) {
        Ok(value) => StructuredOutput::Parsed(value),
        Err(_) => StructuredOutput::Raw(reply.to_string()),
    }
}

/// Extract Mermaid code from a reply.
///
/// Uses the first ```` ```mermaid ```` block; failing that, the bare reply if it
/// looks like a diagram (mentions `graph` or `flowchart`).
pub fn extract_mermaid(reply: &str) -> Option<String> {
    if let Some(cap) = MERMAID_FENCE.captures(reply) {
        return Some(cap[1].trim().to_string());
    }
    if reply.contains("graph") || reply.contains("flowchart") {
        return Some(reply.trim().to_string());
    }
    None
}

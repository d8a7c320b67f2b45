//! Full analysis of one movie: every intent in order, results persisted.

use serde_json::Value;
use tracing::{info, warn};

use crate::analyzer::{ScriptAnalyzer, MIN_ANALYSIS_CHARS};
use crate::providers::CompletionClient;
use crate::relations::save_relationships;
use crate::types::{AnalysisReport, StructuredOutput};
use scriptlens_core::{Error, Result};
use scriptlens_store::ScriptStore;

const UNKNOWN_SENTIMENT: &str = "unknown";

/// Read `sentiment_score` whether the model wrote it as a number or a string.
fn sentiment_score(value: &Value) -> f64 {
    match value.get("sentiment_score") {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
        Some(Value::String(s)) => s.trim().parse().unwrap_or(0.0),
        _ => 0.0,
    }
}

/// Run summary, structured extraction, character analysis, character tree and
/// sentiment for `movie_id`, then persist what succeeded.
///
/// Completion failures do not abort the run; each is recorded in
/// [`AnalysisReport::diagnostics`] and the dependent stage is skipped. Text
/// too short to analyse and storage failures are returned as errors.
pub async fn process_ai_analysis<C: CompletionClient>(
    store: &ScriptStore,
    client: &C,
    movie_id: i64,
    text: &str,
) -> Result<AnalysisReport> {
    if store.get_movie(movie_id)?.is_none() {
        return Err(Error::NotFound(format!("movie {}", movie_id)));
    }
    let len = text.trim().chars().count();
    if len < MIN_ANALYSIS_CHARS {
        return Err(Error::Extraction(format!(
            "script text too short to analyse ({} chars)",
            len
        )));
    }

    let analyzer = ScriptAnalyzer::new(client);
    let mut report = AnalysisReport {
        movie_id,
        ..Default::default()
    };

    info!("Analyzing movie {}", movie_id);

    match analyzer.summarize(text).await {
        Ok(summary) => report.summary = Some(summary),
        Err(e) => report.note("summary", e),
    }

    if let Some(summary) = &report.summary {
        match analyzer.extract_structured(summary).await {
            Ok(structured) => {
                if let StructuredOutput::Raw(_) = structured {
                    report
                        .diagnostics
                        .push("structured: reply was not valid JSON".to_string());
                }
                report.structured = Some(structured);
            }
            Err(e) => report.note("structured", e),
        }
    }

    match analyzer.analyze_characters(text).await {
        Ok(analysis) => report.character_analysis = Some(analysis),
        Err(e) => report.note("characters", e),
    }

    match analyzer.character_tree(text).await {
        Ok(tree) => report.character_tree = Some(tree),
        Err(e) => report.note("character tree", e),
    }

    match analyzer.analyze_sentiment(text).await {
        Ok(sentiment) => {
            match &sentiment {
                StructuredOutput::Parsed(value) => {
                    let label = sentiment
                        .str_field("overall_sentiment")
                        .unwrap_or(UNKNOWN_SENTIMENT);
                    store.add_sentiment(movie_id, sentiment_score(value), label, value)?;
                }
                StructuredOutput::Raw(_) => report
                    .diagnostics
                    .push("sentiment: reply was not valid JSON".to_string()),
            }
            report.sentiment = Some(sentiment);
        }
        Err(e) => report.note("sentiment", e),
    }

    if let Some(summary) = &report.summary {
        let structured = report.structured.as_ref();
        let genre = structured
            .and_then(|s| s.str_field("genre"))
            .unwrap_or_default();
        let themes = structured
            .map(|s| s.string_list("themes"))
            .unwrap_or_default();
        let title = structured.and_then(|s| s.str_field("title"));
        store.update_movie_summary(movie_id, summary, genre, &themes.join(", "), title)?;

        let plot_points = structured
            .map(|s| s.string_list("plot_points"))
            .unwrap_or_default();
        if !plot_points.is_empty() {
            report.plot_elements_saved =
                store.replace_plot_elements(movie_id, &plot_points, &themes)?;
        }
    }

    if let Some(analysis) = &report.character_analysis {
        report.relationships_saved = save_relationships(store, movie_id, analysis)?;
    }

    info!(
        "Analysis of movie {} finished ({} relationships, {} plot elements, {} diagnostics)",
        movie_id,
        report.relationships_saved,
        report.plot_elements_saved,
        report.diagnostics.len()
    );
    Ok(report)
}

impl AnalysisReport {
    fn note(&mut self, stage: &str, error: Error) {
        warn!("Analysis stage '{}' failed: {}", stage, error);
        self.diagnostics.push(format!("{}: {}", stage, error));
    }
}

//! Command implementations. Each prints its result to stdout.

use std::path::Path;

use anyhow::{anyhow, bail, Context as _};
use tracing::info;

use scriptlens_analyze::{
    process_ai_analysis, AnalysisReport, HttpCompletionClient, LLMConfig, ScriptAnalyzer,
};
use scriptlens_core::config::load_exclusion_list;
use scriptlens_core::AppConfig;
use scriptlens_ingest::file::extract_text;
use scriptlens_ingest::{chunk_text, IngestOutcome, Ingester};
use scriptlens_store::{MovieDetail, RelationshipGraph, ScriptStore, StoreStats};

/// Opened configuration and store shared by every command.
pub struct Context {
    pub config: AppConfig,
    pub store: ScriptStore,
}

impl Context {
    pub fn open(data_dir: &Path) -> anyhow::Result<Self> {
        let config = AppConfig::from_env(data_dir)
            .with_context(|| format!("preparing data directory {}", data_dir.display()))?;
        let store = ScriptStore::open(&config.data_paths.database)
            .map_err(|e| anyhow!("Failed to open store: {}", e))?;
        Ok(Self { config, store })
    }

    fn ingester(&self) -> Ingester<'_> {
        Ingester::new(
            &self.store,
            self.config.thresholds.clone(),
            load_exclusion_list(&self.config.data_paths.blacklist_file),
        )
    }

    fn completion_client(&self) -> anyhow::Result<HttpCompletionClient> {
        let llm = LLMConfig::load(&self.config.data_paths.llm_config_file);
        let client = HttpCompletionClient::from_config(&llm)?;
        info!("Using {} model {}", client.provider(), client.model());
        Ok(client)
    }
}

pub fn init(ctx: &Context, reset: bool) -> anyhow::Result<()> {
    if reset {
        let backup = ctx.store.reset_with_backup(&ctx.config.data_paths.backups)?;
        println!("Previous database saved to {}", backup.display());
        println!("Database reset: {}", ctx.store.db_path().display());
    } else {
        println!("Database ready: {}", ctx.store.db_path().display());
    }
    Ok(())
}

pub fn backup(ctx: &Context, dest: Option<&Path>) -> anyhow::Result<()> {
    let dest = match dest {
        Some(dest) => {
            ctx.store.backup(dest)?;
            dest.to_path_buf()
        }
        None => ctx
            .store
            .backup_timestamped(&ctx.config.data_paths.backups, "scripts_backup")?,
    };
    println!("Database backed up to {}", dest.display());
    Ok(())
}

pub fn restore(ctx: &Context, src: &Path) -> anyhow::Result<()> {
    if !src.is_file() {
        bail!("Backup file {} not found", src.display());
    }
    let previous = ctx
        .store
        .backup_timestamped(&ctx.config.data_paths.backups, "scripts_before_restore")?;
    println!("Current database saved to {}", previous.display());
    ctx.store
        .restore(src)
        .with_context(|| format!("restoring from {}", src.display()))?;
    println!("Database restored from {}", src.display());
    Ok(())
}

pub fn list(ctx: &Context) -> anyhow::Result<()> {
    let movies = ctx.store.list_movies()?;
    if movies.is_empty() {
        println!("No movies stored.");
        return Ok(());
    }
    println!("{:>5}  {:<19}  {:<30}  Filename", "ID", "Modified", "Title");
    for m in &movies {
        println!(
            "{:>5}  {:<19}  {:<30}  {}",
            m.id,
            m.modified_date.as_deref().unwrap_or("-"),
            m.title,
            m.filename
        );
    }
    Ok(())
}

pub fn ingest(ctx: &Context, path: Option<&Path>) -> anyhow::Result<()> {
    let path = path.unwrap_or(ctx.config.data_paths.scripts.as_path());
    let ingester = ctx.ingester();

    if path.is_dir() {
        let report = ingester.process_directory(path)?;
        println!("=== Ingestion Report ===");
        println!();
        println!("PDF files:   {}", report.total);
        println!("Succeeded:   {}", report.succeeded);
        println!("Failed:      {}", report.failed.len());
        if !report.failed.is_empty() {
            println!();
            println!("Errors:");
            for (file, error) in &report.failed {
                println!("  - {}: {}", file, error);
            }
            bail!("{} of {} files failed", report.failed.len(), report.total);
        }
        return Ok(());
    }

    match ingester.process_single_file(path)? {
        IngestOutcome::Unchanged => println!("{} is unchanged; nothing to do.", path.display()),
        IngestOutcome::Ingested(report) => {
            println!("Ingested '{}' as movie {}", report.title, report.movie_id);
            println!(
                "Characters: {} new, {} updated, {} unchanged",
                report.characters.inserted, report.characters.updated, report.characters.unchanged
            );
            println!(
                "Scenes:     {} new, {} updated, {} unchanged",
                report.scenes.inserted, report.scenes.updated, report.scenes.unchanged
            );
        }
    }
    Ok(())
}

pub fn delete(ctx: &Context, target: &str) -> anyhow::Result<()> {
    let deleted = match target.parse::<i64>() {
        Ok(id) => ctx.store.delete_movie(id)?,
        Err(_) => ctx.store.delete_movie_by_filename(target)?,
    };
    if !deleted {
        bail!("No movie matches '{}'", target);
    }
    println!("Deleted {}", target);
    Ok(())
}

pub fn show(ctx: &Context, id: i64) -> anyhow::Result<()> {
    let detail = ctx
        .store
        .movie_detail(id)?
        .ok_or_else(|| anyhow!("Movie {} not found", id))?;
    print_detail(&detail);
    Ok(())
}

fn print_detail(detail: &MovieDetail) {
    let movie = &detail.movie;
    println!("=== {} ===", movie.title);
    println!();
    println!("File:       {}", movie.filename);
    println!("Genre:      {}", movie.genre.as_deref().unwrap_or("-"));
    println!("Themes:     {}", movie.theme.as_deref().unwrap_or("-"));
    if let Some(summary) = &movie.summary {
        println!();
        println!("Summary:");
        println!("{}", summary);
    }

    println!();
    println!("Characters ({}):", detail.characters.len());
    for c in &detail.characters {
        println!("  - {} ({})", c.name, c.count);
    }

    println!();
    println!("Scenes ({}):", detail.scenes.len());
    for s in &detail.scenes {
        println!(
            "  - {} [{} / {}]",
            s.record.heading, s.record.setting, s.record.time_of_day
        );
    }

    if !detail.relationships.is_empty() {
        println!();
        println!("Relationships:");
        for r in &detail.relationships {
            println!(
                "  - {} / {}: {}",
                r.character1,
                r.character2,
                r.relationship_type.as_deref().unwrap_or("-")
            );
        }
    }

    if let Some(sentiment) = &detail.sentiment {
        println!();
        println!("Sentiment:  {} ({:+.2})", sentiment.label, sentiment.score);
    }

    if !detail.plot_points.is_empty() {
        println!();
        println!("Plot:");
        for p in &detail.plot_points {
            println!("  {}. {}", p.order, p.description);
        }
    }
}

pub fn stats(ctx: &Context) -> anyhow::Result<()> {
    print_stats(&ctx.store.stats()?);
    Ok(())
}

fn print_stats(stats: &StoreStats) {
    println!("=== ScriptLens Database ===");
    println!();
    println!("Path:        {}", stats.db_path);
    println!("Size:        {:.2} MB", stats.db_size_mb);
    println!("Movies:      {}", stats.movie_count);
    println!("Characters:  {}", stats.character_count);
    println!("Scenes:      {}", stats.scene_count);
    if let Some((title, count)) = &stats.most_characters {
        println!("Most characters: {} ({})", title, count);
    }
    if let Some((title, count)) = &stats.most_scenes {
        println!("Most scenes:     {} ({})", title, count);
    }
}

pub fn diagram(ctx: &Context, id: i64) -> anyhow::Result<()> {
    if ctx.store.get_movie(id)?.is_none() {
        bail!("Movie {} not found", id);
    }
    let characters = ctx.store.get_characters(id)?;
    let relationships = ctx.store.get_relationships(id)?;
    println!(
        "{}",
        RelationshipGraph::build(&characters, &relationships).to_mermaid()
    );
    Ok(())
}

pub async fn analyze(ctx: &Context, pdf: &Path) -> anyhow::Result<()> {
    let client = ctx.completion_client()?;
    let filename = pdf
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| anyhow!("invalid filename: {}", pdf.display()))?;

    let movie_id = match ctx.ingester().process_single_file(pdf)? {
        IngestOutcome::Ingested(report) => report.movie_id,
        IngestOutcome::Unchanged => ctx
            .store
            .find_movie_by_filename(filename)?
            .map(|m| m.id)
            .ok_or_else(|| anyhow!("{} is not stored", filename))?,
    };

    let text = extract_text(pdf)?;
    let report = process_ai_analysis(&ctx.store, &client, movie_id, &text).await?;
    print_analysis(&report);
    if !report.is_complete() {
        bail!("analysis finished with {} failed stages", report.diagnostics.len());
    }
    Ok(())
}

fn print_analysis(report: &AnalysisReport) {
    println!("=== Analysis of movie {} ===", report.movie_id);
    if let Some(summary) = &report.summary {
        println!();
        println!("Summary:");
        println!("{}", summary);
    }
    if let Some(structured) = report.structured.as_ref().and_then(|s| s.as_value()) {
        println!();
        println!("Structured:");
        println!(
            "{}",
            serde_json::to_string_pretty(structured).unwrap_or_default()
        );
    }
    if let Some(analysis) = &report.character_analysis {
        println!();
        println!("Characters:");
        println!("{}", analysis);
    }
    if let Some(tree) = &report.character_tree {
        println!();
        println!("Character tree:");
        println!("{}", tree);
    }
    if let Some(sentiment) = report.sentiment.as_ref().and_then(|s| s.as_value()) {
        println!();
        println!("Sentiment:");
        println!(
            "{}",
            serde_json::to_string_pretty(sentiment).unwrap_or_default()
        );
    }

    println!();
    println!("Relationships saved:  {}", report.relationships_saved);
    println!("Plot elements saved:  {}", report.plot_elements_saved);
    if !report.diagnostics.is_empty() {
        println!();
        println!("Warnings:");
        for d in &report.diagnostics {
            println!("  - {}", d);
        }
    }
}

pub async fn ask(ctx: &Context, pdf: &Path) -> anyhow::Result<()> {
    let client = ctx.completion_client()?;
    let text = extract_text(pdf)?;
    let analyzer = ScriptAnalyzer::new(&client);

    let mut failed = 0;
    for (question, answer) in analyzer.ask_all(&text).await {
        println!("Q: {}", question);
        match answer {
            Ok(answer) => println!("A: {}", answer),
            Err(e) => {
                failed += 1;
                println!("A: (failed: {})", e);
            }
        }
        println!();
    }
    if failed > 0 {
        bail!("{} questions could not be answered", failed);
    }
    Ok(())
}

pub fn chunk(ctx: &Context, pdf: &Path, max_chunk_size: Option<usize>) -> anyhow::Result<()> {
    let text = extract_text(pdf)?;
    let max = max_chunk_size.unwrap_or(ctx.config.max_chunk_size);
    let chunks = chunk_text(&text, max);
    println!(
        "{}: {} chars, {} chunks",
        pdf.display(),
        text.chars().count(),
        chunks.len()
    );
    for (i, c) in chunks.iter().enumerate() {
        println!();
        println!("--- chunk {} ({} chars) ---", i + 1, c.chars().count());
        println!("{}", c);
    }
    Ok(())
}

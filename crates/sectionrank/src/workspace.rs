//! File-system and execution helpers shared by the subcommands.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use futures::future::join_all;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;

use sectionrank_core::config::AnalysisConfig;
use sectionrank_core::report::{
    analyze_collection, analyze_document, skip_reason, DocumentAnalysis, RunOutcome,
};
use sectionrank_core::text::EnglishAnalyzer;
use sectionrank_core::types::QueryContext;

use crate::prelude::*;

/// `strftime` pattern of report timestamps.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6f";

/// Current local time, ISO-8601 with microseconds.
pub fn timestamp() -> String {
    chrono::Local::now().format(TIMESTAMP_FORMAT).to_string()
}

pub fn load_config(global: &crate::Global) -> Result<AnalysisConfig> {
    match &global.config {
        Some(path) => {
            let config = AnalysisConfig::load(path)?;
            log::info!("loaded config from {}", path.display());
            Ok(config)
        }
        None => Ok(AnalysisConfig::default()),
    }
}

pub fn build_analyzer(config: &AnalysisConfig) -> Result<EnglishAnalyzer> {
    let analyzer = EnglishAnalyzer::new()?;
    match &config.extra_stopwords {
        Some(path) => Ok(analyzer.with_extra_stopwords(path)?),
        None => Ok(analyzer),
    }
}

/// Effective document-level parallelism.
pub fn jobs(global: &crate::Global) -> usize {
    global
        .jobs
        .unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1)
        })
        .max(1)
}

pub fn ensure_dir(dir: &Path) -> Result<()> {
    std::fs::create_dir_all(dir)
        .wrap_err_with(|| format!("Failed to create directory '{}'", dir.display()))
}

/// PDF files directly inside `dir` (extension matched case-insensitively),
/// sorted by path.
pub fn list_pdfs(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = std::fs::read_dir(dir)
        .wrap_err_with(|| format!("Failed to list directory '{}'", dir.display()))?;

    let mut pdfs = Vec::new();
    for entry in entries {
        let path = entry?.path();
        let is_pdf = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"));
        if is_pdf && path.is_file() {
            pdfs.push(path);
        }
    }
    pdfs.sort();
    Ok(pdfs)
}

/// Serialize `value` as JSON indented with four spaces.
pub fn to_json_pretty<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
    value.serialize(&mut serializer)?;
    Ok(buf)
}

pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let bytes = to_json_pretty(value)?;
    std::fs::write(path, bytes).wrap_err_with(|| format!("Failed to write '{}'", path.display()))
}

fn progress_bar(len: usize) -> ProgressBar {
    let bar = ProgressBar::new(len as u64);
    let template = "{spinner:.cyan} [{bar:30.cyan/blue}] {pos}/{len} {msg}";
    if let Ok(style) = ProgressStyle::with_template(template) {
        bar.set_style(style.progress_chars("=> "));
    }
    bar
}

/// Run `work` on every path on blocking workers, at most `jobs` at a time.
///
/// Results come back in the order of `paths`. A worker that panics is
/// replaced by `fallback` for its document; the other documents are kept.
pub async fn process_documents<T, F, G>(
    paths: &[PathBuf],
    jobs: usize,
    work: F,
    fallback: G,
) -> Result<Vec<T>>
where
    T: Send + 'static,
    F: Fn(&Path) -> T + Send + Sync + 'static,
    G: Fn(&Path) -> T,
{
    let jobs = jobs.max(1);
    let work = Arc::new(work);
    let bar = progress_bar(paths.len());
    let mut slots: Vec<Option<T>> = (0..paths.len()).map(|_| None).collect();

    for (chunk_index, chunk) in paths.chunks(jobs).enumerate() {
        let tasks = chunk.iter().cloned().map(|path| {
            let work = Arc::clone(&work);
            let bar = bar.clone();
            tokio::task::spawn_blocking(move || {
                bar.set_message(display_name(&path));
                let result = work(&path);
                bar.inc(1);
                result
            })
        });

        for (offset, joined) in join_all(tasks).await.into_iter().enumerate() {
            let index = chunk_index * jobs + offset;
            let result = match joined {
                Ok(result) => result,
                Err(err) => {
                    let path = &paths[index];
                    log::warn!("worker for {} failed: {}", path.display(), err);
                    bar.inc(1);
                    fallback(path)
                }
            };
            slots[index] = Some(result);
        }
    }

    bar.finish_and_clear();
    slots
        .into_iter()
        .map(|slot| slot.ok_or_else(|| eyre!("document result missing")))
        .collect()
}

pub fn display_name(path: &Path) -> String {
    sectionrank_core::report::document_name(path)
}

/// Outline, segment and rank `paths` for `query`.
///
/// Returns a skip before any document is read when the query is empty or
/// there are no documents.
pub async fn analyze_paths(
    paths: &[PathBuf],
    query: &QueryContext,
    config: &AnalysisConfig,
    analyzer: &EnglishAnalyzer,
    jobs: usize,
) -> Result<RunOutcome> {
    if let Some(reason) = skip_reason(paths.len(), query) {
        return Ok(RunOutcome::Skipped(reason));
    }

    let documents = process_documents(
        paths,
        jobs,
        |path| analyze_document(&pdf::LopdfStream, path),
        DocumentAnalysis::unreadable,
    )
    .await?;

    Ok(analyze_collection(
        documents,
        query,
        config,
        analyzer,
        timestamp(),
    ))
}

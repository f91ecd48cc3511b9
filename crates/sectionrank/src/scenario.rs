use std::path::{Path, PathBuf};

use colored::Colorize;
use sectionrank_core::types::QueryContext;

use crate::analyze::analyze_to_file;
use crate::prelude::{eprintln, println, *};
use crate::workspace::{display_name, ensure_dir, list_pdfs};

/// File name of every scenario's report.
pub const OUTPUT_FILE: &str = "challenge1b_output.json";

#[derive(Debug, clap::Args)]
pub struct Options {
    /// Directory with one sub-directory per scenario
    pub input_dir: PathBuf,

    /// Directory receiving `<scenario>/challenge1b_output.json`
    pub output_dir: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScenarioStatus {
    Completed(PathBuf),
    NoPdfs,
    NoQuery,
}

/// Sub-directories of `dir`, sorted.
pub fn list_scenarios(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut scenarios = Vec::new();
    for entry in std::fs::read_dir(dir)
        .wrap_err_with(|| format!("Failed to list directory '{}'", dir.display()))?
    {
        let path = entry?.path();
        if path.is_dir() {
            scenarios.push(path);
        }
    }
    scenarios.sort();
    Ok(scenarios)
}

/// Trimmed content of `<dir>/<name>`, or an empty string with a warning when
/// the file does not exist.
pub fn read_query_file(dir: &Path, name: &str) -> Result<String> {
    let path = dir.join(name);
    if !path.exists() {
        println!(
            "{} '{}' not found in {}. Using an empty value.",
            "Warning:".yellow().bold(),
            name,
            dir.display()
        );
        return Ok(String::new());
    }
    let content = std::fs::read_to_string(&path)
        .wrap_err_with(|| format!("Failed to read '{}'", path.display()))?;
    Ok(content.trim().to_string())
}

pub async fn run_scenario(
    scenario: &Path,
    output_dir: &Path,
    global: &crate::Global,
) -> Result<ScenarioStatus> {
    let name = display_name(scenario);

    let pdfs = list_pdfs(scenario)?;
    if pdfs.is_empty() {
        println!("No PDF files found in {}. Skipping.", scenario.display());
        return Ok(ScenarioStatus::NoPdfs);
    }

    let query = QueryContext::new(
        read_query_file(scenario, "persona.txt")?,
        read_query_file(scenario, "job.txt")?,
    );
    if query.is_empty() {
        println!("Skipping scenario {}: No persona or job defined.", name);
        return Ok(ScenarioStatus::NoQuery);
    }

    let target_dir = output_dir.join(&name);
    ensure_dir(&target_dir)?;
    let target = target_dir.join(OUTPUT_FILE);

    match analyze_to_file(&pdfs, &query, &target, global).await? {
        Some(report) => {
            log::info!(
                "scenario {}: {} section(s) ranked",
                name,
                report.extracted_sections.len()
            );
            Ok(ScenarioStatus::Completed(target))
        }
        None => Ok(ScenarioStatus::NoQuery),
    }
}

pub async fn run(options: Options, global: crate::Global) -> Result<()> {
    if !options.input_dir.is_dir() {
        return Err(Error::InputDirNotFound(options.input_dir).into());
    }
    ensure_dir(&options.output_dir)?;

    let scenarios = list_scenarios(&options.input_dir)?;
    if scenarios.is_empty() {
        println!(
            "No scenario subdirectories found in '{}'.",
            options.input_dir.display()
        );
        return Ok(());
    }

    for scenario in &scenarios {
        let name = display_name(scenario);
        println!("\n--- Running Scenario: {} ---", name.bold());

        match run_scenario(scenario, &options.output_dir, &global).await {
            Ok(ScenarioStatus::Completed(target)) => {
                println!(
                    "Scenario {} completed. Output saved to '{}'",
                    name,
                    target.display()
                );
            }
            Ok(_) => {}
            Err(err) => {
                eprintln!("{} scenario {}: {:#}", "Error running".red().bold(), name, err);
            }
        }
    }

    println!("\n--- All scenarios processed. ---");
    Ok(())
}

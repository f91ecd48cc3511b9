use std::path::{Path, PathBuf};

use colored::Colorize;
use prettytable::row;
use sectionrank_core::report::{PersonaReport, RunOutcome};
use sectionrank_core::types::QueryContext;

use crate::prelude::{eprintln, println, *};
use crate::workspace::{
    analyze_paths, build_analyzer, display_name, ensure_dir, jobs, load_config, write_json,
};

/// Rows shown in the ranked-section summary.
const SUMMARY_ROWS: usize = 10;

#[derive(Debug, clap::Args)]
pub struct Options {
    /// Comma-separated PDF paths
    pub pdfs: String,

    /// Who is reading, e.g. "PhD Researcher in Computational Biology"
    pub persona: String,

    /// What they need to get done
    pub job: String,

    /// Where to write the analysis JSON
    pub output: PathBuf,
}

/// Split a comma-separated path list, ignoring blank items.
pub fn parse_pdf_list(list: &str) -> Vec<PathBuf> {
    list.split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(PathBuf::from)
        .collect()
}

/// Every path must exist, and there must be at least one.
pub fn validate_pdfs(paths: &[PathBuf]) -> Result<()> {
    if paths.is_empty() {
        return Err(Error::NoPdfPaths.into());
    }
    if let Some(missing) = paths.iter().find(|p| !p.exists()) {
        return Err(Error::PdfNotFound(missing.clone()).into());
    }
    Ok(())
}

pub fn print_summary(report: &PersonaReport) {
    let mut table = new_table();
    table.add_row(row![
        "#".bold().cyan(),
        "Score".bold().cyan(),
        "Document".bold().cyan(),
        "Page".bold().cyan(),
        "Section".bold().cyan()
    ]);

    for (i, section) in report
        .extracted_sections
        .iter()
        .take(SUMMARY_ROWS)
        .enumerate()
    {
        table.add_row(row![
            (i + 1).to_string().bright_yellow(),
            format!("{:.4}", section.importance_rank),
            section.document.bright_white(),
            section.page_number,
            section.section_title
        ]);
    }

    table.printstd();

    let hidden = report.extracted_sections.len().saturating_sub(SUMMARY_ROWS);
    if hidden > 0 {
        println!("{}", format!("... and {} more section(s)", hidden).bright_black());
    }
    println!(
        "{} refined segment(s) from the top sections",
        report.sub_section_analysis.len()
    );
}

/// Analyze `paths` and write the report to `output`.
///
/// `None` when the run was skipped and nothing was written.
pub async fn analyze_to_file(
    paths: &[PathBuf],
    query: &QueryContext,
    output: &Path,
    global: &crate::Global,
) -> Result<Option<PersonaReport>> {
    let config = load_config(global)?;
    let analyzer = build_analyzer(&config)?;

    match analyze_paths(paths, query, &config, &analyzer, jobs(global)).await? {
        RunOutcome::Completed(report) => {
            if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
                ensure_dir(parent)?;
            }
            write_json(output, &report)?;
            Ok(Some(report))
        }
        RunOutcome::Skipped(reason) => {
            eprintln!("{} {}", "Skipping analysis:".yellow().bold(), reason);
            Ok(None)
        }
    }
}

pub async fn run(options: Options, global: crate::Global) -> Result<()> {
    let paths = parse_pdf_list(&options.pdfs);
    validate_pdfs(&paths)?;

    let names: Vec<String> = paths.iter().map(|p| display_name(p)).collect();
    println!("Starting analysis for scenario:");
    println!("  PDFs: {:?}", names);
    println!("  Persona: '{}'", options.persona);
    println!("  Job: '{}'", options.job);

    let query = QueryContext::new(options.persona, options.job);
    if let Some(report) = analyze_to_file(&paths, &query, &options.output, &global).await? {
        if global.verbose || !report.extracted_sections.is_empty() {
            print_summary(&report);
        }
        println!(
            "Analysis complete. Output saved to '{}'",
            options.output.display()
        );
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_pdf_list_skips_blanks() {
        assert_eq!(
            parse_pdf_list(" a.pdf, ,b/c.pdf,,"),
            vec![PathBuf::from("a.pdf"), PathBuf::from("b/c.pdf")]
        );
        assert!(parse_pdf_list(" , ").is_empty());
    }

    #[test]
    fn test_validate_pdfs() {
        assert!(validate_pdfs(&[]).is_err());

        let dir = tempfile::tempdir().unwrap();
        let present = dir.path().join("a.pdf");
        std::fs::write(&present, b"").unwrap();
        assert!(validate_pdfs(std::slice::from_ref(&present)).is_ok());

        let missing = dir.path().join("missing.pdf");
        let err = validate_pdfs(&[present, missing]).unwrap_err();
        assert!(err.to_string().contains("missing.pdf"));
    }

    #[tokio::test]
    async fn test_writes_report_and_creates_parent() {
        let dir = tempfile::tempdir().unwrap();
        let pdf = dir.path().join("broken.pdf");
        std::fs::write(&pdf, b"not a pdf").unwrap();
        let output = dir.path().join("results").join("out.json");

        let global = crate::Global {
            config: None,
            jobs: Some(1),
            verbose: false,
        };
        let query = QueryContext::new("Chef", "Plan a menu");
        let report = analyze_to_file(&[pdf], &query, &output, &global)
            .await
            .unwrap()
            .unwrap();
        assert!(report.extracted_sections.is_empty());

        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&output).unwrap()).unwrap();
        assert_eq!(json["metadata"]["input_documents"][0], "broken.pdf");
        assert_eq!(json["metadata"]["job_to_be_done"], "Plan a menu");
        assert_eq!(json["extracted_sections"], serde_json::json!([]));
        assert_eq!(json["sub_section_analysis"], serde_json::json!([]));
    }

    #[tokio::test]
    async fn test_skipped_run_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("out.json");
        let global = crate::Global {
            config: None,
            jobs: None,
            verbose: false,
        };
        let outcome = analyze_to_file(
            &[dir.path().join("a.pdf")],
            &QueryContext::new(" ", ""),
            &output,
            &global,
        )
        .await
        .unwrap();
        assert!(outcome.is_none());
        assert!(!output.exists());
    }
}

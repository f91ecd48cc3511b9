use std::path::{Path, PathBuf};

use colored::Colorize;
use sectionrank_core::outline::extract_outline;
use sectionrank_core::types::Outline;

use crate::prelude::{println, *};
use crate::workspace::{display_name, ensure_dir, jobs, list_pdfs, process_documents, write_json};

#[derive(Debug, clap::Args)]
pub struct Options {
    /// Directory holding the PDF files
    pub input_dir: PathBuf,

    /// Directory receiving one `<name>.json` per PDF
    pub output_dir: PathBuf,
}

/// `<output_dir>/<file stem>.json`
pub fn output_path(output_dir: &Path, pdf: &Path) -> Result<PathBuf> {
    let stem = pdf
        .file_stem()
        .ok_or_eyre(format!("Invalid PDF path '{}'", pdf.display()))?;
    let mut name = stem.to_os_string();
    name.push(".json");
    Ok(output_dir.join(name))
}

pub async fn run(options: Options, global: crate::Global) -> Result<()> {
    if !options.input_dir.is_dir() {
        return Err(Error::InputDirNotFound(options.input_dir).into());
    }
    ensure_dir(&options.output_dir)?;

    let pdfs = list_pdfs(&options.input_dir)?;
    if pdfs.is_empty() {
        println!(
            "No PDF files found in '{}' directory.",
            options.input_dir.display()
        );
        return Ok(());
    }

    if global.verbose {
        println!("Processing {} PDF file(s) with {} job(s)", pdfs.len(), jobs(&global));
    }

    let outlines = process_documents(
        &pdfs,
        jobs(&global),
        |path| extract_outline(&pdf::LopdfStream, path).0,
        |_| Outline::error(),
    )
    .await?;

    for (pdf, outline) in pdfs.iter().zip(&outlines) {
        let target = output_path(&options.output_dir, pdf)?;
        write_json(&target, outline)?;

        if outline.is_error() {
            println!(
                "{} '{}' could not be read; wrote placeholder outline",
                "Warning:".yellow().bold(),
                display_name(pdf)
            );
        }
        println!(
            "Outline for '{}' saved to '{}'",
            display_name(pdf),
            target.display()
        );
    }

    Ok(())
}

use std::path::PathBuf;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Input directory '{}' not found", .0.display())]
    InputDirNotFound(PathBuf),

    #[error("No PDF file paths provided")]
    NoPdfPaths,

    #[error("PDF file not found at '{}'", .0.display())]
    PdfNotFound(PathBuf),
}

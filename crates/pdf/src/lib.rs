//! PDF character stream backed by `lopdf`.
//!
//! [`LopdfStream`] is the concrete [`CharacterStream`] used by the command
//! line: it loads a file, walks every page's content stream and returns
//! glyph lines ready for heading classification.

use std::path::Path;

use thiserror::Error;

use sectionrank_core::stream::{CharacterStream, PageText, StreamError};

use parser::backend::{LopdfBackend, PdfBackend};

pub mod cleanup;
pub mod parser;

#[derive(Debug, Error)]
pub enum PdfError {
    #[error("PDF parsing error: {0}")]
    Parse(String),
    #[error("Document is encrypted")]
    Encrypted,
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Decode every page of an in-memory PDF.
pub fn read_document(bytes: &[u8]) -> Result<Vec<PageText>, PdfError> {
    let backend = LopdfBackend::load_bytes(bytes)?;
    log::debug!("loaded PDF with {} page(s)", backend.page_count());
    read_backend(&backend)
}

/// Decode every page reachable through `backend`.
pub fn read_backend(backend: &dyn PdfBackend) -> Result<Vec<PageText>, PdfError> {
    parser::layout::read_pages(backend)
}

/// Reads PDF files from disk.
#[derive(Debug, Clone, Copy, Default)]
pub struct LopdfStream;

impl LopdfStream {
    pub fn load(&self, path: &Path) -> Result<Vec<PageText>, PdfError> {
        let bytes = std::fs::read(path)?;
        read_document(&bytes)
    }
}

impl CharacterStream for LopdfStream {
    fn read_pages(&self, path: &Path) -> Result<Vec<PageText>, StreamError> {
        self.load(path)
            .map_err(|e| StreamError::new(path.display().to_string(), e.to_string()))
    }
}

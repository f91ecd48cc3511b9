//! Positioned glyphs and visual lines, plus the [`CharacterStream`] seam.
//!
//! Everything downstream of PDF decoding works on these records. The concrete
//! decoder lives in the `pdf` crate; tests feed hand-built pages instead.

use std::path::Path;

use thiserror::Error;

/// The document could not be turned into a character stream.
#[derive(Debug, Error)]
#[error("cannot read '{path}': {reason}")]
pub struct StreamError {
    pub path: String,
    pub reason: String,
}

impl StreamError {
    pub fn new(path: impl Into<String>, reason: impl Into<String>) -> Self {
        StreamError {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

/// A single rendered character.
#[derive(Debug, Clone, PartialEq)]
pub struct Glyph {
    pub text: char,
    pub size: f32,
    pub font_name: String,
    pub x: f32,
    pub y: f32,
    /// Inserted by layout analysis at a word gap rather than decoded from
    /// the document.
    pub synthetic: bool,
}

impl Glyph {
    pub fn new(text: char, size: f32, font_name: impl Into<String>) -> Self {
        Glyph {
            text,
            size,
            font_name: font_name.into(),
            x: 0.0,
            y: 0.0,
            synthetic: false,
        }
    }

    pub fn synthetic(mut self) -> Self {
        self.synthetic = true;
        self
    }

    pub fn at(mut self, x: f32, y: f32) -> Self {
        self.x = x;
        self.y = y;
        self
    }
}

/// One visual line of glyphs in reading order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TextLine {
    pub glyphs: Vec<Glyph>,
}

impl TextLine {
    pub fn new(glyphs: Vec<Glyph>) -> Self {
        TextLine { glyphs }
    }

    /// Build a line where every character shares one font and size.
    pub fn uniform(text: &str, size: f32, font_name: &str) -> Self {
        TextLine {
            glyphs: text
                .chars()
                .enumerate()
                .map(|(i, c)| Glyph::new(c, size, font_name).at(i as f32 * size * 0.5, 0.0))
                .collect(),
        }
    }

    /// Concatenated glyph text with runs of whitespace collapsed to one space.
    pub fn text(&self) -> String {
        let raw: String = self.glyphs.iter().map(|g| g.text).collect();
        collapse_whitespace(&raw)
    }

    /// The first glyph that is not whitespace.
    pub fn lead_glyph(&self) -> Option<&Glyph> {
        self.glyphs.iter().find(|g| !g.text.is_whitespace())
    }

    /// Size of the leading non-blank glyph, rounded to two decimals.
    pub fn primary_font_size(&self) -> Option<f32> {
        self.lead_glyph().map(|g| round2(g.size))
    }

    pub fn is_bold(&self) -> bool {
        self.lead_glyph().is_some_and(|g| is_bold_font(&g.font_name))
    }
}

/// All lines of one page, top to bottom.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageText {
    /// 1-based page number.
    pub number: usize,
    pub lines: Vec<TextLine>,
}

impl PageText {
    pub fn new(number: usize, lines: Vec<TextLine>) -> Self {
        PageText { number, lines }
    }

    pub fn glyphs(&self) -> impl Iterator<Item = &Glyph> {
        self.lines.iter().flat_map(|l| l.glyphs.iter())
    }

    /// Glyphs decoded from the document, without layout-inserted spaces.
    pub fn source_glyphs(&self) -> impl Iterator<Item = &Glyph> {
        self.glyphs().filter(|g| !g.synthetic)
    }
}

/// Source of per-page glyphs and pre-grouped lines for a document.
pub trait CharacterStream {
    /// Decode every page of the document at `path`.
    ///
    /// Malformed documents must surface as [`StreamError`], never a panic.
    fn read_pages(&self, path: &Path) -> Result<Vec<PageText>, StreamError>;
}

pub fn is_bold_font(font_name: &str) -> bool {
    let lower = font_name.to_lowercase();
    lower.contains("bold") || lower.contains("black") || lower.contains("heavy")
}

pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

pub(crate) fn round2(value: f32) -> f32 {
    (value * 100.0).round() / 100.0
}

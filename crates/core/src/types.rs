use std::fmt;

use serde::{Deserialize, Serialize};

pub const UNTITLED_DOCUMENT: &str = "Untitled Document";
pub const EMPTY_DOCUMENT: &str = "Empty Document";
pub const ERROR_DOCUMENT: &str = "Error Processing Document";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum HeadingLevel {
    H1,
    H2,
    H3,
    H4,
}

impl HeadingLevel {
    pub fn as_u8(&self) -> u8 {
        match self {
            HeadingLevel::H1 => 1,
            HeadingLevel::H2 => 2,
            HeadingLevel::H3 => 3,
            HeadingLevel::H4 => 4,
        }
    }
}

impl fmt::Display for HeadingLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "H{}", self.as_u8())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeadingEntry {
    pub level: HeadingLevel,
    pub text: String,
    pub page: usize,
}

impl HeadingEntry {
    pub fn new(level: HeadingLevel, text: impl Into<String>, page: usize) -> Self {
        HeadingEntry {
            level,
            text: text.into(),
            page,
        }
    }
}

/// Per-document outline, serialized as `{"title", "outline"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Outline {
    pub title: String,
    #[serde(rename = "outline")]
    pub entries: Vec<HeadingEntry>,
}

impl Outline {
    /// Sentinel for a document whose character stream failed.
    pub fn error() -> Self {
        Outline {
            title: ERROR_DOCUMENT.to_string(),
            entries: Vec::new(),
        }
    }

    /// Sentinel for a readable document without pages.
    pub fn empty_document() -> Self {
        Outline {
            title: EMPTY_DOCUMENT.to_string(),
            entries: Vec::new(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.title == ERROR_DOCUMENT && self.entries.is_empty()
    }
}

/// A text span anchored on one outline entry.
#[derive(Debug, Clone, PartialEq)]
pub struct Section {
    pub document: String,
    pub page: usize,
    pub title: String,
    pub text: String,
    pub score: f64,
}

impl Section {
    pub fn new(
        document: impl Into<String>,
        page: usize,
        title: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        Section {
            document: document.into(),
            page,
            title: title.into(),
            text: text.into(),
            score: 0.0,
        }
    }
}

/// The persona/job query embedded alongside the sections.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryContext {
    pub persona: String,
    pub job: String,
}

impl QueryContext {
    pub fn new(persona: impl Into<String>, job: impl Into<String>) -> Self {
        QueryContext {
            persona: persona.into(),
            job: job.into(),
        }
    }

    /// `true` when neither persona nor job carries any text.
    pub fn is_empty(&self) -> bool {
        self.persona.trim().is_empty() && self.job.trim().is_empty()
    }

    pub fn combined_text(&self) -> String {
        format!("Persona: {}. Job: {}.", self.persona, self.job)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefinedSegment {
    pub document: String,
    pub page_number: usize,
    pub refined_text: String,
}

//! Heading classification for single text lines.
//!
//! Classification is two ordered rule tables. [`REJECT_RULES`] filter out
//! lines that look like prose, leaders, running headers or footers; the
//! first rule that fires wins. Survivors are leveled by [`LEVEL_RULES`]:
//! numbering patterns first, then bold lines against the size cutoffs.
//! Both tables are plain data so each rule can be tested and reordered on
//! its own.

use std::sync::OnceLock;

use regex::Regex;

use crate::fonts::FontThresholds;
use crate::stream::{PageText, TextLine};
use crate::types::{HeadingLevel, UNTITLED_DOCUMENT};

/// Lines with more words than this are prose.
const MAX_HEADING_WORDS: usize = 15;

/// Bold lines qualify for a level at this fraction of its cutoff.
const SIZE_TOLERANCE: f32 = 0.9;

/// A title line's lead glyph must be this close to the H1 cutoff.
const TITLE_SIZE_DELTA: f32 = 0.1;

/// The inputs every rule sees.
#[derive(Debug, Clone, PartialEq)]
pub struct LineFeatures {
    /// Whitespace-normalized line text.
    pub text: String,
    /// Lead glyph size, rounded to two decimals.
    pub size: f32,
    pub bold: bool,
}

impl LineFeatures {
    pub fn new(text: impl Into<String>, size: f32, bold: bool) -> Self {
        LineFeatures {
            text: text.into(),
            size,
            bold,
        }
    }

    /// `None` for lines without a visible glyph.
    pub fn from_line(line: &TextLine) -> Option<Self> {
        let size = line.primary_font_size()?;
        Some(LineFeatures {
            text: line.text(),
            size,
            bold: line.is_bold(),
        })
    }

    pub fn word_count(&self) -> usize {
        self.text.split_whitespace().count()
    }
}

pub type RulePredicate = fn(&LineFeatures, &FontThresholds) -> bool;

/// A filter that discards a line when its predicate holds.
pub struct RejectRule {
    pub name: &'static str,
    pub rejects: RulePredicate,
}

/// Assigns `level` when its predicate holds.
pub struct LevelRule {
    pub name: &'static str,
    pub level: HeadingLevel,
    pub matches: RulePredicate,
}

pub const REJECT_RULES: &[RejectRule] = &[
    RejectRule {
        name: "too-short",
        rejects: too_short,
    },
    RejectRule {
        name: "toc-leader",
        rejects: toc_leader,
    },
    RejectRule {
        name: "prose",
        rejects: prose,
    },
    RejectRule {
        name: "numbered-prose",
        rejects: numbered_prose,
    },
    RejectRule {
        name: "running-header",
        rejects: running_header,
    },
    RejectRule {
        name: "page-footer",
        rejects: page_footer,
    },
];

pub const LEVEL_RULES: &[LevelRule] = &[
    LevelRule {
        name: "numbered-h4",
        level: HeadingLevel::H4,
        matches: numbered_h4,
    },
    LevelRule {
        name: "numbered-h3",
        level: HeadingLevel::H3,
        matches: numbered_h3,
    },
    LevelRule {
        name: "numbered-h2",
        level: HeadingLevel::H2,
        matches: numbered_h2,
    },
    LevelRule {
        name: "numbered-h1",
        level: HeadingLevel::H1,
        matches: numbered_h1,
    },
    LevelRule {
        name: "bold-h1",
        level: HeadingLevel::H1,
        matches: bold_h1,
    },
    LevelRule {
        name: "bold-h2",
        level: HeadingLevel::H2,
        matches: bold_h2,
    },
    LevelRule {
        name: "bold-h3",
        level: HeadingLevel::H3,
        matches: bold_h3,
    },
];

/// Name of the first reject rule that fires, if any.
pub fn rejected_by(features: &LineFeatures, thresholds: &FontThresholds) -> Option<&'static str> {
    REJECT_RULES
        .iter()
        .find(|rule| (rule.rejects)(features, thresholds))
        .map(|rule| rule.name)
}

pub fn classify_features(
    features: &LineFeatures,
    thresholds: &FontThresholds,
) -> Option<HeadingLevel> {
    if let Some(rule) = rejected_by(features, thresholds) {
        log::trace!("rejected {:?} ({})", features.text, rule);
        return None;
    }

    LEVEL_RULES
        .iter()
        .find(|rule| (rule.matches)(features, thresholds))
        .map(|rule| {
            log::trace!("{} {:?} ({})", rule.level, features.text, rule.name);
            rule.level
        })
}

/// Decide whether `line` is a heading and at which level.
pub fn classify_line(line: &TextLine, thresholds: &FontThresholds) -> Option<HeadingLevel> {
    LineFeatures::from_line(line).and_then(|f| classify_features(&f, thresholds))
}

/// The first line of page one set at (about) the H1 cutoff and shorter
/// than fifteen words.
pub fn detect_title(first_page: Option<&PageText>, thresholds: &FontThresholds) -> String {
    if thresholds.h1 <= 0.0 {
        return UNTITLED_DOCUMENT.to_string();
    }

    first_page
        .into_iter()
        .flat_map(|page| page.lines.iter())
        .find_map(|line| {
            let lead = line.lead_glyph()?;
            if (lead.size - thresholds.h1).abs() >= TITLE_SIZE_DELTA {
                return None;
            }
            let text = line.text();
            (text.split_whitespace().count() < MAX_HEADING_WORDS).then_some(text)
        })
        .unwrap_or_else(|| UNTITLED_DOCUMENT.to_string())
}

// ---------------------------------------------------------------------------
// Reject predicates
// ---------------------------------------------------------------------------

fn too_short(f: &LineFeatures, _t: &FontThresholds) -> bool {
    f.text.trim().chars().count() < 3
}

fn toc_leader(f: &LineFeatures, _t: &FontThresholds) -> bool {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\.{3,}\s*\d+$").unwrap())
        .is_match(&f.text)
}

fn prose(f: &LineFeatures, _t: &FontThresholds) -> bool {
    f.word_count() > MAX_HEADING_WORDS || f.text.ends_with(['.', ',', ';'])
}

fn numbered_prose(f: &LineFeatures, t: &FontThresholds) -> bool {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| Regex::new(r"^\d+\.\s+[a-zA-Z]").unwrap());
    re.is_match(&f.text) && f.word_count() > 5 && !f.bold && f.size < t.h2 * SIZE_TOLERANCE
}

fn running_header(f: &LineFeatures, t: &FontThresholds) -> bool {
    is_all_uppercase(&f.text) && f.word_count() > 2 && f.size < t.h2
}

fn page_footer(f: &LineFeatures, _t: &FontThresholds) -> bool {
    static RE_PAGE: OnceLock<Regex> = OnceLock::new();
    static RE_NUMBER: OnceLock<Regex> = OnceLock::new();
    let re_page = RE_PAGE.get_or_init(|| Regex::new(r"(?i)^Page\s*\d+\s*of\s*\d+$").unwrap());
    let re_number = RE_NUMBER.get_or_init(|| Regex::new(r"^\d+$").unwrap());
    re_page.is_match(&f.text) || re_number.is_match(&f.text)
}

/// At least one cased character and no lowercase ones.
fn is_all_uppercase(text: &str) -> bool {
    text.chars().any(char::is_uppercase) && !text.chars().any(char::is_lowercase)
}

// ---------------------------------------------------------------------------
// Level predicates
// ---------------------------------------------------------------------------

fn numbered_h4(f: &LineFeatures, _t: &FontThresholds) -> bool {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\d+\.\d+\.\d+\.\d+\s+").unwrap())
        .is_match(&f.text)
}

fn numbered_h3(f: &LineFeatures, _t: &FontThresholds) -> bool {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\d+\.\d+\.\d+\s+").unwrap())
        .is_match(&f.text)
}

fn numbered_h2(f: &LineFeatures, _t: &FontThresholds) -> bool {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\d+\.\d+\s+").unwrap())
        .is_match(&f.text)
}

fn numbered_h1(f: &LineFeatures, _t: &FontThresholds) -> bool {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(?:Appendix\s+[A-Z]\b|\d+\.\s+)").unwrap())
        .is_match(&f.text)
}

fn bold_h1(f: &LineFeatures, t: &FontThresholds) -> bool {
    f.bold && f.size >= t.h1 * SIZE_TOLERANCE
}

fn bold_h2(f: &LineFeatures, t: &FontThresholds) -> bool {
    f.bold && f.size >= t.h2 * SIZE_TOLERANCE
}

fn bold_h3(f: &LineFeatures, t: &FontThresholds) -> bool {
    f.bold && f.size >= t.h3 * SIZE_TOLERANCE
}

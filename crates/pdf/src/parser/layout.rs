//! Text extraction and line assembly.
//!
//! Walks each page's content stream with a simplified text-state machine and
//! turns what it shows into positioned glyphs grouped by baseline.
//!
//! ```text
//! content ops  ->  TextRun[]  ->  runs per baseline  ->  TextLine (glyphs)
//!   (per page)     extract        group_runs_into_lines   line_glyphs
//! ```
//!
//! Glyph metrics are not read from the font programs; every character is
//! assumed to be half an em wide. Positions are therefore approximate, which
//! is enough to order runs and to find word gaps.

use std::cmp::Ordering;

use sectionrank_core::stream::{Glyph, PageText, TextLine};

use super::backend::{ContentOp, FontResource, PageId, PdfBackend, PdfValue};
use crate::cleanup::clean_run;
use crate::PdfError;

/// A string shown by one text operator, already cleaned.
#[derive(Debug, Clone, PartialEq)]
pub struct TextRun {
    pub text: String,
    pub x: f32,
    pub y: f32,
    /// Horizontal extent in user space.
    pub width: f32,
    pub font_size: f32,
    pub font_name: String,
}

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Runs whose baselines differ by at most this many points share a line.
const Y_TOLERANCE: f32 = 1.0;

/// Assumed glyph advance as a fraction of the font size.
const APPROX_CHAR_WIDTH_RATIO: f32 = 0.5;

/// A gap wider than this (points) between two runs becomes a space.
const MIN_WORD_GAP: f32 = 1.5;

/// A `TJ` displacement above this fraction of a glyph advance is a word break.
const TJ_SPACE_FACTOR: f32 = 0.3;

const IDENTITY_MATRIX: [f32; 6] = [1.0, 0.0, 0.0, 1.0, 0.0, 0.0];

// ---------------------------------------------------------------------------
// Text-state machine
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
struct TextState {
    font: Option<FontResource>,
    font_name: String,
    font_size: f32,
    /// `[a, b, c, d, tx, ty]`
    text_matrix: [f32; 6],
    line_matrix: [f32; 6],
    /// `Tz / 100`
    horiz_scale: f32,
    char_spacing: f32,
    word_spacing: f32,
    text_rise: f32,
    leading: f32,
}

impl Default for TextState {
    fn default() -> Self {
        Self {
            font: None,
            font_name: String::new(),
            font_size: 0.0,
            text_matrix: IDENTITY_MATRIX,
            line_matrix: IDENTITY_MATRIX,
            horiz_scale: 1.0,
            char_spacing: 0.0,
            word_spacing: 0.0,
            text_rise: 0.0,
            leading: 0.0,
        }
    }
}

impl TextState {
    fn x(&self) -> f32 {
        self.text_matrix[4]
    }

    fn y(&self) -> f32 {
        self.text_matrix[5] + self.text_rise
    }

    /// Rendered size: `font_size * sqrt(b^2 + d^2)`.
    fn effective_font_size(&self) -> f32 {
        let scale = (self.text_matrix[1].powi(2) + self.text_matrix[3].powi(2)).sqrt();
        (self.font_size * scale).abs()
    }

    /// Move along the baseline by `dx` text-space units.
    fn advance_x(&mut self, dx: f32) {
        self.text_matrix[4] += dx * self.text_matrix[0];
        self.text_matrix[5] += dx * self.text_matrix[1];
    }

    /// `Td`: translate the line matrix and restart the text matrix from it.
    fn translate_line(&mut self, tx: f32, ty: f32) {
        let m = self.line_matrix;
        self.line_matrix[4] = m[0] * tx + m[2] * ty + m[4];
        self.line_matrix[5] = m[1] * tx + m[3] * ty + m[5];
        self.text_matrix = self.line_matrix;
    }

    /// `T*`
    fn next_line(&mut self) {
        self.translate_line(0.0, -self.leading);
    }

    fn glyph_advance(&self) -> f32 {
        self.font_size * APPROX_CHAR_WIDTH_RATIO * self.horiz_scale
    }

    /// Advance past `text` as if it had been painted.
    fn advance_after_show(&mut self, text: &str) {
        let dx: f32 = text
            .chars()
            .map(|c| {
                let word = if c == ' ' { self.word_spacing } else { 0.0 };
                self.glyph_advance() + self.char_spacing + word
            })
            .sum();
        self.advance_x(dx);
    }

    fn set_font(&mut self, key: &[u8], fonts: &[FontResource], size: f32) {
        self.font_size = size;
        self.font = fonts.iter().find(|f| f.key == key).cloned();
        self.font_name = match &self.font {
            Some(font) => font.display_name(),
            None => String::from_utf8_lossy(key).into_owned(),
        };
    }
}

// ---------------------------------------------------------------------------
// Run extraction
// ---------------------------------------------------------------------------

/// Every text run shown on one page, in content-stream order.
///
/// Handles `BT`, `ET`, `Tf`, `Tm`, `Td`, `TD`, `T*`, `TL`, `Tc`, `Tw`, `Tz`,
/// `Ts`, `Tj`, `TJ`, `'` and `"`. Every other operator is ignored.
pub fn extract_page_runs(
    backend: &dyn PdfBackend,
    page_id: PageId,
) -> Result<Vec<TextRun>, PdfError> {
    let raw = backend.page_content(page_id)?;
    let ops = backend.decode_content(&raw)?;
    let fonts = backend.page_fonts(page_id).unwrap_or_else(|err| {
        log::debug!("page {:?}: no font resources ({})", page_id, err);
        Vec::new()
    });

    let mut state = TextState::default();
    let mut runs: Vec<TextRun> = Vec::new();

    for op in &ops {
        apply_op(op, backend, &fonts, &mut state, &mut runs);
    }

    Ok(runs)
}

fn apply_op(
    op: &ContentOp,
    backend: &dyn PdfBackend,
    fonts: &[FontResource],
    state: &mut TextState,
    runs: &mut Vec<TextRun>,
) {
    match op.operator.as_str() {
        "BT" => {
            state.text_matrix = IDENTITY_MATRIX;
            state.line_matrix = IDENTITY_MATRIX;
        }
        // Font state survives text objects.
        "ET" => {}
        "Tf" => {
            let key = match op.operands.first() {
                Some(PdfValue::Name(n)) | Some(PdfValue::Str(n)) => n.as_slice(),
                _ => return,
            };
            state.set_font(key, fonts, op.number(1).unwrap_or(0.0));
        }
        "Tm" => {
            let m: Vec<f32> = (0..6).filter_map(|i| op.number(i)).collect();
            if let [a, b, c, d, e, f] = m[..] {
                state.text_matrix = [a, b, c, d, e, f];
                state.line_matrix = state.text_matrix;
            }
        }
        "Td" => {
            if let (Some(tx), Some(ty)) = (op.number(0), op.number(1)) {
                state.translate_line(tx, ty);
            }
        }
        "TD" => {
            if let (Some(tx), Some(ty)) = (op.number(0), op.number(1)) {
                state.leading = -ty;
                state.translate_line(tx, ty);
            }
        }
        "T*" => state.next_line(),
        "TL" => {
            if let Some(v) = op.number(0) {
                state.leading = v;
            }
        }
        "Tc" => {
            if let Some(v) = op.number(0) {
                state.char_spacing = v;
            }
        }
        "Tw" => {
            if let Some(v) = op.number(0) {
                state.word_spacing = v;
            }
        }
        "Tz" => {
            if let Some(v) = op.number(0) {
                state.horiz_scale = v / 100.0;
            }
        }
        "Ts" => {
            if let Some(v) = op.number(0) {
                state.text_rise = v;
            }
        }
        "Tj" => {
            if let Some(operand) = op.operands.first() {
                show_string(operand, backend, state, runs);
            }
        }
        "TJ" => {
            if let Some(PdfValue::Array(items)) = op.operands.first() {
                show_array(items, backend, state, runs);
            }
        }
        "'" => {
            state.next_line();
            if let Some(operand) = op.operands.first() {
                show_string(operand, backend, state, runs);
            }
        }
        "\"" => {
            if let (Some(aw), Some(ac), Some(operand)) =
                (op.number(0), op.number(1), op.operands.get(2))
            {
                state.word_spacing = aw;
                state.char_spacing = ac;
                state.next_line();
                show_string(operand, backend, state, runs);
            }
        }
        _ => {}
    }
}

fn decode(operand: &PdfValue, backend: &dyn PdfBackend, state: &TextState) -> String {
    match operand {
        PdfValue::Str(bytes) => backend.decode_text(state.font.as_ref(), bytes),
        _ => String::new(),
    }
}

/// Record `raw` as a run starting at `(x, y)` and ending at the current position.
fn push_run(raw: &str, x: f32, y: f32, state: &TextState, runs: &mut Vec<TextRun>) {
    let text = clean_run(raw.trim_end());
    if text.trim().is_empty() {
        return;
    }
    runs.push(TextRun {
        text,
        x,
        y,
        width: (state.x() - x).max(0.0),
        font_size: state.effective_font_size(),
        font_name: state.font_name.clone(),
    });
}

fn show_string(
    operand: &PdfValue,
    backend: &dyn PdfBackend,
    state: &mut TextState,
    runs: &mut Vec<TextRun>,
) {
    let text = decode(operand, backend, state);
    if text.is_empty() {
        return;
    }
    let (x, y) = (state.x(), state.y());
    state.advance_after_show(&text);
    push_run(&text, x, y, state, runs);
}

/// `TJ`: strings interleaved with displacements in thousandths of an em.
///
/// One run per operator; a large enough negative displacement is a space.
fn show_array(
    items: &[PdfValue],
    backend: &dyn PdfBackend,
    state: &mut TextState,
    runs: &mut Vec<TextRun>,
) {
    let mut buf = String::new();
    let (mut x, y) = (state.x(), state.y());

    for item in items {
        if let PdfValue::Str(_) = item {
            let fragment = decode(item, backend, state);
            if buf.is_empty() {
                x = state.x();
            }
            buf.push_str(&fragment);
            state.advance_after_show(&fragment);
        } else if let Some(adjust) = item.as_number() {
            let dx = -adjust / 1000.0 * state.font_size * state.horiz_scale;
            if dx > state.glyph_advance() * TJ_SPACE_FACTOR && !buf.is_empty() {
                buf.push(' ');
            }
            state.advance_x(dx);
        }
    }

    push_run(&buf, x, y, state, runs);
}

// ---------------------------------------------------------------------------
// Line assembly
// ---------------------------------------------------------------------------

fn cmp_f32(a: f32, b: f32) -> Ordering {
    a.partial_cmp(&b).unwrap_or(Ordering::Equal)
}

/// Group runs into lines, top of the page first, each line left to right.
pub fn group_runs_into_lines(mut runs: Vec<TextRun>) -> Vec<Vec<TextRun>> {
    runs.sort_by(|a, b| cmp_f32(b.y, a.y).then(cmp_f32(a.x, b.x)));

    let mut lines: Vec<Vec<TextRun>> = Vec::new();
    let mut baseline = f32::NAN;

    for run in runs {
        match lines.last_mut() {
            Some(line) if (run.y - baseline).abs() <= Y_TOLERANCE => line.push(run),
            _ => {
                baseline = run.y;
                lines.push(vec![run]);
            }
        }
    }

    for line in &mut lines {
        line.sort_by(|a, b| cmp_f32(a.x, b.x));
    }
    lines
}

/// Explode the runs of one line into glyphs.
///
/// Characters are spread evenly over their run's width. A space glyph is
/// inserted where two runs are separated by a visible gap.
pub fn line_glyphs(runs: &[TextRun]) -> TextLine {
    let mut glyphs: Vec<Glyph> = Vec::new();
    let mut prev_end: Option<f32> = None;

    for run in runs {
        if let (Some(end), Some(last)) = (prev_end, glyphs.last()) {
            let starts_blank = run.text.starts_with(char::is_whitespace);
            if run.x - end > MIN_WORD_GAP && !last.text.is_whitespace() && !starts_blank {
                let space = Glyph::new(' ', last.size, last.font_name.clone())
                    .at(end, run.y)
                    .synthetic();
                glyphs.push(space);
            }
        }

        let count = run.text.chars().count().max(1) as f32;
        let step = run.width / count;
        glyphs.extend(run.text.chars().enumerate().map(|(i, c)| {
            Glyph::new(c, run.font_size, run.font_name.clone()).at(run.x + i as f32 * step, run.y)
        }));
        prev_end = Some(run.x + run.width);
    }

    TextLine::new(glyphs)
}

/// Build the [`PageText`] of page `number` from its runs.
pub fn page_text(number: usize, runs: Vec<TextRun>) -> PageText {
    let lines = group_runs_into_lines(runs)
        .iter()
        .map(|line| line_glyphs(line))
        .filter(|line| line.lead_glyph().is_some())
        .collect();
    PageText::new(number, lines)
}

/// Decode every page of the document behind `backend`.
pub fn read_pages(backend: &dyn PdfBackend) -> Result<Vec<PageText>, PdfError> {
    let page_map = backend.pages();
    let mut pages = Vec::with_capacity(page_map.len());

    for (&number, &page_id) in &page_map {
        let runs = extract_page_runs(backend, page_id)?;
        let page = page_text(number as usize, runs);
        log::debug!("page {}: {} line(s)", number, page.lines.len());
        pages.push(page);
    }

    Ok(pages)
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;

    // -- Mock backend -----------------------------------------------------

    /// Serves pre-decoded operations per page. The "raw content" of a page
    /// is its object number, so `decode_content` can find the right list.
    struct MockBackend {
        fonts: Vec<FontResource>,
        pages: Vec<Vec<ContentOp>>,
    }

    impl PdfBackend for MockBackend {
        fn pages(&self) -> BTreeMap<u32, PageId> {
            (1..=self.pages.len() as u32).map(|n| (n, (n, 0))).collect()
        }

        fn page_fonts(&self, _page: PageId) -> Result<Vec<FontResource>, PdfError> {
            Ok(self.fonts.clone())
        }

        fn page_content(&self, page: PageId) -> Result<Vec<u8>, PdfError> {
            Ok(vec![page.0 as u8])
        }

        fn decode_content(&self, data: &[u8]) -> Result<Vec<ContentOp>, PdfError> {
            let index = data.first().map(|n| *n as usize - 1).unwrap_or(0);
            self.pages
                .get(index)
                .cloned()
                .ok_or_else(|| PdfError::Parse("no such page".into()))
        }
    }

    fn fonts() -> Vec<FontResource> {
        vec![
            FontResource {
                key: b"F1".to_vec(),
                base_font: Some("Helvetica".to_string()),
                encoding: None,
            },
            FontResource {
                key: b"F2".to_vec(),
                base_font: Some("ABCDEF+Helvetica-Bold".to_string()),
                encoding: None,
            },
        ]
    }

    fn backend(pages: Vec<Vec<ContentOp>>) -> MockBackend {
        MockBackend {
            fonts: fonts(),
            pages,
        }
    }

    fn real(v: f32) -> PdfValue {
        PdfValue::Real(v)
    }

    fn tf(font: &[u8], size: f32) -> ContentOp {
        ContentOp::new("Tf", vec![PdfValue::Name(font.to_vec()), real(size)])
    }

    fn tm(a: f32, d: f32, x: f32, y: f32) -> ContentOp {
        ContentOp::new("Tm", vec![real(a), real(0.0), real(0.0), real(d), real(x), real(y)])
    }

    fn td(x: f32, y: f32) -> ContentOp {
        ContentOp::new("Td", vec![real(x), real(y)])
    }

    fn tj(text: &str) -> ContentOp {
        ContentOp::new("Tj", vec![PdfValue::Str(text.as_bytes().to_vec())])
    }

    fn run(text: &str, x: f32, y: f32) -> TextRun {
        TextRun {
            text: text.to_string(),
            x,
            y,
            width: text.chars().count() as f32 * 6.0,
            font_size: 12.0,
            font_name: "Helvetica".to_string(),
        }
    }

    // -- State machine ----------------------------------------------------

    #[test]
    fn test_simple_tj_run() {
        let b = backend(vec![vec![
            ContentOp::new("BT", vec![]),
            tf(b"F1", 12.0),
            tm(1.0, 1.0, 72.0, 700.0),
            tj("Hello World"),
            ContentOp::new("ET", vec![]),
        ]]);

        let runs = extract_page_runs(&b, (1, 0)).unwrap();
        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0].text, "Hello World");
        assert_eq!(runs[0].font_name, "Helvetica");
        assert!((runs[0].x - 72.0).abs() < 0.01);
        assert!((runs[0].y - 700.0).abs() < 0.01);
        assert!((runs[0].font_size - 12.0).abs() < 0.01);
        assert!((runs[0].width - 66.0).abs() < 0.01);
    }

    #[test]
    fn test_subset_tag_removed_from_font_name() {
        let b = backend(vec![vec![tf(b"F2", 18.0), tj("Title")]]);
        let runs = extract_page_runs(&b, (1, 0)).unwrap();
        assert_eq!(runs[0].font_name, "Helvetica-Bold");
    }

    #[test]
    fn test_unknown_font_key_used_as_name() {
        let b = backend(vec![vec![tf(b"F9", 10.0), tj("x y")]]);
        let runs = extract_page_runs(&b, (1, 0)).unwrap();
        assert_eq!(runs[0].font_name, "F9");
    }

    #[test]
    fn test_text_matrix_scales_font_size() {
        let b = backend(vec![vec![tf(b"F1", 1.0), tm(14.0, 14.0, 50.0, 500.0), tj("Big")]]);
        let runs = extract_page_runs(&b, (1, 0)).unwrap();
        assert!((runs[0].font_size - 14.0).abs() < 0.01);
        assert!((runs[0].width - 21.0).abs() < 0.01);
    }

    #[test]
    fn test_tj_array_kerning_inserts_space() {
        let b = backend(vec![vec![
            tf(b"F1", 12.0),
            td(72.0, 700.0),
            ContentOp::new(
                "TJ",
                vec![PdfValue::Array(vec![
                    PdfValue::Str(b"Hel".to_vec()),
                    PdfValue::Integer(-20),
                    PdfValue::Str(b"lo".to_vec()),
                    PdfValue::Integer(-300),
                    PdfValue::Str(b"World".to_vec()),
                ])],
            ),
        ]]);
        let runs = extract_page_runs(&b, (1, 0)).unwrap();
        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0].text, "Hello World");
    }

    #[test]
    fn test_leading_moves_to_next_line() {
        let b = backend(vec![vec![
            tf(b"F1", 10.0),
            ContentOp::new("TD", vec![real(72.0), real(-12.0)]),
            tj("first"),
            ContentOp::new("T*", vec![]),
            tj("second"),
            ContentOp::new("'", vec![PdfValue::Str(b"third".to_vec())]),
        ]]);
        let runs = extract_page_runs(&b, (1, 0)).unwrap();
        let ys: Vec<f32> = runs.iter().map(|r| r.y).collect();
        assert_eq!(ys, vec![-12.0, -24.0, -36.0]);
        assert!(runs.iter().all(|r| (r.x - 72.0).abs() < 0.01));
    }

    #[test]
    fn test_runs_are_cleaned() {
        let b = backend(vec![vec![
            tf(b"F1", 10.0),
            ContentOp::new("Tj", vec![PdfValue::Str("\u{FB01}nal".as_bytes().to_vec())]),
            tj("   "),
        ]]);
        let runs = extract_page_runs(&b, (1, 0)).unwrap();
        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0].text, "final");
    }

    // -- Line assembly ----------------------------------------------------

    #[test]
    fn test_group_runs_by_baseline_top_first() {
        let lines = group_runs_into_lines(vec![
            run("low", 72.0, 600.0),
            run("right", 200.0, 700.4),
            run("left", 72.0, 700.0),
            run("apart", 72.0, 698.5),
        ]);
        let texts: Vec<Vec<&str>> = lines
            .iter()
            .map(|l| l.iter().map(|r| r.text.as_str()).collect())
            .collect();
        assert_eq!(texts, vec![vec!["left", "right"], vec!["apart"], vec!["low"]]);
    }

    #[test]
    fn test_line_glyphs_inserts_space_across_gap() {
        let line = line_glyphs(&[run("Chapter", 72.0, 700.0), run("One", 130.0, 700.0)]);
        assert_eq!(line.text(), "Chapter One");
        assert_eq!(line.glyphs.len(), 11);
        assert!((line.glyphs[8].x - 130.0).abs() < 0.01);
        assert!(line.glyphs[7].synthetic);
        assert_eq!(line.glyphs.iter().filter(|g| g.synthetic).count(), 1);
    }

    #[test]
    fn test_line_glyphs_joins_adjacent_runs() {
        // "Sec" ends at 90.0; "tion" starts right there.
        let line = line_glyphs(&[run("Sec", 72.0, 700.0), run("tion", 90.0, 700.0)]);
        assert_eq!(line.text(), "Section");
    }

    #[test]
    fn test_read_pages_builds_numbered_pages() {
        let b = backend(vec![
            vec![
                tf(b"F2", 20.0),
                tm(1.0, 1.0, 72.0, 750.0),
                tj("1. Introduction"),
                tf(b"F1", 10.0),
                tm(1.0, 1.0, 72.0, 700.0),
                tj("Body text."),
            ],
            vec![],
        ]);

        let pages = read_pages(&b).unwrap();
        assert_eq!(pages.len(), 2);
        assert_eq!(pages[0].number, 1);
        assert_eq!(pages[0].lines.len(), 2);
        assert_eq!(pages[0].lines[0].text(), "1. Introduction");
        assert!(pages[0].lines[0].is_bold());
        assert_eq!(pages[0].lines[0].primary_font_size(), Some(20.0));
        assert_eq!(pages[0].lines[1].text(), "Body text.");
        assert_eq!(pages[1].number, 2);
        assert!(pages[1].lines.is_empty());
    }
}

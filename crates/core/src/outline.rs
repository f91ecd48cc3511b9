//! Per-document outline assembly.

use std::collections::HashSet;
use std::path::Path;

use crate::fonts::{font_thresholds, FontThresholds};
use crate::heading::{classify_line, detect_title};
use crate::stream::{CharacterStream, PageText};
use crate::types::{HeadingEntry, Outline};

/// Classify every line of every page, in page order.
pub fn classify_pages(pages: &[PageText], thresholds: &FontThresholds) -> Vec<HeadingEntry> {
    pages
        .iter()
        .flat_map(|page| {
            page.lines.iter().filter_map(move |line| {
                classify_line(line, thresholds)
                    .map(|level| HeadingEntry::new(level, line.text(), page.number))
            })
        })
        .collect()
}

/// Drop later entries that repeat an earlier `(lowercased text, page)` pair.
pub fn dedup_entries(entries: Vec<HeadingEntry>) -> Vec<HeadingEntry> {
    let mut seen: HashSet<(String, usize)> = HashSet::new();
    entries
        .into_iter()
        .filter(|e| seen.insert((e.text.to_lowercase(), e.page)))
        .collect()
}

/// Build the outline of an already-decoded document.
pub fn build_outline(pages: &[PageText]) -> Outline {
    if pages.is_empty() {
        return Outline::empty_document();
    }

    let thresholds = font_thresholds(pages.iter().flat_map(PageText::source_glyphs));
    let title = detect_title(pages.first(), &thresholds);
    let entries = dedup_entries(classify_pages(pages, &thresholds));

    Outline { title, entries }
}

/// Read a document through `stream` and build its outline.
///
/// Returns the decoded pages alongside the outline so section segmentation
/// can reuse them. An unreadable document yields [`Outline::error`] and no
/// pages.
pub fn extract_outline(stream: &dyn CharacterStream, path: &Path) -> (Outline, Vec<PageText>) {
    match stream.read_pages(path) {
        Ok(pages) => {
            let outline = build_outline(&pages);
            log::info!(
                "{}: {} page(s), {} heading(s), title {:?}",
                path.display(),
                pages.len(),
                outline.entries.len(),
                outline.title
            );
            (outline, pages)
        }
        Err(err) => {
            log::warn!("error processing PDF '{}': {}", path.display(), err);
            (Outline::error(), Vec::new())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stream::{Glyph, StreamError, TextLine};
    use crate::types::HeadingLevel;

    fn body(text: &str) -> TextLine {
        TextLine::uniform(text, 10.0, "Times-Roman")
    }

    #[test]
    fn test_dedup_keeps_first_occurrence_in_order() {
        let entries = vec![
            HeadingEntry::new(HeadingLevel::H1, "Results", 2),
            HeadingEntry::new(HeadingLevel::H2, "Method", 2),
            HeadingEntry::new(HeadingLevel::H3, "RESULTS", 2),
            HeadingEntry::new(HeadingLevel::H1, "Results", 3),
            HeadingEntry::new(HeadingLevel::H2, "method", 2),
        ];
        let out = dedup_entries(entries);
        assert_eq!(
            out,
            vec![
                HeadingEntry::new(HeadingLevel::H1, "Results", 2),
                HeadingEntry::new(HeadingLevel::H2, "Method", 2),
                HeadingEntry::new(HeadingLevel::H1, "Results", 3),
            ]
        );
    }

    #[test]
    fn test_inserted_spaces_do_not_shift_thresholds() {
        let mut results = TextLine::uniform("Key Results", 12.0, "Helvetica-Bold");
        results
            .glyphs
            .extend((0..20).map(|_| Glyph::new(' ', 30.0, "Helvetica-Bold").synthetic()));
        let pages = vec![PageText::new(
            1,
            vec![
                TextLine::uniform("Methods Overview", 16.0, "Helvetica-Bold"),
                body("plain words that fill the body of the page here"),
                results,
            ],
        )];

        // Counting the twenty 30pt spaces would make 30pt the H1 cutoff and
        // leave the document untitled.
        let outline = build_outline(&pages);
        assert_eq!(outline.title, "Methods Overview");
        assert_eq!(
            outline.entries,
            vec![
                HeadingEntry::new(HeadingLevel::H1, "Methods Overview", 1),
                HeadingEntry::new(HeadingLevel::H2, "Key Results", 1),
            ]
        );
    }

    #[test]
    fn test_empty_document_sentinel() {
        assert_eq!(build_outline(&[]), Outline::empty_document());
    }

    #[test]
    fn test_two_page_document_outline() {
        let filler = "the quick brown fox jumps over the lazy dog again and again";
        let pages = vec![
            PageText::new(
                1,
                vec![
                    TextLine::uniform("1. Introduction", 20.0, "Helvetica-Bold"),
                    body(filler),
                    body(filler),
                ],
            ),
            PageText::new(
                2,
                vec![
                    TextLine::uniform("1.1 Background", 14.0, "Helvetica-Bold"),
                    body(filler),
                    body("Page 2 of 2"),
                ],
            ),
        ];

        let outline = build_outline(&pages);
        assert_eq!(outline.title, "1. Introduction");
        assert_eq!(
            outline.entries,
            vec![
                HeadingEntry::new(HeadingLevel::H1, "1. Introduction", 1),
                HeadingEntry::new(HeadingLevel::H2, "1.1 Background", 2),
            ]
        );

        let json = serde_json::to_value(&outline).unwrap();
        assert_eq!(
            json["outline"],
            serde_json::json!([
                {"level": "H1", "text": "1. Introduction", "page": 1},
                {"level": "H2", "text": "1.1 Background", "page": 2}
            ])
        );
    }

    #[test]
    fn test_repeated_heading_on_same_page_is_deduplicated() {
        let pages = vec![PageText::new(
            1,
            vec![
                TextLine::uniform("2. Scope", 12.0, "Arial-Bold"),
                body("some ordinary body text follows here"),
                TextLine::uniform("2. SCOPE", 12.0, "Arial-Bold"),
            ],
        )];
        let outline = build_outline(&pages);
        assert_eq!(outline.entries.len(), 1);
        assert_eq!(outline.entries[0].text, "2. Scope");
    }

    struct FailingStream;

    impl CharacterStream for FailingStream {
        fn read_pages(&self, path: &Path) -> Result<Vec<PageText>, StreamError> {
            Err(StreamError::new(path.display().to_string(), "broken xref"))
        }
    }

    #[test]
    fn test_unreadable_document_degrades_to_sentinel() {
        let (outline, pages) = extract_outline(&FailingStream, Path::new("broken.pdf"));
        assert!(outline.is_error());
        assert!(pages.is_empty());
    }
}

//! Turn outline entries into text spans.
//!
//! A section starts at the first line on or after its page that contains the
//! heading text and runs until a line containing the next heading's text is
//! met on the next heading's page, or until the document ends. Anchoring is
//! plain substring containment, so a heading text quoted earlier in the body
//! of the same page wins over the real heading.

use crate::stream::{collapse_whitespace, PageText};
use crate::types::{Outline, Section};

/// Where the following section begins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Boundary<'a> {
    pub page: usize,
    pub title: &'a str,
}

/// Text of the section titled `title` on `page`, stopping before `next`.
///
/// Returns an empty string when the title is never found.
pub fn section_text(
    pages: &[PageText],
    page: usize,
    title: &str,
    next: Option<Boundary<'_>>,
) -> String {
    let mut parts: Vec<String> = Vec::new();
    let mut found = false;

    'pages: for current in pages.iter().filter(|p| p.number >= page) {
        for line in &current.lines {
            let text = line.text();

            if !found {
                if text.contains(title) {
                    found = true;
                    parts.push(text);
                }
                continue;
            }

            if let Some(next) = next {
                if current.number == next.page && text.contains(next.title) {
                    break 'pages;
                }
            }

            parts.push(text);
        }
    }

    if !found {
        log::debug!("section {:?} not found from page {}", title, page);
    }

    collapse_whitespace(&parts.join(" "))
}

/// One [`Section`] per outline entry, in outline order.
pub fn segment_document(document: &str, outline: &Outline, pages: &[PageText]) -> Vec<Section> {
    let entries = &outline.entries;
    entries
        .iter()
        .enumerate()
        .map(|(i, entry)| {
            let next = entries.get(i + 1).map(|n| Boundary {
                page: n.page,
                title: n.text.as_str(),
            });
            let text = section_text(pages, entry.page, &entry.text, next);
            Section::new(document, entry.page, entry.text.clone(), text)
        })
        .collect()
}

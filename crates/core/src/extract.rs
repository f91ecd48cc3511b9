//! Query-focused sentence selection over the best-ranked sections.

use std::collections::HashSet;

use crate::config::AnalysisConfig;
use crate::text::TextAnalyzer;
use crate::types::{QueryContext, RefinedSegment, Section};

/// Jaccard index of two keyword sets; 0.0 when both are empty.
pub fn jaccard(a: &HashSet<String>, b: &HashSet<String>) -> f64 {
    let union = a.union(b).count();
    if union == 0 {
        return 0.0;
    }
    a.intersection(b).count() as f64 / union as f64
}

pub struct SentenceExtractor<'a> {
    analyzer: &'a dyn TextAnalyzer,
    top_sections: usize,
    jaccard_threshold: f64,
    char_budget: usize,
}

impl<'a> SentenceExtractor<'a> {
    pub fn new(analyzer: &'a dyn TextAnalyzer, config: &AnalysisConfig) -> Self {
        SentenceExtractor {
            analyzer,
            top_sections: config.top_sections,
            jaccard_threshold: config.jaccard_threshold,
            char_budget: config.refined_char_budget,
        }
    }

    /// Sentences of `section` overlapping `keywords`, up to the character budget.
    ///
    /// The budget is checked after each retained sentence, so the result may
    /// exceed it by at most that last sentence.
    fn select(&self, section: &Section, keywords: &HashSet<String>) -> Vec<String> {
        let mut kept: Vec<String> = Vec::new();
        let mut length = 0usize;

        for sentence in self.analyzer.sentences(&section.text) {
            let overlap = jaccard(keywords, &self.analyzer.keywords(sentence));
            if overlap > self.jaccard_threshold {
                length += sentence.chars().count();
                kept.push(sentence.to_string());
            }
            if length > self.char_budget {
                break;
            }
        }

        kept
    }

    /// Refined text for the top sections of `ranked`, in rank order.
    pub fn refine(&self, ranked: &[Section], query: &QueryContext) -> Vec<RefinedSegment> {
        let keywords = self.analyzer.keywords(&query.combined_text());

        ranked
            .iter()
            .take(self.top_sections)
            .filter(|section| !section.text.is_empty())
            .filter_map(|section| {
                let kept = self.select(section, &keywords);
                if kept.is_empty() {
                    log::debug!("no sentence of {:?} matches the query", section.title);
                    return None;
                }
                Some(RefinedSegment {
                    document: section.document.clone(),
                    page_number: section.page,
                    refined_text: kept.join(" "),
                })
            })
            .collect()
    }
}

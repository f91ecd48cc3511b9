//! Score sections against the persona/job query.

use std::cmp::Ordering;

use crate::types::{QueryContext, Section};
use crate::vector::VectorSpaceModel;

pub struct RelevanceRanker<'a> {
    model: &'a dyn VectorSpaceModel,
}

impl<'a> RelevanceRanker<'a> {
    pub fn new(model: &'a dyn VectorSpaceModel) -> Self {
        RelevanceRanker { model }
    }

    /// Score every section and return them best first.
    ///
    /// The query is embedded as the last document of the same corpus as the
    /// sections. Equal scores keep their incoming order.
    pub fn rank(&self, sections: Vec<Section>, query: &QueryContext) -> Vec<Section> {
        if sections.is_empty() {
            return sections;
        }

        let mut corpus: Vec<String> = sections.iter().map(|s| s.text.clone()).collect();
        corpus.push(query.combined_text());

        let mut vectors = self.model.fit_transform(&corpus);
        let Some(query_vector) = vectors.pop() else {
            return sections;
        };
        let scores = self.model.similarities(&query_vector, &vectors);
        if scores.len() != sections.len() {
            log::warn!(
                "{} similarity score(s) for {} section(s); missing scores count as 0",
                scores.len(),
                sections.len()
            );
        }

        let mut ranked: Vec<Section> = sections
            .into_iter()
            .zip(scores.into_iter().chain(std::iter::repeat(0.0)))
            .map(|(mut section, score)| {
                section.score = score;
                section
            })
            .collect();

        // `sort_by` is stable.
        ranked.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));

        if let Some(best) = ranked.first() {
            log::debug!(
                "ranked {} section(s), best {:?} ({:.4})",
                ranked.len(),
                best.title,
                best.score
            );
        }

        ranked
    }
}

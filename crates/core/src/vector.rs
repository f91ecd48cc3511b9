//! Vector-space representation of texts.
//!
//! [`VectorSpaceModel`] hides the concrete weighting scheme from the ranker.
//! [`TfidfModel`] uses raw term counts, smoothed inverse document frequency
//! (`ln((1 + n) / (1 + df)) + 1`) and L2-normalized rows, over a vocabulary
//! capped at the most frequent terms of the corpus.

use std::collections::{BTreeMap, HashMap, HashSet};

use crate::text::TextAnalyzer;

/// Default vocabulary cap.
pub const DEFAULT_MAX_FEATURES: usize = 5000;

/// One dense row of the term matrix.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TermVector {
    pub weights: Vec<f64>,
}

impl TermVector {
    pub fn is_zero(&self) -> bool {
        self.weights.iter().all(|w| *w == 0.0)
    }
}

/// Cosine similarity between two vectors.
/// Returns 0.0 for mismatched lengths or an all-zero vector.
pub fn cosine_similarity(a: &[f64], b: &[f64]) -> f64 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot: f64 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f64 = a.iter().map(|x| x * x).sum::<f64>().sqrt();
    let norm_b: f64 = b.iter().map(|x| x * x).sum::<f64>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot / (norm_a * norm_b)
}

pub trait VectorSpaceModel {
    /// Embed every document of `corpus` in one shared space, in order.
    fn fit_transform(&self, corpus: &[String]) -> Vec<TermVector>;

    /// Similarity of `query` against each of `vectors`, in order.
    fn similarities(&self, query: &TermVector, vectors: &[TermVector]) -> Vec<f64> {
        vectors
            .iter()
            .map(|v| cosine_similarity(&query.weights, &v.weights))
            .collect()
    }
}

pub struct TfidfModel<'a> {
    analyzer: &'a dyn TextAnalyzer,
    max_features: usize,
}

impl<'a> TfidfModel<'a> {
    pub fn new(analyzer: &'a dyn TextAnalyzer, max_features: usize) -> Self {
        TfidfModel {
            analyzer,
            max_features,
        }
    }

    /// Term -> column index for the retained vocabulary, alphabetical.
    fn vocabulary(&self, docs: &[Vec<String>]) -> BTreeMap<String, usize> {
        let mut totals: HashMap<&str, usize> = HashMap::new();
        for doc in docs {
            for term in doc {
                *totals.entry(term.as_str()).or_insert(0) += 1;
            }
        }

        let mut ranked: Vec<(&str, usize)> = totals.into_iter().collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(b.0)));
        ranked.truncate(self.max_features);

        let mut vocab: BTreeMap<String, usize> =
            ranked.into_iter().map(|(t, _)| (t.to_string(), 0)).collect();
        for (i, index) in vocab.values_mut().enumerate() {
            *index = i;
        }
        vocab
    }
}

impl VectorSpaceModel for TfidfModel<'_> {
    fn fit_transform(&self, corpus: &[String]) -> Vec<TermVector> {
        let docs: Vec<Vec<String>> = corpus.iter().map(|d| self.analyzer.terms(d)).collect();
        let vocab = self.vocabulary(&docs);
        let n = docs.len() as f64;

        let mut df = vec![0usize; vocab.len()];
        for doc in &docs {
            let unique: HashSet<usize> = doc.iter().filter_map(|t| vocab.get(t).copied()).collect();
            for col in unique {
                df[col] += 1;
            }
        }
        let idf: Vec<f64> = df
            .iter()
            .map(|&d| ((1.0 + n) / (1.0 + d as f64)).ln() + 1.0)
            .collect();

        log::debug!("tf-idf space: {} documents, {} terms", docs.len(), vocab.len());

        docs.iter()
            .map(|doc| {
                let mut weights = vec![0.0; vocab.len()];
                for term in doc {
                    if let Some(&col) = vocab.get(term) {
                        weights[col] += 1.0;
                    }
                }
                for (w, idf) in weights.iter_mut().zip(&idf) {
                    *w *= idf;
                }
                let norm = weights.iter().map(|w| w * w).sum::<f64>().sqrt();
                if norm > 0.0 {
                    for w in &mut weights {
                        *w /= norm;
                    }
                }
                TermVector { weights }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::text::EnglishAnalyzer;

    fn corpus(texts: &[&str]) -> Vec<String> {
        texts.iter().map(|t| t.to_string()).collect()
    }

    #[test]
    fn test_cosine_basic() {
        assert!((cosine_similarity(&[1.0, 0.0], &[1.0, 0.0]) - 1.0).abs() < 1e-12);
        assert_eq!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]), 0.0);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 1.0]), 0.0);
        assert_eq!(cosine_similarity(&[1.0], &[1.0, 2.0]), 0.0);
    }

    #[test]
    fn test_identical_texts_have_similarity_one() {
        let analyzer = EnglishAnalyzer::new().unwrap();
        let model = TfidfModel::new(&analyzer, DEFAULT_MAX_FEATURES);
        let text = "Chickpea curry with coconut milk and spinach";
        let vectors = model.fit_transform(&corpus(&[text, "Contract law overview", text]));
        let sims = model.similarities(&vectors[2], &vectors[..2]);
        assert!((sims[0] - 1.0).abs() < 1e-9, "got {}", sims[0]);
        assert_eq!(sims[1], 0.0);
    }

    #[test]
    fn test_rows_are_unit_length_or_zero() {
        let analyzer = EnglishAnalyzer::new().unwrap();
        let model = TfidfModel::new(&analyzer, DEFAULT_MAX_FEATURES);
        let vectors = model.fit_transform(&corpus(&["alpha beta beta", "", "the and of"]));
        let norm: f64 = vectors[0].weights.iter().map(|w| w * w).sum::<f64>().sqrt();
        assert!((norm - 1.0).abs() < 1e-9);
        assert!(vectors[1].is_zero());
        assert!(vectors[2].is_zero());
    }

    #[test]
    fn test_rare_terms_weigh_more() {
        let analyzer = EnglishAnalyzer::new().unwrap();
        let model = TfidfModel::new(&analyzer, DEFAULT_MAX_FEATURES);
        let vectors = model.fit_transform(&corpus(&["common rare", "common", "common"]));
        let vocab = model.vocabulary(&[vec!["common".into(), "rare".into()]]);
        let w = &vectors[0].weights;
        assert!(w[vocab["rare"]] > w[vocab["common"]]);
    }

    #[test]
    fn test_vocabulary_capped_by_frequency() {
        let analyzer = EnglishAnalyzer::new().unwrap();
        let model = TfidfModel::new(&analyzer, 2);
        let docs = vec![analyzer.terms("apple apple apple banana banana cherry")];
        let vocab = model.vocabulary(&docs);
        assert_eq!(vocab.keys().collect::<Vec<_>>(), vec!["apple", "banana"]);
        let vectors = model.fit_transform(&corpus(&["apple banana cherry"]));
        assert_eq!(vectors[0].weights.len(), 3);
    }
}

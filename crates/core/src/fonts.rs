//! Document-wide font-size statistics.
//!
//! Heading cutoffs come from the four most common glyph sizes in the
//! document. Sizes are bucketed at two decimals before counting.

use std::collections::HashMap;

use crate::stream::Glyph;

/// Size cutoffs used by the heading classifier.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FontThresholds {
    pub h1: f32,
    pub h2: f32,
    pub h3: f32,
    pub h4: f32,
}

impl FontThresholds {
    pub fn new(h1: f32, h2: f32, h3: f32, h4: f32) -> Self {
        FontThresholds { h1, h2, h3, h4 }
    }

    pub fn as_array(&self) -> [f32; 4] {
        [self.h1, self.h2, self.h3, self.h4]
    }
}

/// `(size, glyph_count)` pairs, most frequent first. Equal counts put the
/// larger size first so the order is deterministic.
pub fn size_histogram<'a>(glyphs: impl IntoIterator<Item = &'a Glyph>) -> Vec<(f32, usize)> {
    let mut counts: HashMap<i64, usize> = HashMap::new();
    for glyph in glyphs {
        let key = (f64::from(glyph.size) * 100.0).round() as i64;
        *counts.entry(key).or_insert(0) += 1;
    }

    let mut histogram: Vec<(i64, usize)> = counts.into_iter().collect();
    histogram.sort_by(|a, b| b.1.cmp(&a.1).then(b.0.cmp(&a.0)));
    histogram
        .into_iter()
        .map(|(key, count)| ((key as f64 / 100.0) as f32, count))
        .collect()
}

/// Derive the H1..H4 cutoffs from every glyph of one document.
///
/// The four most frequent sizes are selected first, then ordered largest to
/// smallest among themselves; missing ranks are `0.0`.
pub fn font_thresholds<'a>(glyphs: impl IntoIterator<Item = &'a Glyph>) -> FontThresholds {
    let mut top: Vec<f32> = size_histogram(glyphs)
        .into_iter()
        .take(4)
        .map(|(size, _)| size)
        .collect();
    top.sort_by(|a, b| b.partial_cmp(a).unwrap_or(std::cmp::Ordering::Equal));

    let rank = |i: usize| top.get(i).copied().unwrap_or(0.0);
    let thresholds = FontThresholds::new(rank(0), rank(1), rank(2), rank(3));
    log::debug!("font thresholds: {:?}", thresholds);
    thresholds
}

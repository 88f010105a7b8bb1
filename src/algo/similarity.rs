use std::collections::HashMap;

use rayon::prelude::*;

use crate::algo::bm25::Bow;
use crate::algo::corpus::Corpus;

/// Blend weights for pair similarity. Titles dominate because they are
/// denser in named entities.
pub const TITLE_WEIGHT: f64 = 0.7;
pub const DESCRIPTION_WEIGHT: f64 = 0.15;
pub const CROSS_WEIGHT: f64 = 0.075;

/// Cosine similarity of two sparse vectors; 0 when either is empty.
pub fn cosine(a: &Bow, b: &Bow) -> f64 {
    let norm_a = a.values().map(|x| x * x).sum::<f64>().sqrt();
    let norm_b = b.values().map(|x| x * x).sum::<f64>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    let dot: f64 = a
        .iter()
        .filter_map(|(term, wa)| b.get(term).map(|wb| wa * wb))
        .sum();
    dot / (norm_a * norm_b)
}

/// Blended title/description similarity of two documents. A document is
/// fully similar to itself.
///
/// The pair is evaluated in ascending index order so `(i, j)` and `(j, i)`
/// give bit-identical results.
pub fn pair_similarity(corpus: &Corpus, i: usize, j: usize) -> f64 {
    if i == j {
        return 1.0;
    }
    let (lo, hi) = (i.min(j), i.max(j));
    let (Some(a), Some(b)) = (corpus.get(lo), corpus.get(hi)) else {
        return 0.0;
    };
    cosine(a.title.bow(), b.title.bow()) * TITLE_WEIGHT
        + cosine(a.description.bow(), b.description.bow()) * DESCRIPTION_WEIGHT
        + cosine(a.description.bow(), b.title.bow()) * CROSS_WEIGHT
        + cosine(a.title.bow(), b.description.bow()) * CROSS_WEIGHT
}

/// Symmetric memo of pair similarities for one corpus.
#[derive(Debug, Clone, Default)]
pub struct SimilarityCache {
    entries: HashMap<(usize, usize), f64>,
}

impl SimilarityCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn key(i: usize, j: usize) -> (usize, usize) {
        (i.min(j), i.max(j))
    }

    pub fn get(&self, i: usize, j: usize) -> Option<f64> {
        self.entries.get(&Self::key(i, j)).copied()
    }

    /// Cached similarity, computing and storing it on a miss.
    pub fn similarity(&mut self, corpus: &Corpus, i: usize, j: usize) -> f64 {
        *self
            .entries
            .entry(Self::key(i, j))
            .or_insert_with(|| pair_similarity(corpus, i, j))
    }

    /// Make sure every unordered pair of `nodes` is cached. Missing pairs are
    /// computed in parallel from the immutable corpus, then inserted.
    pub fn fill(&mut self, corpus: &Corpus, nodes: &[usize]) {
        let missing: Vec<(usize, usize)> = nodes
            .iter()
            .enumerate()
            .flat_map(|(a, &x)| nodes[a + 1..].iter().map(move |&y| Self::key(x, y)))
            .filter(|key| !self.entries.contains_key(key))
            .collect();
        if missing.is_empty() {
            return;
        }

        let computed: Vec<((usize, usize), f64)> = missing
            .into_par_iter()
            .map(|(i, j)| ((i, j), pair_similarity(corpus, i, j)))
            .collect();
        self.entries.extend(computed);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

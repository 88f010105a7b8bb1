//! Keyword scoring: score maps, ramps and corpus keyword maps.

use indexmap::IndexMap;
use serde::Serialize;

use crate::algo::corpus::{Corpus, Document};
use crate::algo::lexicon::Lexicon;

/// Title stems count four times as much as description stems.
pub const TITLE_SHARE: f64 = 0.8;
pub const DESCRIPTION_SHARE: f64 = 0.2;

/// stem -> score, with a default for stems that are not present.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct KeywordScoreMap {
    scores: IndexMap<String, f64>,
    oov: f64,
}

impl KeywordScoreMap {
    pub fn new(oov: f64) -> Self {
        Self {
            scores: IndexMap::new(),
            oov,
        }
    }

    pub fn from_scores(scores: IndexMap<String, f64>, oov: f64) -> Self {
        Self { scores, oov }
    }

    /// Score of a stem, or the out-of-vocabulary default.
    pub fn score(&self, stem: &str) -> f64 {
        self.scores.get(stem).copied().unwrap_or(self.oov)
    }

    pub fn oov(&self) -> f64 {
        self.oov
    }

    /// Copy with a different out-of-vocabulary default.
    pub fn with_oov(&self, oov: f64) -> Self {
        Self {
            scores: self.scores.clone(),
            oov,
        }
    }

    /// Add `other`'s explicit scores times `scale`. Stems missing here start
    /// from 0, not from this map's default.
    pub fn add(&mut self, other: &KeywordScoreMap, scale: f64) {
        for (stem, score) in &other.scores {
            *self.scores.entry(stem.clone()).or_insert(0.0) += score * scale;
        }
    }

    pub fn set(&mut self, stem: impl Into<String>, score: f64) {
        self.scores.insert(stem.into(), score);
    }

    pub fn contains(&self, stem: &str) -> bool {
        self.scores.contains_key(stem)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.scores.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn len(&self) -> usize {
        self.scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }
}

/// Log-shaped squashing that is 1 at 0, grows slowly for positive inputs and
/// decays toward 0 for negative ones.
pub fn smooth_log(x: f64) -> f64 {
    if x >= 0.0 {
        (x + 1.0).ln() + 1.0
    } else {
        1.0 / ((-x + 1.0).ln() + 1.0)
    }
}

/// Keyword weight of one document under `map`: the smoothed sum of
/// `score(stem) * weight` over its vector.
pub fn doc_keyword_score(doc: &Document, map: &KeywordScoreMap) -> f64 {
    let total: f64 = doc
        .bow()
        .iter()
        .map(|(stem, weight)| map.score(stem) * weight)
        .sum();
    smooth_log(total)
}

/// Linear ramp over ranked keyword lists. Position `i` of a list gets
/// `top - i / (n - 1) * (top - bottom)` where `n` is the longest list's
/// length, so the first keyword scores `top`. Scores of keywords appearing in
/// several lists add up. No keywords at all give an empty map.
pub fn smooth_score_ramp<S: AsRef<str>>(
    lists: &[Vec<S>],
    top: f64,
    bottom: f64,
    oov: f64,
) -> KeywordScoreMap {
    let mut map = KeywordScoreMap::new(oov);
    let n = lists.iter().map(Vec::len).max().unwrap_or(0);
    if n == 0 {
        return map;
    }
    for list in lists {
        for (i, keyword) in list.iter().enumerate() {
            let score = if n == 1 {
                top
            } else {
                top - (i as f64) / ((n - 1) as f64) * (top - bottom)
            };
            *map.scores.entry(keyword.as_ref().to_string()).or_insert(0.0) += score;
        }
    }
    map
}

/// Every stem of the candidate documents at score 1, default 0.
pub fn empty_keyword_map(corpus: &Corpus, candidates: &[usize]) -> KeywordScoreMap {
    let mut map = KeywordScoreMap::new(0.0);
    for pair in candidates.iter().filter_map(|&i| corpus.get(i)) {
        for stem in pair.title.stems().chain(pair.description.stems()) {
            map.scores.insert(stem.to_string(), 1.0);
        }
    }
    map
}

/// Score every stem of the candidate documents.
///
/// Each occurrence writes `(previous + 1 + rank) * idf * scaling * share`,
/// where `previous` is the value currently stored for the stem, `rank` is
/// the document's rank (0 without `ranks`), `scaling` comes from `scores`
/// (smoothed with [`smooth_log`] when `use_smooth_log`) and `share` is
/// [`TITLE_SHARE`] or [`DESCRIPTION_SHARE`]. The write replaces the stored
/// value rather than adding to it.
pub fn keyword_map(
    corpus: &Corpus,
    candidates: &[usize],
    ranks: Option<&IndexMap<usize, f64>>,
    scores: Option<&KeywordScoreMap>,
    use_smooth_log: bool,
) -> IndexMap<String, f64> {
    let mut keywords: IndexMap<String, f64> = IndexMap::new();

    for &index in candidates {
        let Some(pair) = corpus.get(index) else {
            continue;
        };
        let rank = ranks.and_then(|r| r.get(&index)).copied().unwrap_or(0.0);

        let fields = [
            (&pair.title, TITLE_SHARE),
            (&pair.description, DESCRIPTION_SHARE),
        ];
        for (doc, share) in fields {
            for stem in doc.stems() {
                let scaling = match scores {
                    Some(map) if use_smooth_log => smooth_log(map.score(stem)),
                    Some(map) => map.score(stem),
                    None => 1.0,
                };
                let previous = keywords.get(stem).copied().unwrap_or(0.0);
                let value = (previous + 1.0 + rank) * corpus.idf(stem) * scaling * share;
                keywords.insert(stem.to_string(), value);
            }
        }
    }

    keywords
}

/// Keywords by descending score; equal scores keep map order.
pub fn top_from_map(map: &IndexMap<String, f64>, n: Option<usize>) -> Vec<String> {
    let mut entries: Vec<(&String, f64)> = map.iter().map(|(k, &v)| (k, v)).collect();
    entries.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    let limit = n.unwrap_or(entries.len());
    entries
        .into_iter()
        .take(limit)
        .map(|(k, _)| k.clone())
        .collect()
}

/// Display text for the first `n` stems.
pub fn keyword_preview<S: AsRef<str>>(lexicon: &Lexicon, stems: &[S], n: usize) -> Vec<String> {
    stems
        .iter()
        .take(n)
        .map(|stem| lexicon.display(stem.as_ref()))
        .collect()
}

//! Story cluster extraction.
//!
//! Each round picks the strongest keyword of the whole corpus under the
//! running global score map, ranks the documents mentioning it and emits a
//! [`Cluster`]. The cluster's own top keywords are then pushed far down in
//! the global map so later rounds move on to other stories.

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::algo::corpus::Corpus;
use crate::algo::keywords::{
    empty_keyword_map, keyword_map, keyword_preview, smooth_score_ramp, top_from_map,
    KeywordScoreMap,
};
use crate::algo::pagerank::{ranked_nodes, PageRankConfig};
use crate::algo::relevance::rank_documents;
use crate::algo::similarity::SimilarityCache;
use crate::error::{Result, StorylineError};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusterConfig {
    /// Number of extraction rounds, one cluster each.
    pub rounds: usize,
    /// Documents shown per cluster.
    pub members: usize,
    /// Global top keywords fed into the local ramp.
    pub anchor_pool: usize,
    /// Keywords of the matching subset that join the anchor in the ramp.
    pub secondary_keywords: usize,
    /// Cluster keywords suppressed after each round.
    pub suppression_keywords: usize,
    pub suppression_score: f64,
    pub same_source_penalty: f64,
    /// Keywords in a cluster's header.
    pub preview_keywords: usize,
    pub pagerank: PageRankConfig,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            rounds: 20,
            members: 5,
            anchor_pool: 5,
            secondary_keywords: 4,
            suppression_keywords: 10,
            suppression_score: -100.0,
            same_source_penalty: 0.5,
            preview_keywords: 5,
            pagerank: PageRankConfig::default(),
        }
    }
}

impl ClusterConfig {
    pub fn validate(&self) -> Result<()> {
        if self.members == 0 {
            return Err(StorylineError::InvalidConfig(
                "members must be at least 1".into(),
            ));
        }
        if !(0.0..=1.0).contains(&self.pagerank.damping) {
            return Err(StorylineError::InvalidConfig(format!(
                "damping must be within [0, 1], got {}",
                self.pagerank.damping
            )));
        }
        if !(self.same_source_penalty.is_finite() && self.same_source_penalty >= 0.0) {
            return Err(StorylineError::InvalidConfig(format!(
                "same_source_penalty must be a non-negative number, got {}",
                self.same_source_penalty
            )));
        }
        if self.pagerank.max_iterations == 0 {
            return Err(StorylineError::InvalidConfig(
                "pagerank.max_iterations must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

/// One extracted story. Immutable once built.
#[derive(Debug, Clone)]
pub struct Cluster<'a> {
    index: usize,
    corpus: &'a Corpus,
    members: Vec<usize>,
    candidates: Vec<usize>,
    ranks: IndexMap<usize, f64>,
    preview_keywords: usize,
}

impl<'a> Cluster<'a> {
    /// Round index, starting at 0.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn corpus(&self) -> &'a Corpus {
        self.corpus
    }

    /// Shown documents, best first.
    pub fn members(&self) -> &[usize] {
        &self.members
    }

    /// Every ranked document, best first.
    pub fn candidates(&self) -> &[usize] {
        &self.candidates
    }

    pub fn ranks(&self) -> &IndexMap<usize, f64> {
        &self.ranks
    }

    pub fn rank(&self, index: usize) -> Option<f64> {
        self.ranks.get(&index).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Top stems of the shown documents.
    pub fn top_keywords(&self, n: usize) -> Vec<String> {
        top_from_map(
            &keyword_map(self.corpus, &self.members, None, None, true),
            Some(n),
        )
    }

    /// Display text of the top keywords.
    pub fn keyword_preview(&self, n: usize) -> Vec<String> {
        keyword_preview(self.corpus.lexicon(), &self.top_keywords(n), n)
    }

    pub fn report(&self) -> ClusterReport {
        let members = self
            .members
            .iter()
            .filter_map(|&i| {
                let pair = self.corpus.get(i)?;
                Some(MemberReport {
                    index: i,
                    rank: self.rank(i).unwrap_or_default(),
                    title: pair.article.title.clone(),
                    link: pair.article.link.clone(),
                    source: pair.article.source.clone(),
                    section: pair.article.section.clone(),
                    image: pair.article.image.clone(),
                })
            })
            .collect();

        ClusterReport {
            index: self.index,
            keywords: self.keyword_preview(self.preview_keywords),
            shown: self.members.len(),
            total: self.candidates.len(),
            members,
            candidates: self.candidates.clone(),
        }
    }
}

fn member_label(position: usize) -> String {
    match u8::try_from(position) {
        Ok(p) if p < 26 => char::from(b'a' + p).to_string(),
        _ => (position + 1).to_string(),
    }
}

/// Lemmas without their term padding, comma-joined for the debug line.
fn joined_lemmas<'b>(lemmas: impl Iterator<Item = &'b str>) -> String {
    lemmas.map(str::trim).collect::<Vec<_>>().join(",")
}

impl fmt::Display for Cluster<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Cluster {}  [n={}/{}] ({})",
            self.index + 1,
            self.members.len(),
            self.candidates.len(),
            self.keyword_preview(self.preview_keywords).join(",")
        )?;
        writeln!(f, "--------")?;
        for (position, &i) in self.members.iter().enumerate() {
            let Some(pair) = self.corpus.get(i) else {
                continue;
            };
            writeln!(
                f,
                "  {}) {:.3} {}",
                member_label(position),
                self.rank(i).unwrap_or_default(),
                pair.title.text()
            )?;
            writeln!(
                f,
                "{} | {}",
                joined_lemmas(pair.title.lemmas()),
                joined_lemmas(pair.description.lemmas())
            )?;
            writeln!(f)?;
        }
        Ok(())
    }
}

/// Serializable summary of a [`Cluster`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClusterReport {
    pub index: usize,
    pub keywords: Vec<String>,
    pub shown: usize,
    pub total: usize,
    pub members: Vec<MemberReport>,
    pub candidates: Vec<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MemberReport {
    pub index: usize,
    pub rank: f64,
    pub title: String,
    pub link: String,
    pub source: String,
    pub section: String,
    pub image: Option<String>,
}

/// Run every extraction round over `corpus`. Rounds keep running once the
/// corpus is exhausted; they then produce empty clusters.
pub fn extract_clusters<'a>(corpus: &'a Corpus, config: &ClusterConfig) -> Vec<Cluster<'a>> {
    let all = corpus.indices();
    let mut global = empty_keyword_map(corpus, &all);
    let mut cache = SimilarityCache::new();
    let mut clusters = Vec::with_capacity(config.rounds);

    for round in 0..config.rounds {
        let cluster = extract_round(corpus, &all, &global, &mut cache, round, config);

        let suppressed = cluster.top_keywords(config.suppression_keywords);
        let penalty = smooth_score_ramp(
            &[suppressed],
            config.suppression_score,
            config.suppression_score,
            0.0,
        );
        global.add(&penalty, 1.0);

        clusters.push(cluster);
    }

    info!(
        "Extracted clusters - rounds={}, documents={}, cached_pairs={}",
        clusters.len(),
        corpus.len(),
        cache.len()
    );
    clusters
}

fn extract_round<'a>(
    corpus: &'a Corpus,
    all: &[usize],
    global: &KeywordScoreMap,
    cache: &mut SimilarityCache,
    round: usize,
    config: &ClusterConfig,
) -> Cluster<'a> {
    let keywords = top_from_map(&keyword_map(corpus, all, None, Some(global), true), None);
    let anchor = keywords.first();

    let filtered = match anchor {
        Some(stem) => corpus.filter_docs(all, |doc| doc.has_stem(stem)),
        None => Vec::new(),
    };

    let secondary: Vec<String> =
        top_from_map(&keyword_map(corpus, &filtered, None, None, true), None)
            .into_iter()
            .filter(|stem| Some(stem) != anchor)
            .take(config.secondary_keywords)
            .collect();

    let pool: Vec<String> = keywords.iter().take(config.anchor_pool).cloned().collect();
    let focus: Vec<String> = anchor.into_iter().cloned().chain(secondary).collect();
    let local = smooth_score_ramp(&[pool, focus], 1.0, 0.0, -1.0);

    let pagerank = rank_documents(
        corpus,
        cache,
        &filtered,
        Some(&local),
        config.same_source_penalty,
        &config.pagerank,
    );
    let candidates = ranked_nodes(&pagerank.ranks);
    let members: Vec<usize> = candidates.iter().take(config.members).copied().collect();

    debug!(
        "Round {} - anchor={:?}, matching={}, shown={}, pagerank_iterations={}",
        round,
        anchor.map(|s| corpus.lexicon().display(s)),
        filtered.len(),
        members.len(),
        pagerank.iterations
    );

    Cluster {
        index: round,
        corpus,
        members,
        candidates,
        ranks: pagerank.ranks,
        preview_keywords: config.preview_keywords,
    }
}

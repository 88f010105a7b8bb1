//! Corpus construction: dedup, annotation, term learning and vectorisation.
//!
//! The build runs in two passes so that a [`Document`] only ever exists with
//! its final BM25 vector:
//! 1. annotate every article (parallel) and fold its terms into the
//!    [`Lexicon`] and the [`Bm25Vectorizer`] (serial, corpus order)
//! 2. freeze the model and vectorise every document

use std::collections::{HashMap, HashSet};

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::algo::annotate::{Annotator, Term};
use crate::algo::bm25::{Bm25Params, Bm25Vectorizer, Bow};
use crate::algo::lexicon::Lexicon;
use crate::error::Result;

/// A configured feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedDescriptor {
    pub source: String,
    #[serde(default)]
    pub section: String,
    pub feed: String,
}

/// One fetched feed item, already entity-decoded and tag-stripped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub link: String,
    #[serde(default)]
    pub image: Option<String>,
}

/// Everything fetched in one run: the feed list and the items per feed URL.
/// A feed whose entry is missing or `null` contributes nothing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Snapshot {
    pub feeds: Vec<FeedDescriptor>,
    #[serde(default)]
    pub items: HashMap<String, Option<Vec<Item>>>,
}

/// A flat input row: one item plus the feed it was fetched from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedRow {
    pub feed: String,
    pub source: String,
    pub section: String,
    pub item: Item,
}

impl Snapshot {
    /// Group flat rows into feeds in order of first appearance. Rows are
    /// keyed by `feed`, or by `source` when the feed URL is empty; the first
    /// row of a group names its source and section.
    pub fn from_rows(rows: impl IntoIterator<Item = FeedRow>) -> Self {
        let mut snapshot = Snapshot::default();
        for row in rows {
            let key = if row.feed.is_empty() {
                row.source.clone()
            } else {
                row.feed.clone()
            };
            if !snapshot.items.contains_key(&key) {
                snapshot.feeds.push(FeedDescriptor {
                    source: row.source,
                    section: row.section,
                    feed: key.clone(),
                });
                snapshot.items.insert(key.clone(), Some(Vec::new()));
            }
            if let Some(Some(items)) = snapshot.items.get_mut(&key) {
                items.push(row.item);
            }
        }
        snapshot
    }
}

/// An item tagged with the feed it came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Article {
    pub title: String,
    pub description: String,
    pub link: String,
    pub image: Option<String>,
    pub source: String,
    pub section: String,
}

impl Article {
    pub fn from_item(item: &Item, feed: &FeedDescriptor) -> Self {
        Self {
            title: item.title.clone(),
            description: item.description.clone(),
            link: item.link.clone(),
            image: item.image.clone(),
            source: feed.source.clone(),
            section: feed.section.clone(),
        }
    }
}

/// One text field of an article with its entity terms and BM25 vector.
#[derive(Debug, Clone, Serialize)]
pub struct Document {
    text: String,
    terms: Vec<Term>,
    bow: Bow,
}

impl Document {
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn terms(&self) -> &[Term] {
        &self.terms
    }

    pub fn bow(&self) -> &Bow {
        &self.bow
    }

    pub fn stems(&self) -> impl Iterator<Item = &str> {
        self.terms.iter().map(|t| t.stem.as_str())
    }

    pub fn lemmas(&self) -> impl Iterator<Item = &str> {
        self.terms.iter().map(|t| t.lemma.as_str())
    }

    pub fn has_stem(&self, stem: &str) -> bool {
        self.terms.iter().any(|t| t.stem == stem)
    }
}

/// Title document, description document and their article. Identified
/// solely by its position in the [`Corpus`].
#[derive(Debug, Clone, Serialize)]
pub struct DocumentPair {
    pub title: Document,
    pub description: Document,
    pub article: Article,
}

impl DocumentPair {
    pub fn same_source(&self, other: &DocumentPair) -> bool {
        self.article.source == other.article.source
    }
}

/// Key under which titles are considered duplicates: trimmed, lowercased,
/// inner whitespace collapsed.
pub fn dedup_key(title: &str) -> String {
    title
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Flatten a snapshot into articles in feed order, dropping repeated titles
/// (first occurrence wins).
pub fn collect_articles(snapshot: &Snapshot) -> Vec<Article> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut articles = Vec::new();
    let mut duplicates = 0usize;

    for feed in &snapshot.feeds {
        let Some(Some(items)) = snapshot.items.get(&feed.feed) else {
            warn!(
                "Skipping feed with no items - source={}, feed={}",
                feed.source, feed.feed
            );
            continue;
        };
        for item in items {
            if !seen.insert(dedup_key(&item.title)) {
                duplicates += 1;
                continue;
            }
            articles.push(Article::from_item(item, feed));
        }
    }

    debug!(
        "Collected articles - kept={}, duplicates={}",
        articles.len(),
        duplicates
    );
    articles
}

/// The documents of one run together with the state learned from them.
#[derive(Debug, Clone)]
pub struct Corpus {
    pairs: Vec<DocumentPair>,
    lexicon: Lexicon,
    model: Bm25Vectorizer,
}

impl Corpus {
    /// Build from a fetched snapshot.
    pub fn build(snapshot: &Snapshot, annotator: &Annotator) -> Result<Self> {
        Self::from_articles(collect_articles(snapshot), annotator, Bm25Params::default())
    }

    /// Build from articles that are already in corpus order. Repeated titles
    /// are dropped here as well.
    pub fn from_articles(
        articles: Vec<Article>,
        annotator: &Annotator,
        params: Bm25Params,
    ) -> Result<Self> {
        let mut seen: HashSet<String> = HashSet::new();
        let articles: Vec<Article> = articles
            .into_iter()
            .filter(|a| seen.insert(dedup_key(&a.title)))
            .collect();

        let annotated: Vec<(Vec<Term>, Vec<Term>, String)> = articles
            .par_iter()
            .map(|article| {
                let description = annotator.normalize_description(&article.description);
                (
                    annotator.terms(&article.title),
                    annotator.terms(description),
                    description.to_string(),
                )
            })
            .collect();

        let mut lexicon = Lexicon::new();
        let mut model = Bm25Vectorizer::with_params(params);
        for (title_terms, description_terms, _) in &annotated {
            for terms in [title_terms, description_terms] {
                for term in terms {
                    lexicon.record(term);
                }
                model.learn(&stems_of(terms))?;
            }
        }
        model.freeze();

        let mut pairs = Vec::with_capacity(articles.len());
        for (article, (title_terms, description_terms, description)) in
            articles.into_iter().zip(annotated)
        {
            pairs.push(DocumentPair {
                title: vectorize(&model, article.title.clone(), title_terms)?,
                description: vectorize(&model, description, description_terms)?,
                article,
            });
        }

        info!(
            "Corpus built - documents={}, vocabulary={}, display_terms={}",
            pairs.len(),
            model.vocabulary_size(),
            lexicon.len()
        );

        Ok(Self {
            pairs,
            lexicon,
            model,
        })
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&DocumentPair> {
        self.pairs.get(index)
    }

    pub fn pairs(&self) -> &[DocumentPair] {
        &self.pairs
    }

    /// All document indices, in corpus order.
    pub fn indices(&self) -> Vec<usize> {
        (0..self.pairs.len()).collect()
    }

    pub fn lexicon(&self) -> &Lexicon {
        &self.lexicon
    }

    pub fn model(&self) -> &Bm25Vectorizer {
        &self.model
    }

    /// IDF of a stem. The model is frozen during construction.
    pub fn idf(&self, stem: &str) -> f64 {
        self.model.idf(stem).unwrap_or_default()
    }

    /// Titles for a list of document indices.
    pub fn doc_preview(&self, indices: &[usize]) -> Vec<&str> {
        indices
            .iter()
            .filter_map(|&i| self.pairs.get(i))
            .map(|pair| pair.title.text())
            .collect()
    }

    /// Candidates whose title or description satisfies `predicate`, in
    /// candidate order.
    pub fn filter_docs<F>(&self, candidates: &[usize], predicate: F) -> Vec<usize>
    where
        F: Fn(&Document) -> bool,
    {
        candidates
            .iter()
            .copied()
            .filter(|&i| {
                self.pairs
                    .get(i)
                    .is_some_and(|pair| predicate(&pair.title) || predicate(&pair.description))
            })
            .collect()
    }
}

fn vectorize(model: &Bm25Vectorizer, text: String, terms: Vec<Term>) -> Result<Document> {
    let bow = model.weighted_vector(&stems_of(&terms))?;
    Ok(Document { text, terms, bow })
}

fn stems_of(terms: &[Term]) -> Vec<String> {
    terms.iter().map(|t| t.stem.clone()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feed(source: &str, url: &str) -> FeedDescriptor {
        FeedDescriptor {
            source: source.into(),
            section: "Home".into(),
            feed: url.into(),
        }
    }

    fn item(title: &str, description: &str) -> Item {
        Item {
            title: title.into(),
            description: description.into(),
            link: format!("https://example.com/{}", title.len()),
            image: None,
        }
    }

    fn snapshot() -> Snapshot {
        let mut items = HashMap::new();
        items.insert(
            "https://a.example/rss".to_string(),
            Some(vec![
                item(
                    "Storm batters Florida coast",
                    "Hurricane Milton made landfall near Tampa Bay overnight.",
                ),
                item("NASA delays Artemis 2", "short"),
            ]),
        );
        items.insert(
            "https://b.example/rss".to_string(),
            Some(vec![item(
                "storm batters Florida coast ",
                "Another outlet covers the same storm in Florida.",
            )]),
        );
        items.insert("https://c.example/rss".to_string(), None);
        Snapshot {
            feeds: vec![
                feed("Alpha", "https://a.example/rss"),
                feed("Beta", "https://b.example/rss"),
                feed("Gamma", "https://c.example/rss"),
                feed("Delta", "https://missing.example/rss"),
            ],
            items,
        }
    }

    #[test]
    fn dedup_key_normalizes_case_and_whitespace() {
        assert_eq!(dedup_key("  Storm  Hits\tCoast "), "storm hits coast");
    }

    #[test]
    fn collect_drops_duplicates_and_skips_missing_feeds() {
        let articles = collect_articles(&snapshot());
        assert_eq!(articles.len(), 2);
        assert_eq!(articles[0].source, "Alpha");
        assert_eq!(articles[0].section, "Home");
        assert_eq!(articles[1].title, "NASA delays Artemis 2");
    }

    #[test]
    fn build_sets_vectors_for_every_document() {
        let corpus = Corpus::build(&snapshot(), &Annotator::default()).unwrap();
        assert_eq!(corpus.len(), 2);
        assert!(corpus.model().is_ready());
        let first = corpus.get(0).unwrap();
        assert!(first.title.has_stem(" florida "));
        assert_eq!(first.title.bow().len(), first.title.stems().count());
    }

    #[test]
    fn short_description_becomes_empty_document() {
        let corpus = Corpus::build(&snapshot(), &Annotator::default()).unwrap();
        let second = corpus.get(1).unwrap();
        assert_eq!(second.description.text(), "");
        assert!(second.description.terms().is_empty());
        assert!(second.description.bow().is_empty());
    }

    #[test]
    fn filter_docs_checks_both_fields() {
        let corpus = Corpus::build(&snapshot(), &Annotator::default()).unwrap();
        let hits = corpus.filter_docs(&corpus.indices(), |d| d.has_stem(" tampa bay "));
        assert_eq!(hits, vec![0]);
    }

    #[test]
    fn empty_snapshot_builds_empty_corpus() {
        let corpus = Corpus::build(&Snapshot::default(), &Annotator::default()).unwrap();
        assert!(corpus.is_empty());
        assert!(corpus.indices().is_empty());
    }

    #[test]
    fn rows_group_by_feed_then_source() {
        let row = |feed: &str, source: &str, title: &str| FeedRow {
            feed: feed.into(),
            source: source.into(),
            section: "Top".into(),
            item: item(title, ""),
        };
        let snap = Snapshot::from_rows(vec![
            row("https://b.example/rss", "Beta", "one"),
            row("", "Alpha", "two"),
            row("https://b.example/rss", "Beta", "three"),
        ]);
        let feeds: Vec<&str> = snap.feeds.iter().map(|f| f.feed.as_str()).collect();
        assert_eq!(feeds, vec!["https://b.example/rss", "Alpha"]);
        let titles: Vec<String> = collect_articles(&snap).into_iter().map(|a| a.title).collect();
        assert_eq!(titles, vec!["one", "three", "two"]);
    }

    #[test]
    fn snapshot_deserializes_null_feed() {
        let snap: Snapshot = serde_json::from_str(
            r#"{"feeds":[{"source":"A","feed":"u"}],"items":{"u":null}}"#,
        )
        .unwrap();
        assert!(collect_articles(&snap).is_empty());
    }
}

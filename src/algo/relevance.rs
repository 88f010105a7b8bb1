use tracing::debug;

use crate::algo::corpus::Corpus;
use crate::algo::keywords::{doc_keyword_score, KeywordScoreMap, DESCRIPTION_SHARE, TITLE_SHARE};
use crate::algo::pagerank::{PageRank, PageRankConfig, WeightedGraph};
use crate::algo::similarity::SimilarityCache;

/// Keyword weight of one article: title and description scores blended
/// with the keyword-map field shares.
pub fn node_keyword_score(corpus: &Corpus, index: usize, bias: &KeywordScoreMap) -> f64 {
    corpus.get(index).map_or(1.0, |pair| {
        doc_keyword_score(&pair.title, bias) * TITLE_SHARE
            + doc_keyword_score(&pair.description, bias) * DESCRIPTION_SHARE
    })
}

/// Build the similarity graph over `candidates` and run pagerank on it.
///
/// Every candidate is a node even if it has no edges. An edge between `i`
/// and `j` weighs `similarity * scaling * penalty`, where `scaling` is the
/// mean node keyword score of the endpoints (1 without `bias`) and `penalty`
/// is `same_source_penalty` for documents from the same source, else 1.
pub fn rank_documents(
    corpus: &Corpus,
    cache: &mut SimilarityCache,
    candidates: &[usize],
    bias: Option<&KeywordScoreMap>,
    same_source_penalty: f64,
    config: &PageRankConfig,
) -> PageRank {
    cache.fill(corpus, candidates);

    let node_scores: Vec<f64> = match bias {
        Some(map) => candidates
            .iter()
            .map(|&i| node_keyword_score(corpus, i, map))
            .collect(),
        None => vec![1.0; candidates.len()],
    };

    let mut graph = WeightedGraph::new();
    for &index in candidates {
        graph.add_node(index);
    }

    for (a, &i) in candidates.iter().enumerate() {
        for (b, &j) in candidates.iter().enumerate().skip(a + 1) {
            if i == j {
                continue;
            }
            let (Some(pi), Some(pj)) = (corpus.get(i), corpus.get(j)) else {
                continue;
            };
            let similarity = cache.similarity(corpus, i, j);
            let scaling = (node_scores[a] + node_scores[b]) / 2.0;
            let penalty = if pi.same_source(pj) {
                same_source_penalty
            } else {
                1.0
            };
            graph.link(i, j, similarity * scaling * penalty);
        }
    }

    debug!(
        "Relevance graph built - nodes={}, edges={}",
        graph.node_count(),
        graph.edge_count()
    );
    graph.rank(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algo::annotate::Annotator;
    use crate::algo::bm25::Bm25Params;
    use crate::algo::corpus::Article;

    fn article(title: &str, description: &str, source: &str) -> Article {
        Article {
            title: title.into(),
            description: description.into(),
            link: String::new(),
            image: None,
            source: source.into(),
            section: String::new(),
        }
    }

    fn corpus(articles: Vec<Article>) -> Corpus {
        Corpus::from_articles(articles, &Annotator::default(), Bm25Params::default()).unwrap()
    }

    #[test]
    fn unrelated_pair_splits_rank() {
        let c = corpus(vec![
            article("NASA delays Artemis launch", "", "A"),
            article("Taylor Swift tours Europe", "", "B"),
        ]);
        let mut cache = SimilarityCache::new();
        let pr = rank_documents(&c, &mut cache, &[0, 1], None, 0.5, &PageRankConfig::default());
        assert!((pr.ranks[&0] - 0.5).abs() < 1e-6);
        assert!((pr.ranks[&1] - 0.5).abs() < 1e-6);
    }

    #[test]
    fn connected_documents_outrank_isolated_one() {
        let c = corpus(vec![
            article("Joe Biden visits Kyiv", "", "A"),
            article("Joe Biden arrives in Kyiv", "", "B"),
            article("Joe Biden speaks in Kyiv", "", "C"),
            article("Taylor Swift tours Europe", "", "D"),
        ]);
        let mut cache = SimilarityCache::new();
        let pr = rank_documents(
            &c,
            &mut cache,
            &c.indices(),
            None,
            0.5,
            &PageRankConfig::default(),
        );
        assert!(pr.ranks[&0] > pr.ranks[&3]);
        assert!(pr.ranks[&1] > pr.ranks[&3]);
        assert_eq!(cache.len(), 6);
    }

    #[test]
    fn only_candidates_are_ranked() {
        let c = corpus(vec![
            article("Joe Biden visits Kyiv", "", "A"),
            article("Joe Biden arrives in Kyiv", "", "B"),
            article("Taylor Swift tours Europe", "", "C"),
        ]);
        let mut cache = SimilarityCache::new();
        let pr = rank_documents(&c, &mut cache, &[0, 1], None, 0.5, &PageRankConfig::default());
        assert_eq!(pr.ranks.len(), 2);
        assert!(!pr.ranks.contains_key(&2));
    }

    #[test]
    fn neutral_bias_scores_one() {
        let c = corpus(vec![article("Joe Biden visits Kyiv", "", "A")]);
        let neutral = KeywordScoreMap::new(0.0);
        assert!((node_keyword_score(&c, 0, &neutral) - 1.0).abs() < 1e-12);
    }
}

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use nu_plugin_storyline::algo::annotate::Annotator;
use nu_plugin_storyline::algo::bm25::Bm25Params;
use nu_plugin_storyline::algo::corpus::{Article, Corpus};
use nu_plugin_storyline::algo::extract::{extract_clusters, ClusterConfig};
use nu_plugin_storyline::algo::similarity::SimilarityCache;

/// Generate synthetic headlines over a handful of recurring stories.
fn generate_articles(n: usize) -> Vec<Article> {
    let stories = [
        ("Joe Biden", "Kyiv", "Volodymyr Zelensky"),
        ("NASA", "Artemis 2", "Kennedy Space Center"),
        ("Taylor Swift", "Europe", "Eras Tour"),
        ("Federal Reserve", "Wall Street", "Jerome Powell"),
        ("Hurricane Milton", "Florida", "Tampa Bay"),
        ("Premier League", "Manchester City", "Erling Haaland"),
        ("Apple", "Cupertino", "Tim Cook"),
        ("European Union", "Brussels", "Ursula von der Leyen"),
    ];
    let sources = ["Alpha", "Beta", "Gamma", "Delta", "Epsilon"];
    (0..n)
        .map(|i| {
            let (who, place, other) = stories[i % stories.len()];
            Article {
                title: format!("{who} update {i} from {place}"),
                description: format!(
                    "Reporters said {other} commented on {who} in {place} during briefing {i}."
                ),
                link: format!("https://news.example/{i}"),
                image: None,
                source: sources[i % sources.len()].into(),
                section: "World".into(),
            }
        })
        .collect()
}

fn bench_annotate(c: &mut Criterion) {
    let annotator = Annotator::default();
    let text = "the president met Volodymyr Zelensky and Joe Biden in Kyiv on Monday, officials said.";
    c.bench_function("annotate/terms", |b| {
        b.iter(|| annotator.terms(black_box(text)))
    });
}

fn bench_corpus_build(c: &mut Criterion) {
    let annotator = Annotator::default();
    let mut group = c.benchmark_group("corpus/build");
    for n in [100, 500] {
        let articles = generate_articles(n);
        group.bench_with_input(BenchmarkId::from_parameter(n), &articles, |b, articles| {
            b.iter(|| Corpus::from_articles(articles.clone(), &annotator, Bm25Params::default()))
        });
    }
    group.finish();
}

fn bench_similarity(c: &mut Criterion) {
    let corpus = Corpus::from_articles(
        generate_articles(300),
        &Annotator::default(),
        Bm25Params::default(),
    )
    .unwrap();
    let nodes = corpus.indices();
    c.bench_function("similarity/fill_300", |b| {
        b.iter(|| {
            let mut cache = SimilarityCache::new();
            cache.fill(&corpus, black_box(&nodes));
            cache.len()
        })
    });
}

fn bench_extract(c: &mut Criterion) {
    let corpus = Corpus::from_articles(
        generate_articles(300),
        &Annotator::default(),
        Bm25Params::default(),
    )
    .unwrap();
    let config = ClusterConfig::default();
    c.bench_function("extract/300_articles", |b| {
        b.iter(|| extract_clusters(black_box(&corpus), &config).len())
    });
}

criterion_group!(
    benches,
    bench_annotate,
    bench_corpus_build,
    bench_similarity,
    bench_extract
);
criterion_main!(benches);

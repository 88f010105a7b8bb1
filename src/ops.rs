//! Shared operation wrappers for all interfaces (CLI, plugin).
//!
//! Each `op_*` function is a synchronous wrapper around the `algo` modules.
//! Input and output are `serde_json::Value`, with no dependency on clap or
//! nu-plugin.

use serde_json::{json, Value};

use crate::algo::annotate::Annotator;
use crate::algo::corpus::{Corpus, FeedRow, Item, Snapshot};
use crate::algo::extract::{extract_clusters, ClusterConfig};
use crate::algo::keywords::{empty_keyword_map, keyword_map, top_from_map};
use crate::error::{Result, StorylineError};

// ── Helpers ──────────────────────────────────────────────────────────────────

/// Extract a text field from a JSON object, returning "" if missing.
pub fn get_text(row: &Value, field: &str) -> String {
    row.get(field)
        .and_then(|v| v.as_str())
        .unwrap_or("")
        .to_string()
}

/// Decode a snapshot. Accepts either the `{feeds, items}` object or a flat
/// array of rows carrying `feed`/`source`/`section` next to the item fields.
pub fn parse_snapshot(input: &Value) -> Result<Snapshot> {
    match input {
        Value::Array(rows) => Ok(snapshot_from_rows(rows)),
        Value::Object(_) => Ok(serde_json::from_value(input.clone())?),
        other => Err(StorylineError::InvalidSnapshot(format!(
            "expected an object or an array, got {}",
            type_name(other)
        ))),
    }
}

/// Group flat JSON rows into a snapshot. Rows without a source are filed
/// under "unknown".
pub fn snapshot_from_rows(rows: &[Value]) -> Snapshot {
    Snapshot::from_rows(rows.iter().map(|row| {
        let source = get_text(row, "source");
        FeedRow {
            feed: get_text(row, "feed"),
            source: if source.is_empty() {
                "unknown".into()
            } else {
                source
            },
            section: get_text(row, "section"),
            item: Item {
                title: get_text(row, "title"),
                description: get_text(row, "description"),
                link: get_text(row, "link"),
                image: row
                    .get("image")
                    .and_then(Value::as_str)
                    .map(str::to_string),
            },
        }
    }))
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

fn build_corpus(input: &Value) -> Result<Corpus> {
    let snapshot = parse_snapshot(input)?;
    Corpus::build(&snapshot, &Annotator::default())
}

// ── Operations ───────────────────────────────────────────────────────────────

/// Cluster a snapshot; one JSON report per round.
pub fn op_clusters(input: &Value, config: &ClusterConfig) -> Result<Value> {
    config.validate()?;
    let corpus = build_corpus(input)?;
    let reports: Vec<Value> = extract_clusters(&corpus, config)
        .iter()
        .map(|cluster| serde_json::to_value(cluster.report()))
        .collect::<std::result::Result<_, _>>()?;
    Ok(Value::Array(reports))
}

/// Cluster a snapshot and render the plain-text listing.
pub fn op_clusters_text(input: &Value, config: &ClusterConfig) -> Result<String> {
    config.validate()?;
    let corpus = build_corpus(input)?;
    Ok(extract_clusters(&corpus, config)
        .iter()
        .map(ToString::to_string)
        .collect())
}

/// Entity terms of one text, in order of appearance.
pub fn op_entities(text: &str) -> Value {
    let terms = Annotator::default().terms(text);
    Value::Array(
        terms
            .iter()
            .map(|t| {
                json!({
                    "text": t.text.trim(),
                    "lemma": t.lemma.trim(),
                    "stem": t.stem.trim(),
                })
            })
            .collect(),
    )
}

/// Top keywords of the whole corpus, scored the way the first extraction
/// round scores them.
pub fn op_keywords(input: &Value, count: usize) -> Result<Value> {
    let corpus = build_corpus(input)?;
    if corpus.is_empty() {
        return Err(StorylineError::EmptyInput(
            "snapshot contains no articles".into(),
        ));
    }
    let all = corpus.indices();
    let seed = empty_keyword_map(&corpus, &all);
    let scores = keyword_map(&corpus, &all, None, Some(&seed), true);
    let top = top_from_map(&scores, Some(count));

    Ok(Value::Array(
        top.iter()
            .map(|stem| {
                let documents = corpus.filter_docs(&all, |d| d.has_stem(stem)).len();
                json!({
                    "keyword": corpus.lexicon().display(stem),
                    "stem": stem.trim(),
                    "score": scores.get(stem).copied().unwrap_or_default(),
                    "documents": documents,
                })
            })
            .collect(),
    ))
}

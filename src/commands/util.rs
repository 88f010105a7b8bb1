use nu_protocol::{PipelineData, Record, Span, Value};

use crate::algo::corpus::{FeedRow, Item};
use crate::algo::extract::ClusterReport;

/// Normalize any PipelineData into a Vec<Value> of records.
///
/// Handles:
///   - Table (list of records) → pass through
///   - Single record → [record]
///   - List of strings → [{title: s1}, {title: s2}, ...]
///   - Single string → [{title: s}]
///   - Empty/Nothing → []
pub fn normalize_input(input: PipelineData, span: Span) -> Vec<Value> {
    match input {
        PipelineData::Value(value, _) => normalize_value(value, span),
        other => {
            let values: Vec<Value> = other.into_iter().collect();
            if matches!(values.first(), Some(Value::Record { .. })) {
                values
            } else {
                values.into_iter().map(|v| wrap_value(v, span)).collect()
            }
        }
    }
}

fn normalize_value(value: Value, span: Span) -> Vec<Value> {
    match value {
        Value::List { vals, .. } => {
            if matches!(vals.first(), Some(Value::Record { .. })) {
                vals
            } else {
                vals.into_iter().map(|v| wrap_value(v, span)).collect()
            }
        }
        Value::Record { .. } => vec![value],
        Value::Nothing { .. } => vec![],
        other => vec![wrap_value(other, span)],
    }
}

/// Bare values become the title of an otherwise empty row.
fn wrap_value(v: Value, span: Span) -> Value {
    let mut record = Record::new();
    record.push("title", v);
    Value::record(record, span)
}

/// String content of a column, if present and convertible.
pub fn get_string(row: &Value, column: &str) -> Option<String> {
    row.get_data_by_key(column)
        .and_then(|v| v.coerce_string().ok())
}

/// One pipeline row as a feed item. Rows without a source are filed under
/// "unknown".
pub fn feed_row(row: &Value) -> FeedRow {
    let text = |column: &str| get_string(row, column).unwrap_or_default();
    FeedRow {
        feed: text("feed"),
        source: get_string(row, "source")
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| "unknown".into()),
        section: text("section"),
        item: Item {
            title: text("title"),
            description: text("description"),
            link: text("link"),
            image: get_string(row, "image").filter(|s| !s.is_empty()),
        },
    }
}

pub fn report_to_value(report: &ClusterReport, span: Span) -> Value {
    let keywords: Vec<Value> = report
        .keywords
        .iter()
        .map(|k| Value::string(k, span))
        .collect();

    let members: Vec<Value> = report
        .members
        .iter()
        .map(|m| {
            let mut r = Record::new();
            r.push("index", Value::int(m.index as i64, span));
            r.push("rank", Value::float(m.rank, span));
            r.push("title", Value::string(&m.title, span));
            r.push("link", Value::string(&m.link, span));
            r.push("source", Value::string(&m.source, span));
            r.push("section", Value::string(&m.section, span));
            r.push(
                "image",
                m.image
                    .as_ref()
                    .map_or(Value::nothing(span), |i| Value::string(i, span)),
            );
            Value::record(r, span)
        })
        .collect();

    let candidates: Vec<Value> = report
        .candidates
        .iter()
        .map(|&i| Value::int(i as i64, span))
        .collect();

    let mut record = Record::new();
    record.push("cluster", Value::int(report.index as i64 + 1, span));
    record.push("keywords", Value::list(keywords, span));
    record.push("shown", Value::int(report.shown as i64, span));
    record.push("total", Value::int(report.total as i64, span));
    record.push("members", Value::list(members, span));
    record.push("candidates", Value::list(candidates, span));
    Value::record(record, span)
}

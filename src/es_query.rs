use serde_json::{Map, Value};

use crate::filter::{ResolvedFilter, TimeRange};

/// Exact match against the keyword sub-field.
pub fn term_keyword(field: &str, value: &str) -> Value {
    let mut term = Map::new();
    term.insert(format!("{field}.keyword"), Value::String(value.to_string()));
    serde_json::json!({ "term": term })
}

/// Analyzed free-text match against the field itself.
pub fn match_field(field: &str, value: &str) -> Value {
    let mut clause = Map::new();
    clause.insert(field.to_string(), Value::String(value.to_string()));
    serde_json::json!({ "match": clause })
}

/// Range clause over `time_stamp`, with only the bounded sides present.
/// `None` when the range carries no bound at all.
pub fn ts_range(range: &TimeRange) -> Option<Value> {
    if range.is_unbounded() {
        return None;
    }
    let mut bounds = Map::new();
    if let Some(start) = &range.start {
        bounds.insert("gte".to_string(), Value::String(start.clone()));
    }
    if let Some(end) = &range.end {
        bounds.insert("lte".to_string(), Value::String(end.clone()));
    }
    bounds.insert(
        "format".to_string(),
        Value::String("strict_date_optional_time".to_string()),
    );
    Some(serde_json::json!({ "range": { "time_stamp": bounds } }))
}

/// Full `_search` body: the filter's clauses ANDed together (or
/// `match_all` when the filter is empty), newest first, capped at `size`.
pub fn search_body(filter: &ResolvedFilter, size: usize) -> Value {
    let mut must: Vec<Value> = Vec::new();
    for (field, value) in &filter.exact {
        must.push(term_keyword(field, value));
    }
    if let Some((field, value)) = &filter.text {
        must.push(match_field(field, value));
    }
    if let Some(range) = ts_range(&filter.range) {
        must.push(range);
    }

    let query = if must.is_empty() {
        serde_json::json!({ "match_all": {} })
    } else {
        serde_json::json!({ "bool": { "must": must } })
    };

    serde_json::json!({
        "query": query,
        "sort": [{ "time_stamp": { "order": "desc" } }],
        "size": size
    })
}

/// Zero-hit terms aggregation listing the distinct values of a keyword
/// field.
pub fn keyword_terms_agg_body(field: &str, size: usize) -> Value {
    let mut terms = Map::new();
    terms.insert(
        "field".to_string(),
        Value::String(format!("{field}.keyword")),
    );
    terms.insert("size".to_string(), Value::from(size));
    serde_json::json!({
        "size": 0,
        "aggs": { "unique_values": { "terms": terms } }
    })
}

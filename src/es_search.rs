use std::sync::Arc;

use anyhow::Result;
use serde::Deserialize;
use serde_json::Value;

use crate::es_http::EsHttp;
use crate::es_query;
use crate::filter::ResolvedFilter;
use crate::types::RawEvent;

const API_NAME_AGG_SIZE: usize = 1000;
const STATE_AGG_SIZE: usize = 10;

#[derive(Debug, Deserialize)]
struct SearchResp {
    #[serde(default)]
    hits: HitsEnvelope,
}

#[derive(Debug, Default, Deserialize)]
struct HitsEnvelope {
    #[serde(default)]
    hits: Vec<Hit>,
}

#[derive(Debug, Deserialize)]
struct Hit {
    #[serde(rename = "_source")]
    source: RawEvent,
}

/// Read-only client for the event index. Sorting is requested newest
/// first, but consumers must not depend on it; the aggregation stage
/// recomputes per-group extremes itself.
#[derive(Clone)]
pub struct EventSearch {
    http: EsHttp,
    index: Arc<str>,
    search_size: usize,
    api_search_size: usize,
}

impl EventSearch {
    pub fn new(
        http: EsHttp,
        index: impl Into<Arc<str>>,
        search_size: usize,
        api_search_size: usize,
    ) -> Self {
        Self {
            http,
            index: index.into(),
            search_size,
            api_search_size,
        }
    }

    fn search_path(&self) -> String {
        format!("{}/_search", self.index)
    }

    /// Run one filtered search, capped at the standard result size.
    pub async fn search(&self, filter: &ResolvedFilter) -> Result<Vec<RawEvent>> {
        let body = es_query::search_body(filter, self.search_size);
        self.fetch_hits(&body, "es filtered search").await
    }

    /// Every event carrying the given correlation id (drill-down view).
    pub async fn events_for_correlation(&self, correlation_id: &str) -> Result<Vec<RawEvent>> {
        let filter = ResolvedFilter {
            exact: vec![("correlationid".to_string(), correlation_id.to_string())],
            ..Default::default()
        };
        let body = es_query::search_body(&filter, self.search_size);
        self.fetch_hits(&body, "es correlation search").await
    }

    /// Every event for one API name. Uses the wider cap so hourly charts
    /// see the full recent history.
    pub async fn events_for_api(&self, api_name: &str) -> Result<Vec<RawEvent>> {
        let filter = ResolvedFilter {
            exact: vec![("api_name".to_string(), api_name.to_string())],
            ..Default::default()
        };
        let body = es_query::search_body(&filter, self.api_search_size);
        self.fetch_hits(&body, "es api search").await
    }

    /// Distinct API names present in the index, sorted.
    pub async fn api_names(&self) -> Result<Vec<String>> {
        self.keyword_values("api_name", API_NAME_AGG_SIZE).await
    }

    /// Distinct lifecycle states present in the index, sorted.
    pub async fn states(&self) -> Result<Vec<String>> {
        self.keyword_values("state", STATE_AGG_SIZE).await
    }

    async fn fetch_hits(&self, body: &Value, context: &'static str) -> Result<Vec<RawEvent>> {
        let parsed: SearchResp = self.http.post_json(&self.search_path(), body, context).await?;
        Ok(parsed.hits.hits.into_iter().map(|h| h.source).collect())
    }

    async fn keyword_values(&self, field: &str, size: usize) -> Result<Vec<String>> {
        let body = es_query::keyword_terms_agg_body(field, size);
        let parsed: Value = self
            .http
            .post_json(&self.search_path(), &body, "es terms aggregation")
            .await?;
        let mut values: Vec<String> = parsed
            .pointer("/aggregations/unique_values/buckets")
            .and_then(Value::as_array)
            .map(|buckets| {
                buckets
                    .iter()
                    .filter_map(|b| b.get("key").and_then(Value::as_str))
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();
        values.sort();
        Ok(values)
    }
}

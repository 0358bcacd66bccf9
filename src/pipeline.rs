use std::collections::BTreeMap;

use chrono::{DateTime, Timelike, Utc};
use chrono_tz::Tz;
use tracing::{info, warn};

use crate::aggregate::{reduce_by_correlation, CorrelationSummary, MissingKeyPolicy};
use crate::error::PipelineError;
use crate::es_search::EventSearch;
use crate::filter::{self, ResolvedFilter, SearchCriteria, WindowPolicy};
use crate::normalize::{self, TARGET_ZONE};
use crate::types::{HourlyStateCount, RawEvent, ReducedRecord};

/// The whole correlation pipeline behind one handle: resolve criteria,
/// run the search, normalize timestamps, reduce per correlation id. One
/// instance per process, cloneable across request handlers; every call is
/// request-scoped with no shared mutable state.
#[derive(Clone)]
pub struct Pipeline {
    search: EventSearch,
    missing_key_policy: MissingKeyPolicy,
}

impl Pipeline {
    pub fn new(search: EventSearch, missing_key_policy: MissingKeyPolicy) -> Self {
        Self {
            search,
            missing_key_policy,
        }
    }

    /// Interactive search: one reduced record per correlation id among
    /// the matching events. An empty or all-invalid batch is an empty
    /// result, not an error.
    pub async fn search(
        &self,
        criteria: &SearchCriteria,
    ) -> Result<Vec<ReducedRecord>, PipelineError> {
        self.search_at(criteria, now_eastern()).await
    }

    /// Same as [`Pipeline::search`] with an explicit clock.
    pub async fn search_at(
        &self,
        criteria: &SearchCriteria,
        now: DateTime<Tz>,
    ) -> Result<Vec<ReducedRecord>, PipelineError> {
        let resolved = filter::resolve(criteria, WindowPolicy::Interactive, now);
        let events = self.fetch_normalized(&resolved, "search").await?;
        let summaries = reduce_by_correlation(&events, self.missing_key_policy);
        info!(groups = summaries.len(), "search: reduced correlation groups");
        Ok(summaries.into_iter().map(to_record).collect())
    }

    /// Date-range listing: raw records, newest first, defaulting to the
    /// last 24 hours when no bounds are given.
    pub async fn list_window(
        &self,
        start: Option<String>,
        end: Option<String>,
    ) -> Result<Vec<RawEvent>, PipelineError> {
        self.list_window_at(start, end, now_eastern()).await
    }

    /// Same as [`Pipeline::list_window`] with an explicit clock.
    pub async fn list_window_at(
        &self,
        start: Option<String>,
        end: Option<String>,
        now: DateTime<Tz>,
    ) -> Result<Vec<RawEvent>, PipelineError> {
        let resolved = ResolvedFilter {
            range: filter::resolve_listing(start, end, now),
            ..Default::default()
        };
        self.search
            .search(&resolved)
            .await
            .map_err(PipelineError::upstream)
    }

    /// Every raw event for one correlation id, passthrough fields intact.
    pub async fn correlation_details(
        &self,
        correlation_id: &str,
    ) -> Result<Vec<RawEvent>, PipelineError> {
        self.search
            .events_for_correlation(correlation_id)
            .await
            .map_err(PipelineError::upstream)
    }

    /// Distinct API names in the index, sorted.
    pub async fn api_names(&self) -> Result<Vec<String>, PipelineError> {
        self.search.api_names().await.map_err(PipelineError::upstream)
    }

    /// Distinct lifecycle states in the index, sorted.
    pub async fn states(&self) -> Result<Vec<String>, PipelineError> {
        self.search.states().await.map_err(PipelineError::upstream)
    }

    /// Hour-of-day by state counts for one API, for activity charting.
    /// Events without a state are skipped.
    pub async fn hourly_state_counts(
        &self,
        api_name: &str,
    ) -> Result<Vec<HourlyStateCount>, PipelineError> {
        let raw = self
            .search
            .events_for_api(api_name)
            .await
            .map_err(PipelineError::upstream)?;
        let (events, dropped) = normalize::normalize_batch(raw);
        if dropped > 0 {
            warn!(dropped, api_name, "chart: dropped events with unusable timestamps");
        }

        let mut buckets: BTreeMap<(u32, String), u64> = BTreeMap::new();
        for ev in events {
            let Some(state) = ev.state else { continue };
            *buckets.entry((ev.instant.hour(), state)).or_insert(0) += 1;
        }
        Ok(buckets
            .into_iter()
            .map(|((hour, state), count)| HourlyStateCount { hour, state, count })
            .collect())
    }

    async fn fetch_normalized(
        &self,
        resolved: &ResolvedFilter,
        op: &'static str,
    ) -> Result<Vec<crate::types::NormalizedEvent>, PipelineError> {
        let raw = self
            .search
            .search(resolved)
            .await
            .map_err(PipelineError::upstream)?;
        info!(hits = raw.len(), "{op}: fetched raw batch");
        let (events, dropped) = normalize::normalize_batch(raw);
        if dropped > 0 {
            warn!(dropped, "{op}: dropped events with unusable timestamps");
        }
        Ok(events)
    }
}

fn now_eastern() -> DateTime<Tz> {
    Utc::now().with_timezone(&TARGET_ZONE)
}

fn to_record(summary: CorrelationSummary) -> ReducedRecord {
    let rep = summary.representative;
    ReducedRecord {
        correlation_id: rep.correlation_id,
        api_name: rep.api_name,
        time_stamp: normalize::format_display(&rep.instant),
        state: rep.state,
        total_time_taken: summary.total_time_taken,
    }
}

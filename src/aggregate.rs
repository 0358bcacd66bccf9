use std::collections::HashMap;

use serde::Deserialize;

use crate::duration::format_duration;
use crate::types::NormalizedEvent;

/// How events lacking a correlation id are treated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MissingKeyPolicy {
    /// Exclude ungroupable events from the output entirely.
    #[default]
    Drop,
    /// Keep each ungroupable event as its own singleton group. Such
    /// groups are never merged with each other.
    Isolate,
}

impl MissingKeyPolicy {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "drop" => Some(Self::Drop),
            "isolate" => Some(Self::Isolate),
            _ => None,
        }
    }
}

/// One correlation group collapsed to its representative event plus the
/// group's elapsed span.
#[derive(Debug, Clone)]
pub struct CorrelationSummary {
    pub representative: NormalizedEvent,
    pub duration_seconds: f64,
    pub total_time_taken: String,
}

/// Member indices tracking one group's extremes while scanning the input.
#[derive(Clone, Copy)]
struct Span {
    rep: usize,
    min: usize,
    max: usize,
}

/// Collapse normalized events into one summary per correlation id.
///
/// The representative is the member with the latest instant; among equal
/// instants the one seen earliest in the input wins. Both choices make the
/// result a function of the input multiset alone, independent of whatever
/// order the search backend returned it in. Output is sorted newest
/// representative first, ties again by input position.
pub fn reduce_by_correlation(
    events: &[NormalizedEvent],
    policy: MissingKeyPolicy,
) -> Vec<CorrelationSummary> {
    let mut table: HashMap<&str, Span> = HashMap::new();
    let mut isolated: Vec<Span> = Vec::new();

    for (idx, ev) in events.iter().enumerate() {
        match ev.correlation_id.as_deref() {
            Some(key) => match table.get_mut(key) {
                Some(span) => {
                    if ev.instant > events[span.rep].instant {
                        span.rep = idx;
                    }
                    if ev.instant < events[span.min].instant {
                        span.min = idx;
                    }
                    if ev.instant > events[span.max].instant {
                        span.max = idx;
                    }
                }
                None => {
                    let span = Span {
                        rep: idx,
                        min: idx,
                        max: idx,
                    };
                    table.insert(key, span);
                }
            },
            None => match policy {
                MissingKeyPolicy::Drop => {}
                MissingKeyPolicy::Isolate => isolated.push(Span {
                    rep: idx,
                    min: idx,
                    max: idx,
                }),
            },
        }
    }

    let mut spans: Vec<Span> = table.into_values().chain(isolated).collect();
    spans.sort_by(|a, b| {
        events[b.rep]
            .instant
            .cmp(&events[a.rep].instant)
            .then(a.rep.cmp(&b.rep))
    });

    spans
        .into_iter()
        .map(|span| {
            let duration_seconds = span_seconds(events, span);
            CorrelationSummary {
                representative: events[span.rep].clone(),
                duration_seconds,
                total_time_taken: format_duration(duration_seconds),
            }
        })
        .collect()
}

fn span_seconds(events: &[NormalizedEvent], span: Span) -> f64 {
    let elapsed = events[span.max].instant - events[span.min].instant;
    match elapsed.num_microseconds() {
        Some(us) => us as f64 / 1_000_000.0,
        None => elapsed.num_milliseconds() as f64 / 1_000.0,
    }
}

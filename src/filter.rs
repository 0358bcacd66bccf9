use chrono::{DateTime, Duration};
use chrono_tz::Tz;
use serde::Deserialize;

/// Caller-supplied criteria for one interactive search. All fields are
/// optional; present ones are ANDed together. Field names match the wire
/// request the surrounding handler receives.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchCriteria {
    #[serde(rename = "correlationid", default)]
    pub correlation_id: Option<String>,
    #[serde(default)]
    pub api_name: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    /// Free-text match: the field to search in.
    #[serde(default)]
    pub search_type: Option<String>,
    /// Free-text match: the value to search for.
    #[serde(default)]
    pub search_value: Option<String>,
    /// Relative window token (`30min` | `1hr` | `6hr`) or `custom`.
    #[serde(default)]
    pub timestamp_filter: Option<String>,
    #[serde(default)]
    pub custom_start_time: Option<String>,
    #[serde(default)]
    pub custom_end_time: Option<String>,
}

impl SearchCriteria {
    /// Decode the wire time-filter fields into a window request. A token
    /// outside the known set keeps only the end-at-now bound.
    pub fn window(&self) -> TimeWindowSpec {
        match self.timestamp_filter.as_deref() {
            Some("custom") => TimeWindowSpec::Custom {
                start: self.custom_start_time.clone(),
                end: self.custom_end_time.clone(),
            },
            Some(token) => match RelativeWindow::parse(token) {
                Some(rel) => TimeWindowSpec::Relative(rel),
                None => TimeWindowSpec::UpToNow,
            },
            None => TimeWindowSpec::Unbounded,
        }
    }
}

/// A requested time window, before policy defaults are applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimeWindowSpec {
    /// No time bound requested.
    Unbounded,
    /// Lookback token: the window is `[now - lookback, now]`.
    Relative(RelativeWindow),
    /// Bounded above at now, unbounded below. Produced by time-filter
    /// tokens outside the known set.
    UpToNow,
    /// Caller-supplied bounds passed through verbatim.
    Custom {
        start: Option<String>,
        end: Option<String>,
    },
}

/// The fixed set of relative lookback tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelativeWindow {
    Last30Min,
    LastHour,
    Last6Hours,
}

impl RelativeWindow {
    pub fn parse(token: &str) -> Option<Self> {
        match token {
            "30min" => Some(Self::Last30Min),
            "1hr" => Some(Self::LastHour),
            "6hr" => Some(Self::Last6Hours),
            _ => None,
        }
    }

    fn lookback(self) -> Duration {
        match self {
            Self::Last30Min => Duration::minutes(30),
            Self::LastHour => Duration::hours(1),
            Self::Last6Hours => Duration::hours(6),
        }
    }
}

/// Which default applies when a request carries no time bounds. The two
/// entry points have always disagreed on this; both behaviors are kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowPolicy {
    /// Interactive search: no time criteria means no time bound at all.
    Interactive,
    /// Unfiltered listing: no time criteria means the last 24 hours.
    DefaultListing,
}

/// Resolved time bounds, ready to drop into a range clause. `None` on a
/// side leaves that side unbounded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TimeRange {
    pub start: Option<String>,
    pub end: Option<String>,
}

impl TimeRange {
    pub fn is_unbounded(&self) -> bool {
        self.start.is_none() && self.end.is_none()
    }
}

/// Structured conjunctive filter handed to the search client. Pure data;
/// rendering into a query body happens in `es_query`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedFilter {
    /// Exact-match clauses on keyword fields: `(field, value)`.
    pub exact: Vec<(String, String)>,
    /// At most one free-text match clause: `(field, value)`.
    pub text: Option<(String, String)>,
    /// Resolved time bounds; unbounded sides are omitted from the query.
    pub range: TimeRange,
}

impl ResolvedFilter {
    pub fn is_empty(&self) -> bool {
        self.exact.is_empty() && self.text.is_none() && self.range.is_unbounded()
    }
}

/// Resolve interactive-search criteria against `now` (taken in the target
/// zone by the caller).
pub fn resolve(criteria: &SearchCriteria, policy: WindowPolicy, now: DateTime<Tz>) -> ResolvedFilter {
    let mut exact = Vec::new();
    if let Some(v) = non_empty(&criteria.api_name) {
        exact.push(("api_name".to_string(), v));
    }
    if let Some(v) = non_empty(&criteria.correlation_id) {
        exact.push(("correlationid".to_string(), v));
    }
    if let Some(v) = non_empty(&criteria.state) {
        exact.push(("state".to_string(), v));
    }
    let text = match (
        non_empty(&criteria.search_type),
        non_empty(&criteria.search_value),
    ) {
        (Some(field), Some(value)) => Some((field, value)),
        _ => None,
    };
    let range = resolve_window(&criteria.window(), policy, now);
    ResolvedFilter { exact, text, range }
}

/// Resolve a window request under one of the two policies.
pub fn resolve_window(spec: &TimeWindowSpec, policy: WindowPolicy, now: DateTime<Tz>) -> TimeRange {
    match spec {
        TimeWindowSpec::Relative(rel) => TimeRange {
            start: Some((now - rel.lookback()).to_rfc3339()),
            end: Some(now.to_rfc3339()),
        },
        TimeWindowSpec::UpToNow => TimeRange {
            start: None,
            end: Some(now.to_rfc3339()),
        },
        TimeWindowSpec::Custom { start, end } => TimeRange {
            start: start.clone(),
            end: end.clone(),
        },
        TimeWindowSpec::Unbounded => match policy {
            WindowPolicy::Interactive => TimeRange::default(),
            WindowPolicy::DefaultListing => TimeRange {
                start: Some((now - Duration::hours(24)).to_rfc3339()),
                end: Some(now.to_rfc3339()),
            },
        },
    }
}

/// Resolve the date-range listing entrypoint's optional bounds: verbatim
/// when either side is given, the 24-hour default when neither is.
pub fn resolve_listing(
    start: Option<String>,
    end: Option<String>,
    now: DateTime<Tz>,
) -> TimeRange {
    let start = start.filter(|s| !s.is_empty());
    let end = end.filter(|s| !s.is_empty());
    let spec = if start.is_none() && end.is_none() {
        TimeWindowSpec::Unbounded
    } else {
        TimeWindowSpec::Custom { start, end }
    };
    resolve_window(&spec, WindowPolicy::DefaultListing, now)
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value.as_ref().filter(|s| !s.is_empty()).cloned()
}

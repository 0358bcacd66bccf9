use chrono::DateTime;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One `_source` document from the event index, exactly as the search
/// backend returned it. Fields the pipeline does not interpret ride along
/// in `extra` and survive untouched into raw listings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawEvent {
    #[serde(rename = "correlationid", default)]
    pub correlation_id: Option<String>,
    #[serde(default)]
    pub api_name: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub time_stamp: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// An event whose raw timestamp has been replaced by an instant in the
/// target zone. Lives only for the duration of one request.
#[derive(Debug, Clone)]
pub struct NormalizedEvent {
    pub correlation_id: Option<String>,
    pub api_name: Option<String>,
    pub state: Option<String>,
    pub instant: DateTime<Tz>,
    pub extra: Map<String, Value>,
}

/// One row of the aggregated search response: the representative event of
/// a correlation group plus the group's formatted elapsed time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReducedRecord {
    #[serde(rename = "correlationid")]
    pub correlation_id: Option<String>,
    pub api_name: Option<String>,
    pub time_stamp: String,
    pub state: Option<String>,
    pub total_time_taken: String,
}

/// Event count for one (hour-of-day, state) bucket of a single API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HourlyStateCount {
    pub hour: u32,
    pub state: String,
    pub count: u64,
}

use chrono::{DateTime, FixedOffset, LocalResult, NaiveDate, NaiveDateTime, TimeZone};
use chrono_tz::Tz;
use thiserror::Error;
use tracing::debug;

use crate::types::{NormalizedEvent, RawEvent};

/// Civil timezone every displayed timestamp is normalized into.
pub const TARGET_ZONE: Tz = chrono_tz::US::Eastern;

/// Label appended to display timestamps. The dashboard has always pinned
/// it to EST, so summer (EDT) instants carry it too.
pub const DISPLAY_SUFFIX: &str = " EST";

const EASTERN_STD_OFFSET_SECS: i32 = -5 * 3600;
const EASTERN_DST_OFFSET_SECS: i32 = -4 * 3600;

const NAIVE_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

const OFFSET_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f%#z", "%Y-%m-%d %H:%M:%S%.f%#z"];

/// Why a record's timestamp could not be normalized.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("record has no timestamp")]
    Missing,
    #[error("unrecognized timestamp {0:?}")]
    Unrecognized(String),
    #[error("wall clock {0:?} does not exist in the target zone")]
    NonexistentLocal(String),
}

/// Parse a raw timestamp and express it in [`TARGET_ZONE`].
///
/// Values without an explicit UTC offset are assumed to be UTC. Values
/// whose offset is exactly -05:00 or -04:00 (the Eastern standard and
/// daylight offsets) are taken to be Eastern wall-clock readings already:
/// the zone tag is swapped without touching the wall clock. Everything
/// else is converted, which keeps the instant and shifts the wall clock.
///
/// The offset test cannot tell a genuinely non-Eastern reading at -05:00
/// or -04:00 (UTC data recorded hours earlier, Bogota, Atlantic daylight
/// time) from an Eastern one, and relabels both. Downstream output depends
/// on this branching, so it stays as is; callers that need the conversion
/// reading must supply an offset outside the Eastern pair.
///
/// Relabeling can land on a wall clock the target zone skips (the
/// spring-forward gap); that value is reported as invalid. A wall clock
/// the zone repeats (the fall-back hour) takes the earlier reading.
pub fn to_eastern(raw: &str) -> Result<DateTime<Tz>, ParseError> {
    let parsed = parse_any(raw).ok_or_else(|| ParseError::Unrecognized(raw.to_string()))?;
    let offset_secs = parsed.offset().local_minus_utc();
    if offset_secs == EASTERN_STD_OFFSET_SECS || offset_secs == EASTERN_DST_OFFSET_SECS {
        relabel(parsed).ok_or_else(|| ParseError::NonexistentLocal(raw.to_string()))
    } else {
        Ok(parsed.with_timezone(&TARGET_ZONE))
    }
}

/// Normalize one record, replacing its raw timestamp with an Eastern
/// instant.
pub fn normalize_event(raw: RawEvent) -> Result<NormalizedEvent, ParseError> {
    let ts = raw.time_stamp.as_deref().ok_or(ParseError::Missing)?;
    let instant = to_eastern(ts)?;
    Ok(NormalizedEvent {
        correlation_id: raw.correlation_id,
        api_name: raw.api_name,
        state: raw.state,
        instant,
        extra: raw.extra,
    })
}

/// Normalize a batch in input order, dropping records whose timestamps
/// fail to parse. Returns the surviving events and the drop count.
pub fn normalize_batch(raw: Vec<RawEvent>) -> (Vec<NormalizedEvent>, usize) {
    let mut events = Vec::with_capacity(raw.len());
    let mut dropped = 0usize;
    for record in raw {
        match normalize_event(record) {
            Ok(ev) => events.push(ev),
            Err(err) => {
                dropped += 1;
                debug!("dropping event: {err}");
            }
        }
    }
    (events, dropped)
}

/// Render an Eastern instant for display: `YYYY-MM-DD HH:MM:SS EST`.
pub fn format_display(instant: &DateTime<Tz>) -> String {
    format!("{}{}", instant.format("%Y-%m-%d %H:%M:%S"), DISPLAY_SUFFIX)
}

fn parse_any(raw: &str) -> Option<DateTime<FixedOffset>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt);
    }
    for fmt in OFFSET_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(trimmed, fmt) {
            return Some(dt);
        }
    }
    for fmt in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, fmt) {
            return Some(naive.and_utc().fixed_offset());
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        let midnight = date.and_hms_opt(0, 0, 0)?;
        return Some(midnight.and_utc().fixed_offset());
    }
    None
}

fn relabel(dt: DateTime<FixedOffset>) -> Option<DateTime<Tz>> {
    match TARGET_ZONE.from_local_datetime(&dt.naive_local()) {
        LocalResult::Single(local) => Some(local),
        LocalResult::Ambiguous(earlier, _) => Some(earlier),
        LocalResult::None => None,
    }
}

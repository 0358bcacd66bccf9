//! Tests for criteria resolution and time-window defaults.

use chrono::{DateTime, TimeZone};
use chrono_tz::Tz;
use eventscope::filter::{
    resolve, resolve_listing, resolve_window, RelativeWindow, SearchCriteria, TimeWindowSpec,
    WindowPolicy,
};

fn noon_jan_15() -> DateTime<Tz> {
    chrono_tz::US::Eastern
        .with_ymd_and_hms(2024, 1, 15, 12, 0, 0)
        .unwrap()
}

#[test]
fn test_interactive_default_has_no_time_bound() {
    let resolved = resolve(
        &SearchCriteria::default(),
        WindowPolicy::Interactive,
        noon_jan_15(),
    );
    assert!(resolved.range.is_unbounded());
    assert!(resolved.is_empty());
}

#[test]
fn test_listing_default_is_last_24_hours() {
    let range = resolve_listing(None, None, noon_jan_15());
    assert_eq!(range.start.as_deref(), Some("2024-01-14T12:00:00-05:00"));
    assert_eq!(range.end.as_deref(), Some("2024-01-15T12:00:00-05:00"));
}

#[test]
fn test_relative_tokens_resolve_against_now() {
    let cases = [
        ("30min", "2024-01-15T11:30:00-05:00"),
        ("1hr", "2024-01-15T11:00:00-05:00"),
        ("6hr", "2024-01-15T06:00:00-05:00"),
    ];

    for (token, expected_start) in cases {
        let criteria = SearchCriteria {
            timestamp_filter: Some(token.to_string()),
            ..Default::default()
        };
        let resolved = resolve(&criteria, WindowPolicy::Interactive, noon_jan_15());
        assert_eq!(resolved.range.start.as_deref(), Some(expected_start));
        assert_eq!(
            resolved.range.end.as_deref(),
            Some("2024-01-15T12:00:00-05:00")
        );
    }
}

#[test]
fn test_custom_window_passes_bounds_verbatim() {
    let criteria = SearchCriteria {
        timestamp_filter: Some("custom".to_string()),
        custom_start_time: Some("2024-01-01T00:00:00".to_string()),
        custom_end_time: Some("2024-01-02T00:00:00".to_string()),
        ..Default::default()
    };

    let resolved = resolve(&criteria, WindowPolicy::Interactive, noon_jan_15());
    assert_eq!(resolved.range.start.as_deref(), Some("2024-01-01T00:00:00"));
    assert_eq!(resolved.range.end.as_deref(), Some("2024-01-02T00:00:00"));
}

#[test]
fn test_unknown_token_keeps_only_the_end_bound() {
    let criteria = SearchCriteria {
        timestamp_filter: Some("45min".to_string()),
        ..Default::default()
    };
    assert_eq!(criteria.window(), TimeWindowSpec::UpToNow);

    let resolved = resolve(&criteria, WindowPolicy::Interactive, noon_jan_15());
    assert_eq!(resolved.range.start, None);
    assert_eq!(
        resolved.range.end.as_deref(),
        Some("2024-01-15T12:00:00-05:00")
    );
}

#[test]
fn test_unbounded_listing_policy_still_defaults() {
    let range = resolve_window(
        &TimeWindowSpec::Unbounded,
        WindowPolicy::DefaultListing,
        noon_jan_15(),
    );
    assert_eq!(range.start.as_deref(), Some("2024-01-14T12:00:00-05:00"));
    assert_eq!(range.end.as_deref(), Some("2024-01-15T12:00:00-05:00"));
}

#[test]
fn test_exact_clauses_in_stable_order() {
    let criteria = SearchCriteria {
        correlation_id: Some("abc-123".to_string()),
        api_name: Some("orders".to_string()),
        state: Some("DONE".to_string()),
        ..Default::default()
    };

    let resolved = resolve(&criteria, WindowPolicy::Interactive, noon_jan_15());
    assert_eq!(
        resolved.exact,
        vec![
            ("api_name".to_string(), "orders".to_string()),
            ("correlationid".to_string(), "abc-123".to_string()),
            ("state".to_string(), "DONE".to_string()),
        ]
    );
}

#[test]
fn test_free_text_needs_both_field_and_value() {
    let only_field = SearchCriteria {
        search_type: Some("message".to_string()),
        ..Default::default()
    };
    assert!(resolve(&only_field, WindowPolicy::Interactive, noon_jan_15())
        .text
        .is_none());

    let both = SearchCriteria {
        search_type: Some("message".to_string()),
        search_value: Some("timeout".to_string()),
        ..Default::default()
    };
    assert_eq!(
        resolve(&both, WindowPolicy::Interactive, noon_jan_15()).text,
        Some(("message".to_string(), "timeout".to_string()))
    );
}

#[test]
fn test_empty_strings_count_as_absent() {
    let criteria = SearchCriteria {
        api_name: Some(String::new()),
        state: Some(String::new()),
        search_type: Some("message".to_string()),
        search_value: Some(String::new()),
        ..Default::default()
    };

    let resolved = resolve(&criteria, WindowPolicy::Interactive, noon_jan_15());
    assert!(resolved.is_empty());
}

#[test]
fn test_listing_with_one_bound_is_verbatim() {
    let range = resolve_listing(Some("2024-01-10T00:00:00".to_string()), None, noon_jan_15());
    assert_eq!(range.start.as_deref(), Some("2024-01-10T00:00:00"));
    assert_eq!(range.end, None);
}

#[test]
fn test_listing_empty_strings_fall_back_to_default() {
    let range = resolve_listing(Some(String::new()), Some(String::new()), noon_jan_15());
    assert_eq!(range.start.as_deref(), Some("2024-01-14T12:00:00-05:00"));
    assert_eq!(range.end.as_deref(), Some("2024-01-15T12:00:00-05:00"));
}

#[test]
fn test_relative_token_parse() {
    assert_eq!(RelativeWindow::parse("30min"), Some(RelativeWindow::Last30Min));
    assert_eq!(RelativeWindow::parse("1hr"), Some(RelativeWindow::LastHour));
    assert_eq!(RelativeWindow::parse("6hr"), Some(RelativeWindow::Last6Hours));
    assert_eq!(RelativeWindow::parse("2hr"), None);
}

#[test]
fn test_criteria_decode_uses_wire_names() {
    let criteria: SearchCriteria = serde_json::from_value(serde_json::json!({
        "correlationid": "abc-123",
        "api_name": "orders",
        "timestamp_filter": "custom",
        "custom_start_time": "2024-01-01T00:00:00",
        "custom_end_time": "2024-01-02T00:00:00"
    }))
    .unwrap();

    assert_eq!(criteria.correlation_id.as_deref(), Some("abc-123"));
    assert_eq!(criteria.api_name.as_deref(), Some("orders"));
    assert_eq!(
        criteria.window(),
        TimeWindowSpec::Custom {
            start: Some("2024-01-01T00:00:00".to_string()),
            end: Some("2024-01-02T00:00:00".to_string()),
        }
    );
}

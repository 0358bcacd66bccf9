//! Tests for the read-only search client against a mock Elasticsearch.

use std::time::Duration;

use eventscope::es_http::EsHttp;
use eventscope::es_search::EventSearch;
use eventscope::filter::{ResolvedFilter, TimeRange};
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn search_client(server: &MockServer) -> EventSearch {
    let http = EsHttp::new(server.uri(), "user", "pass", Duration::from_secs(5)).expect("EsHttp");
    EventSearch::new(http, "events-test", 1000, 10_000)
}

fn sort_desc() -> serde_json::Value {
    serde_json::json!([{ "time_stamp": { "order": "desc" } }])
}

#[tokio::test]
async fn unfiltered_search_posts_match_all_and_parses_hits() {
    let server = MockServer::start().await;

    let expected_body = serde_json::json!({
        "query": { "match_all": {} },
        "sort": sort_desc(),
        "size": 1000
    });
    let resp = serde_json::json!({
        "hits": {
            "hits": [
                {
                    "_id": "1",
                    "_source": {
                        "correlationid": "abc-123",
                        "api_name": "orders",
                        "state": "NEW",
                        "time_stamp": "2024-01-15T10:00:00",
                        "host": "app-01"
                    }
                }
            ]
        }
    });

    Mock::given(method("POST"))
        .and(path("/events-test/_search"))
        .and(body_json(expected_body))
        .respond_with(ResponseTemplate::new(200).set_body_json(resp))
        .mount(&server)
        .await;

    let events = search_client(&server)
        .search(&ResolvedFilter::default())
        .await
        .expect("search");

    assert_eq!(events.len(), 1);
    assert_eq!(events[0].correlation_id.as_deref(), Some("abc-123"));
    assert_eq!(events[0].api_name.as_deref(), Some("orders"));
    assert_eq!(events[0].time_stamp.as_deref(), Some("2024-01-15T10:00:00"));
    assert_eq!(
        events[0].extra.get("host"),
        Some(&serde_json::Value::String("app-01".to_string()))
    );
}

#[tokio::test]
async fn filtered_search_renders_all_clause_kinds() {
    let server = MockServer::start().await;

    let filter = ResolvedFilter {
        exact: vec![("api_name".to_string(), "orders".to_string())],
        text: Some(("message".to_string(), "timeout".to_string())),
        range: TimeRange {
            start: Some("2024-01-14T12:00:00-05:00".to_string()),
            end: Some("2024-01-15T12:00:00-05:00".to_string()),
        },
    };
    let expected_body = serde_json::json!({
        "query": {
            "bool": {
                "must": [
                    { "term": { "api_name.keyword": "orders" } },
                    { "match": { "message": "timeout" } },
                    {
                        "range": {
                            "time_stamp": {
                                "gte": "2024-01-14T12:00:00-05:00",
                                "lte": "2024-01-15T12:00:00-05:00",
                                "format": "strict_date_optional_time"
                            }
                        }
                    }
                ]
            }
        },
        "sort": sort_desc(),
        "size": 1000
    });

    Mock::given(method("POST"))
        .and(path("/events-test/_search"))
        .and(body_json(expected_body))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({ "hits": { "hits": [] } })),
        )
        .mount(&server)
        .await;

    let events = search_client(&server).search(&filter).await.expect("search");
    assert!(events.is_empty());
}

#[tokio::test]
async fn correlation_lookup_uses_exact_term() {
    let server = MockServer::start().await;

    let expected_body = serde_json::json!({
        "query": {
            "bool": { "must": [{ "term": { "correlationid.keyword": "abc-123" } }] }
        },
        "sort": sort_desc(),
        "size": 1000
    });
    let resp = serde_json::json!({
        "hits": {
            "hits": [
                { "_source": { "correlationid": "abc-123", "time_stamp": "2024-01-15T10:00:00" } },
                { "_source": { "correlationid": "abc-123", "time_stamp": "2024-01-15T10:00:02" } }
            ]
        }
    });

    Mock::given(method("POST"))
        .and(path("/events-test/_search"))
        .and(body_json(expected_body))
        .respond_with(ResponseTemplate::new(200).set_body_json(resp))
        .mount(&server)
        .await;

    let events = search_client(&server)
        .events_for_correlation("abc-123")
        .await
        .expect("events_for_correlation");
    assert_eq!(events.len(), 2);
}

#[tokio::test]
async fn api_lookup_uses_wider_result_cap() {
    let server = MockServer::start().await;

    let expected_body = serde_json::json!({
        "query": {
            "bool": { "must": [{ "term": { "api_name.keyword": "orders" } }] }
        },
        "sort": sort_desc(),
        "size": 10000
    });

    Mock::given(method("POST"))
        .and(path("/events-test/_search"))
        .and(body_json(expected_body))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({ "hits": { "hits": [] } })),
        )
        .mount(&server)
        .await;

    let events = search_client(&server)
        .events_for_api("orders")
        .await
        .expect("events_for_api");
    assert!(events.is_empty());
}

#[tokio::test]
async fn api_names_come_back_sorted() {
    let server = MockServer::start().await;

    let expected_body = serde_json::json!({
        "size": 0,
        "aggs": {
            "unique_values": {
                "terms": { "field": "api_name.keyword", "size": 1000 }
            }
        }
    });
    let resp = serde_json::json!({
        "aggregations": {
            "unique_values": {
                "buckets": [
                    { "key": "orders", "doc_count": 7 },
                    { "key": "billing", "doc_count": 3 },
                    { "key": "shipping", "doc_count": 1 }
                ]
            }
        }
    });

    Mock::given(method("POST"))
        .and(path("/events-test/_search"))
        .and(body_json(expected_body))
        .respond_with(ResponseTemplate::new(200).set_body_json(resp))
        .mount(&server)
        .await;

    let names = search_client(&server).api_names().await.expect("api_names");
    assert_eq!(names, vec!["billing", "orders", "shipping"]);
}

#[tokio::test]
async fn states_aggregation_uses_small_bucket_cap() {
    let server = MockServer::start().await;

    let expected_body = serde_json::json!({
        "size": 0,
        "aggs": {
            "unique_values": {
                "terms": { "field": "state.keyword", "size": 10 }
            }
        }
    });
    let resp = serde_json::json!({
        "aggregations": {
            "unique_values": {
                "buckets": [
                    { "key": "NEW", "doc_count": 4 },
                    { "key": "DONE", "doc_count": 9 }
                ]
            }
        }
    });

    Mock::given(method("POST"))
        .and(path("/events-test/_search"))
        .and(body_json(expected_body))
        .respond_with(ResponseTemplate::new(200).set_body_json(resp))
        .mount(&server)
        .await;

    let states = search_client(&server).states().await.expect("states");
    assert_eq!(states, vec!["DONE", "NEW"]);
}

#[tokio::test]
async fn error_status_surfaces_status_and_body() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/events-test/_search"))
        .respond_with(
            ResponseTemplate::new(500)
                .set_body_string("{\"error\":\"search_phase_execution_exception\"}"),
        )
        .mount(&server)
        .await;

    let err = search_client(&server)
        .search(&ResolvedFilter::default())
        .await
        .expect_err("should fail");
    let rendered = format!("{err:#}");
    assert!(rendered.contains("status=500"), "got: {rendered}");
    assert!(
        rendered.contains("search_phase_execution_exception"),
        "got: {rendered}"
    );
}

#[tokio::test]
async fn response_without_hits_is_empty() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/events-test/_search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
        .mount(&server)
        .await;

    let events = search_client(&server)
        .search(&ResolvedFilter::default())
        .await
        .expect("search");
    assert!(events.is_empty());
}

#[tokio::test]
async fn missing_aggregation_yields_no_values() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/events-test/_search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
        .mount(&server)
        .await;

    let names = search_client(&server).api_names().await.expect("api_names");
    assert!(names.is_empty());
}

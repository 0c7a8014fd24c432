use quarry_core::models::*;
use serde_json::{json, Value};

fn to_value<T: serde::Serialize>(value: &T) -> Value {
    serde_json::to_value(value).unwrap()
}

#[test]
fn search_request_omits_filters_when_absent() {
    let request = SearchRequest {
        embedding: vec![0.0, 1.0],
        keywords: "install guide".to_string(),
        limit: 5,
        filters: None,
    };
    let value = to_value(&request);
    assert!(value.get("filters").is_none(), "filters must not be sent as null");
    assert_eq!(value["limit"], json!(5));
    assert_eq!(value["keywords"], json!("install guide"));
}

#[test]
fn filters_built_only_from_supplied_restrictions() {
    let neither = SearchOptions::default();
    assert!(neither.filters().is_none());

    let repos_only = SearchOptions {
        repos: Some(vec!["quarry".to_string()]),
        ..Default::default()
    };
    let filters = repos_only.filters().unwrap();
    let value = to_value(&filters);
    assert_eq!(value["repos"], json!(["quarry"]));
    assert!(value.get("chunk_types").is_none(), "absent restriction is omitted");

    let both = SearchOptions {
        chunk_types: Some(vec!["doc".to_string()]),
        repos: Some(vec!["quarry".to_string()]),
        ..Default::default()
    };
    let value = to_value(&both.filters().unwrap());
    assert_eq!(value["chunk_types"], json!(["doc"]));
    assert_eq!(value["repos"], json!(["quarry"]));
}

#[test]
fn keyword_request_omits_unset_limit() {
    let request = KeywordRequest {
        text: "how do I install".to_string(),
        limit: None,
    };
    let value = to_value(&request);
    assert!(value.get("limit").is_none());

    let request = KeywordRequest {
        text: "how do I install".to_string(),
        limit: Some(8),
    };
    assert_eq!(to_value(&request)["limit"], json!(8));
}

#[test]
fn search_response_tolerates_minimal_payload() {
    let response: SearchResponse = serde_json::from_value(json!({
        "results": [
            {"score": 0.92, "content": "Run the installer."}
        ]
    }))
    .unwrap();
    assert_eq!(response.results.len(), 1);
    assert_eq!(response.results[0].content, "Run the installer.");
    assert_eq!(response.results[0].repo, None);
    assert_eq!(response.query_time_ms, None);

    let empty: SearchResponse = serde_json::from_value(json!({})).unwrap();
    assert!(empty.results.is_empty());
}

#[test]
fn health_response_parses_stats_fields() {
    let health: HealthResponse = serde_json::from_value(json!({
        "status": "ok",
        "chunks": 4182,
        "model": "nomic-embed-text-v1.5"
    }))
    .unwrap();
    assert_eq!(health.status, "ok");
    assert_eq!(health.chunks, Some(4182));
}

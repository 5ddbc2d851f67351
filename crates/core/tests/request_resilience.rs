//! Integration tests for the request-side resilience pieces: idempotency
//! keys attached to writes and the mock-data fallback on failures.

use assert_matches::assert_matches;
use serde_json::{json, Map, Value};
use sism_core::config::{FallbackConfig, IdempotencyConfig};
use sism_core::error::CoreError;
use sism_core::fallback::{
    decide, get_mock_data, should_fallback, FallbackReason, MockData, RequestFailure,
    ResourceContext,
};
use sism_core::idempotency::{
    generate_idempotency_key, generate_idempotency_key_sync, idempotency_header,
    HttpMethod, IdempotencyPayload, WriteRequest,
};

// ---------------------------------------------------------------------------
// Test: key is independent of object construction order
// ---------------------------------------------------------------------------

#[test]
fn key_is_independent_of_insertion_order() {
    let mut forward = Map::new();
    for (k, v) in [("name", json!("就业率")), ("weight", json!(25)), ("year", json!(2025))] {
        forward.insert(k.to_string(), v);
    }
    let mut backward = Map::new();
    for (k, v) in [("year", json!(2025)), ("weight", json!(25)), ("name", json!("就业率"))] {
        backward.insert(k.to_string(), v);
    }

    let a = IdempotencyPayload::new(HttpMethod::Post, "/api/indicators", Value::Object(forward));
    let b = IdempotencyPayload::new(HttpMethod::Post, "/api/indicators", Value::Object(backward));

    assert_eq!(generate_idempotency_key_sync(&a), generate_idempotency_key_sync(&b));
}

// ---------------------------------------------------------------------------
// Test: async and sync variants agree
// ---------------------------------------------------------------------------

#[tokio::test]
async fn async_and_sync_keys_match() {
    let payload = IdempotencyPayload::new(
        HttpMethod::Patch,
        "/api/indicators/ind-001",
        json!({"progress": 75, "milestones": [{"id": "m1"}, {"id": "m2"}]}),
    );

    assert_eq!(
        generate_idempotency_key(&payload).await,
        generate_idempotency_key_sync(&payload)
    );
}

// ---------------------------------------------------------------------------
// Test: reads never carry a key, writes do unless disabled
// ---------------------------------------------------------------------------

#[test]
fn header_attached_only_to_writes() {
    let config = IdempotencyConfig::default();

    for method in [HttpMethod::Get, HttpMethod::Head, HttpMethod::Options] {
        let request = WriteRequest::new(method, "/api/indicators", Value::Null);
        assert!(idempotency_header(&config, &request).is_none(), "{method}");
    }
    for method in [HttpMethod::Post, HttpMethod::Put, HttpMethod::Patch, HttpMethod::Delete] {
        let request = WriteRequest::new(method, "/api/indicators", json!({}));
        assert!(idempotency_header(&config, &request).is_some(), "{method}");
    }

    let disabled = IdempotencyConfig {
        enabled: false,
        ..IdempotencyConfig::default()
    };
    let post = WriteRequest::new(HttpMethod::Post, "/api/indicators", json!({}));
    assert!(idempotency_header(&disabled, &post).is_none());
}

// ---------------------------------------------------------------------------
// Test: status code policy
// ---------------------------------------------------------------------------

#[test]
fn fallback_policy_by_status() {
    let config = FallbackConfig::default();

    let unavailable = RequestFailure::from_json(&json!({"response": {"status": 503}}));
    let not_found = RequestFailure::from_json(&json!({"response": {"status": 404}}));
    let offline = RequestFailure::from_json(&json!({"message": "Network Error"}));

    assert!(should_fallback(&config, &unavailable));
    assert!(!should_fallback(&config, &not_found));
    assert!(should_fallback(&config, &offline));
    assert_eq!(decide(&config, &offline).reason, FallbackReason::NetworkError);
}

// ---------------------------------------------------------------------------
// Test: 401 is a deliberate fallback case
// ---------------------------------------------------------------------------

#[test]
fn unauthorized_is_a_deliberate_fallback() {
    let decision = decide(&FallbackConfig::default(), &RequestFailure::http(401));

    assert!(decision.should_fallback);
    assert_eq!(decision.reason, FallbackReason::Unauthorized);
    assert_eq!(decision.status, Some(401));
}

// ---------------------------------------------------------------------------
// Test: a failed request path resolves to a DTO-shaped mock payload
// ---------------------------------------------------------------------------

#[test]
fn failed_request_is_served_from_mock_data() {
    let config = FallbackConfig::default();
    let failure = RequestFailure::http(502);
    assert!(should_fallback(&config, &failure));

    let context = ResourceContext::from_path("/api/indicators?year=2025").unwrap();
    let data = get_mock_data(&context).unwrap();
    assert_matches!(&data, MockData::Indicators(items) if items.len() == 5);

    let body = data.to_value().unwrap();
    assert!(body.as_array().unwrap().iter().all(|i| i.get("ownerDept").is_some()));

    let dashboard = get_mock_data(&ResourceContext::Dashboard).unwrap().to_value().unwrap();
    assert_eq!(dashboard["totalIndicators"], 5);
}

// ---------------------------------------------------------------------------
// Test: unknown ids surface as NotFound
// ---------------------------------------------------------------------------

#[test]
fn unknown_mock_indicator_is_not_found() {
    let context = ResourceContext::from_path("/api/indicators/ind-999").unwrap();

    assert_matches!(
        get_mock_data(&context),
        Err(CoreError::NotFound { entity: "indicator", id }) if id == "ind-999"
    );
}

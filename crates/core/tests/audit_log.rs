//! Integration tests for the audit log store.

use chrono::{Duration, TimeZone, Utc};
use serde_json::json;
use sism_core::audit::{
    calculate_changes, AuditAction, AuditLogStore, AuditQuery, LogActionParams,
};
use sism_core::types::EntityKind;

fn update(entity_id: &str, operator: &str, before: serde_json::Value, after: serde_json::Value) -> LogActionParams {
    LogActionParams {
        entity_type: EntityKind::Indicator,
        entity_id: entity_id.into(),
        entity_name: "本科生就业率".into(),
        action: AuditAction::Update,
        operator: format!("id-{operator}"),
        operator_name: operator.into(),
        before: Some(before),
        after: Some(after),
    }
}

// ---------------------------------------------------------------------------
// Test: the documented progress diff
// ---------------------------------------------------------------------------

#[test]
fn progress_diff_serializes_with_label() {
    let changes = calculate_changes(Some(&json!({"progress": 50})), Some(&json!({"progress": 75})));

    let value = serde_json::to_value(&changes).unwrap();
    assert_eq!(
        value,
        json!([{
            "field": "progress",
            "fieldLabel": "进度",
            "oldValue": 50,
            "newValue": 75,
            "status": "changed"
        }])
    );
}

// ---------------------------------------------------------------------------
// Test: diff reports exactly the differing keys
// ---------------------------------------------------------------------------

#[test]
fn diff_reports_exactly_differing_keys() {
    let before = json!({"name": "a", "progress": 10, "tags": ["x"], "unit": "%"});
    let after = json!({"name": "a", "progress": 10.0, "tags": ["x", "y"], "deadline": "2025-12-31"});

    let mut fields: Vec<String> = calculate_changes(Some(&before), Some(&after))
        .into_iter()
        .map(|c| c.field)
        .collect();
    fields.sort();

    assert_eq!(fields, vec!["deadline", "tags", "unit"]);
}

// ---------------------------------------------------------------------------
// Test: N entries come back newest first
// ---------------------------------------------------------------------------

#[test]
fn entries_come_back_newest_first() {
    let store = AuditLogStore::new();
    let base = Utc.with_ymd_and_hms(2025, 4, 1, 9, 0, 0).unwrap();

    let logged: Vec<_> = (0..10)
        .map(|i| {
            store.log_action_at(
                update("ind-002", "王芳", json!({"progress": i}), json!({"progress": i + 1})),
                base + Duration::minutes(i),
            )
        })
        .collect();

    let all = store.query_logs(&AuditQuery::default());
    assert_eq!(all.len(), 10);
    assert!(all.windows(2).all(|w| w[0].timestamp >= w[1].timestamp));
    assert_eq!(all.first(), logged.last());
}

// ---------------------------------------------------------------------------
// Test: combined filters
// ---------------------------------------------------------------------------

#[test]
fn filters_combine_with_and() {
    let store = AuditLogStore::new();
    let day = |d| Utc.with_ymd_and_hms(2025, 4, d, 12, 0, 0).unwrap();

    store.log_action_at(update("ind-001", "王芳", json!({}), json!({"a": 1})), day(1));
    store.log_action_at(update("ind-001", "李明", json!({}), json!({"a": 1})), day(2));
    store.log_action_at(update("ind-002", "王芳", json!({}), json!({"a": 1})), day(3));
    let mut delete = update("ind-003", "王芳", json!({}), json!({}));
    delete.action = AuditAction::Delete;
    store.log_action_at(delete, day(3));

    let query = AuditQuery {
        operator: Some("王芳".into()),
        action: Some(AuditAction::Update),
        ..AuditQuery::default()
    }
    .with_date_range(
        chrono::NaiveDate::from_ymd_opt(2025, 4, 2).unwrap(),
        chrono::NaiveDate::from_ymd_opt(2025, 4, 3).unwrap(),
    );
    let hits = store.query_logs(&query);

    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].entity_id, "ind-002");
    assert_eq!(store.operators(), vec!["王芳", "李明"]);
    assert_eq!(store.get_entity_history(EntityKind::Indicator, "ind-001").len(), 2);
}

// ---------------------------------------------------------------------------
// Test: entries serialize in the API's camelCase shape
// ---------------------------------------------------------------------------

#[test]
fn entry_json_shape() {
    let store = AuditLogStore::new();
    let item = store.log_action(update("ind-001", "李明", json!({"progress": 50}), json!({"progress": 75})));

    let value = serde_json::to_value(&item).unwrap();
    assert_eq!(value["entityType"], "indicator");
    assert_eq!(value["operatorName"], "李明");
    assert_eq!(value["changes"][0]["fieldLabel"], "进度");
    assert_eq!(value["integrityHash"].as_str().unwrap().len(), 64);
    assert!(store.verify_integrity().chain_valid);
}

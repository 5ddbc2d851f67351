//! Field-level change computation for audit entries.

use serde_json::Value;

use super::{is_sensitive_field, redact_sensitive_fields, FieldChange, REDACTED};
use crate::diff::diff_maps;

/// Display labels for entity fields, keyed by API field name.
const FIELD_LABELS: &[(&str, &str)] = &[
    ("name", "名称"),
    ("indicatorType", "指标类型"),
    ("level", "层级"),
    ("parentId", "上级指标"),
    ("year", "年度"),
    ("ownerDept", "责任部门"),
    ("responsiblePerson", "负责人"),
    ("weight", "权重"),
    ("progress", "进度"),
    ("status", "状态"),
    ("targetValue", "目标值"),
    ("actualValue", "实际值"),
    ("unit", "单位"),
    ("deadline", "截止日期"),
    ("description", "描述"),
    ("tags", "标签"),
    ("milestones", "里程碑"),
    ("indicatorId", "所属指标"),
    ("targetProgress", "目标进度"),
    ("username", "用户名"),
    ("realName", "姓名"),
    ("email", "邮箱"),
    ("phone", "电话"),
    ("role", "角色"),
    ("department", "部门"),
    ("password", "密码"),
    ("remark", "备注"),
];

/// The configured label for `field`, if any.
pub fn field_label(field: &str) -> Option<&'static str> {
    FIELD_LABELS
        .iter()
        .find(|(key, _)| *key == field)
        .map(|(_, label)| *label)
}

/// Fields whose values differ between `before` and `after`.
///
/// Empty when either snapshot is absent or not an object. Sensitive values
/// are redacted at any depth, but the change itself is still reported.
pub fn calculate_changes(before: Option<&Value>, after: Option<&Value>) -> Vec<FieldChange> {
    let (Some(Value::Object(before)), Some(Value::Object(after))) = (before, after) else {
        return Vec::new();
    };

    diff_maps(before, after)
        .into_iter()
        .map(|diff| {
            let sensitive = is_sensitive_field(diff.key);
            let value = |v: Option<&Value>| {
                v.map(|v| {
                    if sensitive {
                        Value::String(REDACTED.to_string())
                    } else {
                        redact_sensitive_fields(v)
                    }
                })
            };
            FieldChange {
                field: diff.key.to_string(),
                field_label: field_label(diff.key).unwrap_or(diff.key).to_string(),
                old_value: value(diff.old),
                new_value: value(diff.new),
                status: diff.status,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff::DiffStatus;
    use serde_json::json;

    #[test]
    fn progress_change_uses_label() {
        let changes = calculate_changes(Some(&json!({"progress": 50})), Some(&json!({"progress": 75})));
        assert_eq!(changes.len(), 1);
        let change = &changes[0];
        assert_eq!(change.field, "progress");
        assert_eq!(change.field_label, "进度");
        assert_eq!(change.old_value, Some(json!(50)));
        assert_eq!(change.new_value, Some(json!(75)));
        assert_eq!(change.status, DiffStatus::Changed);
    }

    #[test]
    fn missing_snapshot_yields_no_changes() {
        let snapshot = json!({"progress": 50});
        assert!(calculate_changes(None, Some(&snapshot)).is_empty());
        assert!(calculate_changes(Some(&snapshot), None).is_empty());
        assert!(calculate_changes(None, None).is_empty());
    }

    #[test]
    fn identical_snapshots_yield_no_changes() {
        let snapshot = json!({"name": "x", "tags": ["a"], "meta": {"k": 1}});
        assert!(calculate_changes(Some(&snapshot), Some(&snapshot.clone())).is_empty());
    }

    #[test]
    fn unlabeled_field_falls_back_to_key() {
        let changes = calculate_changes(Some(&json!({"customScore": 1})), Some(&json!({"customScore": 2})));
        assert_eq!(changes[0].field_label, "customScore");
    }

    #[test]
    fn added_and_removed_fields() {
        let changes = calculate_changes(
            Some(&json!({"remark": "old"})),
            Some(&json!({"unit": "%"})),
        );
        assert_eq!(changes.len(), 2);
        assert_eq!(changes[0].field, "remark");
        assert_eq!(changes[0].status, DiffStatus::Removed);
        assert_eq!(changes[0].new_value, None);
        assert_eq!(changes[1].field, "unit");
        assert_eq!(changes[1].status, DiffStatus::Added);
        assert_eq!(changes[1].old_value, None);
    }

    #[test]
    fn nested_change_is_one_field_change() {
        let changes = calculate_changes(
            Some(&json!({"milestones": [{"id": "m1", "status": "pending"}]})),
            Some(&json!({"milestones": [{"id": "m1", "status": "completed"}]})),
        );
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].field_label, "里程碑");
    }

    #[test]
    fn sensitive_values_are_redacted_but_reported() {
        let changes = calculate_changes(
            Some(&json!({"password": "old-secret"})),
            Some(&json!({"password": "new-secret"})),
        );
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].old_value, Some(json!(REDACTED)));
        assert_eq!(changes[0].new_value, Some(json!(REDACTED)));
    }

    #[test]
    fn nested_sensitive_values_are_redacted() {
        let changes = calculate_changes(
            Some(&json!({"profile": {"apiToken": "old-secret", "theme": "light"}})),
            Some(&json!({"profile": {"apiToken": "new-secret", "theme": "dark"}})),
        );
        assert_eq!(changes.len(), 1);
        assert_eq!(
            changes[0].old_value,
            Some(json!({"apiToken": REDACTED, "theme": "light"}))
        );
        assert_eq!(
            changes[0].new_value,
            Some(json!({"apiToken": REDACTED, "theme": "dark"}))
        );
    }

    #[test]
    fn non_object_snapshots_are_ignored() {
        assert!(calculate_changes(Some(&json!([1])), Some(&json!([2]))).is_empty());
    }
}

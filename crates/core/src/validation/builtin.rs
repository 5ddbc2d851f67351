//! Built-in rule and default tables for the dashboard's entity kinds.

use chrono::NaiveDate;
use serde_json::json;

use super::rules::{DefaultTable, FieldRule, RuleKind, RuleRegistry};
use crate::types::EntityKind;

pub const INDICATOR_TYPES: &[&str] = &["quantitative", "qualitative"];
pub const INDICATOR_LEVELS: &[&str] = &["strategic", "functional", "college"];
pub const INDICATOR_STATUSES: &[&str] = &["draft", "pending", "approved", "rejected", "archived"];
pub const MILESTONE_STATUSES: &[&str] = &["pending", "in_progress", "completed", "overdue"];
pub const USER_ROLES: &[&str] = &["admin", "strategic_dept", "functional_dept", "college"];
pub const USER_STATUSES: &[&str] = &["active", "disabled"];
pub const AUDIT_ACTIONS: &[&str] = &["create", "update", "delete", "submit", "approve", "reject"];

const USERNAME_PATTERN: &str = r"^[A-Za-z0-9_]{3,32}$";
const EMAIL_PATTERN: &str = r"^[^@\s]+@[^@\s]+\.[^@\s]+$";
const PHONE_PATTERN: &str = r"^1\d{10}$";

fn percent() -> RuleKind {
    RuleKind::number(Some(0.0), Some(100.0))
}

fn text(max: usize) -> RuleKind {
    RuleKind::string(None, Some(max))
}

fn name(max: usize) -> RuleKind {
    RuleKind::string(Some(1), Some(max))
}

fn indicator_rules() -> Vec<FieldRule> {
    vec![
        FieldRule::new("name", "名称", name(200)).required(),
        FieldRule::new("indicatorType", "指标类型", RuleKind::one_of(INDICATOR_TYPES)),
        FieldRule::new("level", "层级", RuleKind::one_of(INDICATOR_LEVELS)).required(),
        FieldRule::new("parentId", "上级指标", name(64)).nullable(),
        FieldRule::new("year", "年度", RuleKind::integer(Some(2000.0), Some(2100.0))).required(),
        FieldRule::new("ownerDept", "责任部门", name(100)).required(),
        FieldRule::new("responsiblePerson", "负责人", text(50)).nullable(),
        FieldRule::new("weight", "权重", percent()),
        FieldRule::new("progress", "进度", percent()),
        FieldRule::new("status", "状态", RuleKind::one_of(INDICATOR_STATUSES)),
        FieldRule::new("targetValue", "目标值", RuleKind::number(None, None)).nullable(),
        FieldRule::new("actualValue", "实际值", RuleKind::number(None, None)).nullable(),
        FieldRule::new("unit", "单位", text(20)),
        FieldRule::new(
            "deadline",
            "截止日期",
            RuleKind::Date {
                min: NaiveDate::from_ymd_opt(2000, 1, 1),
                max: NaiveDate::from_ymd_opt(2100, 12, 31),
            },
        )
        .nullable(),
        FieldRule::new("description", "描述", text(2000)).warning(),
        FieldRule::new(
            "tags",
            "标签",
            RuleKind::array_of(name(20), None, Some(10)),
        ),
        FieldRule::new(
            "milestones",
            "里程碑",
            RuleKind::array_of(RuleKind::Object, None, Some(50)),
        ),
    ]
}

fn milestone_rules() -> Vec<FieldRule> {
    vec![
        FieldRule::new("indicatorId", "所属指标", name(64)).required(),
        FieldRule::new("name", "名称", name(200)).required(),
        FieldRule::new("targetProgress", "目标进度", percent()),
        FieldRule::new("weight", "权重", percent()),
        FieldRule::new("deadline", "截止日期", RuleKind::date()).required(),
        FieldRule::new("status", "状态", RuleKind::one_of(MILESTONE_STATUSES)),
        FieldRule::new("description", "描述", text(1000)).warning(),
    ]
}

fn user_rules() -> Vec<FieldRule> {
    vec![
        FieldRule::new("username", "用户名", RuleKind::pattern(USERNAME_PATTERN)).required(),
        FieldRule::new("realName", "姓名", name(50)).required(),
        FieldRule::new("email", "邮箱", RuleKind::pattern(EMAIL_PATTERN)).nullable(),
        FieldRule::new("phone", "电话", RuleKind::pattern(PHONE_PATTERN)).nullable(),
        FieldRule::new("role", "角色", RuleKind::one_of(USER_ROLES)),
        FieldRule::new("department", "部门", name(100)).required(),
        FieldRule::new("status", "状态", RuleKind::one_of(USER_STATUSES)),
    ]
}

fn audit_entry_rules() -> Vec<FieldRule> {
    let entity_types: Vec<&str> = EntityKind::ALL.iter().map(EntityKind::as_str).collect();
    vec![
        FieldRule::new("entityType", "实体类型", RuleKind::one_of(&entity_types)).required(),
        FieldRule::new("entityId", "实体ID", name(64)).required(),
        FieldRule::new("entityName", "实体名称", name(200)).required(),
        FieldRule::new("action", "操作", RuleKind::one_of(AUDIT_ACTIONS)).required(),
        FieldRule::new("operator", "操作人ID", name(64)).required(),
        FieldRule::new("operatorName", "操作人", name(50)).required(),
        FieldRule::new("timestamp", "时间", RuleKind::date()).required(),
        FieldRule::new("changes", "变更", RuleKind::array_of(RuleKind::Object, None, None))
            .nullable(),
    ]
}

/// Rule tables for every [`EntityKind`].
pub fn rule_registry() -> RuleRegistry {
    RuleRegistry::new()
        .with_rules(EntityKind::Indicator, indicator_rules())
        .with_rules(EntityKind::Milestone, milestone_rules())
        .with_rules(EntityKind::User, user_rules())
        .with_rules(EntityKind::AuditEntry, audit_entry_rules())
}

/// Default values for every [`EntityKind`].
pub fn default_table() -> DefaultTable {
    DefaultTable::new()
        .with_defaults(
            EntityKind::Indicator,
            json!({
                "indicatorType": "quantitative",
                "weight": 0,
                "progress": 0,
                "status": "draft",
                "unit": "",
                "description": "",
                "tags": [],
                "milestones": [],
                "isDeleted": false,
            }),
        )
        .with_defaults(
            EntityKind::Milestone,
            json!({
                "targetProgress": 0,
                "weight": 0,
                "status": "pending",
                "description": "",
            }),
        )
        .with_defaults(
            EntityKind::User,
            json!({
                "role": "functional_dept",
                "status": "active",
            }),
        )
        .with_defaults(EntityKind::AuditEntry, json!({}))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::{Validator, ViolationKind};
    use serde_json::json;

    fn validator() -> Validator {
        Validator::builtin().unwrap()
    }

    #[test]
    fn every_entity_kind_has_rules_and_defaults() {
        let registry = rule_registry();
        let defaults = default_table();
        for kind in EntityKind::ALL {
            assert!(registry.rules_for(kind).is_ok(), "{kind} has no rules");
            assert!(defaults.defaults_for(kind).is_some(), "{kind} has no defaults");
        }
    }

    #[test]
    fn builtin_patterns_compile() {
        assert!(Validator::builtin().is_ok());
    }

    #[test]
    fn minimal_indicator_is_normalized() {
        let result = validator()
            .validate(
                EntityKind::Indicator,
                &json!({"name": "科研经费", "level": "strategic", "year": 2025, "ownerDept": "科研处"}),
            )
            .unwrap();
        assert!(result.is_valid, "{:?}", result.errors);
        assert_eq!(result.normalized["status"], "draft");
        assert_eq!(result.normalized["progress"], 0);
        assert_eq!(result.normalized["milestones"], json!([]));
        assert_eq!(result.normalized["isDeleted"], false);
    }

    #[test]
    fn indicator_missing_required_fields() {
        let result = validator().validate(EntityKind::Indicator, &json!({})).unwrap();
        let mut missing: Vec<&str> = result
            .errors
            .iter()
            .filter(|e| e.rule == ViolationKind::Required)
            .map(|e| e.field.as_str())
            .collect();
        missing.sort();
        assert_eq!(missing, vec!["level", "name", "ownerDept", "year"]);
    }

    #[test]
    fn user_contact_formats() {
        let base = json!({"username": "zhang_san", "realName": "张三", "department": "教务处"});
        let mut bad = base.clone();
        bad["email"] = json!("not-an-email");
        bad["phone"] = json!("12345");
        let result = validator().validate(EntityKind::User, &bad).unwrap();
        let fields: Vec<&str> = result.errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, vec!["email", "phone"]);

        let mut good = base;
        good["email"] = json!("zhang@example.edu.cn");
        good["phone"] = json!("13800138000");
        assert!(validator().validate(EntityKind::User, &good).unwrap().is_valid);
    }

    #[test]
    fn audit_entry_rejects_unknown_action() {
        let entry = json!({
            "entityType": "indicator",
            "entityId": "ind-1",
            "entityName": "科研经费",
            "action": "explode",
            "operator": "u-1",
            "operatorName": "张三",
            "timestamp": "2025-03-01T10:00:00Z"
        });
        let result = validator().validate(EntityKind::AuditEntry, &entry).unwrap();
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].field, "action");
    }
}

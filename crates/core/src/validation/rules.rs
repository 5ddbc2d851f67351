//! Validation rule, default-table, and result types.
//!
//! Rule tables are plain data: they can be built in code (see
//! [`super::builtin`]) or deserialized from JSON supplied by deployment
//! configuration.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::CoreError;
use crate::types::EntityKind;

/// Whether a rule violation blocks submission or is informational.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ValidationSeverity {
    #[default]
    Error,
    Warning,
}

/// The type-specific part of a field rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum RuleKind {
    String {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        min_length: Option<usize>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max_length: Option<usize>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pattern: Option<String>,
    },
    Number {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        min: Option<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max: Option<f64>,
        #[serde(default)]
        integer: bool,
    },
    Date {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        min: Option<NaiveDate>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max: Option<NaiveDate>,
    },
    Array {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        min_items: Option<usize>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max_items: Option<usize>,
        /// Rule applied to every element.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        element: Option<Box<RuleKind>>,
    },
    Enum {
        values: Vec<Value>,
    },
    Boolean,
    Object,
}

impl RuleKind {
    pub fn string(min_length: Option<usize>, max_length: Option<usize>) -> Self {
        Self::String {
            min_length,
            max_length,
            pattern: None,
        }
    }

    pub fn pattern(pattern: &str) -> Self {
        Self::String {
            min_length: None,
            max_length: None,
            pattern: Some(pattern.to_string()),
        }
    }

    pub fn number(min: Option<f64>, max: Option<f64>) -> Self {
        Self::Number {
            min,
            max,
            integer: false,
        }
    }

    pub fn integer(min: Option<f64>, max: Option<f64>) -> Self {
        Self::Number {
            min,
            max,
            integer: true,
        }
    }

    pub fn date() -> Self {
        Self::Date {
            min: None,
            max: None,
        }
    }

    pub fn one_of(values: &[&str]) -> Self {
        Self::Enum {
            values: values.iter().map(|v| Value::String(v.to_string())).collect(),
        }
    }

    pub fn array_of(element: RuleKind, min_items: Option<usize>, max_items: Option<usize>) -> Self {
        Self::Array {
            min_items,
            max_items,
            element: Some(Box::new(element)),
        }
    }

    /// Name used in type-mismatch constraints.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::String { .. } => "string",
            Self::Number { .. } => "number",
            Self::Date { .. } => "date",
            Self::Array { .. } => "array",
            Self::Enum { .. } => "enum",
            Self::Boolean => "boolean",
            Self::Object => "object",
        }
    }
}

/// A rule for one field of an entity record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldRule {
    pub field: String,
    /// Human-readable label used in messages.
    pub label: String,
    #[serde(flatten)]
    pub kind: RuleKind,
    #[serde(default)]
    pub required: bool,
    /// `null` passes without further checks.
    #[serde(default)]
    pub nullable: bool,
    #[serde(default)]
    pub severity: ValidationSeverity,
}

impl FieldRule {
    pub fn new(field: &str, label: &str, kind: RuleKind) -> Self {
        Self {
            field: field.to_string(),
            label: label.to_string(),
            kind,
            required: false,
            nullable: false,
            severity: ValidationSeverity::Error,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    pub fn warning(mut self) -> Self {
        self.severity = ValidationSeverity::Warning;
        self
    }
}

/// Ordered field rules keyed by entity kind.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RuleRegistry {
    sets: BTreeMap<EntityKind, Vec<FieldRule>>,
}

impl RuleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rules(mut self, kind: EntityKind, rules: Vec<FieldRule>) -> Self {
        self.sets.insert(kind, rules);
        self
    }

    /// Parse a registry from a JSON object keyed by entity kind.
    pub fn from_json(json: &str) -> Result<Self, CoreError> {
        serde_json::from_str(json)
            .map_err(|e| CoreError::Configuration(format!("invalid rule table: {e}")))
    }

    /// Rules for `kind`, in declaration order.
    pub fn rules_for(&self, kind: EntityKind) -> Result<&[FieldRule], CoreError> {
        self.sets
            .get(&kind)
            .map(Vec::as_slice)
            .ok_or_else(|| CoreError::UnknownEntityKind(kind.as_str().to_string()))
    }

    pub fn iter(&self) -> impl Iterator<Item = (EntityKind, &[FieldRule])> {
        self.sets.iter().map(|(kind, rules)| (*kind, rules.as_slice()))
    }
}

/// Default values substituted for missing fields, keyed by entity kind.
///
/// A default may exist for a field that has no rule (system-generated
/// fields such as empty child collections).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DefaultTable {
    tables: BTreeMap<EntityKind, Map<String, Value>>,
}

impl DefaultTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_defaults(mut self, kind: EntityKind, defaults: Value) -> Self {
        if let Value::Object(map) = defaults {
            self.tables.insert(kind, map);
        }
        self
    }

    pub fn defaults_for(&self, kind: EntityKind) -> Option<&Map<String, Value>> {
        self.tables.get(&kind)
    }

    pub fn default_for(&self, kind: EntityKind, field: &str) -> Option<&Value> {
        self.tables.get(&kind).and_then(|t| t.get(field))
    }
}

/// Which check a field failed.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ViolationKind {
    Required,
    Type,
    MinLength,
    MaxLength,
    Pattern,
    MinValue,
    MaxValue,
    NotFinite,
    NotInteger,
    InvalidDate,
    DateTooEarly,
    DateTooLate,
    Enum,
    MinItems,
    MaxItems,
}

/// A single field-level rule violation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FieldViolation {
    /// Field path; array elements are reported as `field[index]`.
    pub field: String,
    pub rule: ViolationKind,
    /// The violated constraint, e.g. `"max 100"`.
    pub constraint: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
}

/// Aggregated result of evaluating all rules against one record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ValidationResult {
    pub is_valid: bool,
    pub errors: Vec<FieldViolation>,
    pub warnings: Vec<FieldViolation>,
    /// The input record with missing fields replaced by their defaults.
    pub normalized: Value,
}

impl ValidationResult {
    /// Errors reported for one field path.
    pub fn errors_for<'a>(&'a self, field: &'a str) -> impl Iterator<Item = &'a FieldViolation> {
        self.errors.iter().filter(move |v| v.field == field)
    }
}

/// Result for one record of a batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordReport {
    pub record_index: usize,
    pub result: ValidationResult,
}

/// Validation outcome for a batch of records of one entity kind.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchReport {
    pub entity: EntityKind,
    pub total_records: usize,
    pub valid_count: usize,
    pub invalid_count: usize,
    pub records: Vec<RecordReport>,
}

impl BatchReport {
    pub fn new(entity: EntityKind) -> Self {
        Self {
            entity,
            total_records: 0,
            valid_count: 0,
            invalid_count: 0,
            records: Vec::new(),
        }
    }

    pub fn push(&mut self, result: ValidationResult) {
        if result.is_valid {
            self.valid_count += 1;
        } else {
            self.invalid_count += 1;
        }
        self.records.push(RecordReport {
            record_index: self.total_records,
            result,
        });
        self.total_records += 1;
    }

    pub fn invalid_records(&self) -> impl Iterator<Item = &RecordReport> {
        self.records.iter().filter(|r| !r.result.is_valid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn field_rule_deserializes_flattened_kind() {
        let rule: FieldRule = serde_json::from_value(json!({
            "field": "progress",
            "label": "进度",
            "kind": "number",
            "min": 0,
            "max": 100,
            "required": true
        }))
        .unwrap();
        assert_eq!(rule.kind, RuleKind::number(Some(0.0), Some(100.0)));
        assert!(rule.required);
        assert!(!rule.nullable);
        assert_eq!(rule.severity, ValidationSeverity::Error);
    }

    #[test]
    fn registry_from_json_keys_by_entity_kind() {
        let registry = RuleRegistry::from_json(
            r#"{"milestone": [{"field": "name", "label": "名称", "kind": "string", "max_length": 10}]}"#,
        )
        .unwrap();
        let rules = registry.rules_for(EntityKind::Milestone).unwrap();
        assert_eq!(rules.len(), 1);
        assert!(registry.rules_for(EntityKind::User).is_err());
    }

    #[test]
    fn registry_from_json_rejects_unknown_kind() {
        let err = RuleRegistry::from_json(r#"{"widget": []}"#).unwrap_err();
        assert!(matches!(err, CoreError::Configuration(_)));
    }

    #[test]
    fn defaults_ignore_non_object_tables() {
        let table = DefaultTable::new()
            .with_defaults(EntityKind::User, json!({"status": "active"}))
            .with_defaults(EntityKind::Milestone, json!([1, 2]));
        assert_eq!(
            table.default_for(EntityKind::User, "status"),
            Some(&json!("active"))
        );
        assert!(table.defaults_for(EntityKind::Milestone).is_none());
    }

    #[test]
    fn batch_report_counts() {
        let ok = ValidationResult {
            is_valid: true,
            errors: vec![],
            warnings: vec![],
            normalized: json!({}),
        };
        let bad = ValidationResult {
            is_valid: false,
            ..ok.clone()
        };
        let mut report = BatchReport::new(EntityKind::User);
        report.push(ok);
        report.push(bad);
        assert_eq!(report.total_records, 2);
        assert_eq!(report.valid_count, 1);
        assert_eq!(report.invalid_count, 1);
        assert_eq!(report.invalid_records().next().unwrap().record_index, 1);
    }
}

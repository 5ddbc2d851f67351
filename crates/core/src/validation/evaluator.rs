//! Rule evaluator: pure logic over rule tables, default tables and a record.

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use regex::Regex;
use serde_json::{Map, Value};

use super::builtin;
use super::rules::{
    BatchReport, DefaultTable, FieldRule, FieldViolation, RuleKind, RuleRegistry,
    ValidationResult, ValidationSeverity, ViolationKind,
};
use crate::error::CoreError;
use crate::types::EntityKind;

/// Field path reported when the record itself is not an object.
pub const RECORD_PATH: &str = "$";

/// Validates and normalizes entity records against immutable rule and
/// default tables.
///
/// Regex patterns are compiled once on construction; a table with an invalid
/// pattern is rejected up front instead of silently passing at evaluation.
#[derive(Debug, Clone)]
pub struct Validator {
    registry: RuleRegistry,
    defaults: DefaultTable,
    patterns: HashMap<String, Regex>,
}

impl Validator {
    pub fn new(registry: RuleRegistry, defaults: DefaultTable) -> Result<Self, CoreError> {
        let mut patterns = HashMap::new();
        for (kind, rules) in registry.iter() {
            for rule in rules {
                collect_patterns(&rule.kind, &mut patterns).map_err(|e| {
                    CoreError::Configuration(format!(
                        "invalid pattern for {kind}.{}: {e}",
                        rule.field
                    ))
                })?;
            }
        }
        Ok(Self {
            registry,
            defaults,
            patterns,
        })
    }

    /// Validator over the built-in indicator, milestone, user and
    /// audit-entry tables.
    pub fn builtin() -> Result<Self, CoreError> {
        Self::new(builtin::rule_registry(), builtin::default_table())
    }

    pub fn registry(&self) -> &RuleRegistry {
        &self.registry
    }

    /// Validate one record.
    ///
    /// Every field is checked; errors are collected rather than stopping at
    /// the first. Returns `Err` only when the tables have no rules for
    /// `kind`.
    pub fn validate(&self, kind: EntityKind, record: &Value) -> Result<ValidationResult, CoreError> {
        let rules = self.registry.rules_for(kind)?;

        let Value::Object(data) = record else {
            let violation = FieldViolation {
                field: RECORD_PATH.to_string(),
                rule: ViolationKind::Type,
                constraint: format!("type {}", RuleKind::Object.type_name()),
                message: format!("{kind} record must be an object"),
                value: Some(record.clone()),
            };
            return Ok(ValidationResult {
                is_valid: false,
                errors: vec![violation],
                warnings: Vec::new(),
                normalized: record.clone(),
            });
        };

        let mut normalized = data.clone();
        let mut errors = Vec::new();
        let mut warnings = Vec::new();

        for rule in rules {
            let mut found = Vec::new();
            self.evaluate_field(kind, rule, data, &mut normalized, &mut found);
            match rule.severity {
                ValidationSeverity::Error => errors.extend(found),
                ValidationSeverity::Warning => warnings.extend(found),
            }
        }

        // Defaults for fields that carry no rule.
        if let Some(defaults) = self.defaults.defaults_for(kind) {
            for (field, default) in defaults {
                if is_missing(normalized.get(field)) {
                    normalized.insert(field.clone(), default.clone());
                }
            }
        }

        tracing::debug!(
            entity = %kind,
            errors = errors.len(),
            warnings = warnings.len(),
            "Validated record"
        );

        Ok(ValidationResult {
            is_valid: errors.is_empty(),
            errors,
            warnings,
            normalized: Value::Object(normalized),
        })
    }

    /// Validate every record of a batch independently.
    pub fn validate_many(&self, kind: EntityKind, records: &[Value]) -> Result<BatchReport, CoreError> {
        let mut report = BatchReport::new(kind);
        for record in records {
            report.push(self.validate(kind, record)?);
        }
        Ok(report)
    }

    fn evaluate_field(
        &self,
        kind: EntityKind,
        rule: &FieldRule,
        data: &Map<String, Value>,
        normalized: &mut Map<String, Value>,
        out: &mut Vec<FieldViolation>,
    ) {
        let value = match data.get(&rule.field) {
            Some(Value::Null) if rule.nullable => return,
            Some(Value::Null) | None => None,
            Some(v) => Some(v),
        };

        let Some(value) = value else {
            if let Some(default) = self.defaults.default_for(kind, &rule.field) {
                normalized.insert(rule.field.clone(), default.clone());
            } else if rule.required {
                out.push(required_violation(rule, data.get(&rule.field)));
            }
            return;
        };

        // A blank required string counts as missing and takes the default.
        if rule.required && value.as_str().is_some_and(|s| s.trim().is_empty()) {
            match self.defaults.default_for(kind, &rule.field) {
                Some(default) => {
                    normalized.insert(rule.field.clone(), default.clone());
                }
                None => out.push(required_violation(rule, Some(value))),
            }
            return;
        }

        self.check_value(&rule.kind, value, &rule.field, &rule.label, out);
    }

    fn check_value(
        &self,
        kind: &RuleKind,
        value: &Value,
        path: &str,
        label: &str,
        out: &mut Vec<FieldViolation>,
    ) {
        let mut push = |rule: ViolationKind, constraint: String, message: String| {
            out.push(FieldViolation {
                field: path.to_string(),
                rule,
                constraint,
                message,
                value: Some(value.clone()),
            });
        };

        match kind {
            RuleKind::String {
                min_length,
                max_length,
                pattern,
            } => {
                let Some(s) = value.as_str() else {
                    return push(
                        ViolationKind::Type,
                        format!("type {}", kind.type_name()),
                        format!("{label} must be text"),
                    );
                };
                let len = s.chars().count();
                if let Some(min) = min_length.filter(|min| len < *min) {
                    push(
                        ViolationKind::MinLength,
                        format!("min length {min}"),
                        format!("{label} must be at least {min} characters"),
                    );
                }
                if let Some(max) = max_length.filter(|max| len > *max) {
                    push(
                        ViolationKind::MaxLength,
                        format!("max length {max}"),
                        format!("{label} must be at most {max} characters"),
                    );
                }
                if let Some(pattern) = pattern {
                    let matches = self.patterns.get(pattern).is_some_and(|re| re.is_match(s));
                    if !matches {
                        push(
                            ViolationKind::Pattern,
                            format!("pattern {pattern}"),
                            format!("{label} has an invalid format"),
                        );
                    }
                }
            }
            RuleKind::Number { min, max, integer } => {
                let Some(n) = value.as_f64() else {
                    return push(
                        ViolationKind::Type,
                        format!("type {}", kind.type_name()),
                        format!("{label} must be a number"),
                    );
                };
                if !n.is_finite() {
                    return push(
                        ViolationKind::NotFinite,
                        "finite".into(),
                        format!("{label} must be a finite number"),
                    );
                }
                if *integer && n.fract() != 0.0 {
                    push(
                        ViolationKind::NotInteger,
                        "integer".into(),
                        format!("{label} must be a whole number"),
                    );
                }
                if let Some(min) = min.filter(|min| n < *min) {
                    push(
                        ViolationKind::MinValue,
                        format!("min {min}"),
                        format!("{label} must be at least {min}"),
                    );
                }
                if let Some(max) = max.filter(|max| n > *max) {
                    push(
                        ViolationKind::MaxValue,
                        format!("max {max}"),
                        format!("{label} must be at most {max}"),
                    );
                }
            }
            RuleKind::Date { min, max } => {
                let Some(date) = value.as_str().and_then(parse_date) else {
                    return push(
                        ViolationKind::InvalidDate,
                        "date".into(),
                        format!("{label} must be a valid date"),
                    );
                };
                if let Some(min) = min.filter(|min| date < *min) {
                    push(
                        ViolationKind::DateTooEarly,
                        format!("min date {min}"),
                        format!("{label} must not be before {min}"),
                    );
                }
                if let Some(max) = max.filter(|max| date > *max) {
                    push(
                        ViolationKind::DateTooLate,
                        format!("max date {max}"),
                        format!("{label} must not be after {max}"),
                    );
                }
            }
            RuleKind::Enum { values } => {
                if !values.contains(value) {
                    let allowed: Vec<String> = values.iter().map(display_value).collect();
                    push(
                        ViolationKind::Enum,
                        format!("one of [{}]", allowed.join(", ")),
                        format!("{label} must be one of: {}", allowed.join(", ")),
                    );
                }
            }
            RuleKind::Boolean => {
                if !value.is_boolean() {
                    push(
                        ViolationKind::Type,
                        format!("type {}", kind.type_name()),
                        format!("{label} must be true or false"),
                    );
                }
            }
            RuleKind::Object => {
                if !value.is_object() {
                    push(
                        ViolationKind::Type,
                        format!("type {}", kind.type_name()),
                        format!("{label} must be an object"),
                    );
                }
            }
            RuleKind::Array {
                min_items,
                max_items,
                element,
            } => {
                let Some(items) = value.as_array() else {
                    return push(
                        ViolationKind::Type,
                        format!("type {}", kind.type_name()),
                        format!("{label} must be a list"),
                    );
                };
                if let Some(min) = min_items.filter(|min| items.len() < *min) {
                    push(
                        ViolationKind::MinItems,
                        format!("min items {min}"),
                        format!("{label} must contain at least {min} items"),
                    );
                }
                if let Some(max) = max_items.filter(|max| items.len() > *max) {
                    push(
                        ViolationKind::MaxItems,
                        format!("max items {max}"),
                        format!("{label} must contain at most {max} items"),
                    );
                }
                if let Some(element) = element {
                    for (i, item) in items.iter().enumerate() {
                        let item_path = format!("{path}[{i}]");
                        let item_label = format!("{label}[{i}]");
                        self.check_value(element, item, &item_path, &item_label, out);
                    }
                }
            }
        }
    }
}

/// Parse an RFC 3339 timestamp, `YYYY-MM-DD HH:MM:SS`, or `YYYY-MM-DD`
/// into its calendar date.
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.date_naive());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return Some(dt.date());
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()
}

fn is_missing(value: Option<&Value>) -> bool {
    matches!(value, None | Some(Value::Null))
}

fn required_violation(rule: &FieldRule, value: Option<&Value>) -> FieldViolation {
    FieldViolation {
        field: rule.field.clone(),
        rule: ViolationKind::Required,
        constraint: "required".to_string(),
        message: format!("{} is required", rule.label),
        value: value.cloned(),
    }
}

fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn collect_patterns(kind: &RuleKind, patterns: &mut HashMap<String, Regex>) -> Result<(), regex::Error> {
    match kind {
        RuleKind::String {
            pattern: Some(pattern),
            ..
        } if !patterns.contains_key(pattern) => {
            patterns.insert(pattern.clone(), Regex::new(pattern)?);
        }
        RuleKind::Array {
            element: Some(element),
            ..
        } => collect_patterns(element, patterns)?,
        _ => {}
    }
    Ok(())
}

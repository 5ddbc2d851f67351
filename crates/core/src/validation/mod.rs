//! Data validation engine.
//!
//! Provides declarative rule tables, default-value tables, and a pure-logic
//! evaluator that checks and normalizes entity records before submission.

pub mod builtin;
pub mod evaluator;
pub mod rules;

pub use evaluator::{parse_date, Validator};
pub use rules::{
    BatchReport, DefaultTable, FieldRule, FieldViolation, RecordReport, RuleKind, RuleRegistry,
    ValidationResult, ValidationSeverity, ViolationKind,
};

//! Key-by-key comparison of JSON objects with deep structural equality.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The status of a key in a diff comparison.
///
/// - `Added`   -- present only in the new side.
/// - `Removed` -- present only in the old side.
/// - `Changed` -- present in both sides with different values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiffStatus {
    Added,
    Removed,
    Changed,
}

impl DiffStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Added => "added",
            Self::Removed => "removed",
            Self::Changed => "changed",
        }
    }
}

impl std::fmt::Display for DiffStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A key whose value differs between two objects.
#[derive(Debug, Clone, PartialEq)]
pub struct KeyDiff<'a> {
    pub key: &'a str,
    pub status: DiffStatus,
    pub old: Option<&'a Value>,
    pub new: Option<&'a Value>,
}

/// Compare two objects over the union of their keys.
///
/// Keys of `old` come first in their order, then keys only in `new`. Keys
/// whose values are deeply equal are omitted.
pub fn diff_maps<'a>(old: &'a Map<String, Value>, new: &'a Map<String, Value>) -> Vec<KeyDiff<'a>> {
    let mut diffs = Vec::new();
    for (key, old_value) in old {
        match new.get(key) {
            None => diffs.push(KeyDiff {
                key,
                status: DiffStatus::Removed,
                old: Some(old_value),
                new: None,
            }),
            Some(new_value) if !deep_equal(old_value, new_value) => diffs.push(KeyDiff {
                key,
                status: DiffStatus::Changed,
                old: Some(old_value),
                new: Some(new_value),
            }),
            Some(_) => {}
        }
    }
    for (key, new_value) in new {
        if !old.contains_key(key) {
            diffs.push(KeyDiff {
                key,
                status: DiffStatus::Added,
                old: None,
                new: Some(new_value),
            });
        }
    }
    diffs
}

/// Structural equality where `1` and `1.0` are the same number.
pub fn deep_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => {
            if x.is_f64() || y.is_f64() {
                x.as_f64() == y.as_f64()
            } else {
                x == y
            }
        }
        (Value::Array(xs), Value::Array(ys)) => {
            xs.len() == ys.len() && xs.iter().zip(ys).all(|(x, y)| deep_equal(x, y))
        }
        (Value::Object(xs), Value::Object(ys)) => {
            xs.len() == ys.len()
                && xs
                    .iter()
                    .all(|(k, x)| ys.get(k).is_some_and(|y| deep_equal(x, y)))
        }
        _ => a == b,
    }
}

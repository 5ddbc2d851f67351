//! Audit trail of entity mutations.
//!
//! Entries are immutable once recorded. Each carries a field-level diff of
//! the before/after snapshots and an integrity hash chaining it to the entry
//! recorded before it.

pub mod changes;
pub mod store;

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::diff::DiffStatus;
use crate::hashing;
use crate::types::{EntityId, EntityKind, Timestamp};

pub use changes::{calculate_changes, field_label};
pub use store::AuditLogStore;

// ---------------------------------------------------------------------------
// Actions
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    Create,
    Update,
    Delete,
    Submit,
    Approve,
    Reject,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
            Self::Submit => "submit",
            Self::Approve => "approve",
            Self::Reject => "reject",
        }
    }
}

// ---------------------------------------------------------------------------
// Entries
// ---------------------------------------------------------------------------

/// One field whose value differs between the before and after snapshots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldChange {
    pub field: String,
    pub field_label: String,
    /// `None` when the field was absent before.
    pub old_value: Option<Value>,
    /// `None` when the field is absent after.
    pub new_value: Option<Value>,
    pub status: DiffStatus,
}

/// A recorded mutation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditLogItem {
    pub id: String,
    pub entity_type: EntityKind,
    pub entity_id: EntityId,
    pub entity_name: String,
    pub action: AuditAction,
    pub operator: String,
    pub operator_name: String,
    pub timestamp: Timestamp,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub before: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub after: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub changes: Option<Vec<FieldChange>>,
    pub integrity_hash: String,
}

/// Input to [`AuditLogStore::log_action`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogActionParams {
    pub entity_type: EntityKind,
    pub entity_id: EntityId,
    pub entity_name: String,
    pub action: AuditAction,
    pub operator: String,
    pub operator_name: String,
    #[serde(default)]
    pub before: Option<Value>,
    #[serde(default)]
    pub after: Option<Value>,
}

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

/// Filters for [`AuditLogStore::query_logs`]. Unset fields match everything;
/// set fields must all match.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditQuery {
    /// Matches the operator id or the operator name.
    pub operator: Option<String>,
    pub entity_type: Option<EntityKind>,
    pub entity_id: Option<EntityId>,
    pub action: Option<AuditAction>,
    /// Inclusive lower bound.
    pub from: Option<Timestamp>,
    /// Inclusive upper bound.
    pub to: Option<Timestamp>,
    /// Case-insensitive substring of the entity name.
    pub keyword: Option<String>,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

impl AuditQuery {
    /// Restrict to whole calendar days, `from_day` 00:00 through the last
    /// instant of `to_day` (UTC).
    pub fn with_date_range(mut self, from_day: NaiveDate, to_day: NaiveDate) -> Self {
        self.from = Some(from_day.and_time(NaiveTime::MIN).and_utc());
        self.to = to_day
            .succ_opt()
            .map(|next| next.and_time(NaiveTime::MIN).and_utc() - chrono::Duration::nanoseconds(1));
        self
    }

    pub fn matches(&self, item: &AuditLogItem) -> bool {
        self.operator
            .as_ref()
            .map_or(true, |op| &item.operator == op || &item.operator_name == op)
            && self.entity_type.map_or(true, |t| item.entity_type == t)
            && self.entity_id.as_ref().map_or(true, |id| &item.entity_id == id)
            && self.action.map_or(true, |a| item.action == a)
            && self.from.map_or(true, |from| item.timestamp >= from)
            && self.to.map_or(true, |to| item.timestamp <= to)
            && self.keyword.as_ref().map_or(true, |kw| {
                item.entity_name
                    .to_lowercase()
                    .contains(&kw.to_lowercase())
            })
    }
}

/// Result of an audit log integrity verification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IntegrityCheckResult {
    pub verified_entries: usize,
    pub chain_valid: bool,
    /// Id of the first (oldest) entry where the chain breaks.
    pub first_break: Option<String>,
}

// ---------------------------------------------------------------------------
// Integrity hash computation
// ---------------------------------------------------------------------------

/// Known seed value for the first entry in the hash chain.
const CHAIN_SEED: &str = "SISM_AUDIT_CHAIN_SEED_V1";

/// Compute the SHA-256 integrity hash for an audit log entry.
///
/// `prev_hash` is the integrity_hash of the previous entry, or `None` for the
/// first entry in the chain (which uses a known seed value).
pub fn compute_integrity_hash(prev_hash: Option<&str>, entry_data: &str) -> String {
    let prev = prev_hash.unwrap_or(CHAIN_SEED);
    let combined = format!("{prev}|{entry_data}");
    hashing::sha256_hex(combined.as_bytes())
}

// ---------------------------------------------------------------------------
// Sensitive field redaction
// ---------------------------------------------------------------------------

/// Fields whose values never reach the audit log.
pub const SENSITIVE_FIELDS: &[&str] = &[
    "password",
    "token",
    "secret",
    "api_key",
    "apikey",
    "private_key",
    "authorization",
    "credential",
];

pub const REDACTED: &str = "[REDACTED]";

pub fn is_sensitive_field(key: &str) -> bool {
    let lower_key = key.to_lowercase();
    SENSITIVE_FIELDS.iter().any(|f| lower_key.contains(f))
}

/// Redact sensitive fields from a JSON value, recursively.
pub fn redact_sensitive_fields(value: &Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(key, val)| {
                    let val = if is_sensitive_field(key) {
                        Value::String(REDACTED.to_string())
                    } else {
                        redact_sensitive_fields(val)
                    };
                    (key.clone(), val)
                })
                .collect(),
        ),
        Value::Array(arr) => Value::Array(arr.iter().map(redact_sensitive_fields).collect()),
        other => other.clone(),
    }
}

//! In-memory audit log, newest entry first.

use std::collections::{HashSet, VecDeque};
use std::sync::{PoisonError, RwLock};

use chrono::{SecondsFormat, Utc};
use rand::Rng;
use serde_json::json;

use super::{
    calculate_changes, compute_integrity_hash, redact_sensitive_fields, AuditLogItem, AuditQuery,
    IntegrityCheckResult, LogActionParams,
};
use crate::canonical::canonical_json;
use crate::types::{EntityKind, Timestamp};

/// Length of the random suffix on entry ids.
const ID_SUFFIX_LENGTH: usize = 6;

/// Append-only audit log.
///
/// Thread-safe via interior `RwLock`; an entry is fully built before it is
/// published, so readers never observe a partial entry.
#[derive(Debug, Default)]
pub struct AuditLogStore {
    entries: RwLock<VecDeque<AuditLogItem>>,
}

impl AuditLogStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a mutation at the current time.
    ///
    /// The clock is read under the write lock, so concurrent writers publish
    /// entries in timestamp order.
    pub fn log_action(&self, params: LogActionParams) -> AuditLogItem {
        self.append(params, Utc::now)
    }

    /// Record a mutation at `timestamp`.
    ///
    /// The entry goes in front of every existing entry regardless of its
    /// timestamp; the log is ordered by insertion.
    pub fn log_action_at(&self, params: LogActionParams, timestamp: Timestamp) -> AuditLogItem {
        self.append(params, || timestamp)
    }

    /// Changes are computed from the raw snapshots; the stored snapshots are
    /// redacted. Absent snapshots and empty change lists are omitted.
    fn append(&self, params: LogActionParams, clock: impl FnOnce() -> Timestamp) -> AuditLogItem {
        let changes = calculate_changes(params.before.as_ref(), params.after.as_ref());
        let before = params.before.as_ref().map(redact_sensitive_fields);
        let after = params.after.as_ref().map(redact_sensitive_fields);

        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        let timestamp = clock();
        let mut item = AuditLogItem {
            id: generate_entry_id(timestamp),
            entity_type: params.entity_type,
            entity_id: params.entity_id,
            entity_name: params.entity_name,
            action: params.action,
            operator: params.operator,
            operator_name: params.operator_name,
            timestamp,
            before,
            after,
            changes: (!changes.is_empty()).then_some(changes),
            integrity_hash: String::new(),
        };
        let prev_hash = entries.front().map(|e| e.integrity_hash.as_str());
        item.integrity_hash = compute_integrity_hash(prev_hash, &entry_data(&item));
        entries.push_front(item.clone());
        drop(entries);

        tracing::debug!(
            id = %item.id,
            entity_type = %item.entity_type,
            entity_id = %item.entity_id,
            action = item.action.as_str(),
            changes = item.changes.as_ref().map_or(0, Vec::len),
            "Recorded audit entry"
        );
        item
    }

    /// Entries matching `query`, newest first, with `offset`/`limit` applied
    /// after filtering.
    pub fn query_logs(&self, query: &AuditQuery) -> Vec<AuditLogItem> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        entries
            .iter()
            .filter(|item| query.matches(item))
            .skip(query.offset.unwrap_or(0))
            .take(query.limit.unwrap_or(usize::MAX))
            .cloned()
            .collect()
    }

    /// Every entry about one entity, newest first.
    pub fn get_entity_history(&self, entity_type: EntityKind, entity_id: &str) -> Vec<AuditLogItem> {
        self.query_logs(&AuditQuery {
            entity_type: Some(entity_type),
            entity_id: Some(entity_id.to_string()),
            ..Default::default()
        })
    }

    /// Distinct operator names, most recently active first.
    pub fn operators(&self) -> Vec<String> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        let mut seen = HashSet::new();
        entries
            .iter()
            .filter(|item| seen.insert(item.operator_name.as_str()))
            .map(|item| item.operator_name.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Recompute the hash chain from the oldest entry forward.
    pub fn verify_integrity(&self) -> IntegrityCheckResult {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        let mut prev_hash: Option<&str> = None;
        for (verified, item) in entries.iter().rev().enumerate() {
            let expected = compute_integrity_hash(prev_hash, &entry_data(item));
            if expected != item.integrity_hash {
                return IntegrityCheckResult {
                    verified_entries: verified,
                    chain_valid: false,
                    first_break: Some(item.id.clone()),
                };
            }
            prev_hash = Some(item.integrity_hash.as_str());
        }
        IntegrityCheckResult {
            verified_entries: entries.len(),
            chain_valid: true,
            first_break: None,
        }
    }

    /// Drop every entry. Irreversible; intended for test isolation.
    pub fn clear_logs(&self) {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        let removed = entries.len();
        entries.clear();
        tracing::info!(removed, "Cleared audit log");
    }

    #[cfg(test)]
    fn tamper<F: FnOnce(&mut AuditLogItem)>(&self, index: usize, f: F) {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(item) = entries.get_mut(index) {
            f(item);
        }
    }
}

/// `<unix millis>-<random alphanumeric suffix>`.
fn generate_entry_id(timestamp: Timestamp) -> String {
    let suffix: String = rand::rng()
        .sample_iter(&rand::distr::Alphanumeric)
        .take(ID_SUFFIX_LENGTH)
        .map(char::from)
        .collect();
    format!("{}-{}", timestamp.timestamp_millis(), suffix.to_lowercase())
}

/// Canonical JSON of an entry without its own hash.
fn entry_data(item: &AuditLogItem) -> String {
    let changes = item.changes.as_ref().map(|changes| {
        changes
            .iter()
            .map(|c| {
                json!({
                    "field": c.field,
                    "fieldLabel": c.field_label,
                    "oldValue": c.old_value,
                    "newValue": c.new_value,
                    "status": c.status.as_str(),
                })
            })
            .collect::<Vec<_>>()
    });
    canonical_json(&json!({
        "id": item.id,
        "entityType": item.entity_type.as_str(),
        "entityId": item.entity_id,
        "entityName": item.entity_name,
        "action": item.action.as_str(),
        "operator": item.operator,
        "operatorName": item.operator_name,
        "timestamp": item.timestamp.to_rfc3339_opts(SecondsFormat::AutoSi, true),
        "before": item.before,
        "after": item.after,
        "changes": changes,
    }))
}

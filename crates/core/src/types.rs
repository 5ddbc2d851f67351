use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// Entity ids are opaque strings assigned by the remote API.
pub type EntityId = String;

/// The entity kinds that carry validation rules and appear in the audit log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EntityKind {
    Indicator,
    Milestone,
    User,
    AuditEntry,
}

impl EntityKind {
    pub const ALL: [EntityKind; 4] = [
        EntityKind::Indicator,
        EntityKind::Milestone,
        EntityKind::User,
        EntityKind::AuditEntry,
    ];

    /// Stable string representation matching serde's `rename_all = "kebab-case"`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Indicator => "indicator",
            Self::Milestone => "milestone",
            Self::User => "user",
            Self::AuditEntry => "audit-entry",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityKind {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EntityKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| CoreError::UnknownEntityKind(s.to_string()))
    }
}

//! Strategic indicator and milestone DTOs.
//!
//! Field names serialize in camelCase so these types are interchangeable with
//! the remote API's JSON payloads.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::types::EntityId;

/// Whether an indicator is measured by a number or judged qualitatively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndicatorType {
    Quantitative,
    Qualitative,
}

/// Position of an indicator in the strategic decomposition tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndicatorLevel {
    Strategic,
    Functional,
    College,
}

/// Approval lifecycle of an indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndicatorStatus {
    Draft,
    Pending,
    Approved,
    Rejected,
    Archived,
}

impl IndicatorStatus {
    pub const ALL: [IndicatorStatus; 5] = [
        IndicatorStatus::Draft,
        IndicatorStatus::Pending,
        IndicatorStatus::Approved,
        IndicatorStatus::Rejected,
        IndicatorStatus::Archived,
    ];

    /// Stable string representation matching serde's `rename_all = "snake_case"`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::Archived => "archived",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MilestoneStatus {
    Pending,
    InProgress,
    Completed,
    Overdue,
}

impl MilestoneStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Overdue => "overdue",
        }
    }
}

/// A checkpoint on the way to an indicator's target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Milestone {
    pub id: EntityId,
    pub indicator_id: EntityId,
    pub name: String,
    /// Progress (0-100) the parent indicator should reach by `deadline`.
    pub target_progress: f64,
    pub weight: f64,
    pub deadline: NaiveDate,
    pub status: MilestoneStatus,
    #[serde(default)]
    pub description: String,
}

/// A strategic indicator tracked on the dashboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StrategicIndicator {
    pub id: EntityId,
    pub name: String,
    pub indicator_type: IndicatorType,
    pub level: IndicatorLevel,
    pub parent_id: Option<EntityId>,
    pub year: i32,
    pub owner_dept: String,
    pub responsible_person: Option<String>,
    pub weight: f64,
    /// Completion percentage, 0-100.
    pub progress: f64,
    pub status: IndicatorStatus,
    pub target_value: Option<f64>,
    pub actual_value: Option<f64>,
    #[serde(default)]
    pub unit: String,
    pub deadline: Option<NaiveDate>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub milestones: Vec<Milestone>,
}

impl StrategicIndicator {
    pub fn is_completed(&self) -> bool {
        self.progress >= 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn serializes_in_camel_case() {
        let milestone = Milestone {
            id: "m-1".into(),
            indicator_id: "ind-1".into(),
            name: "Mid-year review".into(),
            target_progress: 50.0,
            weight: 40.0,
            deadline: NaiveDate::from_ymd_opt(2025, 6, 30).unwrap(),
            status: MilestoneStatus::InProgress,
            description: String::new(),
        };
        let value = serde_json::to_value(&milestone).unwrap();
        assert_eq!(value["indicatorId"], "ind-1");
        assert_eq!(value["targetProgress"], 50.0);
        assert_eq!(value["deadline"], "2025-06-30");
        assert_eq!(value["status"], "in_progress");
    }

    #[test]
    fn optional_collections_default_when_absent() {
        let indicator: StrategicIndicator = serde_json::from_value(json!({
            "id": "ind-9",
            "name": "Research funding",
            "indicatorType": "quantitative",
            "level": "strategic",
            "parentId": null,
            "year": 2025,
            "ownerDept": "Research Office",
            "responsiblePerson": null,
            "weight": 10,
            "progress": 100,
            "status": "approved",
            "targetValue": 500,
            "actualValue": 520,
            "deadline": null
        }))
        .unwrap();
        assert!(indicator.milestones.is_empty());
        assert!(indicator.tags.is_empty());
        assert!(indicator.is_completed());
    }

    #[test]
    fn status_as_str_matches_serde() {
        for status in IndicatorStatus::ALL {
            let json = serde_json::to_value(status).unwrap();
            assert_eq!(json, status.as_str());
        }
    }
}

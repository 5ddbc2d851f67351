//! Static local dataset served when the remote API is unavailable.
//!
//! Payloads use the same DTOs as the real API so callers cannot tell a
//! substituted response from a live one.

use std::fmt;

use chrono::NaiveDate;
use serde::Serialize;
use serde_json::Value;

use crate::dashboard::DashboardData;
use crate::error::CoreError;
use crate::indicator::{
    IndicatorLevel, IndicatorStatus, IndicatorType, Milestone, MilestoneStatus,
    StrategicIndicator,
};

/// The resource a failed request was asking for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceContext {
    Indicators { year: Option<i32> },
    Indicator { id: String },
    Milestones { indicator_id: Option<String> },
    Dashboard,
}

impl ResourceContext {
    /// Map a request path to the resource it reads.
    ///
    /// Accepts an optional `/api` prefix and honours `?year=` on the
    /// indicator list and `?indicatorId=` on the milestone list. Returns
    /// `None` for paths with no mock counterpart.
    pub fn from_path(path: &str) -> Option<Self> {
        let path = path.split('#').next().unwrap_or_default();
        let (route, query) = path.split_once('?').unwrap_or((path, ""));
        let mut segments: Vec<&str> = route.split('/').filter(|s| !s.is_empty()).collect();
        if segments.first() == Some(&"api") {
            segments.remove(0);
        }
        let param = |name: &str| {
            query
                .split('&')
                .filter_map(|p| p.split_once('='))
                .find(|(k, _)| *k == name)
                .map(|(_, v)| v.to_string())
        };

        match segments.as_slice() {
            ["indicators"] => Some(Self::Indicators {
                year: param("year").and_then(|y| y.parse().ok()),
            }),
            ["indicators", id] => Some(Self::Indicator { id: id.to_string() }),
            ["indicators", id, "milestones"] => Some(Self::Milestones {
                indicator_id: Some(id.to_string()),
            }),
            ["milestones"] => Some(Self::Milestones {
                indicator_id: param("indicatorId"),
            }),
            ["dashboard"] | ["dashboard", "overview"] => Some(Self::Dashboard),
            _ => None,
        }
    }
}

impl fmt::Display for ResourceContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Indicators { year: Some(year) } => write!(f, "indicators?year={year}"),
            Self::Indicators { year: None } => f.write_str("indicators"),
            Self::Indicator { id } => write!(f, "indicators/{id}"),
            Self::Milestones {
                indicator_id: Some(id),
            } => write!(f, "indicators/{id}/milestones"),
            Self::Milestones { indicator_id: None } => f.write_str("milestones"),
            Self::Dashboard => f.write_str("dashboard"),
        }
    }
}

/// A mock payload, shaped like the corresponding API response.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum MockData {
    Indicators(Vec<StrategicIndicator>),
    Indicator(StrategicIndicator),
    Milestones(Vec<Milestone>),
    Dashboard(DashboardData),
}

impl MockData {
    /// The JSON body the real endpoint would have returned.
    pub fn to_value(&self) -> Result<Value, CoreError> {
        serde_json::to_value(self)
            .map_err(|e| CoreError::Internal(format!("failed to serialize mock data: {e}")))
    }
}

/// Date the dashboard mock is computed against, so its warnings are stable.
pub fn reference_date() -> NaiveDate {
    date(2025, 6, 15)
}

/// Look up mock data for `context`.
pub fn get_mock_data(context: &ResourceContext) -> Result<MockData, CoreError> {
    let indicators = indicators();
    match context {
        ResourceContext::Indicators { year } => Ok(MockData::Indicators(
            indicators
                .into_iter()
                .filter(|i| year.map_or(true, |y| i.year == y))
                .collect(),
        )),
        ResourceContext::Indicator { id } => indicators
            .into_iter()
            .find(|i| &i.id == id)
            .map(MockData::Indicator)
            .ok_or_else(|| CoreError::NotFound {
                entity: "indicator",
                id: id.clone(),
            }),
        ResourceContext::Milestones { indicator_id } => Ok(MockData::Milestones(
            indicators
                .into_iter()
                .flat_map(|i| i.milestones)
                .filter(|m| indicator_id.as_ref().map_or(true, |id| &m.indicator_id == id))
                .collect(),
        )),
        ResourceContext::Dashboard => Ok(MockData::Dashboard(DashboardData::summarize(
            &indicators,
            reference_date(),
        ))),
    }
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap_or_default()
}

fn milestone(
    indicator_id: &str,
    seq: u32,
    name: &str,
    target_progress: f64,
    deadline: NaiveDate,
    status: MilestoneStatus,
) -> Milestone {
    Milestone {
        id: format!("{indicator_id}-m{seq}"),
        indicator_id: indicator_id.to_string(),
        name: name.to_string(),
        target_progress,
        weight: 50.0,
        deadline,
        status,
        description: String::new(),
    }
}

struct Seed {
    id: &'static str,
    name: &'static str,
    indicator_type: IndicatorType,
    level: IndicatorLevel,
    parent_id: Option<&'static str>,
    owner_dept: &'static str,
    responsible_person: &'static str,
    weight: f64,
    progress: f64,
    status: IndicatorStatus,
    target_value: Option<f64>,
    actual_value: Option<f64>,
    unit: &'static str,
    deadline: NaiveDate,
}

impl Seed {
    fn build(self, milestones: Vec<Milestone>) -> StrategicIndicator {
        StrategicIndicator {
            id: self.id.to_string(),
            name: self.name.to_string(),
            indicator_type: self.indicator_type,
            level: self.level,
            parent_id: self.parent_id.map(str::to_string),
            year: 2025,
            owner_dept: self.owner_dept.to_string(),
            responsible_person: Some(self.responsible_person.to_string()),
            weight: self.weight,
            progress: self.progress,
            status: self.status,
            target_value: self.target_value,
            actual_value: self.actual_value,
            unit: self.unit.to_string(),
            deadline: Some(self.deadline),
            description: String::new(),
            tags: Vec::new(),
            milestones,
        }
    }
}

/// The full mock indicator set, milestones nested.
pub fn indicators() -> Vec<StrategicIndicator> {
    vec![
        Seed {
            id: "ind-001",
            name: "科研经费总额",
            indicator_type: IndicatorType::Quantitative,
            level: IndicatorLevel::Strategic,
            parent_id: None,
            owner_dept: "科研处",
            responsible_person: "李明",
            weight: 30.0,
            progress: 65.0,
            status: IndicatorStatus::Approved,
            target_value: Some(5000.0),
            actual_value: Some(3250.0),
            unit: "万元",
            deadline: date(2025, 12, 31),
        }
        .build(vec![
            milestone("ind-001", 1, "上半年经费到账", 50.0, date(2025, 6, 30), MilestoneStatus::InProgress),
            milestone("ind-001", 2, "全年经费到账", 100.0, date(2025, 12, 31), MilestoneStatus::Pending),
        ]),
        Seed {
            id: "ind-002",
            name: "本科生就业率",
            indicator_type: IndicatorType::Quantitative,
            level: IndicatorLevel::Strategic,
            parent_id: None,
            owner_dept: "招生就业处",
            responsible_person: "王芳",
            weight: 25.0,
            progress: 100.0,
            status: IndicatorStatus::Approved,
            target_value: Some(95.0),
            actual_value: Some(96.2),
            unit: "%",
            deadline: date(2025, 9, 30),
        }
        .build(vec![milestone(
            "ind-002",
            1,
            "毕业季就业统计",
            100.0,
            date(2025, 9, 30),
            MilestoneStatus::Completed,
        )]),
        Seed {
            id: "ind-003",
            name: "省级一流课程建设",
            indicator_type: IndicatorType::Qualitative,
            level: IndicatorLevel::Functional,
            parent_id: Some("ind-001"),
            owner_dept: "教务处",
            responsible_person: "赵强",
            weight: 20.0,
            progress: 40.0,
            status: IndicatorStatus::Pending,
            target_value: None,
            actual_value: None,
            unit: "",
            deadline: date(2025, 6, 20),
        }
        .build(vec![
            milestone("ind-003", 1, "课程申报", 30.0, date(2025, 3, 31), MilestoneStatus::Completed),
            milestone("ind-003", 2, "专家评审", 100.0, date(2025, 6, 20), MilestoneStatus::Overdue),
        ]),
        Seed {
            id: "ind-004",
            name: "高层次人才引进",
            indicator_type: IndicatorType::Quantitative,
            level: IndicatorLevel::Strategic,
            parent_id: None,
            owner_dept: "人事处",
            responsible_person: "陈静",
            weight: 15.0,
            progress: 20.0,
            status: IndicatorStatus::Approved,
            target_value: Some(10.0),
            actual_value: Some(2.0),
            unit: "人",
            deadline: date(2025, 5, 31),
        }
        .build(Vec::new()),
        Seed {
            id: "ind-005",
            name: "学院实验室安全检查",
            indicator_type: IndicatorType::Qualitative,
            level: IndicatorLevel::College,
            parent_id: Some("ind-003"),
            owner_dept: "计算机学院",
            responsible_person: "周伟",
            weight: 10.0,
            progress: 0.0,
            status: IndicatorStatus::Draft,
            target_value: None,
            actual_value: None,
            unit: "",
            deadline: date(2025, 11, 30),
        }
        .build(Vec::new()),
    ]
}

//! Dashboard aggregate DTO and the pure summary computation behind it.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::indicator::StrategicIndicator;

/// Days before a deadline at which a lagging indicator starts to warn.
pub const WARNING_WINDOW_DAYS: i64 = 7;

/// Progress below which an indicator inside the warning window warns.
pub const WARNING_PROGRESS_THRESHOLD: f64 = 80.0;

/// Per-department progress roll-up.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DepartmentProgress {
    pub dept: String,
    pub indicator_count: usize,
    pub average_progress: f64,
}

/// Payload of the dashboard overview endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardData {
    pub total_indicators: usize,
    pub completed_indicators: usize,
    pub average_progress: f64,
    pub warning_count: usize,
    pub status_counts: BTreeMap<String, usize>,
    pub department_progress: Vec<DepartmentProgress>,
    pub indicators: Vec<StrategicIndicator>,
}

impl DashboardData {
    /// Build the dashboard aggregates for `indicators` as seen on `today`.
    ///
    /// `average_progress` is weighted by indicator weight, falling back to a
    /// plain mean when every weight is zero.
    pub fn summarize(indicators: &[StrategicIndicator], today: NaiveDate) -> Self {
        let completed_indicators = indicators.iter().filter(|i| i.is_completed()).count();
        let warning_count = indicators.iter().filter(|i| is_warning(i, today)).count();

        let mut status_counts = BTreeMap::new();
        for indicator in indicators {
            *status_counts
                .entry(indicator.status.as_str().to_string())
                .or_insert(0) += 1;
        }

        let mut by_dept: BTreeMap<&str, Vec<&StrategicIndicator>> = BTreeMap::new();
        for indicator in indicators {
            by_dept
                .entry(indicator.owner_dept.as_str())
                .or_default()
                .push(indicator);
        }
        let department_progress = by_dept
            .into_iter()
            .map(|(dept, items)| DepartmentProgress {
                dept: dept.to_string(),
                indicator_count: items.len(),
                average_progress: weighted_progress(items.iter().copied()),
            })
            .collect();

        Self {
            total_indicators: indicators.len(),
            completed_indicators,
            average_progress: weighted_progress(indicators.iter()),
            warning_count,
            status_counts,
            department_progress,
            indicators: indicators.to_vec(),
        }
    }
}

/// Whether an unfinished indicator is overdue or close to its deadline while
/// lagging behind.
pub fn is_warning(indicator: &StrategicIndicator, today: NaiveDate) -> bool {
    if indicator.is_completed() {
        return false;
    }
    let Some(deadline) = indicator.deadline else {
        return false;
    };
    let days_left = (deadline - today).num_days();
    days_left < 0
        || (days_left <= WARNING_WINDOW_DAYS && indicator.progress < WARNING_PROGRESS_THRESHOLD)
}

fn weighted_progress<'a>(items: impl Iterator<Item = &'a StrategicIndicator>) -> f64 {
    let (count, total_weight, weighted, plain) = items.fold(
        (0usize, 0.0, 0.0, 0.0),
        |(count, total_weight, weighted, plain), i| {
            (
                count + 1,
                total_weight + i.weight,
                weighted + i.progress * i.weight,
                plain + i.progress,
            )
        },
    );
    let mean = if count == 0 {
        0.0
    } else if total_weight > 0.0 {
        weighted / total_weight
    } else {
        plain / count as f64
    };
    round2(mean)
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
